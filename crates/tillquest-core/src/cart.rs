//! # Cart
//!
//! The in-memory working set of the sale being rung up.
//!
//! ## Reservation, Not a Hold
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  add / set_quantity                                                     │
//! │    └── checks the LIVE stock item passed in                            │
//! │        (cart qty for barcode + requested ≤ quantity_on_hand)           │
//! │    └── never touches the inventory itself                              │
//! │                                                                         │
//! │  plan_checkout (at finalize)                                           │
//! │    └── re-validates EVERY line against live stock                      │
//! │    └── returns the frozen sale lines, or the first failure             │
//! │    └── the inventory is only decremented once the whole plan passed    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Lines are unique by barcode; adding the same barcode again accumulates.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{CartLine, StockItem};
use crate::validation::{validate_cart_size, validate_quantity, validate_unit_price};
use crate::{MAX_CART_LINES, MAX_ITEM_QUANTITY};

/// The current cart.
///
/// ## Invariants
/// - At most one line per barcode
/// - Every line quantity is > 0
/// - No line asks for more than the stock on hand at the time it was checked
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    pub fn new() -> Self {
        Cart::default()
    }

    /// Adds `quantity` units of `item`, merging into an existing line.
    ///
    /// `item` must be the live inventory record; its `quantity_on_hand` is
    /// what the accumulated quantity is checked against.
    pub fn add(&mut self, item: &StockItem, quantity: i64) -> CoreResult<()> {
        validate_quantity(quantity)?;

        let existing = self.quantity_of(&item.barcode);
        let requested = existing + quantity;
        check_line(item, requested)?;

        if let Some(line) = self.line_mut(&item.barcode) {
            line.item = item.clone();
            line.quantity = requested;
            return Ok(());
        }

        validate_cart_size(self.lines.len()).map_err(|_| CoreError::CartTooLarge {
            max: MAX_CART_LINES,
        })?;

        self.lines.push(CartLine {
            item: item.clone(),
            quantity,
        });
        Ok(())
    }

    /// Sets a line to an absolute quantity. Zero removes the line.
    pub fn set_quantity(&mut self, item: &StockItem, quantity: i64) -> CoreResult<()> {
        if quantity == 0 {
            return self.remove(&item.barcode).map(|_| ());
        }

        validate_quantity(quantity)?;

        if self.line_mut(&item.barcode).is_none() {
            return Err(CoreError::NotInCart(item.barcode.clone()));
        }

        check_line(item, quantity)?;

        if let Some(line) = self.line_mut(&item.barcode) {
            line.item = item.clone();
            line.quantity = quantity;
        }
        Ok(())
    }

    /// Removes the line for `barcode`, returning it.
    pub fn remove(&mut self, barcode: &str) -> CoreResult<CartLine> {
        let index = self
            .lines
            .iter()
            .position(|l| l.item.barcode == barcode)
            .ok_or_else(|| CoreError::NotInCart(barcode.to_string()))?;

        Ok(self.lines.remove(index))
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Σ(unit_price × quantity) over all lines, computed on every call.
    pub fn total(&self) -> Money {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Units of `barcode` currently in the cart (0 if absent).
    pub fn quantity_of(&self, barcode: &str) -> i64 {
        self.lines
            .iter()
            .find(|l| l.item.barcode == barcode)
            .map(|l| l.quantity)
            .unwrap_or(0)
    }

    /// Re-validates every line against live stock and freezes the sale lines.
    ///
    /// `lookup` resolves a barcode to the live inventory record. Lines are
    /// checked in cart order and the first failure is returned; on success
    /// each returned line carries the live item snapshot, so the sale's
    /// prices are the ones in force at commit time.
    pub fn plan_checkout<'a, F>(&self, lookup: F) -> CoreResult<Vec<CartLine>>
    where
        F: Fn(&str) -> Option<&'a StockItem>,
    {
        if self.lines.is_empty() {
            return Err(CoreError::EmptyCart);
        }

        self.lines
            .iter()
            .map(|line| {
                let live = lookup(&line.item.barcode)
                    .ok_or_else(|| CoreError::ItemNotFound(line.item.barcode.clone()))?;
                check_line(live, line.quantity)?;
                Ok(CartLine {
                    item: live.clone(),
                    quantity: line.quantity,
                })
            })
            .collect()
    }

    fn line_mut(&mut self, barcode: &str) -> Option<&mut CartLine> {
        self.lines.iter_mut().find(|l| l.item.barcode == barcode)
    }
}

/// Checks one line against the price ceiling, the per-line cap and live
/// stock. With both caps in place a line total always fits in `Money`.
fn check_line(item: &StockItem, requested: i64) -> CoreResult<()> {
    validate_unit_price(item.unit_price)?;

    if requested > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        }
        .into());
    }

    if !item.can_supply(requested) {
        return Err(CoreError::InsufficientStock {
            barcode: item.barcode.clone(),
            available: item.quantity_on_hand,
            requested,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

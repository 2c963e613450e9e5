//! # Inventory Store
//!
//! Owns the barcode → stock item collection.
//!
//! ## Write Discipline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  every mutation                                                         │
//! │    1. copy the collection                                               │
//! │    2. validate + apply to the copy        ── reject? nothing changed   │
//! │    3. persist the whole copy              ── failed? nothing changed   │
//! │    4. swap the copy in                                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `decrease_many` runs the same steps for a whole checkout, so either every
//! line's stock drops or none does.

use chrono::Utc;
use tracing::{debug, info, warn};

use tillquest_core::validation::{
    validate_barcode, validate_item_name, validate_quantity, validate_stock_level,
    validate_unit_price,
};
use tillquest_core::{CoreError, Money, StockItem};

use crate::codec;
use crate::error::DbResult;
use crate::kv::KvStore;

/// Store for stock items.
#[derive(Debug)]
pub struct InventoryStore<S: KvStore> {
    store: S,
    items: Vec<StockItem>,
}

impl<S: KvStore> InventoryStore<S> {
    /// Loads the inventory from the persisted store.
    pub async fn open(store: S) -> DbResult<Self> {
        let items: Vec<StockItem> = codec::load(&store).await?;
        debug!(count = items.len(), "Inventory loaded");
        Ok(InventoryStore { store, items })
    }

    /// Looks up an item by barcode.
    pub fn find_by_barcode(&self, barcode: &str) -> Option<&StockItem> {
        self.items.iter().find(|i| i.barcode == barcode.trim())
    }

    /// Like [`find_by_barcode`](Self::find_by_barcode) but rejects when absent.
    pub fn get(&self, barcode: &str) -> DbResult<&StockItem> {
        self.find_by_barcode(barcode)
            .ok_or_else(|| CoreError::ItemNotFound(barcode.trim().to_string()).into())
    }

    /// All items in insertion order.
    pub fn items(&self) -> &[StockItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Units on hand across every item.
    pub fn total_units(&self) -> i64 {
        self.items.iter().map(|i| i.quantity_on_hand).sum()
    }

    /// Creates the item, or replaces name, price and quantity of an
    /// existing one with the same barcode.
    pub async fn upsert(
        &mut self,
        barcode: &str,
        name: &str,
        unit_price: Money,
        quantity: i64,
    ) -> DbResult<StockItem> {
        validate_barcode(barcode)?;
        validate_item_name(name)?;
        validate_unit_price(unit_price)?;
        validate_stock_level(quantity)?;

        let barcode = barcode.trim();
        let name = name.trim();
        let now = Utc::now();
        let mut next = self.items.clone();

        let item = match next.iter_mut().find(|i| i.barcode == barcode) {
            Some(existing) => {
                existing.name = name.to_string();
                existing.unit_price = unit_price;
                existing.quantity_on_hand = quantity;
                existing.updated_at = now;
                existing.clone()
            }
            None => {
                let item = StockItem::new(barcode, name, unit_price, quantity, now);
                next.push(item.clone());
                item
            }
        };

        self.commit(next).await?;
        debug!(barcode = %item.barcode, quantity = item.quantity_on_hand, "Item upserted");
        Ok(item)
    }

    /// Takes `amount` units out of stock, all or nothing.
    pub async fn decrease_quantity(&mut self, barcode: &str, amount: i64) -> DbResult<StockItem> {
        self.decrease_many(&[(barcode.to_string(), amount)]).await?;
        Ok(self.get(barcode)?.clone())
    }

    /// Takes stock for several barcodes in one validated pass.
    ///
    /// Every entry is checked first; if any fails, nothing is decremented.
    /// The collection is persisted once.
    pub async fn decrease_many(&mut self, decrements: &[(String, i64)]) -> DbResult<()> {
        let mut next = self.items.clone();

        for (barcode, amount) in decrements {
            validate_quantity(*amount)?;

            let item = next
                .iter_mut()
                .find(|i| &i.barcode == barcode)
                .ok_or_else(|| CoreError::ItemNotFound(barcode.clone()))?;

            if !item.can_supply(*amount) {
                warn!(barcode = %barcode, available = item.quantity_on_hand, requested = amount, "Insufficient stock");
                return Err(CoreError::InsufficientStock {
                    barcode: barcode.clone(),
                    available: item.quantity_on_hand,
                    requested: *amount,
                }
                .into());
            }

            item.quantity_on_hand -= amount;
            item.updated_at = Utc::now();
        }

        self.commit(next).await?;
        debug!(lines = decrements.len(), "Stock decremented");
        Ok(())
    }

    /// Adds `amount` units to an existing item.
    pub async fn restock(&mut self, barcode: &str, amount: i64) -> DbResult<StockItem> {
        validate_quantity(amount)?;

        let mut next = self.items.clone();
        let item = next
            .iter_mut()
            .find(|i| i.barcode == barcode.trim())
            .ok_or_else(|| CoreError::ItemNotFound(barcode.trim().to_string()))?;

        let quantity = item.quantity_on_hand.saturating_add(amount);
        validate_stock_level(quantity)?;

        item.quantity_on_hand = quantity;
        item.updated_at = Utc::now();
        let item = item.clone();

        self.commit(next).await?;
        debug!(barcode = %item.barcode, quantity = item.quantity_on_hand, "Item restocked");
        Ok(item)
    }

    /// Deletes an item by id. Recorded sales keep their own snapshots.
    pub async fn remove(&mut self, id: &str) -> DbResult<StockItem> {
        let mut next = self.items.clone();
        let index = next
            .iter()
            .position(|i| i.id == id)
            .ok_or_else(|| CoreError::ItemNotFound(id.to_string()))?;
        let removed = next.remove(index);

        self.commit(next).await?;
        info!(barcode = %removed.barcode, "Item removed from inventory");
        Ok(removed)
    }

    /// Empties the inventory.
    pub async fn clear(&mut self) -> DbResult<()> {
        self.commit(Vec::new()).await?;
        info!("Inventory cleared");
        Ok(())
    }

    async fn commit(&mut self, next: Vec<StockItem>) -> DbResult<()> {
        codec::save(&self.store, &next).await?;
        self.items = next;
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

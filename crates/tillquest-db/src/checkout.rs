//! # Checkout
//!
//! Turns the cart into a recorded sale.
//!
//! ## Finalize Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. plan      cart lines re-checked against live stock                 │
//! │               (empty cart / missing item / short stock → reject)       │
//! │  2. decrement every line in one validated pass, persisted once         │
//! │  3. record    sale prepended to the ledger                             │
//! │               (write failed → stock put back, error returned)          │
//! │  4. clear     the cart                                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A rejection at any step leaves the cart, the inventory and the ledger as
//! they were.

use chrono::{DateTime, Utc};
use tracing::{error, info};

use tillquest_core::{Cart, Sale};

use crate::error::DbResult;
use crate::kv::KvStore;
use crate::repository::inventory::InventoryStore;
use crate::repository::sales::SalesLedger;

/// Finalizes the cart at `now`.
pub async fn finalize<S: KvStore>(
    cart: &mut Cart,
    inventory: &mut InventoryStore<S>,
    sales: &mut SalesLedger<S>,
    now: DateTime<Utc>,
) -> DbResult<Sale> {
    let lines = cart.plan_checkout(|barcode| inventory.find_by_barcode(barcode))?;

    let decrements: Vec<(String, i64)> = lines
        .iter()
        .map(|l| (l.item.barcode.clone(), l.quantity))
        .collect();
    inventory.decrease_many(&decrements).await?;

    let sale = Sale::from_lines(lines, now);
    if let Err(e) = sales.record(sale.clone()).await {
        error!(id = %sale.id, error = %e, "Could not record sale, restoring stock");
        for (barcode, quantity) in &decrements {
            if let Err(restock) = inventory.restock(barcode, *quantity).await {
                error!(barcode = %barcode, error = %restock, "Stock restore failed");
            }
        }
        return Err(e);
    }

    cart.clear();
    info!(id = %sale.id, total = %sale.total, units = sale.unit_count(), "Checkout complete");
    Ok(sale)
}

/// [`finalize`] at the current time.
pub async fn finalize_now<S: KvStore>(
    cart: &mut Cart,
    inventory: &mut InventoryStore<S>,
    sales: &mut SalesLedger<S>,
) -> DbResult<Sale> {
    finalize(cart, inventory, sales, Utc::now()).await
}

// =============================================================================
// Unit Tests
// =============================================================================

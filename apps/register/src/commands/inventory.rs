//! # Inventory Commands
//!
//! Scanning and stock management.
//!
//! ```text
//! scan ─────────► ItemScanned ──► lookup ──► item or none, plus progress
//!
//! add_item ─────► upsert ─────────► ItemAdded ────► progress
//! ```

use serde::Serialize;
use tracing::debug;

use tillquest_core::{DomainEvent, Money, ProgressReport, StockItem};
use tillquest_db::KvStore;

use crate::error::ApiError;
use crate::state::ShopState;

/// An item plus whatever progress its event earned.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemResponse {
    pub item: StockItem,
    pub progress: ProgressReport,
}

/// Result of a scan. `item` is `None` when the barcode is not stocked.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResponse {
    pub item: Option<StockItem>,
    pub progress: ProgressReport,
}

/// Scans a barcode and looks it up.
///
/// Every scan counts for progression, whether or not the item is stocked.
pub async fn scan<S: KvStore, C: KvStore>(
    state: &ShopState<S, C>,
    barcode: &str,
) -> Result<ScanResponse, ApiError> {
    debug!(barcode = %barcode, "scan command");
    let mut shop = state.lock().await;

    let progress = shop
        .emit(DomainEvent::ItemScanned {
            barcode: barcode.trim().to_string(),
        })
        .await;

    let item = shop.inventory.find_by_barcode(barcode).cloned();
    if item.is_none() {
        debug!(barcode = %barcode.trim(), "scanned barcode not stocked");
    }

    Ok(ScanResponse { item, progress })
}

/// Creates or replaces an item.
pub async fn add_item<S: KvStore, C: KvStore>(
    state: &ShopState<S, C>,
    barcode: &str,
    name: &str,
    unit_price: Money,
    quantity: i64,
) -> Result<ItemResponse, ApiError> {
    debug!(barcode = %barcode, "add_item command");
    let mut shop = state.lock().await;

    let item = shop
        .inventory
        .upsert(barcode, name, unit_price, quantity)
        .await?;
    let progress = shop
        .emit(DomainEvent::ItemAdded {
            barcode: item.barcode.clone(),
        })
        .await;

    Ok(ItemResponse { item, progress })
}

pub async fn restock<S: KvStore, C: KvStore>(
    state: &ShopState<S, C>,
    barcode: &str,
    amount: i64,
) -> Result<StockItem, ApiError> {
    let mut shop = state.lock().await;
    Ok(shop.inventory.restock(barcode, amount).await?)
}

/// Removes an item by barcode. Past sales keep their snapshot.
pub async fn remove_item<S: KvStore, C: KvStore>(
    state: &ShopState<S, C>,
    barcode: &str,
) -> Result<StockItem, ApiError> {
    let mut shop = state.lock().await;
    let id = shop.inventory.get(barcode)?.id.clone();
    Ok(shop.inventory.remove(&id).await?)
}

pub async fn list_items<S: KvStore, C: KvStore>(
    state: &ShopState<S, C>,
) -> Result<Vec<StockItem>, ApiError> {
    let shop = state.lock().await;
    Ok(shop.inventory.items().to_vec())
}

/// Empties the inventory only.
pub async fn clear_inventory<S: KvStore, C: KvStore>(
    state: &ShopState<S, C>,
) -> Result<(), ApiError> {
    let mut shop = state.lock().await;
    Ok(shop.inventory.clear().await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use tillquest_db::MemoryKvStore;

    async fn state() -> ShopState<MemoryKvStore, MemoryKvStore> {
        ShopState::open(MemoryKvStore::new(), MemoryKvStore::new(), Money::from_major(100))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_scan_hit_and_miss() {
        let state = state().await;
        add_item(&state, "123", "Ball", Money::from_cents(500), 3)
            .await
            .unwrap();

        let miss = scan(&state, "999").await.unwrap();
        assert!(miss.item.is_none());
        assert_eq!(miss.progress.unlocked, vec!["first_scan".to_string()]);
        assert_eq!(state.lock().await.progress.counters().scans, 1);

        let hit = scan(&state, "123").await.unwrap();
        assert_eq!(hit.item.map(|i| i.name).as_deref(), Some("Ball"));
        assert!(hit.progress.unlocked.is_empty());
        assert_eq!(state.lock().await.progress.counters().scans, 2);
    }

    #[tokio::test]
    async fn test_add_item_counts_every_upsert() {
        let state = state().await;
        add_item(&state, "123", "Ball", Money::from_cents(500), 3)
            .await
            .unwrap();
        let updated = add_item(&state, "123", "Ball", Money::from_cents(450), 5)
            .await
            .unwrap();

        assert_eq!(updated.item.quantity_on_hand, 5);
        let shop = state.lock().await;
        assert_eq!(shop.progress.counters().items_added, 2);
        assert_eq!(shop.progress.state().score, 40);
    }

    #[tokio::test]
    async fn test_rejected_add_earns_nothing() {
        let state = state().await;
        let err = add_item(&state, "123", "", Money::from_cents(500), 3)
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::ValidationError);
        assert_eq!(state.lock().await.progress.counters().items_added, 0);
    }

    #[tokio::test]
    async fn test_restock_remove_clear() {
        let state = state().await;
        add_item(&state, "1", "Ball", Money::from_cents(500), 1).await.unwrap();
        add_item(&state, "2", "Kite", Money::from_cents(300), 1).await.unwrap();

        assert_eq!(restock(&state, "1", 4).await.unwrap().quantity_on_hand, 5);
        assert_eq!(remove_item(&state, "2").await.unwrap().name, "Kite");
        assert_eq!(list_items(&state).await.unwrap().len(), 1);

        clear_inventory(&state).await.unwrap();
        assert!(list_items(&state).await.unwrap().is_empty());
    }
}

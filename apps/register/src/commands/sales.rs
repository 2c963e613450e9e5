//! # Sales Commands
//!
//! Read access to the sales history plus the two destructive operations.
//! Deleting a sale never puts stock back.

use chrono::Local;
use serde::Serialize;

use tillquest_core::{CoreError, Money, Sale, SalesWindow};
use tillquest_db::KvStore;

use crate::error::ApiError;
use crate::state::ShopState;

/// Totals for one window next to the all-time figures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesSummary {
    pub window: SalesWindow,
    pub count: usize,
    pub revenue: Money,
    pub all_time_count: usize,
    pub all_time_revenue: Money,
}

/// Sales inside `window`, newest first.
pub async fn list_sales<S: KvStore, C: KvStore>(
    state: &ShopState<S, C>,
    window: SalesWindow,
) -> Vec<Sale> {
    let shop = state.lock().await;
    shop.sales.window(window, Local::now()).cloned().collect()
}

pub async fn sales_summary<S: KvStore, C: KvStore>(
    state: &ShopState<S, C>,
    window: SalesWindow,
) -> SalesSummary {
    let shop = state.lock().await;
    let now = Local::now();

    SalesSummary {
        window,
        count: shop.sales.count_in(window, now),
        revenue: shop.sales.revenue_in(window, now),
        all_time_count: shop.sales.transaction_count(),
        all_time_revenue: shop.sales.total_revenue(),
    }
}

pub async fn get_sale<S: KvStore, C: KvStore>(
    state: &ShopState<S, C>,
    id: &str,
) -> Result<Sale, ApiError> {
    let shop = state.lock().await;
    shop.sales
        .get(id)
        .cloned()
        .ok_or_else(|| CoreError::SaleNotFound(id.to_string()).into())
}

pub async fn delete_sale<S: KvStore, C: KvStore>(
    state: &ShopState<S, C>,
    id: &str,
) -> Result<Sale, ApiError> {
    let mut shop = state.lock().await;
    Ok(shop.sales.delete(id).await?)
}

pub async fn clear_sales<S: KvStore, C: KvStore>(
    state: &ShopState<S, C>,
) -> Result<(), ApiError> {
    let mut shop = state.lock().await;
    Ok(shop.sales.clear().await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::cart;
    use crate::error::ErrorCode;
    use tillquest_db::MemoryKvStore;

    async fn state_with_two_sales() -> ShopState<MemoryKvStore, MemoryKvStore> {
        let state =
            ShopState::open(MemoryKvStore::new(), MemoryKvStore::new(), Money::from_major(100))
                .await
                .unwrap();
        state
            .lock()
            .await
            .inventory
            .upsert("123", "Ball", Money::from_cents(500), 10)
            .await
            .unwrap();

        for qty in [1, 2] {
            cart::add_to_cart(&state, "123", Some(qty)).await.unwrap();
            cart::checkout(&state).await.unwrap();
        }
        state
    }

    #[tokio::test]
    async fn test_list_is_newest_first() {
        let state = state_with_two_sales().await;
        let sales = list_sales(&state, SalesWindow::Today).await;

        assert_eq!(sales.len(), 2);
        assert_eq!(sales[0].total, Money::from_cents(1000));
        assert_eq!(sales[1].total, Money::from_cents(500));
    }

    #[tokio::test]
    async fn test_summary() {
        let state = state_with_two_sales().await;
        let summary = sales_summary(&state, SalesWindow::ThisWeek).await;

        assert_eq!(summary.count, 2);
        assert_eq!(summary.revenue, Money::from_cents(1500));
        assert_eq!(summary.all_time_count, 2);
        assert_eq!(summary.all_time_revenue, Money::from_cents(1500));
    }

    #[tokio::test]
    async fn test_delete_keeps_stock() {
        let state = state_with_two_sales().await;
        let id = list_sales(&state, SalesWindow::AllTime).await[0].id.clone();

        assert_eq!(get_sale(&state, &id).await.unwrap().id, id);
        delete_sale(&state, &id).await.unwrap();
        assert_eq!(
            get_sale(&state, &id).await.unwrap_err().code,
            ErrorCode::NotFound
        );
        assert_eq!(
            state.lock().await.inventory.get("123").unwrap().quantity_on_hand,
            7
        );

        clear_sales(&state).await.unwrap();
        assert!(list_sales(&state, SalesWindow::AllTime).await.is_empty());
    }
}

//! # System Commands

use tillquest_db::KvStore;

use crate::error::ApiError;
use crate::state::ShopState;

/// Wipes the shop: inventory, sales, persona, progress, counters, the
/// payment channel and the cart.
pub async fn reset_everything<S: KvStore, C: KvStore>(
    state: &ShopState<S, C>,
) -> Result<(), ApiError> {
    Ok(state.reset_everything().await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{inventory, progress};
    use tillquest_core::Money;
    use tillquest_db::MemoryKvStore;

    #[tokio::test]
    async fn test_reset_everything_zeroes_counters() {
        let state = ShopState::open(MemoryKvStore::new(), MemoryKvStore::new(), Money::from_major(100))
            .await
            .unwrap();
        inventory::add_item(&state, "123", "Ball", Money::from_cents(500), 3)
            .await
            .unwrap();
        inventory::scan(&state, "123").await.unwrap();

        reset_everything(&state).await.unwrap();

        let progress = progress::get_progress(&state).await;
        assert_eq!(progress.counters.scans, 0);
        assert_eq!(progress.counters.items_added, 0);
        assert!(inventory::list_items(&state).await.unwrap().is_empty());
    }
}

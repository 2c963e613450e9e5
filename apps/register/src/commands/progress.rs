//! # Progress Commands
//!
//! Game profile and the theme shop.

use serde::Serialize;

use tillquest_core::{ProgressState, THEMES};
use tillquest_db::{Counters, KvStore};

use crate::error::ApiError;
use crate::state::ShopState;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressResponse {
    pub state: ProgressState,
    pub counters: Counters,
    /// 0-100, toward the next level.
    pub level_percent: i64,
}

/// One theme, catalog or custom, as seen by the current profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeInfo {
    pub id: String,
    pub name: String,
    pub cost: i64,
    pub unlocked: bool,
    pub current: bool,
}

pub async fn get_progress<S: KvStore, C: KvStore>(state: &ShopState<S, C>) -> ProgressResponse {
    let shop = state.lock().await;
    let profile = shop.progress.state();

    ProgressResponse {
        state: profile.clone(),
        counters: shop.progress.counters(),
        level_percent: profile.level_progress_percent(),
    }
}

pub async fn list_themes<S: KvStore, C: KvStore>(state: &ShopState<S, C>) -> Vec<ThemeInfo> {
    let shop = state.lock().await;
    let profile = shop.progress.state();

    let info = |id: &str, name: &str, cost: i64| ThemeInfo {
        id: id.to_string(),
        name: name.to_string(),
        cost,
        unlocked: profile.is_theme_unlocked(id),
        current: profile.current_theme == id,
    };

    let mut themes: Vec<ThemeInfo> = THEMES
        .iter()
        .map(|theme| info(theme.id, theme.name, theme.cost))
        .collect();
    themes.extend(
        shop.progress
            .custom_themes()
            .iter()
            .map(|theme| info(&theme.id, &theme.name, 0)),
    );
    themes
}

/// Buys a theme with game coins.
pub async fn unlock_theme<S: KvStore, C: KvStore>(
    state: &ShopState<S, C>,
    id: &str,
) -> Result<Vec<ThemeInfo>, ApiError> {
    state.lock().await.progress.unlock_theme(id).await?;
    Ok(list_themes(state).await)
}

pub async fn select_theme<S: KvStore, C: KvStore>(
    state: &ShopState<S, C>,
    id: &str,
) -> Result<Vec<ThemeInfo>, ApiError> {
    state.lock().await.progress.select_theme(id).await?;
    Ok(list_themes(state).await)
}

/// Creates a custom theme from a name and switches to it.
pub async fn add_custom_theme<S: KvStore, C: KvStore>(
    state: &ShopState<S, C>,
    name: &str,
) -> Result<Vec<ThemeInfo>, ApiError> {
    state.lock().await.progress.add_custom_theme(name).await?;
    Ok(list_themes(state).await)
}

/// Fresh profile and zeroed counters. The shop itself is untouched.
pub async fn reset_progress<S: KvStore, C: KvStore>(
    state: &ShopState<S, C>,
) -> Result<ProgressResponse, ApiError> {
    state.lock().await.progress.reset().await?;
    Ok(get_progress(state).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use tillquest_core::Money;
    use tillquest_db::MemoryKvStore;

    async fn state() -> ShopState<MemoryKvStore, MemoryKvStore> {
        ShopState::open(MemoryKvStore::new(), MemoryKvStore::new(), Money::from_major(100))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_fresh_profile() {
        let state = state().await;
        let progress = get_progress(&state).await;

        assert_eq!(progress.state.level, 1);
        assert_eq!(progress.state.coins, 50);
        assert_eq!(progress.level_percent, 0);
        assert_eq!(progress.counters, Counters::default());

        let themes = list_themes(&state).await;
        assert_eq!(themes.len(), 5);
        assert!(themes[0].unlocked && themes[0].current);
        assert!(themes[1..].iter().all(|t| !t.unlocked));
    }

    #[tokio::test]
    async fn test_theme_shop() {
        let state = state().await;

        let err = unlock_theme(&state, "toy").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::GameError);
        let err = select_theme(&state, "toy").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::GameError);
        let err = unlock_theme(&state, "castle").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);

        state
            .lock()
            .await
            .progress
            .add_coins(60, "test")
            .await
            .unwrap();
        let themes = unlock_theme(&state, "toy").await.unwrap();
        assert!(themes[1].unlocked && !themes[1].current);

        let themes = select_theme(&state, "toy").await.unwrap();
        assert!(themes[1].current);
        assert_eq!(get_progress(&state).await.state.coins, 10);
    }

    #[tokio::test]
    async fn test_custom_theme_listed_after_catalog() {
        let state = state().await;

        let themes = add_custom_theme(&state, "Robot Shop").await.unwrap();
        assert_eq!(themes.len(), 6);
        let custom = &themes[5];
        assert_eq!(custom.name, "Robot Shop");
        assert_eq!(custom.cost, 0);
        assert!(custom.unlocked && custom.current);
        assert!(!themes[0].current);

        let err = add_custom_theme(&state, " ").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        reset_progress(&state).await.unwrap();
        let themes = list_themes(&state).await;
        assert!(themes[5].unlocked && !themes[5].current);
        assert!(themes[0].current);
    }

    #[tokio::test]
    async fn test_reset_progress() {
        let state = state().await;
        state.lock().await.progress.on_scan().await.unwrap();

        let progress = reset_progress(&state).await.unwrap();
        assert_eq!(progress.state.coins, 50);
        assert_eq!(progress.counters.scans, 0);
    }
}

//! # Progression Engine
//!
//! Persisted wrapper around [`ProgressState`] plus the three cumulative
//! counters that drive the count-based achievements.
//!
//! ## Two Persistence Domains
//! ```text
//! ┌──────────────────────────────┐     ┌──────────────────────────────┐
//! │ game_state                   │     │ total_scans                  │
//! │   level, xp, coins, score,   │     │ total_items_added            │
//! │   achievements, streak,      │     │ total_sales                  │
//! │   themes                     │     │                              │
//! │                              │     │                              │
//! │ reset_progress()             │     │ reset_counters()             │
//! └──────────────────────────────┘     └──────────────────────────────┘
//!                 └──────────── reset() ──────────┘
//! ```
//!
//! Custom themes live under their own key (`custom_themes`) and outlast
//! both resets; a reset profile gets them back as owned themes.
//!
//! Event handlers bump the counter first and then feed the new total into
//! the state machine, so `scanner_pro` sees the scan that triggered it.

use chrono::{Local, NaiveDate, Utc};
use serde::Serialize;
use tracing::{debug, info};

use tillquest_core::{CoreResult, CustomTheme, DomainEvent, Money, ProgressReport, ProgressState};

use crate::codec::{self, keys};
use crate::error::DbResult;
use crate::kv::KvStore;

/// Cumulative event counts, kept outside [`ProgressState`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Counters {
    pub scans: i64,
    pub items_added: i64,
    pub sales: i64,
}

/// Store for the player's progression.
#[derive(Debug)]
pub struct ProgressionEngine<S: KvStore> {
    store: S,
    state: ProgressState,
    counters: Counters,
    custom_themes: Vec<CustomTheme>,
}

impl<S: KvStore> ProgressionEngine<S> {
    pub async fn open(store: S) -> DbResult<Self> {
        let mut state: ProgressState = codec::load(&store).await?;
        let custom_themes: Vec<CustomTheme> = codec::load(&store).await?;
        for theme in &custom_themes {
            state.grant_custom_theme(theme);
        }
        let counters = Counters {
            scans: codec::load_counter(&store, keys::TOTAL_SCANS).await?,
            items_added: codec::load_counter(&store, keys::TOTAL_ITEMS_ADDED).await?,
            sales: codec::load_counter(&store, keys::TOTAL_SALES).await?,
        };

        debug!(level = state.level, coins = state.coins, ?counters, "Progress loaded");
        Ok(ProgressionEngine {
            store,
            state,
            counters,
            custom_themes,
        })
    }

    pub fn state(&self) -> &ProgressState {
        &self.state
    }

    pub fn custom_themes(&self) -> &[CustomTheme] {
        &self.custom_themes
    }

    pub fn counters(&self) -> Counters {
        self.counters
    }

    // -------------------------------------------------------------------------
    // Events
    // -------------------------------------------------------------------------

    /// Routes a shop event to its handler.
    pub async fn handle(&mut self, event: &DomainEvent) -> DbResult<ProgressReport> {
        debug!(event = event.name(), "Progress event");
        match event {
            DomainEvent::ItemScanned { .. } => self.on_scan().await,
            DomainEvent::ItemAdded { .. } => self.on_item_added().await,
            DomainEvent::SaleCompleted { total, .. } => self.on_sale_completed(*total).await,
        }
    }

    pub async fn on_scan(&mut self) -> DbResult<ProgressReport> {
        let total = self.counters.scans + 1;
        codec::save_counter(&self.store, keys::TOTAL_SCANS, total).await?;
        self.counters.scans = total;

        self.mutate(|state| Ok(state.on_scan(total, Utc::now()))).await
    }

    pub async fn on_item_added(&mut self) -> DbResult<ProgressReport> {
        let total = self.counters.items_added + 1;
        codec::save_counter(&self.store, keys::TOTAL_ITEMS_ADDED, total).await?;
        self.counters.items_added = total;

        self.mutate(|state| Ok(state.on_item_added(total, Utc::now())))
            .await
    }

    pub async fn on_sale_completed(&mut self, total: Money) -> DbResult<ProgressReport> {
        let sales = self.counters.sales + 1;
        codec::save_counter(&self.store, keys::TOTAL_SALES, sales).await?;
        self.counters.sales = sales;

        self.mutate(|state| Ok(state.on_sale_completed(total, sales, Utc::now())))
            .await
    }

    /// Session start. Pass the local calendar date; fresh and reset
    /// profiles are dated with the same clock.
    pub async fn check_daily_streak(&mut self, today: NaiveDate) -> DbResult<ProgressReport> {
        self.mutate(|state| Ok(state.check_daily_streak(today, Utc::now())))
            .await
    }

    // -------------------------------------------------------------------------
    // Direct rewards
    // -------------------------------------------------------------------------

    pub async fn add_experience(&mut self, amount: i64) -> DbResult<ProgressReport> {
        self.mutate(|state| state.add_experience(amount, Utc::now()))
            .await
    }

    pub async fn add_coins(&mut self, amount: i64, reason: &str) -> DbResult<ProgressReport> {
        let report = self
            .mutate(|state| state.add_coins(amount, Utc::now()))
            .await?;
        debug!(amount, reason = %reason, "Coins added");
        Ok(report)
    }

    pub async fn add_score(&mut self, points: i64) -> DbResult<()> {
        self.mutate(|state| state.add_score(points)).await
    }

    pub async fn spend_coins(&mut self, amount: i64) -> DbResult<()> {
        self.mutate(|state| state.spend_coins(amount)).await
    }

    pub async fn update_achievement_progress(
        &mut self,
        id: &str,
        progress: i64,
    ) -> DbResult<ProgressReport> {
        self.mutate(|state| state.update_achievement_progress(id, progress, Utc::now()))
            .await
    }

    pub async fn unlock_theme(&mut self, id: &str) -> DbResult<()> {
        self.mutate(|state| state.unlock_theme(id)).await?;
        info!(theme = %id, "Theme unlocked");
        Ok(())
    }

    pub async fn select_theme(&mut self, id: &str) -> DbResult<()> {
        self.mutate(|state| state.select_theme(id)).await?;
        debug!(theme = %id, "Theme selected");
        Ok(())
    }

    /// Saves a player-made theme and switches to it.
    pub async fn add_custom_theme(&mut self, name: &str) -> DbResult<CustomTheme> {
        let theme = CustomTheme::new(name)?;

        let mut themes = self.custom_themes.clone();
        themes.push(theme.clone());
        codec::save(&self.store, &themes).await?;
        self.custom_themes = themes;

        self.mutate(|state| {
            state.add_custom_theme(&theme);
            Ok(())
        })
        .await?;
        info!(theme = %theme.id, name = %theme.name, "Custom theme added");
        Ok(theme)
    }

    // -------------------------------------------------------------------------
    // Resets
    // -------------------------------------------------------------------------

    /// Fresh profile dated today (local calendar); counters are kept.
    pub async fn reset_progress(&mut self) -> DbResult<()> {
        let mut fresh = ProgressState::new(Local::now().date_naive());
        for theme in &self.custom_themes {
            fresh.grant_custom_theme(theme);
        }
        codec::save(&self.store, &fresh).await?;
        self.state = fresh;
        info!("Progress reset");
        Ok(())
    }

    /// Zeroes the counters; the profile is kept.
    pub async fn reset_counters(&mut self) -> DbResult<()> {
        for key in [keys::TOTAL_SCANS, keys::TOTAL_ITEMS_ADDED, keys::TOTAL_SALES] {
            self.store.remove(key).await?;
        }
        self.counters = Counters::default();
        info!("Progress counters reset");
        Ok(())
    }

    pub async fn reset(&mut self) -> DbResult<()> {
        self.reset_progress().await?;
        self.reset_counters().await
    }

    async fn mutate<T, F>(&mut self, f: F) -> DbResult<T>
    where
        F: FnOnce(&mut ProgressState) -> CoreResult<T>,
    {
        let mut next = self.state.clone();
        let out = f(&mut next)?;
        let before = self.state.level;

        codec::save(&self.store, &next).await?;
        self.state = next;

        if self.state.level > before {
            info!(level = self.state.level, "Level up");
        }
        Ok(out)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::MemoryKvStore;
    use crate::DbError;
    use tillquest_core::progression::ids;
    use tillquest_core::CoreError;

    async fn engine() -> ProgressionEngine<MemoryKvStore> {
        ProgressionEngine::open(MemoryKvStore::new()).await.unwrap()
    }

    #[tokio::test]
    async fn test_fresh_profile() {
        let engine = engine().await;
        let state = engine.state();
        assert_eq!(state.level, 1);
        assert_eq!(state.coins, 50);
        assert_eq!(state.experience_to_next_level, 100);
        assert_eq!(state.achievements.len(), 8);
        assert_eq!(engine.counters(), Counters::default());
    }

    #[tokio::test]
    async fn test_first_scan() {
        let mut engine = engine().await;
        let report = engine.on_scan().await.unwrap();

        // +5 scan, then first_scan unlock: +25 coins, +50 xp.
        assert_eq!(report.unlocked, vec![ids::FIRST_SCAN.to_string()]);
        let state = engine.state();
        assert_eq!(state.experience, 55);
        assert_eq!(state.score, 10);
        assert_eq!(state.coins, 75);
        assert_eq!(state.achievement(ids::SCANNER_PRO).unwrap().progress, 1);
        assert_eq!(engine.counters().scans, 1);
    }

    #[tokio::test]
    async fn test_level_up_once_per_call() {
        let mut engine = engine().await;
        engine.add_experience(90).await.unwrap();

        let report = engine.add_experience(20).await.unwrap();
        assert_eq!(report.level_ups, vec![2]);

        let state = engine.state();
        assert_eq!(state.level, 2);
        assert_eq!(state.experience, 10);
        assert_eq!(state.experience_to_next_level, 150);
        assert_eq!(state.coins, 70);
        assert_eq!(state.achievement(ids::LEVEL_5).unwrap().progress, 2);
    }

    #[tokio::test]
    async fn test_sale_rewards() {
        let mut engine = engine().await;
        let report = engine.on_sale_completed(Money::from_cents(2550)).await.unwrap();

        // 2 coins for the sale, first_sale unlock adds 25.
        assert_eq!(report.coins_earned, 27);
        assert_eq!(engine.state().coins, 77);
        assert_eq!(engine.state().score, 50);
        assert_eq!(engine.counters().sales, 1);
    }

    #[tokio::test]
    async fn test_handle_routes_events() {
        let mut engine = engine().await;
        engine
            .handle(&DomainEvent::ItemAdded {
                barcode: "123".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(engine.counters().items_added, 1);
        assert_eq!(engine.state().score, 20);
        assert_eq!(
            engine.state().achievement(ids::INVENTORY_EXPERT).unwrap().progress,
            1
        );
    }

    #[tokio::test]
    async fn test_achievement_unlocks_once() {
        let mut engine = engine().await;
        engine.on_scan().await.unwrap();
        let coins = engine.state().coins;

        let report = engine
            .update_achievement_progress(ids::FIRST_SCAN, 1)
            .await
            .unwrap();
        assert!(report.is_empty());
        assert_eq!(engine.state().coins, coins);

        assert!(matches!(
            engine.update_achievement_progress("nope", 1).await,
            Err(DbError::Rejected(CoreError::UnknownAchievement(_)))
        ));
    }

    #[tokio::test]
    async fn test_daily_streak() {
        let mut engine = engine().await;
        let start = engine.state().last_play_date;

        let report = engine.check_daily_streak(start).await.unwrap();
        assert!(report.is_empty());

        let next_day = start.succ_opt().unwrap();
        engine.check_daily_streak(next_day).await.unwrap();
        assert_eq!(engine.state().daily_streak, 1);
        assert_eq!(engine.state().coins, 60);

        let much_later = next_day + chrono::Duration::days(5);
        engine.check_daily_streak(much_later).await.unwrap();
        assert_eq!(engine.state().daily_streak, 1);
        assert_eq!(engine.state().coins, 60);
    }

    #[tokio::test]
    async fn test_fresh_and_reset_profiles_use_local_date() {
        let mut engine = engine().await;
        let today = Local::now().date_naive();
        assert_eq!(engine.state().last_play_date, today);

        engine.check_daily_streak(today).await.unwrap();
        engine.reset_progress().await.unwrap();
        assert_eq!(engine.state().last_play_date, today);

        let report = engine.check_daily_streak(today).await.unwrap();
        assert!(report.is_empty());
        assert_eq!(engine.state().daily_streak, 0);
        assert_eq!(engine.state().coins, 50);
    }

    #[tokio::test]
    async fn test_spend_coins_and_themes() {
        let mut engine = engine().await;

        assert!(matches!(
            engine.unlock_theme("toy").await,
            Err(DbError::Rejected(CoreError::InsufficientCoins { .. }))
        ));
        assert!(matches!(
            engine.select_theme("toy").await,
            Err(DbError::Rejected(CoreError::ThemeLocked(_)))
        ));

        engine.add_coins(60, "test").await.unwrap();
        engine.unlock_theme("toy").await.unwrap();
        engine.select_theme("toy").await.unwrap();
        assert_eq!(engine.state().coins, 10);
        assert_eq!(engine.state().current_theme, "toy");

        engine.spend_coins(10).await.unwrap();
        assert!(engine.spend_coins(1).await.is_err());
        assert_eq!(engine.state().coins, 0);
    }

    #[tokio::test]
    async fn test_custom_themes_outlast_progress_reset() {
        let kv = MemoryKvStore::new();
        let mut engine = ProgressionEngine::open(kv.clone()).await.unwrap();

        let theme = engine.add_custom_theme("Dino Den").await.unwrap();
        assert_eq!(engine.state().current_theme, theme.id);
        assert_eq!(engine.state().coins, 50);

        engine.reset().await.unwrap();
        assert_eq!(engine.state().current_theme, "candy");
        assert!(engine.state().is_theme_unlocked(&theme.id));

        let mut reopened = ProgressionEngine::open(kv).await.unwrap();
        assert_eq!(reopened.custom_themes(), &[theme.clone()]);
        reopened.select_theme(&theme.id).await.unwrap();
        assert_eq!(reopened.state().current_theme, theme.id);

        assert!(matches!(
            reopened.add_custom_theme("").await,
            Err(DbError::Rejected(CoreError::Validation(_)))
        ));
        assert_eq!(reopened.custom_themes().len(), 1);
    }

    #[tokio::test]
    async fn test_resets_are_independent() {
        let kv = MemoryKvStore::new();
        let mut engine = ProgressionEngine::open(kv.clone()).await.unwrap();
        engine.on_scan().await.unwrap();
        engine.on_scan().await.unwrap();

        engine.reset_progress().await.unwrap();
        assert_eq!(engine.state().coins, 50);
        assert_eq!(engine.counters().scans, 2);

        let reopened = ProgressionEngine::open(kv.clone()).await.unwrap();
        assert_eq!(reopened.counters().scans, 2);
        assert_eq!(reopened.state().unlocked_count(), 0);

        engine.on_scan().await.unwrap();
        assert_eq!(
            engine.state().achievement(ids::SCANNER_PRO).unwrap().progress,
            3
        );

        engine.reset_counters().await.unwrap();
        assert_eq!(engine.counters(), Counters::default());
        assert!(engine.state().achievement(ids::FIRST_SCAN).unwrap().unlocked);

        engine.reset().await.unwrap();
        let reopened = ProgressionEngine::open(kv).await.unwrap();
        assert_eq!(reopened.counters(), Counters::default());
        assert_eq!(reopened.state().level, 1);
    }
}

//! # Progression
//!
//! Experience, levels, coins, achievements, daily streaks and shop themes.
//!
//! ## Reward Cascade
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  update_achievement_progress(id, p)                                     │
//! │     │  clamp p to max_progress, ignore if already unlocked             │
//! │     ▼                                                                   │
//! │  reached max? ──► unlock ──► add_coins(+25) ──► coin_collector         │
//! │                         └──► add_experience(+50)                       │
//! │                                   │                                     │
//! │                                   ▼                                     │
//! │                          level up? ──► coins += new_level × 10         │
//! │                                   └──► level_5 progress = new_level    │
//! │                                                                         │
//! │  Every achievement unlocks at most once, so the cascade terminates.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Everything here is pure. The scan, item-added and sale counters that
//! drive `scanner_pro`, `inventory_expert` and `sales_master` are owned by
//! the caller and passed in, so they can be reset independently.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::new_id;
use crate::validation::{validate_points, validate_theme_name};

// =============================================================================
// Constants
// =============================================================================

pub const INITIAL_COINS: i64 = 50;
pub const INITIAL_EXPERIENCE_TO_NEXT_LEVEL: i64 = 100;

/// Granted once per achievement unlock.
pub const ACHIEVEMENT_COINS: i64 = 25;
pub const ACHIEVEMENT_EXPERIENCE: i64 = 50;

/// Login bonus for continuing a streak.
pub const DAILY_BONUS_COINS: i64 = 10;

/// Level-up coin reward is `new_level × LEVEL_UP_COINS_PER_LEVEL`.
pub const LEVEL_UP_COINS_PER_LEVEL: i64 = 10;

pub const SCAN_EXPERIENCE: i64 = 5;
pub const SCAN_SCORE: i64 = 10;
pub const ITEM_ADDED_EXPERIENCE: i64 = 10;
pub const ITEM_ADDED_SCORE: i64 = 20;
pub const SALE_EXPERIENCE: i64 = 20;
pub const SALE_SCORE: i64 = 50;

/// Achievement ids.
pub mod ids {
    pub const FIRST_SCAN: &str = "first_scan";
    pub const SCANNER_PRO: &str = "scanner_pro";
    pub const FIRST_SALE: &str = "first_sale";
    pub const SALES_MASTER: &str = "sales_master";
    pub const INVENTORY_EXPERT: &str = "inventory_expert";
    pub const COIN_COLLECTOR: &str = "coin_collector";
    pub const WEEK_STREAK: &str = "week_streak";
    pub const LEVEL_5: &str = "level_5";
}

/// (id, name, description, max_progress)
const ACHIEVEMENT_CATALOG: [(&str, &str, &str, i64); 8] = [
    (ids::FIRST_SCAN, "First Scan!", "Scan your first item", 1),
    (ids::SCANNER_PRO, "Scanner Pro", "Scan 10 items", 10),
    (ids::FIRST_SALE, "First Sale!", "Complete your first sale", 1),
    (ids::SALES_MASTER, "Sales Master", "Complete 20 sales", 20),
    (ids::INVENTORY_EXPERT, "Inventory Expert", "Add 15 items to inventory", 15),
    (ids::COIN_COLLECTOR, "Coin Collector", "Earn 500 coins", 500),
    (ids::WEEK_STREAK, "Week Warrior", "Play for 7 days in a row", 7),
    (ids::LEVEL_5, "Rising Star", "Reach level 5", 5),
];

// =============================================================================
// Themes
// =============================================================================

/// A purchasable shop theme. Visuals live in the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Theme {
    pub id: &'static str,
    pub name: &'static str,
    pub cost: i64,
}

pub const DEFAULT_THEME: &str = "candy";

pub const THEMES: [Theme; 5] = [
    Theme { id: "candy", name: "Candy Shop", cost: 0 },
    Theme { id: "toy", name: "Toy Store", cost: 100 },
    Theme { id: "pet", name: "Pet Shop", cost: 200 },
    Theme { id: "book", name: "Book Store", cost: 300 },
    Theme { id: "space", name: "Space Station", cost: 500 },
];

/// Looks up a theme by id.
pub fn find_theme(id: &str) -> CoreResult<&'static Theme> {
    THEMES
        .iter()
        .find(|t| t.id == id)
        .ok_or_else(|| CoreError::UnknownTheme(id.to_string()))
}

pub const CUSTOM_THEME_PREFIX: &str = "custom_";

/// A theme the player designed. Free, and unlocked as soon as it exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CustomTheme {
    pub id: String,
    pub name: String,
}

impl CustomTheme {
    pub fn new(name: &str) -> CoreResult<Self> {
        validate_theme_name(name)?;
        Ok(CustomTheme {
            id: format!("{}{}", CUSTOM_THEME_PREFIX, new_id()),
            name: name.trim().to_string(),
        })
    }
}

// =============================================================================
// Achievement
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Achievement {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Non-decreasing until unlocked, then frozen at `max_progress`.
    pub progress: i64,
    pub max_progress: i64,
    pub unlocked: bool,
    #[ts(as = "Option<String>")]
    pub unlocked_at: Option<DateTime<Utc>>,
}

impl Achievement {
    /// The full catalog, all locked at zero progress.
    pub fn catalog() -> Vec<Achievement> {
        ACHIEVEMENT_CATALOG
            .iter()
            .map(|(id, name, description, max)| Achievement {
                id: id.to_string(),
                name: name.to_string(),
                description: description.to_string(),
                progress: 0,
                max_progress: *max,
                unlocked: false,
                unlocked_at: None,
            })
            .collect()
    }
}

// =============================================================================
// Progress Report
// =============================================================================

/// What a single progression call changed, for the caller to announce.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProgressReport {
    /// Levels reached, in order.
    pub level_ups: Vec<i64>,
    /// Achievement ids unlocked, in order.
    pub unlocked: Vec<String>,
    /// Total coins gained, including cascaded rewards.
    pub coins_earned: i64,
}

impl ProgressReport {
    pub fn leveled_up(&self) -> bool {
        !self.level_ups.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.level_ups.is_empty() && self.unlocked.is_empty() && self.coins_earned == 0
    }
}

// =============================================================================
// Progress State
// =============================================================================

/// The player's game profile.
///
/// ## Invariants
/// - `level >= 1`
/// - `experience`, `score`, `coins` never negative
/// - `experience < experience_to_next_level` after every built-in reward
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProgressState {
    pub level: i64,
    pub experience: i64,
    pub experience_to_next_level: i64,
    pub score: i64,
    pub coins: i64,
    pub achievements: Vec<Achievement>,
    pub daily_streak: i64,
    #[ts(as = "String")]
    pub last_play_date: NaiveDate,
    #[serde(default = "default_unlocked_themes")]
    pub unlocked_themes: Vec<String>,
    #[serde(default = "default_theme")]
    pub current_theme: String,
}

fn default_unlocked_themes() -> Vec<String> {
    vec![DEFAULT_THEME.to_string()]
}

fn default_theme() -> String {
    DEFAULT_THEME.to_string()
}

impl ProgressState {
    /// A fresh profile created on `today`.
    pub fn new(today: NaiveDate) -> Self {
        ProgressState {
            level: 1,
            experience: 0,
            experience_to_next_level: INITIAL_EXPERIENCE_TO_NEXT_LEVEL,
            score: 0,
            coins: INITIAL_COINS,
            achievements: Achievement::catalog(),
            daily_streak: 0,
            last_play_date: today,
            unlocked_themes: default_unlocked_themes(),
            current_theme: default_theme(),
        }
    }

    pub fn achievement(&self, id: &str) -> Option<&Achievement> {
        self.achievements.iter().find(|a| a.id == id)
    }

    pub fn unlocked_count(&self) -> usize {
        self.achievements.iter().filter(|a| a.unlocked).count()
    }

    /// Percentage of the way to the next level (0-100).
    pub fn level_progress_percent(&self) -> i64 {
        if self.experience_to_next_level <= 0 {
            return 0;
        }
        (self.experience.saturating_mul(100) / self.experience_to_next_level).min(100)
    }

    // -------------------------------------------------------------------------
    // Primitive rewards
    // -------------------------------------------------------------------------

    /// Adds experience, granting at most one level per call.
    pub fn add_experience(&mut self, amount: i64, now: DateTime<Utc>) -> CoreResult<ProgressReport> {
        validate_points("experience", amount)?;
        let mut report = ProgressReport::default();
        self.apply_experience(amount, now, &mut report);
        Ok(report)
    }

    /// Adds coins and advances `coin_collector` to the new total.
    pub fn add_coins(&mut self, amount: i64, now: DateTime<Utc>) -> CoreResult<ProgressReport> {
        validate_points("coins", amount)?;
        let mut report = ProgressReport::default();
        self.apply_coins(amount, now, &mut report);
        Ok(report)
    }

    pub fn add_score(&mut self, points: i64) -> CoreResult<()> {
        validate_points("score", points)?;
        self.score = self.score.saturating_add(points);
        Ok(())
    }

    /// Spends coins. Fails without change if the player is short.
    pub fn spend_coins(&mut self, amount: i64) -> CoreResult<()> {
        validate_points("coins", amount)?;
        if self.coins < amount {
            return Err(CoreError::InsufficientCoins {
                available: self.coins,
                requested: amount,
            });
        }
        self.coins -= amount;
        Ok(())
    }

    /// Moves an achievement's progress forward.
    ///
    /// Progress is clamped to `max_progress`; unlocked achievements ignore
    /// the call. Reaching the maximum unlocks the achievement and pays out
    /// its rewards.
    pub fn update_achievement_progress(
        &mut self,
        id: &str,
        progress: i64,
        now: DateTime<Utc>,
    ) -> CoreResult<ProgressReport> {
        if self.achievement(id).is_none() {
            return Err(CoreError::UnknownAchievement(id.to_string()));
        }
        let mut report = ProgressReport::default();
        self.apply_achievement(id, progress, now, &mut report);
        Ok(report)
    }

    // -------------------------------------------------------------------------
    // Domain events
    // -------------------------------------------------------------------------

    /// An item was scanned. `total_scans` includes this scan.
    pub fn on_scan(&mut self, total_scans: i64, now: DateTime<Utc>) -> ProgressReport {
        let mut report = ProgressReport::default();
        self.apply_experience(SCAN_EXPERIENCE, now, &mut report);
        self.score = self.score.saturating_add(SCAN_SCORE);
        self.apply_achievement(ids::FIRST_SCAN, 1, now, &mut report);
        self.apply_achievement(ids::SCANNER_PRO, total_scans, now, &mut report);
        report
    }

    /// An item was added to the inventory. `total_added` includes this one.
    pub fn on_item_added(&mut self, total_added: i64, now: DateTime<Utc>) -> ProgressReport {
        let mut report = ProgressReport::default();
        self.apply_experience(ITEM_ADDED_EXPERIENCE, now, &mut report);
        self.score = self.score.saturating_add(ITEM_ADDED_SCORE);
        self.apply_achievement(ids::INVENTORY_EXPERT, total_added, now, &mut report);
        report
    }

    /// A sale was recorded. `total_sales` includes this sale.
    ///
    /// The coin reward is one coin per ten whole currency units of the total.
    pub fn on_sale_completed(
        &mut self,
        total: Money,
        total_sales: i64,
        now: DateTime<Utc>,
    ) -> ProgressReport {
        let mut report = ProgressReport::default();
        self.apply_coins(sale_coin_reward(total), now, &mut report);
        self.apply_experience(SALE_EXPERIENCE, now, &mut report);
        self.score = self.score.saturating_add(SALE_SCORE);
        self.apply_achievement(ids::FIRST_SALE, 1, now, &mut report);
        self.apply_achievement(ids::SALES_MASTER, total_sales, now, &mut report);
        report
    }

    /// Session-start streak check.
    ///
    /// ```text
    /// last_play_date == today       → nothing
    /// last_play_date == today - 1   → streak + 1, login bonus, week_streak
    /// anything else                 → streak = 1
    /// ```
    pub fn check_daily_streak(&mut self, today: NaiveDate, now: DateTime<Utc>) -> ProgressReport {
        let mut report = ProgressReport::default();

        if self.last_play_date == today {
            return report;
        }

        let continued = today.pred_opt() == Some(self.last_play_date);
        self.last_play_date = today;

        if continued {
            self.daily_streak = self.daily_streak.saturating_add(1);
            self.apply_coins(DAILY_BONUS_COINS, now, &mut report);
            let streak = self.daily_streak;
            self.apply_achievement(ids::WEEK_STREAK, streak, now, &mut report);
        } else {
            self.daily_streak = 1;
        }

        report
    }

    // -------------------------------------------------------------------------
    // Themes
    // -------------------------------------------------------------------------

    pub fn is_theme_unlocked(&self, id: &str) -> bool {
        self.unlocked_themes.iter().any(|t| t == id)
    }

    /// Buys a theme with coins.
    pub fn unlock_theme(&mut self, id: &str) -> CoreResult<()> {
        let theme = find_theme(id)?;
        if self.is_theme_unlocked(theme.id) {
            return Err(CoreError::ThemeAlreadyUnlocked(theme.id.to_string()));
        }
        self.spend_coins(theme.cost)?;
        self.unlocked_themes.push(theme.id.to_string());
        Ok(())
    }

    /// Switches to an unlocked theme, catalog or custom.
    pub fn select_theme(&mut self, id: &str) -> CoreResult<()> {
        if !self.is_theme_unlocked(id) {
            let theme = find_theme(id)?;
            return Err(CoreError::ThemeLocked(theme.id.to_string()));
        }
        self.current_theme = id.to_string();
        Ok(())
    }

    /// Marks a custom theme as owned without selecting it.
    pub fn grant_custom_theme(&mut self, theme: &CustomTheme) {
        if !self.is_theme_unlocked(&theme.id) {
            self.unlocked_themes.push(theme.id.clone());
        }
    }

    /// Takes ownership of a new custom theme and switches to it.
    pub fn add_custom_theme(&mut self, theme: &CustomTheme) {
        self.grant_custom_theme(theme);
        self.current_theme = theme.id.clone();
    }

    // -------------------------------------------------------------------------
    // Cascade internals
    // -------------------------------------------------------------------------

    fn apply_experience(&mut self, amount: i64, now: DateTime<Utc>, report: &mut ProgressReport) {
        let experience = self.experience.saturating_add(amount);

        if experience < self.experience_to_next_level {
            self.experience = experience;
            return;
        }

        let new_level = self.level.saturating_add(1);
        self.experience = experience - self.experience_to_next_level;
        self.experience_to_next_level = self.experience_to_next_level.saturating_mul(3) / 2;
        self.level = new_level;

        // Paid straight into the balance; does not advance coin_collector.
        let bonus = new_level.saturating_mul(LEVEL_UP_COINS_PER_LEVEL);
        self.coins = self.coins.saturating_add(bonus);
        report.coins_earned = report.coins_earned.saturating_add(bonus);
        report.level_ups.push(new_level);

        self.apply_achievement(ids::LEVEL_5, new_level, now, report);
    }

    fn apply_coins(&mut self, amount: i64, now: DateTime<Utc>, report: &mut ProgressReport) {
        self.coins = self.coins.saturating_add(amount);
        report.coins_earned = report.coins_earned.saturating_add(amount);
        let total = self.coins;
        self.apply_achievement(ids::COIN_COLLECTOR, total, now, report);
    }

    fn apply_achievement(
        &mut self,
        id: &str,
        progress: i64,
        now: DateTime<Utc>,
        report: &mut ProgressReport,
    ) {
        let Some(achievement) = self.achievements.iter_mut().find(|a| a.id == id) else {
            return;
        };
        if achievement.unlocked {
            return;
        }

        let clamped = progress.min(achievement.max_progress);
        if clamped > achievement.progress {
            achievement.progress = clamped;
        }
        if achievement.progress < achievement.max_progress {
            return;
        }

        achievement.unlocked = true;
        achievement.unlocked_at = Some(now);
        report.unlocked.push(achievement.id.clone());

        self.apply_coins(ACHIEVEMENT_COINS, now, report);
        self.apply_experience(ACHIEVEMENT_EXPERIENCE, now, report);
    }
}

/// Coins for a sale: ⌊total / 10⌋ in whole currency units.
pub fn sale_coin_reward(total: Money) -> i64 {
    if total.is_positive() {
        total.cents() / 1000
    } else {
        0
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 10).unwrap()
    }

    fn fresh() -> ProgressState {
        ProgressState::new(today())
    }

    #[test]
    fn test_initial_state() {
        let state = fresh();
        assert_eq!(state.level, 1);
        assert_eq!(state.coins, INITIAL_COINS);
        assert_eq!(state.experience_to_next_level, 100);
        assert_eq!(state.achievements.len(), 8);
        assert_eq!(state.unlocked_count(), 0);
        assert!(state.is_theme_unlocked("candy"));
        assert_eq!(state.current_theme, "candy");
    }

    #[test]
    fn test_level_up_carries_overflow() {
        let mut state = fresh();
        state.experience = 90;

        let report = state.add_experience(30, Utc::now()).unwrap();

        assert_eq!(report.level_ups, vec![2]);
        assert_eq!(state.level, 2);
        assert_eq!(state.experience, 20);
        assert_eq!(state.experience_to_next_level, 150);
        assert_eq!(state.coins, INITIAL_COINS + 20);
        assert_eq!(report.coins_earned, 20);
    }

    #[test]
    fn test_single_level_up_per_call() {
        let mut state = fresh();
        let report = state.add_experience(400, Utc::now()).unwrap();

        assert_eq!(report.level_ups, vec![2]);
        assert_eq!(state.level, 2);
        assert_eq!(state.experience, 300);
    }

    #[test]
    fn test_no_level_up_below_threshold() {
        let mut state = fresh();
        let report = state.add_experience(99, Utc::now()).unwrap();
        assert!(!report.leveled_up());
        assert_eq!(state.experience, 99);
        assert!(state.add_experience(-1, Utc::now()).is_err());
    }

    #[test]
    fn test_oversized_grants_are_rejected() {
        let mut state = fresh();
        let before = state.clone();

        assert!(state.add_experience(crate::MAX_POINTS + 1, Utc::now()).is_err());
        assert!(state.add_coins(i64::MAX, Utc::now()).is_err());
        assert!(state.add_score(i64::MAX).is_err());
        assert_eq!(state, before);
    }

    #[test]
    fn test_counters_saturate_instead_of_overflowing() {
        let mut state = fresh();
        state.coins = i64::MAX - 5;
        state.score = i64::MAX - 5;
        state.experience = i64::MAX - 5;
        state.experience_to_next_level = i64::MAX;

        let report = state.add_experience(100, Utc::now()).unwrap();
        assert_eq!(report.level_ups, vec![2]);
        assert_eq!(state.experience, 0);

        state.add_coins(100, Utc::now()).unwrap();
        state.add_score(100).unwrap();

        assert_eq!(state.coins, i64::MAX);
        assert_eq!(state.score, i64::MAX);
        assert_eq!(state.level_progress_percent(), 0);
    }

    #[test]
    fn test_achievement_unlock_pays_out_once() {
        let mut state = fresh();

        let report = state
            .update_achievement_progress(ids::FIRST_SALE, 1, Utc::now())
            .unwrap();
        assert_eq!(report.unlocked, vec![ids::FIRST_SALE.to_string()]);
        assert_eq!(state.coins, INITIAL_COINS + ACHIEVEMENT_COINS);
        assert_eq!(state.experience, ACHIEVEMENT_EXPERIENCE);

        let first = state.achievement(ids::FIRST_SALE).unwrap().clone();
        assert!(first.unlocked);
        assert!(first.unlocked_at.is_some());

        let report = state
            .update_achievement_progress(ids::FIRST_SALE, 1, Utc::now())
            .unwrap();
        assert!(report.is_empty());
        assert_eq!(state.coins, INITIAL_COINS + ACHIEVEMENT_COINS);
        assert_eq!(state.achievement(ids::FIRST_SALE).unwrap(), &first);
    }

    #[test]
    fn test_achievement_progress_is_monotonic_and_clamped() {
        let mut state = fresh();
        state
            .update_achievement_progress(ids::SCANNER_PRO, 6, Utc::now())
            .unwrap();
        state
            .update_achievement_progress(ids::SCANNER_PRO, 3, Utc::now())
            .unwrap();
        assert_eq!(state.achievement(ids::SCANNER_PRO).unwrap().progress, 6);

        state
            .update_achievement_progress(ids::SCANNER_PRO, 99, Utc::now())
            .unwrap();
        let pro = state.achievement(ids::SCANNER_PRO).unwrap();
        assert_eq!(pro.progress, 10);
        assert!(pro.unlocked);
    }

    #[test]
    fn test_unknown_achievement() {
        let mut state = fresh();
        assert!(matches!(
            state.update_achievement_progress("nope", 1, Utc::now()),
            Err(CoreError::UnknownAchievement(_))
        ));
    }

    #[test]
    fn test_on_scan_rewards() {
        let mut state = fresh();
        let report = state.on_scan(1, Utc::now());

        // 5 scan XP + 50 first_scan XP; 10 score; 25 coins for first_scan.
        assert_eq!(report.unlocked, vec![ids::FIRST_SCAN.to_string()]);
        assert_eq!(state.experience, 55);
        assert_eq!(state.score, 10);
        assert_eq!(state.coins, INITIAL_COINS + ACHIEVEMENT_COINS);
        assert_eq!(state.achievement(ids::SCANNER_PRO).unwrap().progress, 1);
    }

    #[test]
    fn test_on_item_added_rewards() {
        let mut state = fresh();
        let report = state.on_item_added(3, Utc::now());

        assert!(report.is_empty());
        assert_eq!(state.experience, 10);
        assert_eq!(state.score, 20);
        assert_eq!(state.achievement(ids::INVENTORY_EXPERT).unwrap().progress, 3);
    }

    #[test]
    fn test_on_sale_completed_rewards() {
        let mut state = fresh();
        let report = state.on_sale_completed(Money::from_cents(4599), 1, Utc::now());

        // 4 coins for 45.99, then first_sale pays 25 coins and 50 XP.
        assert_eq!(report.unlocked, vec![ids::FIRST_SALE.to_string()]);
        assert_eq!(state.coins, INITIAL_COINS + 4 + ACHIEVEMENT_COINS);
        assert_eq!(state.experience, SALE_EXPERIENCE + ACHIEVEMENT_EXPERIENCE);
        assert_eq!(state.score, SALE_SCORE);
        assert_eq!(state.achievement(ids::SALES_MASTER).unwrap().progress, 1);
    }

    #[test]
    fn test_sale_coin_reward() {
        assert_eq!(sale_coin_reward(Money::from_cents(999)), 0);
        assert_eq!(sale_coin_reward(Money::from_cents(1000)), 1);
        assert_eq!(sale_coin_reward(Money::from_major(105)), 10);
        assert_eq!(sale_coin_reward(Money::zero()), 0);
    }

    #[test]
    fn test_coin_collector_tracks_total() {
        let mut state = fresh();
        state.add_coins(100, Utc::now()).unwrap();
        assert_eq!(
            state.achievement(ids::COIN_COLLECTOR).unwrap().progress,
            INITIAL_COINS + 100
        );

        let report = state.add_coins(400, Utc::now()).unwrap();
        assert_eq!(report.unlocked, vec![ids::COIN_COLLECTOR.to_string()]);
        assert_eq!(state.coins, INITIAL_COINS + 500 + ACHIEVEMENT_COINS);
    }

    #[test]
    fn test_level_5_unlocks_on_fifth_level() {
        let mut state = fresh();
        state.level = 4;
        state.experience = state.experience_to_next_level - 1;

        let report = state.add_experience(1, Utc::now()).unwrap();
        assert_eq!(report.level_ups, vec![5]);
        assert!(report.unlocked.contains(&ids::LEVEL_5.to_string()));
        assert!(state.achievement(ids::LEVEL_5).unwrap().unlocked);
    }

    #[test]
    fn test_daily_streak_same_day_is_noop() {
        let mut state = fresh();
        let report = state.check_daily_streak(today(), Utc::now());
        assert!(report.is_empty());
        assert_eq!(state.daily_streak, 0);
    }

    #[test]
    fn test_daily_streak_continues() {
        let mut state = fresh();
        state.daily_streak = 3;
        let tomorrow = today().succ_opt().unwrap();

        let report = state.check_daily_streak(tomorrow, Utc::now());
        assert_eq!(state.daily_streak, 4);
        assert_eq!(state.last_play_date, tomorrow);
        assert_eq!(state.coins, INITIAL_COINS + DAILY_BONUS_COINS);
        assert_eq!(report.coins_earned, DAILY_BONUS_COINS);
        assert_eq!(state.achievement(ids::WEEK_STREAK).unwrap().progress, 4);
    }

    #[test]
    fn test_daily_streak_broken() {
        let mut state = fresh();
        state.daily_streak = 5;
        let later = NaiveDate::from_ymd_opt(2024, 5, 20).unwrap();

        state.check_daily_streak(later, Utc::now());
        assert_eq!(state.daily_streak, 1);
        assert_eq!(state.last_play_date, later);
        assert_eq!(state.coins, INITIAL_COINS);
    }

    #[test]
    fn test_spend_coins() {
        let mut state = fresh();
        state.spend_coins(20).unwrap();
        assert_eq!(state.coins, 30);

        assert!(matches!(
            state.spend_coins(31),
            Err(CoreError::InsufficientCoins { available: 30, requested: 31 })
        ));
        assert_eq!(state.coins, 30);
    }

    #[test]
    fn test_custom_theme_is_free_and_selected() {
        let mut state = fresh();
        let coins = state.coins;
        let theme = CustomTheme::new("  Robot Shop ").unwrap();
        assert!(theme.id.starts_with(CUSTOM_THEME_PREFIX));
        assert_eq!(theme.name, "Robot Shop");

        state.add_custom_theme(&theme);
        assert_eq!(state.current_theme, theme.id);
        assert_eq!(state.coins, coins);

        state.select_theme("candy").unwrap();
        state.select_theme(&theme.id).unwrap();
        state.add_custom_theme(&theme);
        assert_eq!(state.unlocked_themes.len(), 2);

        assert!(matches!(
            state.select_theme("custom_missing"),
            Err(CoreError::UnknownTheme(_))
        ));
        assert!(CustomTheme::new("   ").is_err());
    }

    #[test]
    fn test_themes() {
        let mut state = fresh();
        state.coins = 150;

        assert!(matches!(state.select_theme("toy"), Err(CoreError::ThemeLocked(_))));
        state.unlock_theme("toy").unwrap();
        assert_eq!(state.coins, 50);
        state.select_theme("toy").unwrap();
        assert_eq!(state.current_theme, "toy");

        assert!(matches!(
            state.unlock_theme("toy"),
            Err(CoreError::ThemeAlreadyUnlocked(_))
        ));
        assert!(matches!(
            state.unlock_theme("pet"),
            Err(CoreError::InsufficientCoins { .. })
        ));
        assert!(matches!(state.unlock_theme("moon"), Err(CoreError::UnknownTheme(_))));
    }

    #[test]
    fn test_state_without_theme_fields_deserializes() {
        let mut value = serde_json::to_value(fresh()).unwrap();
        let obj = value.as_object_mut().unwrap();
        obj.remove("unlocked_themes");
        obj.remove("current_theme");

        let state: ProgressState = serde_json::from_value(value).unwrap();
        assert_eq!(state.current_theme, DEFAULT_THEME);
    }
}

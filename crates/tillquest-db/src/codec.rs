//! # Persisted Value Codec
//!
//! The only place persisted JSON is parsed or written.
//!
//! ## Layout
//! ```text
//! ┌──────────────────────┬──────────────────────────────┬──────────────────┐
//! │ key                  │ value                        │ fallback         │
//! ├──────────────────────┼──────────────────────────────┼──────────────────┤
//! │ inventory_items      │ [StockItem]                  │ []               │
//! │ sales_history        │ [Sale] newest first          │ []               │
//! │ wallet_persona       │ { persona, wallet }          │ absent           │
//! │ payment_request      │ PaymentRequest               │ absent           │
//! │ game_state           │ ProgressState                │ fresh profile    │
//! │ total_scans          │ integer                      │ 0                │
//! │ total_items_added    │ integer                      │ 0                │
//! │ total_sales          │ integer                      │ 0                │
//! │ custom_themes        │ [CustomTheme]                │ []               │
//! └──────────────────────┴──────────────────────────────┴──────────────────┘
//! ```
//!
//! Timestamps are RFC 3339 strings, calendar dates `YYYY-MM-DD`, both via
//! chrono's serde support, so no load site decodes dates by hand.
//!
//! ## Corrupt Values
//! A value that fails to parse is logged and replaced by the fallback. It is
//! never surfaced to the caller as an error.

use chrono::Local;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::warn;

use tillquest_core::{
    CustomTheme, PaymentRequest, Persona, ProgressState, Sale, StockItem, WalletAccount,
};

use crate::error::DbResult;
use crate::kv::KvStore;

/// Persisted keys.
pub mod keys {
    pub const INVENTORY_ITEMS: &str = "inventory_items";
    pub const SALES_HISTORY: &str = "sales_history";
    pub const WALLET_PERSONA: &str = "wallet_persona";
    pub const PAYMENT_REQUEST: &str = "payment_request";
    pub const GAME_STATE: &str = "game_state";
    pub const TOTAL_SCANS: &str = "total_scans";
    pub const TOTAL_ITEMS_ADDED: &str = "total_items_added";
    pub const TOTAL_SALES: &str = "total_sales";
    pub const CUSTOM_THEMES: &str = "custom_themes";
}

/// An entity stored as one JSON document under a fixed key.
pub trait Persisted: Serialize + DeserializeOwned + Send + Sync {
    const KEY: &'static str;

    /// Value used when the key is absent or its JSON is corrupt.
    fn fallback() -> Self;
}

/// The active persona together with its wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletRecord {
    pub persona: Persona,
    pub wallet: WalletAccount,
}

impl Persisted for Vec<StockItem> {
    const KEY: &'static str = keys::INVENTORY_ITEMS;

    fn fallback() -> Self {
        Vec::new()
    }
}

impl Persisted for Vec<Sale> {
    const KEY: &'static str = keys::SALES_HISTORY;

    fn fallback() -> Self {
        Vec::new()
    }
}

impl Persisted for Option<WalletRecord> {
    const KEY: &'static str = keys::WALLET_PERSONA;

    fn fallback() -> Self {
        None
    }
}

impl Persisted for Option<PaymentRequest> {
    const KEY: &'static str = keys::PAYMENT_REQUEST;

    fn fallback() -> Self {
        None
    }
}

impl Persisted for Vec<CustomTheme> {
    const KEY: &'static str = keys::CUSTOM_THEMES;

    fn fallback() -> Self {
        Vec::new()
    }
}

impl Persisted for ProgressState {
    const KEY: &'static str = keys::GAME_STATE;

    /// A fresh profile dated by the local calendar, the same clock the
    /// daily streak check is run with.
    fn fallback() -> Self {
        ProgressState::new(Local::now().date_naive())
    }
}

/// Decodes raw stored text, falling back on corrupt JSON.
pub fn decode<T: Persisted>(raw: &str) -> T {
    match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(e) => {
            warn!(key = T::KEY, error = %e, "Corrupt persisted value, using default");
            T::fallback()
        }
    }
}

/// Encodes a value for storage. `None` for values that serialize to null.
pub fn encode<T: Persisted>(value: &T) -> DbResult<Option<String>> {
    let json = serde_json::to_value(value)?;
    if json.is_null() {
        return Ok(None);
    }
    Ok(Some(serde_json::to_string(&json)?))
}

/// Loads an entity, or its fallback if absent or corrupt.
pub async fn load<T: Persisted, S: KvStore>(store: &S) -> DbResult<T> {
    Ok(match store.get(T::KEY).await? {
        Some(raw) => decode(&raw),
        None => T::fallback(),
    })
}

/// Saves an entity. Values that serialize to null remove the key.
pub async fn save<T: Persisted, S: KvStore>(store: &S, value: &T) -> DbResult<()> {
    match encode(value)? {
        Some(raw) => store.set(T::KEY, &raw).await,
        None => store.remove(T::KEY).await,
    }
}

/// Saves an entity only if the stored text is still `expected`.
///
/// Returns `false`, writing nothing, if another writer got there first.
pub async fn save_if<T: Persisted, S: KvStore>(
    store: &S,
    expected: &str,
    value: &T,
) -> DbResult<bool> {
    match encode(value)? {
        Some(raw) => store.replace_if(T::KEY, expected, &raw).await,
        None => store.remove_if(T::KEY, expected).await,
    }
}

/// Loads one of the independent integer counters (0 if absent or corrupt).
pub async fn load_counter<S: KvStore>(store: &S, key: &str) -> DbResult<i64> {
    let Some(raw) = store.get(key).await? else {
        return Ok(0);
    };

    match raw.trim().parse::<i64>() {
        Ok(n) if n >= 0 => Ok(n),
        _ => {
            warn!(key = %key, value = %raw, "Corrupt counter, resetting to 0");
            Ok(0)
        }
    }
}

pub async fn save_counter<S: KvStore>(store: &S, key: &str, value: i64) -> DbResult<()> {
    store.set(key, &value.to_string()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::MemoryKvStore;
    use chrono::Utc;
    use tillquest_core::Money;

    #[tokio::test]
    async fn test_round_trip_preserves_dates() {
        let store = MemoryKvStore::new();
        let items = vec![StockItem::new("123", "Ball", Money::from_cents(500), 3, Utc::now())];

        save(&store, &items).await.unwrap();
        let loaded: Vec<StockItem> = load(&store).await.unwrap();

        assert_eq!(loaded, items);
    }

    #[tokio::test]
    async fn test_corrupt_value_falls_back() {
        let store = MemoryKvStore::new();
        store.set(keys::INVENTORY_ITEMS, "{not json").await.unwrap();

        let loaded: Vec<StockItem> = load(&store).await.unwrap();
        assert!(loaded.is_empty());

        store.set(keys::GAME_STATE, "[]").await.unwrap();
        let state: ProgressState = load(&store).await.unwrap();
        assert_eq!(state.level, 1);
    }

    #[tokio::test]
    async fn test_none_removes_key() {
        let store = MemoryKvStore::new();
        store.set(keys::PAYMENT_REQUEST, "{}").await.unwrap();

        let none: Option<PaymentRequest> = None;
        save(&store, &none).await.unwrap();

        assert_eq!(store.get(keys::PAYMENT_REQUEST).await.unwrap(), None);
        let loaded: Option<PaymentRequest> = load(&store).await.unwrap();
        assert!(loaded.is_none());
    }

    #[tokio::test]
    async fn test_save_if_only_over_expected_text() {
        let store = MemoryKvStore::new();
        let items = vec![StockItem::new("123", "Ball", Money::from_cents(500), 3, Utc::now())];
        save(&store, &items).await.unwrap();
        let raw = store.get(keys::INVENTORY_ITEMS).await.unwrap().unwrap();

        let empty: Vec<StockItem> = Vec::new();
        assert!(!save_if(&store, "[]", &empty).await.unwrap());
        assert_eq!(load::<Vec<StockItem>, _>(&store).await.unwrap(), items);

        assert!(save_if(&store, &raw, &empty).await.unwrap());
        assert!(load::<Vec<StockItem>, _>(&store).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_counters() {
        let store = MemoryKvStore::new();
        assert_eq!(load_counter(&store, keys::TOTAL_SCANS).await.unwrap(), 0);

        save_counter(&store, keys::TOTAL_SCANS, 7).await.unwrap();
        assert_eq!(load_counter(&store, keys::TOTAL_SCANS).await.unwrap(), 7);

        store.set(keys::TOTAL_SALES, "many").await.unwrap();
        assert_eq!(load_counter(&store, keys::TOTAL_SALES).await.unwrap(), 0);
    }
}

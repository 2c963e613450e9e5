//! # Key-Value Store
//!
//! The persisted store every TillQuest store writes through.
//!
//! ## Contract
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  get(key)                 → Option<String>                              │
//! │  set(key, value)          → insert or replace                           │
//! │  remove(key)              → delete (absent key is fine)                 │
//! │  remove_if(key, expected) → delete only if the value still equals      │
//! │                             `expected`; returns whether it deleted     │
//! │  replace_if(key, expected, value)                                      │
//! │                           → overwrite only if the value still equals   │
//! │                             `expected`; returns whether it wrote       │
//! │  clear()                  → delete everything                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `remove_if` and `replace_if` are the atomic read-compare-writes in the
//! contract. The payment channel uses them for every step that depends on
//! what another register may have just written: the buyer marks a request
//! paid with `replace_if`, the seller claims it with `remove_if`.
//!
//! ## Implementations
//! - [`MemoryKvStore`] - shared `HashMap`, clones see the same data
//! - [`SqliteKvStore`] - `kv_entries` table in the SQLite database

use std::future::Future;

use crate::error::DbResult;

pub mod memory;
pub mod sqlite;

pub use memory::MemoryKvStore;
pub use sqlite::SqliteKvStore;

/// A string-keyed store of string values.
pub trait KvStore: Clone + Send + Sync + 'static {
    fn get(&self, key: &str) -> impl Future<Output = DbResult<Option<String>>> + Send;

    fn set(&self, key: &str, value: &str) -> impl Future<Output = DbResult<()>> + Send;

    fn remove(&self, key: &str) -> impl Future<Output = DbResult<()>> + Send;

    /// Removes `key` only if its current value equals `expected`.
    fn remove_if(&self, key: &str, expected: &str) -> impl Future<Output = DbResult<bool>> + Send;

    /// Overwrites `key` with `value` only if its current value equals
    /// `expected`.
    fn replace_if(
        &self,
        key: &str,
        expected: &str,
        value: &str,
    ) -> impl Future<Output = DbResult<bool>> + Send;

    fn clear(&self) -> impl Future<Output = DbResult<()>> + Send;
}

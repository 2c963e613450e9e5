//! # tillquest-db: Persistence Layer for TillQuest
//!
//! This crate owns every read and write of persisted state. Each store keeps
//! its slice in memory and writes it through a [`KvStore`]: a SQLite table
//! in the register, a shared `HashMap` in tests.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        TillQuest Data Flow                              │
//! │                                                                         │
//! │  Register command (scan, checkout, pay, ...)                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  tillquest-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐  ┌──────────────────┐  ┌──────────────┐    │   │
//! │  │   │    Stores     │  │      codec       │  │   KvStore    │    │   │
//! │  │   │               │  │                  │  │              │    │   │
//! │  │   │ Inventory     │  │ key + fallback   │  │ SqliteKv     │    │   │
//! │  │   │ Sales         │──│ per entity,      │──│ MemoryKv     │    │   │
//! │  │   │ Wallet        │  │ JSON + RFC 3339  │  │              │    │   │
//! │  │   │ Payment       │  │                  │  │              │    │   │
//! │  │   │ Progression   │  │                  │  │              │    │   │
//! │  │   └───────────────┘  └──────────────────┘  └──────┬───────┘    │   │
//! │  │                                                    │            │   │
//! │  └────────────────────────────────────────────────────┼────────────┘   │
//! │                                                       ▼                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │   SQLite: kv_entries(key, value, updated_at)                    │   │
//! │  │   ~/.local/share/tillquest/tillquest.db                         │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`kv`] - The key-value store contract and its two implementations
//! - [`codec`] - Per-entity JSON encoding with corrupt-value fallback
//! - [`repository`] - The stateful stores
//! - [`checkout`] - Cart finalize across inventory and sales
//! - [`error`] - Store error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tillquest_db::{Database, DbConfig, InventoryStore, SalesLedger};
//!
//! let db = Database::new(DbConfig::new("path/to/tillquest.db")).await?;
//!
//! let mut inventory = InventoryStore::open(db.kv()).await?;
//! let mut sales = SalesLedger::open(db.kv()).await?;
//!
//! inventory.upsert("123", "Ball", Money::from_cents(500), 3).await?;
//! let sale = tillquest_db::checkout::finalize_now(&mut cart, &mut inventory, &mut sales).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod checkout;
pub mod codec;
pub mod error;
pub mod kv;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use kv::{KvStore, MemoryKvStore, SqliteKvStore};
pub use pool::{Database, DbConfig};

// Store re-exports for convenience
pub use repository::inventory::InventoryStore;
pub use repository::payment::{PaymentHandshake, Settlement};
pub use repository::progress::{Counters, ProgressionEngine};
pub use repository::sales::SalesLedger;
pub use repository::wallet::WalletLedger;

// =============================================================================
// Integration Tests
// =============================================================================

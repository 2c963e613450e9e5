//! # Stores
//!
//! Stateful stores, each owning one slice of the persisted state.
//!
//! ## Store Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Register command                                                      │
//! │       │                                                                 │
//! │       │  inventory.upsert("123", "Ball", 5.00, 3)                      │
//! │       ▼                                                                 │
//! │  InventoryStore<S: KvStore>                                            │
//! │  ├── in-memory copy of its slice (read without I/O)                    │
//! │  └── mutations: copy → apply → codec::save → swap                      │
//! │       │                                                                 │
//! │       │  set("inventory_items", "[...]")                               │
//! │       ▼                                                                 │
//! │  KvStore (SQLite table or shared HashMap)                              │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Stores
//!
//! - [`InventoryStore`](inventory::InventoryStore) - barcode → stock item
//! - [`SalesLedger`](sales::SalesLedger) - recorded sales and summaries
//! - [`WalletLedger`](wallet::WalletLedger) - active persona and its wallet
//! - [`PaymentHandshake`](payment::PaymentHandshake) - the payment channel
//! - [`ProgressionEngine`](progress::ProgressionEngine) - levels, coins, achievements

pub mod inventory;
pub mod payment;
pub mod progress;
pub mod sales;
pub mod wallet;

//! # State Module
//!
//! Application state for the register.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    State Architecture                                   │
//! │                                                                         │
//! │  ┌──────────────────┐         ┌──────────────────────────────────┐     │
//! │  │    AppConfig     │         │          ShopState               │     │
//! │  │                  │         │                                  │     │
//! │  │  store name      │         │  Mutex<Shop>  (stores + cart)    │     │
//! │  │  database paths  │         │  PaymentHandshake (channel)      │     │
//! │  │  welcome credit  │         │                                  │     │
//! │  └──────────────────┘         └──────────────────────────────────┘     │
//! │                                                                         │
//! │  THREAD SAFETY:                                                        │
//! │  • AppConfig: read-only after startup                                  │
//! │  • Shop: one tokio Mutex, held for a whole command                     │
//! │  • PaymentHandshake: stateless, every call reads the channel           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod shop;

pub use shop::{Shop, ShopState};

use tillquest_db::SqliteKvStore;

/// The state the `tillquest` binary runs with.
pub type RegisterState = ShopState<SqliteKvStore, SqliteKvStore>;

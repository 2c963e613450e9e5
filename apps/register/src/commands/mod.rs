//! # Commands Module
//!
//! Every operation the register front end can invoke.
//!
//! ## Command Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Command Flow                                         │
//! │                                                                         │
//! │  REPL line                                                              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  cli::dispatch ──► commands::cart::add_to_cart(state, "123", qty)      │
//! │                         │                                               │
//! │                         ▼                                               │
//! │                    state.lock()  (one command at a time)               │
//! │                         │                                               │
//! │                         ▼                                               │
//! │                    InventoryStore / Cart / ... ──► Result<T, ApiError> │
//! │                         │                                               │
//! │                         ▼                                               │
//! │                    serde_json ──► printed response                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Command Categories
//! - `inventory`: scan, add, restock, remove, list
//! - `cart`: cart building and checkout
//! - `sales`: history, windows and summaries
//! - `wallet`: personas and money moves
//! - `payment`: the seller/buyer handshake
//! - `progress`: game profile and themes
//! - `system`: full reset

pub mod cart;
pub mod inventory;
pub mod payment;
pub mod progress;
pub mod sales;
pub mod system;
pub mod wallet;

//! # tillquest-core: Pure Business Logic for TillQuest
//!
//! This crate is the **heart** of TillQuest, a pretend shop where kids scan
//! items, ring up sales, pay each other from play wallets and level up as
//! they go. It contains the business rules as pure functions with zero I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        TillQuest Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Register (apps/register)                     │   │
//! │  │    scan ──► cart ──► checkout ──► payment ──► rewards          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               tillquest-db (stores + persistence)               │   │
//! │  │    Inventory, Sales, Wallet, Payment channel, Progression       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ tillquest-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌───────────┐ ┌───────┐  │   │
//! │  │   │  types  │ │  money  │ │  cart   │ │progression│ │wallet │  │   │
//! │  │   └─────────┘ └─────────┘ └─────────┘ └───────────┘ └───────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO CLOCK READS IN RULES               │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (StockItem, Sale, Persona, PaymentRequest, ...)
//! - [`money`] - Money type with integer arithmetic
//! - [`cart`] - Cart lines, totals and checkout planning
//! - [`wallet`] - Wallet account balance and ledger
//! - [`progression`] - Experience, levels, achievements, streaks, themes
//! - [`events`] - Domain events consumed by progression
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//!
//! ## Example Usage
//!
//! ```rust
//! use chrono::Utc;
//! use tillquest_core::{Cart, Money, StockItem};
//!
//! let ball = StockItem::new("123", "Ball", Money::from_cents(500), 3, Utc::now());
//!
//! let mut cart = Cart::new();
//! cart.add(&ball, 2).unwrap();
//! assert_eq!(cart.total(), Money::from_cents(1000));
//!
//! // Only three balls on hand.
//! assert!(cart.add(&ball, 2).is_err());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod error;
pub mod events;
pub mod money;
pub mod progression;
pub mod types;
pub mod validation;
pub mod wallet;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::Cart;
pub use error::{CoreError, CoreResult, ValidationError};
pub use events::DomainEvent;
pub use money::Money;
pub use progression::{Achievement, CustomTheme, ProgressReport, ProgressState, Theme, THEMES};
pub use types::*;
pub use wallet::WalletAccount;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum distinct lines in a single cart.
pub const MAX_CART_LINES: usize = 100;

/// Maximum quantity of a single item in a cart or stock movement.
///
/// ## Business Reason
/// Stops a stray keypress from turning 10 into 1000.
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Largest unit price or single wallet/payment amount (1,000,000.00).
pub const MAX_AMOUNT: Money = Money::from_cents(100_000_000);

/// Most units one stock item can hold.
pub const MAX_STOCK: i64 = 1_000_000;

/// Largest single experience, score or coin grant.
pub const MAX_POINTS: i64 = 1_000_000;

//! # Domain Types
//!
//! Core domain types used throughout TillQuest.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │   StockItem     │   │      Sale       │   │ PaymentRequest  │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  request_id     │       │
//! │  │  barcode (key)  │   │  lines (frozen) │   │  seller_id      │       │
//! │  │  unit_price     │   │  total          │   │  amount         │       │
//! │  │  qty on hand    │   │  timestamp      │   │  status         │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Persona      │   │ WalletTransaction│  │  SalesWindow    │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  Seller | Buyer │   │  credit/debit/  │   │  Today          │       │
//! │  │  display_name   │   │  load           │   │  ThisWeek       │       │
//! │  └─────────────────┘   │  balance_after  │   │  ThisMonth      │       │
//! │                        └─────────────────┘   │  AllTime        │       │
//! │                                              └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Stock items have:
//! - `id`: UUID v4, immutable
//! - `barcode`: the decoded scan text, unique, used for every lookup

use chrono::{DateTime, Datelike, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;

/// Generates a new UUID v4 string.
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Stock Item
// =============================================================================

/// An item the shop can sell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StockItem {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Decoded barcode or QR text. Unique within the inventory.
    pub barcode: String,

    /// Display name.
    pub name: String,

    /// Price of one unit.
    pub unit_price: Money,

    /// Units on hand. Never negative.
    pub quantity_on_hand: i64,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl StockItem {
    /// Creates a new stock item stamped with `now`.
    pub fn new(
        barcode: impl Into<String>,
        name: impl Into<String>,
        unit_price: Money,
        quantity_on_hand: i64,
        now: DateTime<Utc>,
    ) -> Self {
        StockItem {
            id: new_id(),
            barcode: barcode.into(),
            name: name.into(),
            unit_price,
            quantity_on_hand,
            created_at: now,
            updated_at: now,
        }
    }

    /// Checks whether `quantity` units can be taken from stock.
    #[inline]
    pub fn can_supply(&self, quantity: i64) -> bool {
        self.quantity_on_hand >= quantity
    }
}

// =============================================================================
// Cart Line
// =============================================================================

/// One line of a cart, and later of a sale.
///
/// The item is a value snapshot: once a line is frozen into a [`Sale`],
/// later price or name edits in the inventory do not reach it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CartLine {
    pub item: StockItem,
    pub quantity: i64,
}

impl CartLine {
    /// unit_price × quantity
    #[inline]
    pub fn line_total(&self) -> Money {
        self.item.unit_price.multiply_quantity(self.quantity)
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A finalized sale. Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Sale {
    pub id: String,
    pub lines: Vec<CartLine>,
    /// Σ(unit_price × quantity) at creation time.
    pub total: Money,
    #[ts(as = "String")]
    pub timestamp: DateTime<Utc>,
}

impl Sale {
    /// Freezes cart lines into a sale, computing the total once.
    pub fn from_lines(lines: Vec<CartLine>, timestamp: DateTime<Utc>) -> Self {
        let total = lines.iter().map(CartLine::line_total).sum();
        Sale {
            id: new_id(),
            lines,
            total,
            timestamp,
        }
    }

    /// Total number of units sold.
    pub fn unit_count(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }
}

// =============================================================================
// Sales Window
// =============================================================================

/// Time windows the sales history can be viewed through.
///
/// Calendar windows are judged in the time zone of the `now` they are given,
/// so the register passes local time and "today" means the local day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum SalesWindow {
    /// Same calendar date as now.
    Today,
    /// Within the last seven days.
    ThisWeek,
    /// Same calendar year and month as now.
    ThisMonth,
    AllTime,
}

impl SalesWindow {
    /// Checks whether `timestamp` falls inside this window relative to `now`.
    pub fn contains<Tz: TimeZone>(&self, timestamp: DateTime<Utc>, now: &DateTime<Tz>) -> bool {
        let local = timestamp.with_timezone(&now.timezone());
        match self {
            SalesWindow::Today => local.date_naive() == now.date_naive(),
            SalesWindow::ThisWeek => {
                let now = now.with_timezone(&Utc);
                timestamp > now - Duration::days(7) && timestamp <= now
            }
            SalesWindow::ThisMonth => local.year() == now.year() && local.month() == now.month(),
            SalesWindow::AllTime => true,
        }
    }
}

impl std::str::FromStr for SalesWindow {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "today" => Ok(SalesWindow::Today),
            "week" | "this_week" => Ok(SalesWindow::ThisWeek),
            "month" | "this_month" => Ok(SalesWindow::ThisMonth),
            "all" | "all_time" => Ok(SalesWindow::AllTime),
            other => Err(CoreError::Validation(
                crate::error::ValidationError::InvalidFormat {
                    field: "window".to_string(),
                    reason: format!("unknown window '{}'", other),
                },
            )),
        }
    }
}

// =============================================================================
// Persona
// =============================================================================

/// The role a session operates as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PersonaKind {
    Seller,
    Buyer,
}

impl PersonaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PersonaKind::Seller => "seller",
            PersonaKind::Buyer => "buyer",
        }
    }
}

impl std::fmt::Display for PersonaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A seller or buyer. Both variants carry the same fields; wallet seeding is
/// dispatched on `kind`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Persona {
    pub id: String,
    pub kind: PersonaKind,
    pub display_name: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Persona {
    pub fn new(kind: PersonaKind, display_name: impl Into<String>, now: DateTime<Utc>) -> Self {
        Persona {
            id: new_id(),
            kind,
            display_name: display_name.into(),
            created_at: now,
        }
    }

    #[inline]
    pub fn is_seller(&self) -> bool {
        self.kind == PersonaKind::Seller
    }

    #[inline]
    pub fn is_buyer(&self) -> bool {
        self.kind == PersonaKind::Buyer
    }

    /// Rejects with `WrongPersona` unless this persona has the given role.
    pub fn require(&self, kind: PersonaKind) -> CoreResult<()> {
        if self.kind == kind {
            Ok(())
        } else {
            Err(CoreError::WrongPersona {
                expected: kind.to_string(),
            })
        }
    }
}

// =============================================================================
// Wallet Transaction
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    /// Money earned or received.
    Credit,
    /// Money paid out.
    Debit,
    /// User-initiated top-up. Adds to the balance like a credit.
    Load,
}

impl TransactionKind {
    /// Signed effect of `amount` on the balance.
    #[inline]
    pub fn apply(&self, amount: Money) -> Money {
        match self {
            TransactionKind::Credit | TransactionKind::Load => amount,
            TransactionKind::Debit => Money::zero() - amount,
        }
    }
}

/// One wallet ledger entry. Never mutated after insertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct WalletTransaction {
    pub id: String,
    pub kind: TransactionKind,
    /// Always positive; the sign comes from `kind`.
    pub amount: Money,
    pub description: String,
    #[ts(as = "String")]
    pub timestamp: DateTime<Utc>,
    /// Balance right after this entry was applied.
    pub balance_after: Money,
    /// Other persona in a transfer, if any.
    #[serde(default)]
    pub counterpart: Option<String>,
}

// =============================================================================
// Payment Request
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Completed,
}

/// The single live request on the payment channel.
///
/// ## Payload
/// [`PaymentRequest::to_payload`] is the text a QR code carries. The buyer
/// side only ever sees that decoded text and rebuilds the request with
/// [`PaymentRequest::from_payload`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PaymentRequest {
    pub request_id: String,
    pub seller_id: String,
    pub seller_name: String,
    pub amount: Money,
    pub sale_id: String,
    #[ts(as = "String")]
    pub timestamp: DateTime<Utc>,
    pub status: PaymentStatus,
    /// Buyer persona id, set when the request is fulfilled.
    #[serde(default)]
    pub paid_by: Option<String>,
}

impl PaymentRequest {
    /// Creates a pending request from a seller.
    pub fn pending(
        seller: &Persona,
        amount: Money,
        sale_id: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        PaymentRequest {
            request_id: new_id(),
            seller_id: seller.id.clone(),
            seller_name: seller.display_name.clone(),
            amount,
            sale_id: sale_id.into(),
            timestamp: now,
            status: PaymentStatus::Pending,
            paid_by: None,
        }
    }

    #[inline]
    pub fn is_pending(&self) -> bool {
        self.status == PaymentStatus::Pending
    }

    #[inline]
    pub fn is_completed(&self) -> bool {
        self.status == PaymentStatus::Completed
    }

    /// Returns a completed copy paid by `buyer_id`.
    pub fn completed_by(&self, buyer_id: &str) -> Self {
        PaymentRequest {
            status: PaymentStatus::Completed,
            paid_by: Some(buyer_id.to_string()),
            ..self.clone()
        }
    }

    /// Encodes the request as QR payload text.
    pub fn to_payload(&self) -> CoreResult<String> {
        serde_json::to_string(self).map_err(|e| CoreError::InvalidPayload(e.to_string()))
    }

    /// Decodes QR payload text back into a request.
    pub fn from_payload(payload: &str) -> CoreResult<Self> {
        let request: PaymentRequest = serde_json::from_str(payload.trim())
            .map_err(|e| CoreError::InvalidPayload(e.to_string()))?;

        if !request.amount.is_positive() {
            return Err(CoreError::InvalidPayload(
                "amount must be positive".to_string(),
            ));
        }

        Ok(request)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

//! # Cart Commands
//!
//! Commands for building the cart and checking it out.
//!
//! ## Cart Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Lifecycle                                       │
//! │                                                                         │
//! │  ┌──────────┐     ┌──────────┐     ┌──────────┐     ┌──────────────┐   │
//! │  │  Empty   │────►│ In Cart  │────►│ Checkout │────►│ Sale + (for  │   │
//! │  │  Cart    │     │          │     │          │     │ a seller) a  │   │
//! │  └──────────┘     └──────────┘     └──────────┘     │ payment req. │   │
//! │                        │                            └──────────────┘   │
//! │                   add_to_cart                                          │
//! │                   set_quantity                                         │
//! │                   remove_from_cart                                     │
//! │                        │                                                │
//! │                        ▼                                                │
//! │                   clear_cart ──────────────────────► (back to empty)   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use tracing::{debug, error};

use tillquest_core::{Cart, CartLine, DomainEvent, Money, PaymentRequest, ProgressReport, Sale};
use tillquest_db::{checkout, KvStore};

use crate::error::ApiError;
use crate::state::ShopState;

/// Cart response including lines and total.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartResponse {
    pub lines: Vec<CartLine>,
    pub total: Money,
    pub units: i64,
}

impl From<&Cart> for CartResponse {
    fn from(cart: &Cart) -> Self {
        CartResponse {
            lines: cart.lines().to_vec(),
            total: cart.total(),
            units: cart.lines().iter().map(|l| l.quantity).sum(),
        }
    }
}

/// Result of a checkout.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    pub sale: Sale,
    /// Opened automatically when a seller rings up a priced sale.
    pub payment_request: Option<PaymentRequest>,
    pub progress: ProgressReport,
}

pub async fn get_cart<S: KvStore, C: KvStore>(state: &ShopState<S, C>) -> CartResponse {
    let shop = state.lock().await;
    CartResponse::from(&shop.cart)
}

/// Adds an item to the cart by barcode.
///
/// ## Behavior
/// - Already in cart: quantity accumulates
/// - The check is against the item's live stock; the inventory is not held
pub async fn add_to_cart<S: KvStore, C: KvStore>(
    state: &ShopState<S, C>,
    barcode: &str,
    quantity: Option<i64>,
) -> Result<CartResponse, ApiError> {
    let quantity = quantity.unwrap_or(1);
    debug!(barcode = %barcode, quantity, "add_to_cart command");

    let mut shop = state.lock().await;
    let item = shop.inventory.get(barcode)?.clone();
    shop.cart.add(&item, quantity)?;

    Ok(CartResponse::from(&shop.cart))
}

/// Sets a line's quantity. Zero removes the line.
pub async fn set_quantity<S: KvStore, C: KvStore>(
    state: &ShopState<S, C>,
    barcode: &str,
    quantity: i64,
) -> Result<CartResponse, ApiError> {
    debug!(barcode = %barcode, quantity, "set_quantity command");
    let mut shop = state.lock().await;

    if quantity == 0 {
        // Works even if the item has since left the inventory.
        shop.cart.remove(barcode)?;
    } else {
        let item = shop.inventory.get(barcode)?.clone();
        shop.cart.set_quantity(&item, quantity)?;
    }

    Ok(CartResponse::from(&shop.cart))
}

pub async fn remove_from_cart<S: KvStore, C: KvStore>(
    state: &ShopState<S, C>,
    barcode: &str,
) -> Result<CartResponse, ApiError> {
    let mut shop = state.lock().await;
    shop.cart.remove(barcode)?;
    Ok(CartResponse::from(&shop.cart))
}

pub async fn clear_cart<S: KvStore, C: KvStore>(state: &ShopState<S, C>) -> CartResponse {
    let mut shop = state.lock().await;
    shop.cart.clear();
    CartResponse::from(&shop.cart)
}

/// Finalizes the cart.
///
/// ## What Happens
/// 1. Stock is re-checked and decremented for every line, all or nothing
/// 2. The sale is recorded and the cart cleared
/// 3. Progression gets a `SaleCompleted` event
/// 4. If a seller is active and the sale has a price, a payment request for
///    the total is put on the channel
pub async fn checkout<S: KvStore, C: KvStore>(
    state: &ShopState<S, C>,
) -> Result<CheckoutResponse, ApiError> {
    let mut guard = state.lock().await;
    let shop = &mut *guard;

    let sale = checkout::finalize_now(&mut shop.cart, &mut shop.inventory, &mut shop.sales).await?;
    let progress = shop.emit(DomainEvent::sale_completed(&sale)).await;

    let seller_active = shop
        .wallet
        .persona()
        .is_some_and(|p| p.is_seller());

    let payment_request = if seller_active && sale.total.is_positive() {
        match state
            .payment()
            .create_request(&shop.wallet, sale.total, &sale.id)
            .await
        {
            Ok(request) => Some(request),
            Err(e) => {
                // The sale stands; the seller can still request by hand.
                error!(sale = %sale.id, error = %e, "Could not open payment request");
                None
            }
        }
    } else {
        None
    };

    Ok(CheckoutResponse {
        sale,
        payment_request,
        progress,
    })
}

//! # Payment Commands
//!
//! Both halves of the seller/buyer handshake.
//!
//! ## Handshake
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  SELLER                         CHANNEL                      BUYER      │
//! │                                                                         │
//! │  request_payment ────────────► pending ────(payload/QR)────► pay       │
//! │                                   │                           │         │
//! │                                   │◄──────── completed ───────┘         │
//! │                                   │          (buyer debited)            │
//! │  check_payment ◄──── claim ───────┘                                     │
//! │  (seller credited once)                                                 │
//! │                                                                         │
//! │  confirm_payment: seller credits by hand, channel cleared               │
//! │  cancel_payment:  channel cleared, no wallet touched                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use tracing::debug;

use tillquest_core::{Money, PaymentRequest, WalletTransaction};
use tillquest_db::{KvStore, Settlement};

use crate::error::{ApiError, ErrorCode};
use crate::state::ShopState;

/// A fresh request and the text its QR code carries.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequestResponse {
    pub request: PaymentRequest,
    pub payload: String,
}

/// Seller: opens a request for `amount`, replacing any previous one.
pub async fn request_payment<S: KvStore, C: KvStore>(
    state: &ShopState<S, C>,
    amount: Money,
    sale_id: &str,
) -> Result<PaymentRequestResponse, ApiError> {
    let shop = state.lock().await;
    let request = state
        .payment()
        .create_request(&shop.wallet, amount, sale_id)
        .await?;
    let payload = request.to_payload()?;

    Ok(PaymentRequestResponse { request, payload })
}

pub async fn current_payment<S: KvStore, C: KvStore>(
    state: &ShopState<S, C>,
) -> Result<Option<PaymentRequest>, ApiError> {
    Ok(state.payment().current_request().await?)
}

/// Buyer: pays the request encoded in `payload`.
pub async fn pay<S: KvStore, C: KvStore>(
    state: &ShopState<S, C>,
    payload: &str,
) -> Result<WalletTransaction, ApiError> {
    let request = PaymentRequest::from_payload(payload)?;
    debug!(request_id = %request.request_id, "pay command");

    let mut shop = state.lock().await;
    Ok(state.payment().fulfill(&mut shop.wallet, &request).await?)
}

/// Seller: polls the channel and settles a completed request once.
pub async fn check_payment<S: KvStore, C: KvStore>(
    state: &ShopState<S, C>,
) -> Result<Settlement, ApiError> {
    let mut shop = state.lock().await;
    Ok(state.payment().check_and_settle(&mut shop.wallet).await?)
}

/// Seller: records a payment taken outside the app.
///
/// Without an explicit amount the open request's amount is used.
pub async fn confirm_payment<S: KvStore, C: KvStore>(
    state: &ShopState<S, C>,
    amount: Option<Money>,
) -> Result<WalletTransaction, ApiError> {
    let amount = match amount {
        Some(amount) => amount,
        None => state
            .payment()
            .current_request()
            .await?
            .map(|r| r.amount)
            .ok_or_else(|| {
                ApiError::new(ErrorCode::PaymentError, "No payment request to confirm")
            })?,
    };

    let mut shop = state.lock().await;
    Ok(state
        .payment()
        .confirm_manually(&mut shop.wallet, amount)
        .await?)
}

pub async fn cancel_payment<S: KvStore, C: KvStore>(
    state: &ShopState<S, C>,
) -> Result<PaymentRequest, ApiError> {
    state
        .payment()
        .cancel()
        .await?
        .ok_or_else(|| ApiError::new(ErrorCode::PaymentError, "No payment request to cancel"))
}

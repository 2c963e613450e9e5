//! # Wallet Commands
//!
//! Persona management and direct wallet moves.
//!
//! ```text
//! create_persona(kind, name) ──► active persona + wallet
//! switch_persona()           ──► no persona; its own pending request is withdrawn
//! load_money / credit / debit ──► one ledger entry each
//! ```

use serde::Serialize;
use tracing::warn;

use tillquest_core::{Money, Persona, PersonaKind, WalletTransaction};
use tillquest_db::KvStore;

use crate::error::ApiError;
use crate::state::ShopState;

/// Description used for user top-ups.
pub const LOAD_DESCRIPTION: &str = "Money loaded to wallet";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletResponse {
    pub persona: Option<Persona>,
    pub balance: Option<Money>,
    /// Most recent first.
    pub history: Vec<WalletTransaction>,
}

pub async fn get_wallet<S: KvStore, C: KvStore>(
    state: &ShopState<S, C>,
    limit: Option<usize>,
) -> WalletResponse {
    let shop = state.lock().await;
    WalletResponse {
        persona: shop.wallet.persona().cloned(),
        balance: shop.wallet.balance(),
        history: shop.wallet.history(limit).to_vec(),
    }
}

pub async fn create_persona<S: KvStore, C: KvStore>(
    state: &ShopState<S, C>,
    kind: PersonaKind,
    display_name: &str,
) -> Result<Persona, ApiError> {
    let mut shop = state.lock().await;
    Ok(shop.wallet.create_account(kind, display_name).await?)
}

/// Drops the active persona so a new one can be created.
///
/// A still-pending request the old persona opened is withdrawn. A paid one
/// stays for its seller to settle. Failing to withdraw is logged; the switch
/// still stands.
pub async fn switch_persona<S: KvStore, C: KvStore>(
    state: &ShopState<S, C>,
) -> Result<Option<Persona>, ApiError> {
    let mut shop = state.lock().await;
    let previous = shop.wallet.switch_persona().await?;

    if let Some(persona) = &previous {
        if let Err(e) = state.payment().withdraw(&persona.id).await {
            warn!(error = %e, "Could not withdraw payment request on persona switch");
        }
    }
    Ok(previous)
}

pub async fn load_money<S: KvStore, C: KvStore>(
    state: &ShopState<S, C>,
    amount: Money,
) -> Result<WalletTransaction, ApiError> {
    let mut shop = state.lock().await;
    Ok(shop.wallet.load(amount, LOAD_DESCRIPTION).await?)
}

pub async fn credit<S: KvStore, C: KvStore>(
    state: &ShopState<S, C>,
    amount: Money,
    description: &str,
) -> Result<WalletTransaction, ApiError> {
    let mut shop = state.lock().await;
    Ok(shop.wallet.credit(amount, description, None).await?)
}

pub async fn debit<S: KvStore, C: KvStore>(
    state: &ShopState<S, C>,
    amount: Money,
    description: &str,
) -> Result<WalletTransaction, ApiError> {
    let mut shop = state.lock().await;
    Ok(shop.wallet.debit(amount, description, None).await?)
}

pub async fn reset_wallet<S: KvStore, C: KvStore>(
    state: &ShopState<S, C>,
) -> Result<(), ApiError> {
    let mut shop = state.lock().await;
    Ok(shop.wallet.reset().await?)
}

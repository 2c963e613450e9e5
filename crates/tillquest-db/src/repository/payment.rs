//! # Payment Handshake
//!
//! A single-slot request/response protocol between a seller and a buyer who
//! share nothing but a polled channel (the `payment_request` key).
//!
//! ## States
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  NoRequest ──create_request──► Pending ──fulfill──► Completed           │
//! │      ▲                           │  │                    │              │
//! │      │                           │  └─create_request──►  │ (supersede)  │
//! │      ├────────── cancel ─────────┘                       │              │
//! │      ├────────── confirm_manually ◄── Pending/Completed  │              │
//! │      └────────── check_and_settle ◄──────────────────────┘              │
//! │                                                                         │
//! │  SELLER: create_request, check_and_settle, confirm_manually, cancel    │
//! │  BUYER:  fulfill                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## At-Most-Once Settlement
//! `check_and_settle` claims the completed request with the channel's
//! compare-and-remove before crediting. A second poll, or a second register
//! polling the same channel, finds nothing to claim and returns
//! `settled: false`.
//!
//! `fulfill` writes the completed request with compare-and-swap over the
//! pending text it validated, so a seller superseding the request mid-payment
//! never has the new request overwritten.
//!
//! The handshake keeps no state of its own; every call reads the channel.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use tillquest_core::validation::validate_amount;
use tillquest_core::{CoreError, Money, PaymentRequest, PersonaKind, WalletTransaction};

use crate::codec;
use crate::error::DbResult;
use crate::kv::KvStore;
use crate::repository::wallet::WalletLedger;

/// Outcome of a settlement poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    pub settled: bool,
    pub amount: Money,
    pub request_id: Option<String>,
}

impl Settlement {
    fn nothing() -> Self {
        Settlement {
            settled: false,
            amount: Money::zero(),
            request_id: None,
        }
    }
}

/// The payment channel.
#[derive(Debug, Clone)]
pub struct PaymentHandshake<C: KvStore> {
    channel: C,
}

impl<C: KvStore> PaymentHandshake<C> {
    pub fn new(channel: C) -> Self {
        PaymentHandshake { channel }
    }

    /// The request currently on the channel, if any.
    pub async fn current_request(&self) -> DbResult<Option<PaymentRequest>> {
        codec::load(&self.channel).await
    }

    /// Seller: puts a pending request on the channel, replacing any other.
    pub async fn create_request<S: KvStore>(
        &self,
        wallet: &WalletLedger<S>,
        amount: Money,
        sale_id: &str,
    ) -> DbResult<PaymentRequest> {
        let seller = wallet.require_persona(PersonaKind::Seller)?;
        validate_amount(amount)?;

        let request = PaymentRequest::pending(seller, amount, sale_id, Utc::now());

        if let Some(previous) = self.current_request().await? {
            debug!(previous = %previous.request_id, "Superseding payment request");
        }
        codec::save(&self.channel, &Some(request.clone())).await?;

        info!(request_id = %request.request_id, amount = %amount, sale_id = %sale_id, "Payment requested");
        Ok(request)
    }

    /// Buyer: pays a request read from the channel (or decoded from a QR).
    ///
    /// Debits the buyer and marks the request completed. The seller is not
    /// credited here; the seller side must settle.
    ///
    /// The completed request is written over the exact pending text that was
    /// checked. If the seller superseded or cancelled it in between, nothing
    /// is written, the buyer is refunded and the call fails as stale.
    pub async fn fulfill<S: KvStore>(
        &self,
        wallet: &mut WalletLedger<S>,
        request: &PaymentRequest,
    ) -> DbResult<WalletTransaction> {
        let buyer_id = wallet.require_persona(PersonaKind::Buyer)?.id.clone();
        validate_amount(request.amount)?;

        let raw = self.channel.get(codec::keys::PAYMENT_REQUEST).await?;
        let live = raw
            .as_deref()
            .and_then(codec::decode::<Option<PaymentRequest>>);
        let is_live = live.as_ref().is_some_and(|r| {
            r.request_id == request.request_id && r.is_pending() && r.amount == request.amount
        });
        let Some(pending) = raw.filter(|_| is_live) else {
            warn!(request_id = %request.request_id, "Payment request is not live on the channel");
            return Err(CoreError::StaleRequest(request.request_id.clone()).into());
        };

        let debit = wallet
            .debit(
                request.amount,
                &format!("Payment to {}", request.seller_name),
                Some(request.seller_id.clone()),
            )
            .await?;

        let completed = Some(request.completed_by(&buyer_id));
        match codec::save_if(&self.channel, &pending, &completed).await {
            Ok(true) => {}
            Ok(false) => {
                warn!(request_id = %request.request_id, "Payment request changed while paying, refunding");
                refund(wallet, request).await;
                return Err(CoreError::StaleRequest(request.request_id.clone()).into());
            }
            Err(e) => {
                error!(request_id = %request.request_id, error = %e, "Could not mark request paid, refunding");
                refund(wallet, request).await;
                return Err(e);
            }
        }

        info!(request_id = %request.request_id, amount = %request.amount, "Payment sent");
        Ok(debit)
    }

    /// Seller: credits a completed request addressed to this seller, once.
    pub async fn check_and_settle<S: KvStore>(
        &self,
        wallet: &mut WalletLedger<S>,
    ) -> DbResult<Settlement> {
        let seller_id = wallet.require_persona(PersonaKind::Seller)?.id.clone();

        let Some(raw) = self.channel.get(codec::keys::PAYMENT_REQUEST).await? else {
            return Ok(Settlement::nothing());
        };
        let request: Option<PaymentRequest> = codec::decode(&raw);
        let Some(request) = request else {
            return Ok(Settlement::nothing());
        };

        if !request.is_completed() || request.seller_id != seller_id {
            return Ok(Settlement::nothing());
        }

        if !self
            .channel
            .remove_if(codec::keys::PAYMENT_REQUEST, &raw)
            .await?
        {
            debug!(request_id = %request.request_id, "Request already claimed");
            return Ok(Settlement::nothing());
        }

        if let Err(e) = wallet
            .credit(request.amount, "Payment received for sale", request.paid_by.clone())
            .await
        {
            // Put the claim back so a later poll can settle it.
            if let Err(restore) = self.channel.set(codec::keys::PAYMENT_REQUEST, &raw).await {
                error!(request_id = %request.request_id, error = %restore, "Could not restore request");
            }
            return Err(e);
        }

        info!(request_id = %request.request_id, amount = %request.amount, "Payment settled");
        Ok(Settlement {
            settled: true,
            amount: request.amount,
            request_id: Some(request.request_id),
        })
    }

    /// Seller: records an out-of-band payment and clears the channel.
    pub async fn confirm_manually<S: KvStore>(
        &self,
        wallet: &mut WalletLedger<S>,
        amount: Money,
    ) -> DbResult<WalletTransaction> {
        wallet.require_persona(PersonaKind::Seller)?;

        let credit = wallet
            .credit(amount, "Payment received (manual confirmation)", None)
            .await?;

        if let Err(e) = self.channel.remove(codec::keys::PAYMENT_REQUEST).await {
            warn!(error = %e, "Could not clear payment channel after manual confirmation");
        }

        info!(amount = %amount, "Payment confirmed manually");
        Ok(credit)
    }

    /// Clears the channel without touching any wallet.
    pub async fn cancel(&self) -> DbResult<Option<PaymentRequest>> {
        let previous = self.current_request().await?;
        self.channel.remove(codec::keys::PAYMENT_REQUEST).await?;
        if let Some(r) = &previous {
            info!(request_id = %r.request_id, "Payment request cancelled");
        }
        Ok(previous)
    }

    /// Removes `seller_id`'s own request while it is still pending.
    ///
    /// Used when a register drops its persona. Anything else on the channel
    /// is left alone: a paid request still owes its seller a credit, and
    /// another seller's request is not ours to drop.
    pub async fn withdraw(&self, seller_id: &str) -> DbResult<Option<PaymentRequest>> {
        let Some(raw) = self.channel.get(codec::keys::PAYMENT_REQUEST).await? else {
            return Ok(None);
        };
        let Some(request) = codec::decode::<Option<PaymentRequest>>(&raw) else {
            return Ok(None);
        };

        if !request.is_pending() || request.seller_id != seller_id {
            debug!(request_id = %request.request_id, "Leaving payment request on the channel");
            return Ok(None);
        }

        if !self
            .channel
            .remove_if(codec::keys::PAYMENT_REQUEST, &raw)
            .await?
        {
            return Ok(None);
        }

        info!(request_id = %request.request_id, "Payment request withdrawn");
        Ok(Some(request))
    }
}

/// Gives the buyer back a debit whose request never reached the channel.
async fn refund<S: KvStore>(wallet: &mut WalletLedger<S>, request: &PaymentRequest) {
    if let Err(e) = wallet
        .credit(
            request.amount,
            "Refund: payment not delivered",
            Some(request.seller_id.clone()),
        )
        .await
    {
        error!(request_id = %request.request_id, error = %e, "Refund failed");
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;
    use crate::kv::MemoryKvStore;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};
    use tillquest_core::TransactionKind;

    /// Two registers: their own wallet stores, one shared channel.
    struct Fixture {
        seller: WalletLedger<MemoryKvStore>,
        buyer: WalletLedger<MemoryKvStore>,
        seller_side: PaymentHandshake<MemoryKvStore>,
        buyer_side: PaymentHandshake<MemoryKvStore>,
    }

    async fn fixture() -> Fixture {
        let channel = MemoryKvStore::new();

        let mut seller = WalletLedger::open(MemoryKvStore::new(), Money::from_major(100))
            .await
            .unwrap();
        seller.create_account(PersonaKind::Seller, "Sam").await.unwrap();

        let mut buyer = WalletLedger::open(MemoryKvStore::new(), Money::from_major(100))
            .await
            .unwrap();
        buyer.create_account(PersonaKind::Buyer, "Bea").await.unwrap();

        Fixture {
            seller,
            buyer,
            seller_side: PaymentHandshake::new(channel.clone()),
            buyer_side: PaymentHandshake::new(channel),
        }
    }

    #[tokio::test]
    async fn test_full_handshake() {
        let mut f = fixture().await;

        let request = f
            .seller_side
            .create_request(&f.seller, Money::from_major(40), "sale-1")
            .await
            .unwrap();

        // Buyer only sees the QR text.
        let scanned = PaymentRequest::from_payload(&request.to_payload().unwrap()).unwrap();
        let debit = f.buyer_side.fulfill(&mut f.buyer, &scanned).await.unwrap();

        assert_eq!(debit.kind, TransactionKind::Debit);
        assert_eq!(debit.description, "Payment to Sam");
        assert_eq!(f.buyer.balance(), Some(Money::from_major(60)));
        assert_eq!(f.buyer.history(None).len(), 2);
        assert_eq!(f.seller.balance(), Some(Money::zero()));

        let settlement = f.seller_side.check_and_settle(&mut f.seller).await.unwrap();
        assert!(settlement.settled);
        assert_eq!(settlement.amount, Money::from_major(40));
        assert_eq!(f.seller.balance(), Some(Money::from_major(40)));

        let credit = &f.seller.history(None)[0];
        assert_eq!(credit.description, "Payment received for sale");
        assert_eq!(credit.counterpart.as_deref(), Some(f.buyer.persona().unwrap().id.as_str()));

        assert!(f.seller_side.current_request().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_settle_is_idempotent() {
        let mut f = fixture().await;
        let request = f
            .seller_side
            .create_request(&f.seller, Money::from_major(10), "sale-1")
            .await
            .unwrap();
        f.buyer_side.fulfill(&mut f.buyer, &request).await.unwrap();

        assert!(f.seller_side.check_and_settle(&mut f.seller).await.unwrap().settled);
        let second = f.seller_side.check_and_settle(&mut f.seller).await.unwrap();

        assert!(!second.settled);
        assert_eq!(f.seller.balance(), Some(Money::from_major(10)));
        assert_eq!(f.seller.history(None).len(), 1);
    }

    #[tokio::test]
    async fn test_poll_before_payment_settles_nothing() {
        let mut f = fixture().await;
        assert!(!f.seller_side.check_and_settle(&mut f.seller).await.unwrap().settled);

        f.seller_side
            .create_request(&f.seller, Money::from_major(10), "sale-1")
            .await
            .unwrap();
        assert!(!f.seller_side.check_and_settle(&mut f.seller).await.unwrap().settled);
        assert!(f.seller_side.current_request().await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_fulfill_insufficient_funds() {
        let mut f = fixture().await;
        let request = f
            .seller_side
            .create_request(&f.seller, Money::from_major(150), "sale-1")
            .await
            .unwrap();

        let err = f.buyer_side.fulfill(&mut f.buyer, &request).await.unwrap_err();
        assert!(matches!(err, DbError::Rejected(CoreError::InsufficientFunds { .. })));
        assert_eq!(f.buyer.balance(), Some(Money::from_major(100)));
        assert!(f.buyer_side.current_request().await.unwrap().unwrap().is_pending());
    }

    #[tokio::test]
    async fn test_roles_are_enforced() {
        let mut f = fixture().await;

        assert!(matches!(
            f.buyer_side.create_request(&f.buyer, Money::from_major(5), "x").await,
            Err(DbError::Rejected(CoreError::WrongPersona { .. }))
        ));

        let request = f
            .seller_side
            .create_request(&f.seller, Money::from_major(5), "x")
            .await
            .unwrap();
        assert!(matches!(
            f.seller_side.fulfill(&mut f.seller, &request).await,
            Err(DbError::Rejected(CoreError::WrongPersona { .. }))
        ));
        assert!(matches!(
            f.buyer_side.check_and_settle(&mut f.buyer).await,
            Err(DbError::Rejected(CoreError::WrongPersona { .. }))
        ));
    }

    #[tokio::test]
    async fn test_superseded_or_cancelled_request_is_stale() {
        let mut f = fixture().await;
        let old = f
            .seller_side
            .create_request(&f.seller, Money::from_major(5), "sale-1")
            .await
            .unwrap();
        let new = f
            .seller_side
            .create_request(&f.seller, Money::from_major(7), "sale-2")
            .await
            .unwrap();

        assert!(matches!(
            f.buyer_side.fulfill(&mut f.buyer, &old).await,
            Err(DbError::Rejected(CoreError::StaleRequest(_)))
        ));

        let cancelled = f.seller_side.cancel().await.unwrap();
        assert_eq!(cancelled.map(|r| r.request_id), Some(new.request_id.clone()));
        assert!(matches!(
            f.buyer_side.fulfill(&mut f.buyer, &new).await,
            Err(DbError::Rejected(CoreError::StaleRequest(_)))
        ));
        assert_eq!(f.buyer.balance(), Some(Money::from_major(100)));
    }

    #[tokio::test]
    async fn test_paying_twice_is_stale() {
        let mut f = fixture().await;
        let request = f
            .seller_side
            .create_request(&f.seller, Money::from_major(5), "sale-1")
            .await
            .unwrap();

        f.buyer_side.fulfill(&mut f.buyer, &request).await.unwrap();
        assert!(matches!(
            f.buyer_side.fulfill(&mut f.buyer, &request).await,
            Err(DbError::Rejected(CoreError::StaleRequest(_)))
        ));
        assert_eq!(f.buyer.balance(), Some(Money::from_major(95)));
    }

    #[tokio::test]
    async fn test_confirm_manually_on_empty_wallet() {
        let mut f = fixture().await;
        f.seller_side
            .create_request(&f.seller, Money::from_major(500), "sale-1")
            .await
            .unwrap();

        let credit = f
            .seller_side
            .confirm_manually(&mut f.seller, Money::from_major(500))
            .await
            .unwrap();

        assert_eq!(credit.kind, TransactionKind::Credit);
        assert_eq!(credit.balance_after, Money::from_major(500));
        assert_eq!(f.seller.balance(), Some(Money::from_major(500)));
        assert_eq!(f.seller.history(None).len(), 1);
        assert!(f.seller_side.current_request().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_settle_ignores_other_sellers() {
        let mut f = fixture().await;
        let request = f
            .seller_side
            .create_request(&f.seller, Money::from_major(5), "sale-1")
            .await
            .unwrap();
        f.buyer_side.fulfill(&mut f.buyer, &request).await.unwrap();

        let mut other = WalletLedger::open(MemoryKvStore::new(), Money::zero()).await.unwrap();
        other.create_account(PersonaKind::Seller, "Otto").await.unwrap();

        assert!(!f.seller_side.check_and_settle(&mut other).await.unwrap().settled);
        assert!(f.seller_side.check_and_settle(&mut f.seller).await.unwrap().settled);
    }

    /// Channel whose writes can be switched off, and which can let another
    /// register write just before the next compare-and-swap lands.
    #[derive(Debug, Clone, Default)]
    struct FlakyChannel {
        inner: MemoryKvStore,
        fail_writes: Arc<AtomicBool>,
        write_first: Arc<Mutex<Option<String>>>,
    }

    impl FlakyChannel {
        fn check(&self) -> DbResult<()> {
            if self.fail_writes.load(Ordering::SeqCst) {
                Err(DbError::QueryFailed("disk I/O error".to_string()))
            } else {
                Ok(())
            }
        }
    }

    impl KvStore for FlakyChannel {
        async fn get(&self, key: &str) -> DbResult<Option<String>> {
            self.inner.get(key).await
        }

        async fn set(&self, key: &str, value: &str) -> DbResult<()> {
            self.check()?;
            self.inner.set(key, value).await
        }

        async fn remove(&self, key: &str) -> DbResult<()> {
            self.check()?;
            self.inner.remove(key).await
        }

        async fn remove_if(&self, key: &str, expected: &str) -> DbResult<bool> {
            self.check()?;
            self.inner.remove_if(key, expected).await
        }

        async fn replace_if(&self, key: &str, expected: &str, value: &str) -> DbResult<bool> {
            self.check()?;
            let racing = self.write_first.lock().unwrap().take();
            if let Some(other) = racing {
                self.inner.set(key, &other).await?;
            }
            self.inner.replace_if(key, expected, value).await
        }

        async fn clear(&self) -> DbResult<()> {
            self.check()?;
            self.inner.clear().await
        }
    }

    #[tokio::test]
    async fn test_failed_channel_write_refunds_buyer() {
        let f = fixture().await;
        let mut buyer = f.buyer;
        let channel = FlakyChannel::default();
        let handshake = PaymentHandshake::new(channel.clone());

        let request = handshake
            .create_request(&f.seller, Money::from_major(30), "sale-1")
            .await
            .unwrap();

        channel.fail_writes.store(true, Ordering::SeqCst);
        let err = handshake.fulfill(&mut buyer, &request).await.unwrap_err();
        assert!(!err.is_rejection());

        assert_eq!(buyer.balance(), Some(Money::from_major(100)));
        assert!(buyer.account().unwrap().verify_ledger());
        assert_eq!(buyer.history(None)[0].description, "Refund: payment not delivered");
        assert!(handshake.current_request().await.unwrap().unwrap().is_pending());
    }

    #[tokio::test]
    async fn test_request_superseded_while_paying_refunds_buyer() {
        let f = fixture().await;
        let mut buyer = f.buyer;
        let channel = FlakyChannel::default();
        let handshake = PaymentHandshake::new(channel.clone());

        let old = handshake
            .create_request(&f.seller, Money::from_major(30), "sale-1")
            .await
            .unwrap();
        let newer = PaymentRequest::pending(
            f.seller.persona().unwrap(),
            Money::from_major(12),
            "sale-2",
            Utc::now(),
        );
        *channel.write_first.lock().unwrap() = Some(serde_json::to_string(&newer).unwrap());

        let err = handshake.fulfill(&mut buyer, &old).await.unwrap_err();
        assert!(matches!(err, DbError::Rejected(CoreError::StaleRequest(_))));

        assert_eq!(buyer.balance(), Some(Money::from_major(100)));
        assert!(buyer.account().unwrap().verify_ledger());

        let live = handshake.current_request().await.unwrap().unwrap();
        assert_eq!(live.request_id, newer.request_id);
        assert!(live.is_pending());
    }

    #[tokio::test]
    async fn test_withdraw_only_drops_own_pending_request() {
        let mut f = fixture().await;
        let seller_id = f.seller.persona().unwrap().id.clone();
        let buyer_id = f.buyer.persona().unwrap().id.clone();

        let request = f
            .seller_side
            .create_request(&f.seller, Money::from_major(5), "sale-1")
            .await
            .unwrap();

        assert!(f.buyer_side.withdraw(&buyer_id).await.unwrap().is_none());
        assert!(f.buyer_side.current_request().await.unwrap().is_some());

        f.buyer_side.fulfill(&mut f.buyer, &request).await.unwrap();
        assert!(f.seller_side.withdraw(&seller_id).await.unwrap().is_none());
        assert!(f.seller_side.current_request().await.unwrap().unwrap().is_completed());

        assert!(f.seller_side.check_and_settle(&mut f.seller).await.unwrap().settled);

        let next = f
            .seller_side
            .create_request(&f.seller, Money::from_major(7), "sale-2")
            .await
            .unwrap();
        let withdrawn = f.seller_side.withdraw(&seller_id).await.unwrap();
        assert_eq!(withdrawn.map(|r| r.request_id), Some(next.request_id));
        assert!(f.seller_side.current_request().await.unwrap().is_none());
    }
}

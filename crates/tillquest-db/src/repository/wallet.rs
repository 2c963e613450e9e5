//! # Wallet Ledger
//!
//! The active persona and its wallet account.
//!
//! ## Persona Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │   no persona ──create_account(kind, name)──► active persona            │
//! │        ▲                                      │  buyer: welcome load   │
//! │        │                                      │  seller: zero balance  │
//! │        └───────────── switch_persona() ◄──────┘                        │
//! │                       (drops persona + wallet)                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every mutation is applied to a copy of the record, persisted, then swapped
//! in, so a rejected or failed write leaves the wallet exactly as it was.

use chrono::Utc;
use tracing::{debug, info, warn};

use tillquest_core::validation::validate_display_name;
use tillquest_core::{
    CoreError, CoreResult, Money, Persona, PersonaKind, WalletAccount, WalletTransaction,
};

use crate::codec::{self, WalletRecord};
use crate::error::DbResult;
use crate::kv::KvStore;

/// Store for the active persona's wallet.
#[derive(Debug)]
pub struct WalletLedger<S: KvStore> {
    store: S,
    record: Option<WalletRecord>,
    welcome_credit: Money,
}

impl<S: KvStore> WalletLedger<S> {
    /// Loads the active persona, if any.
    ///
    /// `welcome_credit` seeds every new buyer account.
    pub async fn open(store: S, welcome_credit: Money) -> DbResult<Self> {
        let mut record: Option<WalletRecord> = codec::load(&store).await?;

        if let Some(r) = &record {
            if !r.wallet.verify_ledger() {
                warn!(persona = %r.persona.id, "Wallet ledger does not replay to its balance, starting over");
                record = None;
            }
        }

        debug!(active = record.is_some(), "Wallet loaded");
        Ok(WalletLedger {
            store,
            record,
            welcome_credit,
        })
    }

    pub fn persona(&self) -> Option<&Persona> {
        self.record.as_ref().map(|r| &r.persona)
    }

    pub fn account(&self) -> Option<&WalletAccount> {
        self.record.as_ref().map(|r| &r.wallet)
    }

    pub fn balance(&self) -> Option<Money> {
        self.account().map(|a| a.balance)
    }

    pub fn welcome_credit(&self) -> Money {
        self.welcome_credit
    }

    /// The active persona, rejecting unless it has role `kind`.
    pub fn require_persona(&self, kind: PersonaKind) -> CoreResult<&Persona> {
        let persona = self.persona().ok_or(CoreError::NoActivePersona)?;
        persona.require(kind)?;
        Ok(persona)
    }

    /// Creates a persona and its wallet and makes it active.
    pub async fn create_account(&mut self, kind: PersonaKind, display_name: &str) -> DbResult<Persona> {
        if let Some(active) = self.persona() {
            return Err(CoreError::PersonaAlreadyActive(active.display_name.clone()).into());
        }
        validate_display_name(display_name)?;

        let now = Utc::now();
        let persona = Persona::new(kind, display_name.trim(), now);
        let wallet = WalletAccount::opened_for(&persona, self.welcome_credit, now);
        let record = WalletRecord {
            persona: persona.clone(),
            wallet,
        };

        self.commit(Some(record)).await?;
        info!(persona = %persona.id, kind = %persona.kind, "Persona created");
        Ok(persona)
    }

    /// Drops the active persona and its wallet.
    pub async fn switch_persona(&mut self) -> DbResult<Option<Persona>> {
        let previous = self.record.as_ref().map(|r| r.persona.clone());
        self.commit(None).await?;
        if let Some(p) = &previous {
            info!(persona = %p.id, "Persona switched out");
        }
        Ok(previous)
    }

    /// Adds earned or received money.
    pub async fn credit(
        &mut self,
        amount: Money,
        description: &str,
        counterpart: Option<String>,
    ) -> DbResult<WalletTransaction> {
        self.mutate(|wallet| {
            wallet
                .credit(amount, description, counterpart, Utc::now())
                .cloned()
        })
        .await
    }

    /// Takes money out, failing if the balance is short.
    pub async fn debit(
        &mut self,
        amount: Money,
        description: &str,
        counterpart: Option<String>,
    ) -> DbResult<WalletTransaction> {
        self.mutate(|wallet| {
            wallet
                .debit(amount, description, counterpart, Utc::now())
                .cloned()
        })
        .await
    }

    /// User-initiated top-up.
    pub async fn load(&mut self, amount: Money, description: &str) -> DbResult<WalletTransaction> {
        self.mutate(|wallet| wallet.load(amount, description, Utc::now()).cloned())
            .await
    }

    /// Most recent first. Empty when no persona is active.
    pub fn history(&self, limit: Option<usize>) -> &[WalletTransaction] {
        match self.account() {
            Some(account) => account.history(limit),
            None => &[],
        }
    }

    /// Zeroes the balance and clears the history, keeping the persona.
    pub async fn reset(&mut self) -> DbResult<()> {
        self.mutate(|wallet| {
            wallet.reset();
            Ok(())
        })
        .await?;
        info!("Wallet reset");
        Ok(())
    }

    async fn mutate<T, F>(&mut self, f: F) -> DbResult<T>
    where
        F: FnOnce(&mut WalletAccount) -> CoreResult<T>,
    {
        let mut next = self.record.clone().ok_or(CoreError::NoActivePersona)?;
        let out = f(&mut next.wallet)?;

        self.commit(Some(next)).await?;
        if let Some(r) = &self.record {
            debug!(persona = %r.persona.id, balance = %r.wallet.balance, "Wallet updated");
        }
        Ok(out)
    }

    async fn commit(&mut self, next: Option<WalletRecord>) -> DbResult<()> {
        codec::save(&self.store, &next).await?;
        self.record = next;
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

//! # Wallet Account
//!
//! Balance and transaction math for one persona's wallet.
//!
//! ## The Ledger Invariant
//! ```text
//! transactions (newest first)          fold from zero, oldest → newest
//! ┌──────────────────────────────┐     ┌──────────────────────────────┐
//! │ debit   40.00  after  60.00  │ ◄── │ 0 + 100 = 100                │
//! │ load   100.00  after 100.00  │     │ 100 - 40 = 60                │
//! └──────────────────────────────┘     └──────────────────────────────┘
//!
//! Every balance_after equals the running fold, and the last fold equals
//! the account balance. The balance is never negative.
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{new_id, Persona, PersonaKind, TransactionKind, WalletTransaction};
use crate::validation::{validate_amount, validate_description};

/// Description of the buyer's seeded welcome credit.
pub const WELCOME_DESCRIPTION: &str = "Welcome bonus";

/// A persona's wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct WalletAccount {
    pub persona_id: String,
    pub balance: Money,
    /// Most recent first.
    pub transactions: Vec<WalletTransaction>,
}

impl WalletAccount {
    /// An empty account.
    pub fn new(persona_id: impl Into<String>) -> Self {
        WalletAccount {
            persona_id: persona_id.into(),
            balance: Money::zero(),
            transactions: Vec::new(),
        }
    }

    /// Opens the account a new persona starts with.
    ///
    /// Buyers get `welcome_credit` as a `load` entry; sellers start at zero
    /// with no entries.
    pub fn opened_for(persona: &Persona, welcome_credit: Money, now: DateTime<Utc>) -> Self {
        let mut account = WalletAccount::new(persona.id.clone());

        if persona.kind == PersonaKind::Buyer && welcome_credit.is_positive() {
            account.push(
                TransactionKind::Load,
                welcome_credit,
                welcome_credit,
                WELCOME_DESCRIPTION,
                None,
                now,
            );
        }

        account
    }

    /// Adds earned or received money.
    pub fn credit(
        &mut self,
        amount: Money,
        description: &str,
        counterpart: Option<String>,
        now: DateTime<Utc>,
    ) -> CoreResult<&WalletTransaction> {
        check_entry(amount, description)?;
        self.record(TransactionKind::Credit, amount, description, counterpart, now)
    }

    /// Adds user-initiated top-up money.
    pub fn load(
        &mut self,
        amount: Money,
        description: &str,
        now: DateTime<Utc>,
    ) -> CoreResult<&WalletTransaction> {
        check_entry(amount, description)?;
        self.record(TransactionKind::Load, amount, description, None, now)
    }

    /// Takes money out. Fails without any change if the balance is short.
    pub fn debit(
        &mut self,
        amount: Money,
        description: &str,
        counterpart: Option<String>,
        now: DateTime<Utc>,
    ) -> CoreResult<&WalletTransaction> {
        check_entry(amount, description)?;

        if self.balance.checked_sub_non_negative(amount).is_none() {
            return Err(CoreError::InsufficientFunds {
                balance: self.balance,
                requested: amount,
            });
        }

        self.record(TransactionKind::Debit, amount, description, counterpart, now)
    }

    /// Most recent first, optionally truncated to `limit` entries.
    pub fn history(&self, limit: Option<usize>) -> &[WalletTransaction] {
        match limit {
            Some(n) if n < self.transactions.len() => &self.transactions[..n],
            _ => &self.transactions,
        }
    }

    /// Zeroes the balance and drops every entry. The persona is kept.
    pub fn reset(&mut self) {
        self.balance = Money::zero();
        self.transactions.clear();
    }

    /// Replays the ledger from zero and checks every `balance_after`.
    pub fn verify_ledger(&self) -> bool {
        let mut running = Money::zero();

        for tx in self.transactions.iter().rev() {
            if !tx.amount.is_positive() {
                return false;
            }
            running = match running.checked_add(tx.kind.apply(tx.amount)) {
                Some(next) => next,
                None => return false,
            };
            if running.is_negative() || running != tx.balance_after {
                return false;
            }
        }

        running == self.balance
    }

    /// Appends an entry, rejecting it if the balance would overflow.
    fn record(
        &mut self,
        kind: TransactionKind,
        amount: Money,
        description: &str,
        counterpart: Option<String>,
        now: DateTime<Utc>,
    ) -> CoreResult<&WalletTransaction> {
        let balance_after = self
            .balance
            .checked_add(kind.apply(amount))
            .ok_or_else(|| ValidationError::TooLarge {
                field: "balance".to_string(),
                max: Money::from_cents(i64::MAX).to_string(),
            })?;

        Ok(self.push(kind, amount, balance_after, description, counterpart, now))
    }

    fn push(
        &mut self,
        kind: TransactionKind,
        amount: Money,
        balance_after: Money,
        description: &str,
        counterpart: Option<String>,
        now: DateTime<Utc>,
    ) -> &WalletTransaction {
        self.balance = balance_after;
        self.transactions.insert(
            0,
            WalletTransaction {
                id: new_id(),
                kind,
                amount,
                description: description.trim().to_string(),
                timestamp: now,
                balance_after: self.balance,
                counterpart,
            },
        );
        &self.transactions[0]
    }
}

fn check_entry(amount: Money, description: &str) -> CoreResult<()> {
    validate_amount(amount)?;
    validate_description(description)?;
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

//! # Shop State
//!
//! Every store plus the cart, behind one async mutex.
//!
//! A command locks the shop once and runs its whole read-validate-write
//! sequence under that lock, so checkout, wallet moves and settlement stay
//! atomic even if two commands race.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ShopState                                                              │
//! │  ├── Mutex<Shop>                                                        │
//! │  │     ├── inventory   InventoryStore ─┐                                │
//! │  │     ├── sales       SalesLedger     │                                │
//! │  │     ├── wallet      WalletLedger    ├── shop KvStore                 │
//! │  │     ├── progress    ProgressionEngine┘                               │
//! │  │     └── cart        Cart (memory only)                               │
//! │  └── payment           PaymentHandshake ─── channel KvStore             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDate;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{error, info};

use tillquest_core::{Cart, DomainEvent, Money, ProgressReport};
use tillquest_db::{
    DbResult, InventoryStore, KvStore, PaymentHandshake, ProgressionEngine, SalesLedger,
    WalletLedger,
};

/// The stores a command works on.
#[derive(Debug)]
pub struct Shop<S: KvStore> {
    pub inventory: InventoryStore<S>,
    pub sales: SalesLedger<S>,
    pub wallet: WalletLedger<S>,
    pub progress: ProgressionEngine<S>,
    pub cart: Cart,
}

impl<S: KvStore> Shop<S> {
    async fn open(store: S, welcome_credit: Money) -> DbResult<Self> {
        Ok(Shop {
            inventory: InventoryStore::open(store.clone()).await?,
            sales: SalesLedger::open(store.clone()).await?,
            wallet: WalletLedger::open(store.clone(), welcome_credit).await?,
            progress: ProgressionEngine::open(store).await?,
            cart: Cart::new(),
        })
    }

    /// Feeds a shop event to the progression engine.
    ///
    /// The event's own effect has already been persisted, so a progression
    /// write failure is logged and reported as "no rewards", not as a
    /// failure of the command that raised the event.
    pub async fn emit(&mut self, event: DomainEvent) -> ProgressReport {
        match self.progress.handle(&event).await {
            Ok(report) => {
                for id in &report.unlocked {
                    info!(achievement = %id, "Achievement unlocked");
                }
                report
            }
            Err(e) => {
                error!(event = event.name(), error = %e, "Progress update failed");
                ProgressReport::default()
            }
        }
    }
}

/// Register state shared by all commands.
#[derive(Debug)]
pub struct ShopState<S: KvStore, C: KvStore> {
    store: S,
    shop: Mutex<Shop<S>>,
    payment: PaymentHandshake<C>,
    welcome_credit: Money,
}

impl<S: KvStore, C: KvStore> ShopState<S, C> {
    /// Opens every store from `store`; the payment channel lives in `channel`.
    pub async fn open(store: S, channel: C, welcome_credit: Money) -> DbResult<Self> {
        let shop = Shop::open(store.clone(), welcome_credit).await?;
        info!(
            items = shop.inventory.len(),
            sales = shop.sales.transaction_count(),
            persona = shop.wallet.persona().is_some(),
            "Shop opened"
        );

        Ok(ShopState {
            store,
            shop: Mutex::new(shop),
            payment: PaymentHandshake::new(channel),
            welcome_credit,
        })
    }

    /// Locks the shop for one command.
    pub async fn lock(&self) -> MutexGuard<'_, Shop<S>> {
        self.shop.lock().await
    }

    pub fn payment(&self) -> &PaymentHandshake<C> {
        &self.payment
    }

    /// Session start: runs the daily streak check for `today`.
    pub async fn start_session(&self, today: NaiveDate) -> DbResult<ProgressReport> {
        let mut shop = self.lock().await;
        shop.progress.check_daily_streak(today).await
    }

    /// Clears every persisted key and the cart, and drops the active
    /// persona.
    ///
    /// The shared channel only loses this register's own pending request; a
    /// request another register paid stays there to be settled.
    pub async fn reset_everything(&self) -> DbResult<()> {
        let mut shop = self.lock().await;
        let persona_id = shop.wallet.persona().map(|p| p.id.clone());

        self.store.clear().await?;
        if let Some(id) = persona_id {
            self.payment.withdraw(&id).await?;
        }
        *shop = Shop::open(self.store.clone(), self.welcome_credit).await?;

        info!("Shop reset");
        Ok(())
    }
}

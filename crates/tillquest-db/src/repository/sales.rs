//! # Sales Ledger
//!
//! Append-only history of finalized sales, newest first.
//!
//! ## Reads Are Folds
//! Revenue and counts are recomputed from the stored sales on every call;
//! there are no running counters to drift out of step with the history.

use chrono::{DateTime, TimeZone};
use tracing::{debug, info};

use tillquest_core::{CoreError, Money, Sale, SalesWindow};

use crate::codec;
use crate::error::DbResult;
use crate::kv::KvStore;

/// Store for recorded sales.
#[derive(Debug)]
pub struct SalesLedger<S: KvStore> {
    store: S,
    sales: Vec<Sale>,
}

impl<S: KvStore> SalesLedger<S> {
    /// Loads the sales history from the persisted store.
    pub async fn open(store: S) -> DbResult<Self> {
        let sales: Vec<Sale> = codec::load(&store).await?;
        debug!(count = sales.len(), "Sales history loaded");
        Ok(SalesLedger { store, sales })
    }

    /// Records a finalized sale at the front of the history.
    pub async fn record(&mut self, sale: Sale) -> DbResult<()> {
        let mut next = Vec::with_capacity(self.sales.len() + 1);
        next.push(sale);
        next.extend(self.sales.iter().cloned());

        self.commit(next).await?;
        if let Some(sale) = self.sales.first() {
            info!(id = %sale.id, total = %sale.total, lines = sale.lines.len(), "Sale recorded");
        }
        Ok(())
    }

    /// Every sale, newest first.
    pub fn all(&self) -> &[Sale] {
        &self.sales
    }

    pub fn get(&self, id: &str) -> Option<&Sale> {
        self.sales.iter().find(|s| s.id == id)
    }

    /// Lazily filtered view, in stored order.
    pub fn filter<'a, P>(&'a self, predicate: P) -> impl Iterator<Item = &'a Sale> + 'a
    where
        P: Fn(&Sale) -> bool + 'a,
    {
        self.sales.iter().filter(move |s| predicate(*s))
    }

    /// Sales inside `window` relative to `now`, judged in `now`'s time zone.
    pub fn window<'a, Tz: TimeZone + 'a>(
        &'a self,
        window: SalesWindow,
        now: DateTime<Tz>,
    ) -> impl Iterator<Item = &'a Sale> + 'a {
        self.sales
            .iter()
            .filter(move |s| window.contains(s.timestamp, &now))
    }

    /// Deletes one sale. Stock is not restored.
    pub async fn delete(&mut self, id: &str) -> DbResult<Sale> {
        let mut next = self.sales.clone();
        let index = next
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| CoreError::SaleNotFound(id.to_string()))?;
        let removed = next.remove(index);

        self.commit(next).await?;
        info!(id = %removed.id, "Sale deleted");
        Ok(removed)
    }

    /// Empties the history.
    pub async fn clear(&mut self) -> DbResult<()> {
        self.commit(Vec::new()).await?;
        info!("Sales history cleared");
        Ok(())
    }

    pub fn total_revenue(&self) -> Money {
        self.sales.iter().map(|s| s.total).sum()
    }

    pub fn transaction_count(&self) -> usize {
        self.sales.len()
    }

    pub fn revenue_in<Tz: TimeZone>(&self, window: SalesWindow, now: DateTime<Tz>) -> Money {
        self.window(window, now).map(|s| s.total).sum()
    }

    pub fn count_in<Tz: TimeZone>(&self, window: SalesWindow, now: DateTime<Tz>) -> usize {
        self.window(window, now).count()
    }

    async fn commit(&mut self, next: Vec<Sale>) -> DbResult<()> {
        codec::save(&self.store, &next).await?;
        self.sales = next;
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

//! Facade over the store, the rate cache and the aggregation engine.
//!
//! This is the surface the REST layer consumes; its four operations map
//! one-to-one onto the analytics endpoints. Rate-source failures never
//! surface here — only unsupported currency codes (a caller input error)
//! and store failures do.

use anyhow::Result;
use chrono::NaiveDate;
use std::sync::Arc;

use crate::analytics::{self, BudgetStatus, Conversion, MonthlyPoint, Period, Summary};
use crate::error::ConvertError;
use crate::rate_cache::RateCache;
use crate::transaction_store::TransactionStore;

pub struct Analytics {
    store: Arc<dyn TransactionStore>,
    rates: RateCache,
}

impl Analytics {
    pub fn new(store: Arc<dyn TransactionStore>, rates: RateCache) -> Self {
        Analytics { store, rates }
    }

    pub fn rates(&self) -> &RateCache {
        &self.rates
    }

    pub async fn summary(&self, account_ids: &[i64]) -> Result<Summary> {
        if account_ids.is_empty() {
            return Ok(Summary::default());
        }
        let transactions = self.store.transactions_for(account_ids).await?;
        Ok(analytics::summary(account_ids, &transactions, &self.rates).await)
    }

    pub async fn monthly(&self, account_ids: &[i64], year: i32) -> Result<Vec<MonthlyPoint>> {
        if account_ids.is_empty() {
            return Ok(analytics::monthly(account_ids, &[], year, &self.rates).await);
        }
        let transactions = self.store.transactions_for(account_ids).await?;
        Ok(analytics::monthly(account_ids, &transactions, year, &self.rates).await)
    }

    pub async fn budget_status(
        &self,
        account_ids: &[i64],
        period: Period,
    ) -> Result<Vec<BudgetStatus>> {
        if account_ids.is_empty() {
            return Ok(Vec::new());
        }
        let transactions = self.store.transactions_for(account_ids).await?;
        Ok(analytics::budget_status(account_ids, &transactions, period, &self.rates).await)
    }

    pub async fn convert(
        &self,
        amount: f64,
        from: &str,
        to: &str,
        date: Option<NaiveDate>,
    ) -> Result<Conversion, ConvertError> {
        analytics::convert_amount(amount, from, to, date, &self.rates).await
    }
}

//! Transaction store seam.
//!
//! The SQL-backed store lives in the bank service; this crate only consumes
//! it through a trait so the analytics layer can be exercised against an
//! in-memory fake or a JSON export.

use anyhow::Result;
use async_trait::async_trait;

use crate::core::transaction::Transaction;

#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Returns the transactions belonging to the given accounts, newest
    /// first. The caller has already resolved account ownership.
    async fn transactions_for(&self, account_ids: &[i64]) -> Result<Vec<Transaction>>;
}

/// In-memory store over a preloaded transaction list.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    transactions: Vec<Transaction>,
}

impl MemoryStore {
    pub fn new(transactions: Vec<Transaction>) -> Self {
        MemoryStore { transactions }
    }

    /// Every distinct account id present in the store, ascending.
    pub fn account_ids(&self) -> Vec<i64> {
        let mut ids: Vec<i64> = self.transactions.iter().map(|t| t.account_id).collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }
}

#[async_trait]
impl TransactionStore for MemoryStore {
    async fn transactions_for(&self, account_ids: &[i64]) -> Result<Vec<Transaction>> {
        let mut matched: Vec<Transaction> = self
            .transactions
            .iter()
            .filter(|t| account_ids.contains(&t.account_id))
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.occurred_at.cmp(&a.occurred_at));
        Ok(matched)
    }
}

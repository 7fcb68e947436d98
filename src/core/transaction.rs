//! The transaction record as supplied by the bank service.
//!
//! Transactions are read-only from this crate's perspective: the store owns
//! them, the analytics core only derives totals.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub account_id: i64,
    /// Occurrence timestamp; the bank service historically exported this
    /// column under the alias `date`.
    #[serde(alias = "date")]
    pub occurred_at: DateTime<Utc>,
    pub description: String,
    /// ISO-4217-like code, uppercase.
    pub currency: String,
    /// Signed: positive is income, negative is an expense.
    pub amount: f64,
    /// Free-form JSON attached by the importing source; the analytics core
    /// only reads the optional `category` label out of it.
    #[serde(default)]
    pub metadata: serde_json::Value,
}

impl Transaction {
    /// Calendar day the transaction occurred on; rate lookups key on this.
    pub fn day(&self) -> NaiveDate {
        self.occurred_at.date_naive()
    }

    pub fn category(&self) -> Option<&str> {
        self.metadata.get("category")?.as_str()
    }

    pub fn is_expense(&self) -> bool {
        self.amount < 0.0
    }
}

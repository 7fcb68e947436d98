//! Core domain types: rate tables, conversion, transactions.

pub mod convert;
pub mod rates;
pub mod transaction;

// Re-export main types for cleaner imports
pub use convert::{convert, round2};
pub use rates::RateTable;
pub use transaction::Transaction;

//! Exchange-rate source abstractions

use crate::core::rates::RateTable;
use crate::error::RateError;
use async_trait::async_trait;
use chrono::NaiveDate;

#[async_trait]
pub trait RateProvider: Send + Sync {
    /// Fetches the rate listing for `day`, or the most recent available
    /// listing when `day` is `None`.
    async fn fetch_rates(&self, day: Option<NaiveDate>) -> Result<RateTable, RateError>;
}

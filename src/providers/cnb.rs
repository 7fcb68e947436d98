//! Czech National Bank daily exchange rate provider.
//!
//! The CNB quotes every listed currency in CZK. An entry carries a currency
//! code, a unit multiplier (`amount`, e.g. 100 for JPY) and a mid-market
//! rate; the per-unit rate is `rate / amount`. The same endpoint serves the
//! current listing and, with a `date` query parameter, historical listings.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::core::rates::RateTable;
use crate::error::RateError;
use crate::rate_provider::RateProvider;

pub struct CnbRateProvider {
    base_url: String,
    base_currency: String,
    supported: HashSet<String>,
    timeout: Duration,
}

impl CnbRateProvider {
    pub fn new<I, S>(base_url: &str, base_currency: &str, supported: I, timeout: Duration) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        CnbRateProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            base_currency: base_currency.to_ascii_uppercase(),
            supported: supported
                .into_iter()
                .map(|c| c.as_ref().to_ascii_uppercase())
                .collect(),
            timeout,
        }
    }
}

/// The daily endpoint wraps entries in a `rates` object; some mirrors of the
/// historical endpoint return the bare array.
#[derive(Deserialize, Debug)]
#[serde(untagged)]
enum CnbPayload {
    Wrapped { rates: Vec<CnbRateEntry> },
    Bare(Vec<CnbRateEntry>),
}

impl CnbPayload {
    fn into_entries(self) -> Vec<CnbRateEntry> {
        match self {
            CnbPayload::Wrapped { rates } => rates,
            CnbPayload::Bare(rates) => rates,
        }
    }
}

#[derive(Deserialize, Debug)]
struct CnbRateEntry {
    #[serde(alias = "currencyCode", alias = "code")]
    currency_code: String,
    #[serde(default = "default_amount")]
    amount: f64,
    rate: RateValue,
}

fn default_amount() -> f64 {
    1.0
}

/// Mid-market rate, serialized as a number by the JSON API and as a string
/// (with a possible decimal comma) by the legacy text mirror.
#[derive(Deserialize, Debug)]
#[serde(untagged)]
enum RateValue {
    Number(f64),
    Text(String),
}

impl RateValue {
    fn as_f64(&self) -> Option<f64> {
        match self {
            RateValue::Number(n) => Some(*n),
            RateValue::Text(s) => s.trim().replace(',', ".").parse().ok(),
        }
    }
}

#[async_trait]
impl RateProvider for CnbRateProvider {
    #[instrument(name = "CnbRateFetch", skip(self), fields(day = ?day))]
    async fn fetch_rates(&self, day: Option<NaiveDate>) -> Result<RateTable, RateError> {
        let mut url = format!("{}/cnbapi/exrates/daily?lang=EN", self.base_url);
        if let Some(day) = day {
            url.push_str(&format!("&date={}", day.format("%Y-%m-%d")));
        }
        debug!("Requesting exchange rates from {url}");

        let client = reqwest::Client::builder()
            .user_agent("finlytics/0.1")
            .timeout(self.timeout)
            .build()
            .map_err(|e| RateError::SourceUnavailable(e.to_string()))?;

        let response = client
            .get(&url)
            .send()
            .await
            .map_err(|e| RateError::SourceUnavailable(format!("request error: {e} for {url}")))?;

        if !response.status().is_success() {
            return Err(RateError::SourceUnavailable(format!(
                "HTTP {} from {url}",
                response.status()
            )));
        }

        let text = response
            .text()
            .await
            .map_err(|e| RateError::SourceUnavailable(format!("body read error: {e}")))?;

        let payload: CnbPayload = serde_json::from_str(&text)
            .map_err(|e| RateError::MalformedResponse(format!("unparseable listing: {e}")))?;

        let entries = payload.into_entries();
        if entries.is_empty() {
            return Err(RateError::MalformedResponse("empty rate listing".into()));
        }

        let mut table = RateTable::new(&self.base_currency);
        for entry in entries {
            let code = entry.currency_code.to_ascii_uppercase();
            if !self.supported.contains(&code) {
                continue;
            }
            let Some(rate) = entry.rate.as_f64() else {
                debug!(%code, "skipping entry with non-numeric rate");
                continue;
            };
            if rate <= 0.0 || entry.amount <= 0.0 {
                debug!(%code, rate, "skipping entry with non-positive rate");
                continue;
            }
            table.insert(&code, rate / entry.amount);
        }

        debug!(currencies = table.len(), "parsed rate table");
        Ok(table)
    }
}

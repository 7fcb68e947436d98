//! Day-scoped exchange rate tables.
//!
//! A [`RateTable`] quotes every currency against a single base currency:
//! `rates[code]` is the number of base units one unit of `code` buys. The
//! base itself is always present at 1, and every stored rate is positive.
//! Conversions route through the base (a star graph, not a general one).

use once_cell::sync::Lazy;
use std::collections::BTreeMap;

/// Currencies the system will convert. Codes outside this set are rejected
/// by the provider and never enter a rate table.
pub const SUPPORTED_CURRENCIES: [&str; 6] = ["CZK", "EUR", "USD", "GBP", "CHF", "PLN"];

pub fn is_supported(code: &str) -> bool {
    SUPPORTED_CURRENCIES
        .iter()
        .any(|c| c.eq_ignore_ascii_case(code))
}

/// Static last-resort table, served verbatim when the provider is down and
/// nothing has been cached yet. Covers every supported currency.
pub static DEFAULT_FALLBACK_RATES: Lazy<RateTable> = Lazy::new(|| {
    let mut table = RateTable::new("CZK");
    table.insert("EUR", 24.8);
    table.insert("USD", 23.1);
    table.insert("GBP", 28.9);
    table.insert("CHF", 25.4);
    table.insert("PLN", 5.9);
    table
});

#[derive(Debug, Clone, PartialEq)]
pub struct RateTable {
    base: String,
    rates: BTreeMap<String, f64>,
}

impl RateTable {
    /// Creates an empty table quoted against `base`; the base maps to 1.
    pub fn new(base: &str) -> Self {
        let base = base.to_ascii_uppercase();
        let mut rates = BTreeMap::new();
        rates.insert(base.clone(), 1.0);
        RateTable { base, rates }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    /// Stores a per-unit rate. Non-positive and non-finite values are
    /// dropped rather than stored, keeping the all-positive invariant.
    pub fn insert(&mut self, code: &str, per_unit: f64) {
        if per_unit > 0.0 && per_unit.is_finite() {
            self.rates.insert(code.to_ascii_uppercase(), per_unit);
        }
    }

    pub fn rate(&self, code: &str) -> Option<f64> {
        self.rates.get(&code.to_ascii_uppercase()).copied()
    }

    pub fn contains(&self, code: &str) -> bool {
        self.rates.contains_key(&code.to_ascii_uppercase())
    }

    /// Adds every entry of `other` that is missing here. Used to complete a
    /// freshly fetched table so it covers the whole supported set.
    pub fn backfill_from(&mut self, other: &RateTable) {
        for (code, rate) in &other.rates {
            self.rates.entry(code.clone()).or_insert(*rate);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.rates.iter().map(|(code, rate)| (code.as_str(), *rate))
    }

    /// Number of quoted currencies, the base included.
    pub fn len(&self) -> usize {
        self.rates.len()
    }
}

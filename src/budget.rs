//! Per-period category budgets.
//!
//! Limits are stored per `YYYY-MM` period; spent-so-far is derived from the
//! aggregation engine's budget status each time, never stored
//! authoritatively. Alerting on limit overruns is the client's concern.

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::analytics::BudgetStatus;

/// Known budget categories with their default monthly limits (base
/// currency), matching the bank service's seed data.
pub const CATEGORY_DEFAULTS: [(&str, f64); 7] = [
    ("rent", 16000.0),
    ("groceries", 6000.0),
    ("transport", 2500.0),
    ("entertainment", 5000.0),
    ("travel", 7000.0),
    ("education", 3000.0),
    ("health", 2000.0),
];

pub fn is_known_category(category: &str) -> bool {
    CATEGORY_DEFAULTS.iter().any(|(key, _)| *key == category)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    pub category: String,
    /// Positive, in base currency.
    pub limit: f64,
    /// Derived from transactions; zero until a spend snapshot is applied.
    pub spent: f64,
}

/// Budgets keyed by `YYYY-MM` period. A period materializes with the
/// category defaults on first access.
#[derive(Debug, Default, Clone)]
pub struct BudgetBook {
    periods: HashMap<String, Vec<Budget>>,
}

impl BudgetBook {
    pub fn new() -> Self {
        BudgetBook::default()
    }

    /// `YYYY-MM` key for a year and 0-based month index.
    pub fn month_key(year: i32, month_index: u32) -> String {
        format!("{year}-{:02}", month_index + 1)
    }

    pub fn budgets_for(&mut self, period: &str) -> &[Budget] {
        self.periods
            .entry(period.to_string())
            .or_insert_with(default_budgets)
    }

    /// Sets or adds a category limit for a period. Unknown categories and
    /// non-positive limits are rejected.
    pub fn set_limit(&mut self, period: &str, category: &str, limit: f64) -> Result<()> {
        if !is_known_category(category) {
            bail!("unknown budget category: {category}");
        }
        if limit <= 0.0 {
            bail!("budget limit must be positive, got {limit}");
        }
        let budgets = self
            .periods
            .entry(period.to_string())
            .or_insert_with(default_budgets);
        match budgets.iter_mut().find(|b| b.category == category) {
            Some(budget) => budget.limit = limit,
            None => budgets.push(Budget {
                category: category.to_string(),
                limit,
                spent: 0.0,
            }),
        }
        Ok(())
    }

    /// Removes a category budget from a period; returns whether it existed.
    pub fn remove(&mut self, period: &str, category: &str) -> bool {
        match self.periods.get_mut(period) {
            Some(budgets) => {
                let before = budgets.len();
                budgets.retain(|b| b.category != category);
                budgets.len() < before
            }
            None => false,
        }
    }

    /// Overwrites the period's spent figures from a computed spend
    /// snapshot. Categories absent from the snapshot reset to zero.
    pub fn apply_spent(&mut self, period: &str, statuses: &[BudgetStatus]) {
        let budgets = self
            .periods
            .entry(period.to_string())
            .or_insert_with(default_budgets);
        for budget in budgets.iter_mut() {
            budget.spent = statuses
                .iter()
                .find(|s| s.category == budget.category)
                .map(|s| s.spent)
                .unwrap_or(0.0);
        }
    }
}

fn default_budgets() -> Vec<Budget> {
    CATEGORY_DEFAULTS
        .iter()
        .map(|(category, limit)| Budget {
            category: (*category).to_string(),
            limit: *limit,
            spent: 0.0,
        })
        .collect()
}

//! Aggregation of transactions into summary, monthly and budget shapes.
//!
//! Every transaction is converted to the base currency using the rate table
//! for its *own* occurrence day — rates are date-sensitive, one table per
//! batch would skew multi-month ranges. Sums accumulate unrounded values;
//! rounding to 2 decimals happens once, on the final output fields.

use anyhow::{Result, anyhow};
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use futures::future::join_all;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

use crate::core::convert::{convert, round2};
use crate::core::rates::RateTable;
use crate::core::transaction::Transaction;
use crate::error::ConvertError;
use crate::rate_cache::RateCache;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Summary {
    pub total: f64,
    pub income: f64,
    /// Kept negative: expenses are a signed sum, not an absolute value.
    pub expenses: f64,
    pub balance: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyPoint {
    /// Calendar month index, 0–11.
    pub month: u32,
    pub income: f64,
    /// Absolute value of the month's converted expenses.
    pub expenses: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetStatus {
    pub category: String,
    pub spent: f64,
}

/// Result of the convert endpoint: the input echoed back plus the rounded
/// conversion.
#[derive(Debug, Clone, Serialize)]
pub struct Conversion {
    pub amount: f64,
    pub from: String,
    pub to: String,
    pub date: NaiveDate,
    pub result: f64,
}

/// A calendar month, parsed from the `YYYY-MM` wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Period {
    pub year: i32,
    /// 1–12.
    pub month: u32,
}

impl Period {
    pub fn contains(&self, ts: &DateTime<Utc>) -> bool {
        ts.year() == self.year && ts.month() == self.month
    }
}

impl FromStr for Period {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let (year, month) = s
            .split_once('-')
            .ok_or_else(|| anyhow!("invalid period {s:?}, expected YYYY-MM"))?;
        let year: i32 = year.parse().map_err(|_| anyhow!("invalid year in {s:?}"))?;
        let month: u32 = month.parse().map_err(|_| anyhow!("invalid month in {s:?}"))?;
        if !(1..=12).contains(&month) {
            return Err(anyhow!("month out of range in {s:?}"));
        }
        Ok(Period { year, month })
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Resolves one rate table per distinct occurrence day, concurrently.
async fn rate_tables_for<'a, I>(transactions: I, rates: &RateCache) -> HashMap<NaiveDate, RateTable>
where
    I: IntoIterator<Item = &'a Transaction>,
{
    let days: BTreeSet<NaiveDate> = transactions.into_iter().map(|t| t.day()).collect();
    let lookups = days
        .into_iter()
        .map(|day| async move { (day, rates.get_rates(day).await) });
    join_all(lookups).await.into_iter().collect()
}

/// Converts a transaction amount to the table's base currency. Transactions
/// in a currency the table does not know are skipped with a warning rather
/// than failing the whole aggregation.
fn to_base(tx: &Transaction, table: &RateTable) -> Option<f64> {
    match convert(tx.amount, &tx.currency, table.base(), table) {
        Ok(converted) => Some(converted),
        Err(ConvertError::UnsupportedCurrency(code)) => {
            warn!(tx_id = tx.id, %code, "skipping transaction in unsupported currency");
            None
        }
    }
}

/// Income/expense totals over the whole transaction list.
///
/// An empty account set short-circuits to all zeros without any rate lookup.
pub async fn summary(
    account_ids: &[i64],
    transactions: &[Transaction],
    rates: &RateCache,
) -> Summary {
    if account_ids.is_empty() {
        return Summary::default();
    }

    let tables = rate_tables_for(transactions, rates).await;
    let mut income = 0.0;
    let mut expenses = 0.0;
    for tx in transactions {
        let Some(table) = tables.get(&tx.day()) else {
            continue;
        };
        let Some(converted) = to_base(tx, table) else {
            continue;
        };
        if converted >= 0.0 {
            income += converted;
        } else {
            expenses += converted;
        }
    }

    let balance = income + expenses;
    Summary {
        total: round2(balance),
        income: round2(income),
        expenses: round2(expenses),
        balance: round2(balance),
        count: transactions.len(),
    }
}

/// Per-month income/expense series for one year: exactly 12 entries in
/// month order, zero-filled for empty months, expenses as absolute values.
pub async fn monthly(
    account_ids: &[i64],
    transactions: &[Transaction],
    year: i32,
    rates: &RateCache,
) -> Vec<MonthlyPoint> {
    let mut points: Vec<MonthlyPoint> = (0..12)
        .map(|month| MonthlyPoint {
            month,
            income: 0.0,
            expenses: 0.0,
        })
        .collect();
    if account_ids.is_empty() {
        return points;
    }

    let in_year: Vec<&Transaction> = transactions
        .iter()
        .filter(|t| t.occurred_at.year() == year)
        .collect();
    let tables = rate_tables_for(in_year.iter().copied(), rates).await;

    for tx in in_year {
        let Some(table) = tables.get(&tx.day()) else {
            continue;
        };
        let Some(converted) = to_base(tx, table) else {
            continue;
        };
        let point = &mut points[tx.occurred_at.month0() as usize];
        if converted >= 0.0 {
            point.income += converted;
        } else {
            point.expenses += -converted;
        }
    }

    for point in &mut points {
        point.income = round2(point.income);
        point.expenses = round2(point.expenses);
    }
    points
}

/// Spend per category for one `YYYY-MM` period: negative amounts carrying a
/// metadata category only, categories with no observed spend omitted.
pub async fn budget_status(
    account_ids: &[i64],
    transactions: &[Transaction],
    period: Period,
    rates: &RateCache,
) -> Vec<BudgetStatus> {
    if account_ids.is_empty() {
        return Vec::new();
    }

    let in_period: Vec<&Transaction> = transactions
        .iter()
        .filter(|t| t.is_expense() && t.category().is_some() && period.contains(&t.occurred_at))
        .collect();
    let tables = rate_tables_for(in_period.iter().copied(), rates).await;

    let mut spent: BTreeMap<String, f64> = BTreeMap::new();
    for tx in in_period {
        let Some(table) = tables.get(&tx.day()) else {
            continue;
        };
        let Some(converted) = to_base(tx, table) else {
            continue;
        };
        let category = tx.category().unwrap_or_default().to_string();
        *spent.entry(category).or_insert(0.0) += converted.abs();
    }

    spent
        .into_iter()
        .map(|(category, spent)| BudgetStatus {
            category,
            spent: round2(spent),
        })
        .collect()
}

/// The convert endpoint: direct pass-through to the cache and converter.
/// The only failure surfaced to callers is an unrecognized currency code.
pub async fn convert_amount(
    amount: f64,
    from: &str,
    to: &str,
    date: Option<NaiveDate>,
    rates: &RateCache,
) -> Result<Conversion, ConvertError> {
    let date = date.unwrap_or_else(|| Utc::now().date_naive());
    let table = rates.get_rates(date).await;
    let result = convert(amount, from, to, &table)?;
    Ok(Conversion {
        amount,
        from: from.to_ascii_uppercase(),
        to: to.to_ascii_uppercase(),
        date,
        result: round2(result),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RateError;
    use crate::rate_provider::RateProvider;
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Serves `{CZK: 1, EUR: 25, USD: 23}` for every day and counts calls.
    struct FixedProvider {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl RateProvider for FixedProvider {
        async fn fetch_rates(&self, _day: Option<NaiveDate>) -> Result<RateTable, RateError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut table = RateTable::new("CZK");
            table.insert("EUR", 25.0);
            table.insert("USD", 23.0);
            Ok(table)
        }
    }

    fn cache() -> (RateCache, Arc<FixedProvider>) {
        let provider = Arc::new(FixedProvider {
            calls: AtomicUsize::new(0),
        });
        let cache = RateCache::new(
            Arc::clone(&provider) as Arc<dyn RateProvider>,
            crate::core::rates::DEFAULT_FALLBACK_RATES.clone(),
        );
        (cache, provider)
    }

    fn tx(id: i64, date: &str, currency: &str, amount: f64, category: Option<&str>) -> Transaction {
        Transaction {
            id,
            account_id: 1,
            occurred_at: format!("{date}T10:00:00Z").parse().unwrap(),
            description: format!("tx {id}"),
            currency: currency.to_string(),
            amount,
            metadata: match category {
                Some(c) => serde_json::json!({ "category": c }),
                None => serde_json::Value::Null,
            },
        }
    }

    #[tokio::test]
    async fn test_summary_of_same_day_czk_transactions() {
        let (cache, _) = cache();
        let txs = vec![
            tx(1, "2025-03-12", "CZK", 1000.0, None),
            tx(2, "2025-03-12", "CZK", -500.0, None),
        ];

        let result = summary(&[1], &txs, &cache).await;
        assert_eq!(result.income, 1000.0);
        assert_eq!(result.expenses, -500.0);
        assert_eq!(result.balance, 500.0);
        assert_eq!(result.total, 500.0);
        assert_eq!(result.count, 2);
    }

    #[tokio::test]
    async fn test_summary_converts_per_occurrence_day() {
        let (cache, provider) = cache();
        let txs = vec![
            tx(1, "2025-03-12", "EUR", 10.0, None),
            tx(2, "2025-04-01", "EUR", -4.0, None),
        ];

        let result = summary(&[1], &txs, &cache).await;
        assert_eq!(result.income, 250.0);
        assert_eq!(result.expenses, -100.0);
        assert_eq!(result.balance, 150.0);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2, "one per day");
    }

    #[tokio::test]
    async fn test_summary_of_empty_account_set_skips_rate_lookups() {
        let (cache, provider) = cache();
        let txs = vec![tx(1, "2025-03-12", "CZK", 100.0, None)];

        let result = summary(&[], &txs, &cache).await;
        assert_eq!(result, Summary::default());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_summary_of_empty_transaction_list_is_all_zero() {
        let (cache, _) = cache();
        let result = summary(&[1], &[], &cache).await;
        assert_eq!(
            result,
            Summary {
                total: 0.0,
                income: 0.0,
                expenses: 0.0,
                balance: 0.0,
                count: 0
            }
        );
    }

    #[tokio::test]
    async fn test_summary_sums_unrounded_then_rounds_once() {
        let (cache, _) = cache();
        // 0.004 + 0.004 = 0.008 -> 0.01; per-transaction rounding would
        // have given 0.0 + 0.0 = 0.0.
        let txs = vec![
            tx(1, "2025-03-12", "CZK", 0.004, None),
            tx(2, "2025-03-12", "CZK", 0.004, None),
        ];
        let result = summary(&[1], &txs, &cache).await;
        assert_eq!(result.income, 0.01);
    }

    #[tokio::test]
    async fn test_monthly_has_twelve_zero_filled_entries() {
        let (cache, _) = cache();
        let result = monthly(&[1], &[], 2025, &cache).await;
        assert_eq!(result.len(), 12);
        for (index, point) in result.iter().enumerate() {
            assert_eq!(point.month, index as u32);
            assert_eq!(point.income, 0.0);
            assert_eq!(point.expenses, 0.0);
        }
    }

    #[tokio::test]
    async fn test_monthly_buckets_by_month_and_restricts_to_year() {
        let (cache, _) = cache();
        let txs = vec![
            tx(1, "2025-01-05", "CZK", 38000.0, None),
            tx(2, "2025-01-12", "CZK", -14000.0, None),
            tx(3, "2025-03-02", "EUR", -20.0, None),
            tx(4, "2024-01-05", "CZK", 99999.0, None), // other year, ignored
        ];

        let result = monthly(&[1], &txs, 2025, &cache).await;
        assert_eq!(result[0].income, 38000.0);
        assert_eq!(result[0].expenses, 14000.0, "absolute value");
        assert_eq!(result[2].expenses, 500.0, "20 EUR at 25");
        assert_eq!(result[1].income, 0.0);
    }

    #[tokio::test]
    async fn test_budget_status_converts_and_groups_by_category() {
        let (cache, _) = cache();
        let txs = vec![
            tx(1, "2025-03-02", "EUR", -20.0, Some("travel")),
            tx(2, "2025-03-15", "CZK", -1200.0, Some("groceries")),
            tx(3, "2025-03-20", "CZK", -800.0, Some("groceries")),
            tx(4, "2025-03-21", "CZK", 5000.0, Some("salary")), // income, ignored
            tx(5, "2025-03-22", "CZK", -300.0, None),           // no category, ignored
            tx(6, "2025-04-01", "CZK", -100.0, Some("travel")), // other month, ignored
        ];

        let period: Period = "2025-03".parse().unwrap();
        let result = budget_status(&[1], &txs, period, &cache).await;
        assert_eq!(
            result,
            vec![
                BudgetStatus {
                    category: "groceries".into(),
                    spent: 2000.0
                },
                BudgetStatus {
                    category: "travel".into(),
                    spent: 500.0
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_budget_status_of_empty_account_set_is_empty() {
        let (cache, provider) = cache();
        let txs = vec![tx(1, "2025-03-02", "EUR", -20.0, Some("travel"))];
        let period: Period = "2025-03".parse().unwrap();

        let result = budget_status(&[], &txs, period, &cache).await;
        assert!(result.is_empty());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_convert_amount_rounds_result() {
        let (cache, _) = cache();
        let date = NaiveDate::from_ymd_opt(2025, 3, 12).unwrap();
        let conversion = convert_amount(100.0, "czk", "eur", Some(date), &cache)
            .await
            .unwrap();
        assert_eq!(conversion.from, "CZK");
        assert_eq!(conversion.to, "EUR");
        assert_eq!(conversion.date, date);
        assert_eq!(conversion.result, 4.0);
    }

    #[tokio::test]
    async fn test_convert_amount_rejects_unknown_currency() {
        let (cache, _) = cache();
        let err = convert_amount(1.0, "XAU", "CZK", None, &cache)
            .await
            .unwrap_err();
        assert_eq!(err, ConvertError::UnsupportedCurrency("XAU".into()));
    }

    #[test]
    fn test_period_parsing() {
        let period: Period = "2025-03".parse().unwrap();
        assert_eq!(
            period,
            Period {
                year: 2025,
                month: 3
            }
        );
        assert_eq!(period.to_string(), "2025-03");
        assert!("2025".parse::<Period>().is_err());
        assert!("2025-13".parse::<Period>().is_err());
        assert!("abcd-01".parse::<Period>().is_err());
    }
}

use super::ui;
use anyhow::Result;
use chrono::NaiveDate;

use crate::rate_cache::RateCache;
use crate::{analytics, error::ConvertError};

pub async fn run(
    amount: f64,
    from: &str,
    to: &str,
    date: Option<NaiveDate>,
    rates: &RateCache,
) -> Result<()> {
    match analytics::convert_amount(amount, from, to, date, rates).await {
        Ok(conversion) => {
            println!(
                "{} {} = {} {} (as of {})",
                conversion.amount,
                conversion.from,
                ui::style_text(&format!("{:.2}", conversion.result), ui::StyleType::TotalValue),
                conversion.to,
                conversion.date
            );
            Ok(())
        }
        Err(err @ ConvertError::UnsupportedCurrency(_)) => {
            eprintln!("{}", ui::style_text(&err.to_string(), ui::StyleType::Error));
            Err(err.into())
        }
    }
}

use super::ui;
use anyhow::Result;
use chrono::{NaiveDate, Utc};
use comfy_table::Cell;

use crate::rate_cache::{RateCache, RateSource};

pub async fn run(date: Option<NaiveDate>, rates: &RateCache) -> Result<()> {
    let date = date.unwrap_or_else(|| Utc::now().date_naive());
    let resolved = rates.get_rates_with_source(date).await;

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Currency"),
        ui::header_cell(&format!("Rate ({})", resolved.table.base())),
    ]);
    for (code, rate) in resolved.table.iter() {
        table.add_row(vec![Cell::new(code), ui::amount_cell(rate)]);
    }

    println!(
        "Exchange rates for {}\n\n{table}",
        ui::style_text(&date.to_string(), ui::StyleType::Title)
    );
    if resolved.source != RateSource::Fresh {
        let note = format!("Note: degraded rates ({:?})", resolved.source);
        eprintln!("{}", ui::style_text(&note, ui::StyleType::Error));
    }
    Ok(())
}

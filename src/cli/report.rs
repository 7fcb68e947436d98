//! Rendering for the summary, monthly and budget reports.

use super::ui;
use anyhow::{Context, Result};
use comfy_table::Cell;
use std::path::Path;

use crate::analytics::Period;
use crate::budget::BudgetBook;
use crate::core::transaction::Transaction;
use crate::service::Analytics;
use crate::transaction_store::MemoryStore;

const MONTH_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Loads a transaction export (JSON array in the bank service's shape).
pub fn load_transactions<P: AsRef<Path>>(path: P) -> Result<MemoryStore> {
    let raw = std::fs::read_to_string(path.as_ref()).with_context(|| {
        format!(
            "Failed to read transaction file: {}",
            path.as_ref().display()
        )
    })?;
    let transactions: Vec<Transaction> = serde_json::from_str(&raw).with_context(|| {
        format!(
            "Failed to parse transaction file: {}",
            path.as_ref().display()
        )
    })?;
    Ok(MemoryStore::new(transactions))
}

pub async fn summary(service: &Analytics, account_ids: &[i64], base: &str) -> Result<()> {
    let summary = service.summary(account_ids).await?;

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell(&format!("Income ({base})")),
        ui::header_cell(&format!("Expenses ({base})")),
        ui::header_cell(&format!("Balance ({base})")),
        ui::header_cell("Transactions"),
    ]);
    table.add_row(vec![
        ui::signed_amount_cell(summary.income),
        ui::signed_amount_cell(summary.expenses),
        ui::signed_amount_cell(summary.balance),
        Cell::new(summary.count.to_string()),
    ]);

    println!(
        "{}\n\n{table}",
        ui::style_text("Account summary", ui::StyleType::Title)
    );
    Ok(())
}

pub async fn monthly(service: &Analytics, account_ids: &[i64], year: i32, base: &str) -> Result<()> {
    let points = service.monthly(account_ids, year).await?;

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Month"),
        ui::header_cell(&format!("Income ({base})")),
        ui::header_cell(&format!("Expenses ({base})")),
    ]);
    for point in &points {
        table.add_row(vec![
            Cell::new(MONTH_NAMES[point.month as usize]),
            ui::amount_cell(point.income),
            ui::amount_cell(point.expenses),
        ]);
    }

    println!(
        "{}\n\n{table}",
        ui::style_text(&format!("Monthly trend {year}"), ui::StyleType::Title)
    );
    Ok(())
}

pub async fn budgets(
    service: &Analytics,
    account_ids: &[i64],
    period: Period,
    base: &str,
) -> Result<()> {
    let statuses = service.budget_status(account_ids, period).await?;

    let mut book = BudgetBook::new();
    let key = period.to_string();
    book.apply_spent(&key, &statuses);

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Category"),
        ui::header_cell(&format!("Spent ({base})")),
        ui::header_cell(&format!("Limit ({base})")),
    ]);
    for budget in book.budgets_for(&key) {
        let spent_cell = if budget.spent > budget.limit {
            Cell::new(ui::style_text(
                &format!("{:.2}", budget.spent),
                ui::StyleType::Error,
            ))
        } else {
            ui::amount_cell(budget.spent)
        };
        table.add_row(vec![
            Cell::new(&budget.category),
            spent_cell,
            ui::amount_cell(budget.limit),
        ]);
    }

    println!(
        "{}\n\n{table}",
        ui::style_text(&format!("Budgets {key}"), ui::StyleType::Title)
    );
    Ok(())
}

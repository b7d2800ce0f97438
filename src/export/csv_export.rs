use anyhow::{Context, Result};
use rust_decimal::Decimal;
use std::io::Write;
use std::path::Path;

use crate::analytics::in_month;
use crate::models::{Expense, MonthKey};

const HEADER: [&str; 5] = ["Date", "Category", "Amount", "Payment Method", "Notes"];

/// `12.50` → `"12.5"`: no trailing zeros, separators or currency sign.
fn plain_amount(amount: Decimal) -> String {
    amount.normalize().to_string()
}

pub(crate) fn default_file_name(month: MonthKey) -> String {
    format!("expenses-{month}.csv")
}

/// Write the header and one row per expense dated in `month`, in list
/// order. Returns the number of expense rows.
pub(crate) fn write_month<W: Write>(writer: W, expenses: &[Expense], month: MonthKey) -> Result<usize> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(HEADER)
        .context("Failed to write CSV header")?;

    let mut rows = 0;
    for e in in_month(expenses, month) {
        wtr.write_record([
            e.date.format("%Y-%m-%d").to_string(),
            e.category.as_str().to_string(),
            plain_amount(e.amount),
            e.payment_method.clone(),
            e.notes_or_empty().to_string(),
        ])
        .with_context(|| format!("Failed to write expense {}", e.id))?;
        rows += 1;
    }
    wtr.flush().context("Failed to flush CSV output")?;
    Ok(rows)
}

pub(crate) fn export_month_to_path(path: &Path, expenses: &[Expense], month: MonthKey) -> Result<usize> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    write_month(file, expenses, month)
}

#[cfg(test)]
#[path = "csv_export_tests.rs"]
mod tests;

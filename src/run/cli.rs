use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use std::path::PathBuf;
use std::str::FromStr;

use super::format::{
    format_amount, format_percent, format_remaining, format_utilization, insight_sentence,
    progress_bar, share_percent, truncate,
};
use crate::analytics::{
    spending_insight, trend_series, yearly_overview, ExpenseFilter, TrendPoint, Views,
};
use crate::export;
use crate::models::{
    BudgetPatch, Category, DateWindow, Expense, ExpensePatch, MonthKey, NewBudget, NewExpense,
    PAYMENT_METHODS,
};
use crate::session::Session;
use crate::store::StoreError;

const BAR_WIDTH: usize = 20;

pub(crate) async fn as_cli(args: &[String], session: &Session, today: NaiveDate) -> Result<()> {
    let Some(command) = args.first() else {
        print_usage();
        return Ok(());
    };
    let rest = &args[1..];
    match command.as_str() {
        "summary" | "s" => cli_summary(rest, session, today).await,
        "report" => cli_report(rest, session, today).await,
        "trend" => cli_trend(session, today).await,
        "year" => cli_year(rest, session, today).await,
        "expenses" | "ls" => cli_expenses(rest, session).await,
        "add" => cli_add(rest, session, today).await,
        "edit" => cli_edit(rest, session).await,
        "rm" => cli_rm(rest, session).await,
        "budgets" => cli_budgets(rest, session, today).await,
        "budget" => cli_budget(rest, session, today).await,
        "export" => cli_export(rest, session, today).await,
        "--help" | "-h" | "help" => {
            print_usage();
            Ok(())
        }
        "--version" | "-V" | "version" => {
            println!("spendwise {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        other => {
            print_usage();
            anyhow::bail!("Unknown command: {other}");
        }
    }
}

/// Strip a leading `--user <id>` from the arguments.
pub(crate) fn split_user_flag(args: &[String]) -> Result<(Option<String>, &[String])> {
    match args.first().map(String::as_str) {
        Some("--user") => {
            let user = args
                .get(1)
                .filter(|u| !u.trim().is_empty())
                .ok_or_else(|| anyhow::anyhow!("--user needs a user id"))?;
            Ok((Some(user.trim().to_string()), &args[2..]))
        }
        _ => Ok((None, args)),
    }
}

fn print_usage() {
    println!("spendwise: personal expense tracker");
    println!();
    println!("Usage: spendwise [--user <id>] <command>");
    println!();
    println!("Commands:");
    println!("  summary [YYYY-MM]             Month at a glance with comparison to last month");
    println!("  report [YYYY-MM]              Detailed monthly report");
    println!("  trend                         Daily spending over the last month");
    println!("  year [YYYY]                   Monthly totals for a year");
    println!("  expenses                      List expenses");
    println!("    --month <YYYY-MM>           Only this month");
    println!("    --search <text>             Match notes or category name");
    println!("    --category <name>           Only this category");
    println!("    --method <name>             Only this payment method");
    println!("  add <amount> <category>       Record an expense");
    println!("    --date <YYYY-MM-DD>         Day of the expense (default: today)");
    println!("    --method <name>             Payment method (default: UPI)");
    println!("    --notes <text>              Free-form notes");
    println!("  edit <id>                     Change an expense");
    println!("    --amount, --category, --date, --method, --notes");
    println!("  rm <id>                       Delete an expense");
    println!("  budgets [YYYY-MM]             Budgets with spending and status");
    println!("  budget set <category> <limit> Create a monthly budget");
    println!("    --month <YYYY-MM>           Month of the budget (default: current)");
    println!("  budget edit <id> <limit>      Change a budget's limit");
    println!("  budget rm <id>                Delete a budget");
    println!("  export [path]                 Export a month of expenses to CSV");
    println!("    --month <YYYY-MM>           Month to export (default: current)");
    println!("  --help, -h                    Show this help");
    println!("  --version, -V                 Show version");
    println!();
    println!("Categories: {}", category_names());
    println!("Payment methods: {}", PAYMENT_METHODS.join(", "));
}

// ── Reports ──────────────────────────────────────────────────

async fn cli_summary(args: &[String], session: &Session, today: NaiveDate) -> Result<()> {
    let month = month_arg(positional(args).first().copied(), today)?;
    // The trend ends on the last day of a past month
    let day = if month == MonthKey::of(today) {
        today
    } else {
        month.last_day()
    };
    session.refresh().await;

    let mut views = Views::new();
    let d = views.dashboard(session, day);

    println!("Spendwise: {}", month.long_name());
    println!("{}", "─".repeat(44));
    println!("  Spent:         {}", format_amount(d.totals.current));
    println!("  Last month:    {}", format_amount(d.totals.previous));
    println!("  Change:        {}%", d.totals.percent_change);
    println!("  Transactions:  {}", d.transaction_count);
    if let Some(top) = &d.top_category {
        println!("  Top category:  {} ({})", top.category, format_amount(top.amount));
    }
    if !d.top_methods.is_empty() {
        let methods: Vec<String> = d
            .top_methods
            .iter()
            .map(|m| format!("{} ({})", m.method, m.count))
            .collect();
        println!("  Paid with:     {}", methods.join(", "));
    }
    println!();
    println!("  {}", insight_sentence(spending_insight(&d.totals)));

    if !d.breakdown.is_empty() {
        println!();
        println!("Spending by Category:");
        for entry in &d.breakdown {
            println!(
                "  {:<20} {:>14}  {}",
                entry.category.as_str(),
                format_amount(entry.amount),
                entry.color
            );
        }
    }

    if !d.top_expenses.is_empty() {
        println!();
        println!("Top Expenses:");
        for e in &d.top_expenses {
            print_expense_line(e);
        }
    }

    if !d.recent.is_empty() {
        println!();
        println!("Recent:");
        for e in &d.recent {
            print_expense_line(e);
        }
    }
    Ok(())
}

async fn cli_report(args: &[String], session: &Session, today: NaiveDate) -> Result<()> {
    let month = month_arg(positional(args).first().copied(), today)?;
    session.expenses().list().await;

    let mut views = Views::new();
    let r = views.report(session, month);

    println!("Monthly Report: {}", month.long_name());
    println!("{}", "─".repeat(44));
    println!("  Total:          {}", format_amount(r.total));
    println!("  Transactions:   {}", r.transaction_count);
    println!("  Daily average:  {}", format_amount(r.daily_average));

    if r.transaction_count == 0 {
        println!();
        println!("No expenses for {month}");
        return Ok(());
    }

    println!();
    println!("By Category:");
    for entry in &r.breakdown {
        println!(
            "  {:<20} {:>14} {:>7}  {}",
            entry.category.as_str(),
            format_amount(entry.amount),
            format_percent(share_percent(entry.amount, r.total)),
            entry.color
        );
    }

    println!();
    println!("Top Expenses:");
    for e in &r.top_expenses {
        print_expense_line(e);
    }

    println!();
    println!("Daily:");
    print_series(&r.daily);
    Ok(())
}

async fn cli_trend(session: &Session, today: NaiveDate) -> Result<()> {
    let expenses = session.expenses().list().await;
    let window = DateWindow::trailing_month(today);
    let series = trend_series(&expenses, window, "%m/%d");
    let total: Decimal = series.iter().map(|p| p.amount).sum();

    println!("Spending {} to {}", window.start, window.end);
    println!("{}", "─".repeat(44));
    print_series(&series);
    println!("{}", "─".repeat(44));
    println!("  Total: {}", format_amount(total));
    Ok(())
}

async fn cli_year(args: &[String], session: &Session, today: NaiveDate) -> Result<()> {
    let year = match positional(args).first() {
        Some(raw) => raw
            .parse::<i32>()
            .ok()
            .filter(|y| (1..=9999).contains(y))
            .with_context(|| format!("Invalid year '{raw}', expected YYYY"))?,
        None => today.year(),
    };
    let expenses = session.expenses().list().await;
    let months = yearly_overview(&expenses, year);
    let max = months.iter().map(|m| m.amount).max().unwrap_or_default();

    println!("Yearly Overview {year}");
    println!("{}", "─".repeat(44));
    for m in &months {
        println!(
            "  {}  {:>14}  {}",
            m.label,
            format_amount(m.amount),
            progress_bar(share_percent(m.amount, max), BAR_WIDTH)
        );
    }
    let total: Decimal = months.iter().map(|m| m.amount).sum();
    println!("{}", "─".repeat(44));
    println!("  Total {:>14}", format_amount(total));
    Ok(())
}

// ── Expenses ─────────────────────────────────────────────────

async fn cli_expenses(args: &[String], session: &Session) -> Result<()> {
    let filter = ExpenseFilter {
        search: flag(args, "--search").unwrap_or_default().to_string(),
        category: flag(args, "--category").map(parse_category).transpose()?,
        payment_method: flag(args, "--method").map(parse_method).transpose()?,
        month: flag(args, "--month").map(MonthKey::from_str).transpose()?,
    };

    let expenses = session.expenses().list().await;
    let matched = filter.apply(&expenses);
    if matched.is_empty() {
        println!("No expenses found");
        return Ok(());
    }

    println!(
        "{:<36} {:<10} {:<18} {:>12} {:<15} Notes",
        "ID", "Date", "Category", "Amount", "Method"
    );
    println!("{}", "─".repeat(110));
    for e in &matched {
        println!(
            "{:<36} {:<10} {:<18} {:>12} {:<15} {}",
            e.id,
            e.date,
            e.category.as_str(),
            format_amount(e.amount),
            truncate(&e.payment_method, 15),
            truncate(e.notes_or_empty(), 30)
        );
    }
    let total: Decimal = matched.iter().map(|e| e.amount).sum();
    println!("{}", "─".repeat(110));
    println!("{} expenses, {}", matched.len(), format_amount(total));
    Ok(())
}

async fn cli_add(args: &[String], session: &Session, today: NaiveDate) -> Result<()> {
    let pos = positional(args);
    let [amount, category] = pos.as_slice() else {
        anyhow::bail!(
            "Usage: spendwise add <amount> <category> [--date YYYY-MM-DD] [--method M] [--notes N]"
        );
    };

    let draft = NewExpense {
        amount: parse_amount(amount)?,
        category: parse_category(category)?,
        date: flag(args, "--date").map(parse_date).transpose()?.unwrap_or(today),
        payment_method: flag(args, "--method")
            .map(parse_method)
            .transpose()?
            .unwrap_or_else(|| PAYMENT_METHODS[0].to_string()),
        notes: flag(args, "--notes")
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(String::from),
    };

    let e = session
        .expenses()
        .add(draft)
        .await
        .map_err(store_failure("add expense"))?;
    println!(
        "Added {} for {} on {} ({})",
        format_amount(e.amount),
        e.category,
        e.date,
        e.id
    );
    Ok(())
}

async fn cli_edit(args: &[String], session: &Session) -> Result<()> {
    let Some(id) = positional(args).first().copied() else {
        anyhow::bail!("Usage: spendwise edit <id> [--amount A] [--category C] [--date D] [--method M] [--notes N]");
    };

    let patch = ExpensePatch {
        amount: flag(args, "--amount").map(parse_amount).transpose()?,
        category: flag(args, "--category").map(parse_category).transpose()?,
        date: flag(args, "--date").map(parse_date).transpose()?,
        payment_method: flag(args, "--method").map(parse_method).transpose()?,
        notes: flag(args, "--notes").map(|n| n.trim().to_string()),
    };
    if patch.is_empty() {
        anyhow::bail!("Nothing to change. Pass at least one of --amount, --category, --date, --method, --notes");
    }

    let e = session
        .expenses()
        .update(id, patch)
        .await
        .map_err(store_failure("update expense"))?;
    println!("Updated expense {}:", e.id);
    print_expense_line(&e);
    Ok(())
}

async fn cli_rm(args: &[String], session: &Session) -> Result<()> {
    let Some(id) = positional(args).first().copied() else {
        anyhow::bail!("Usage: spendwise rm <id>");
    };
    session
        .expenses()
        .delete(id)
        .await
        .map_err(store_failure("delete expense"))?;
    println!("Deleted expense {id}");
    Ok(())
}

// ── Budgets ──────────────────────────────────────────────────

async fn cli_budgets(args: &[String], session: &Session, today: NaiveDate) -> Result<()> {
    let month = month_arg(positional(args).first().copied(), today)?;
    session.refresh().await;

    let mut views = Views::new();
    let overview = views.budgets(session, month);

    println!("Budgets: {}", month.long_name());
    println!("{}", "─".repeat(44));
    if overview.budgets.is_empty() {
        println!("No budgets set for this month");
        println!("Use `spendwise budget set <category> <limit>` to set a spending limit");
        return Ok(());
    }

    for usage in &overview.budgets {
        println!(
            "  {:<18} {:>12} / {:<12} {} {:>7}  {:<17} {}",
            truncate(usage.budget.category.as_str(), 17),
            format_amount(usage.spent),
            format_amount(usage.budget.monthly_limit),
            progress_bar(usage.fill_percent(), BAR_WIDTH),
            format_utilization(usage.utilization()),
            usage.status().label(),
            format_remaining(usage.remaining())
        );
        println!("    id {}", usage.budget.id);
    }

    println!("{}", "─".repeat(44));
    println!("  Total budget:       {}", format_amount(overview.total_budget));
    println!("  Total spent:        {}", format_amount(overview.total_spent));
    println!("  Over budget:        {}", overview.over_budget_count);
    println!("  Approaching limit:  {}", overview.approaching_limit_count);
    for category in &overview.duplicates {
        eprintln!("Warning: more than one {category} budget for {month}");
    }
    Ok(())
}

async fn cli_budget(args: &[String], session: &Session, today: NaiveDate) -> Result<()> {
    let usage = "Usage: spendwise budget <set|edit|rm> ...";
    let Some(sub) = args.first() else {
        anyhow::bail!(usage);
    };
    let rest = &args[1..];
    match sub.as_str() {
        "set" => budget_set(rest, session, today).await,
        "edit" => budget_edit(rest, session).await,
        "rm" => {
            let Some(id) = positional(rest).first().copied() else {
                anyhow::bail!("Usage: spendwise budget rm <id>");
            };
            session
                .budgets()
                .delete(id)
                .await
                .map_err(store_failure("delete budget"))?;
            println!("Deleted budget {id}");
            Ok(())
        }
        other => anyhow::bail!("Unknown budget command: {other}. {usage}"),
    }
}

async fn budget_set(args: &[String], session: &Session, today: NaiveDate) -> Result<()> {
    let pos = positional(args);
    let [category, limit] = pos.as_slice() else {
        anyhow::bail!("Usage: spendwise budget set <category> <limit> [--month YYYY-MM]");
    };
    let draft = NewBudget {
        category: parse_category(category)?,
        monthly_limit: parse_amount(limit)?,
        month: month_arg(flag(args, "--month"), today)?,
    };

    let existing = session.budgets().list().await;
    if let Some(b) = existing
        .iter()
        .find(|b| b.category == draft.category && b.month == draft.month)
    {
        anyhow::bail!(
            "A {} budget for {} already exists ({}). Use `spendwise budget edit {} <limit>`",
            b.category,
            b.month,
            b.id,
            b.id
        );
    }

    let b = session
        .budgets()
        .add(draft)
        .await
        .map_err(store_failure("create budget"))?;
    println!(
        "Set {} budget for {} to {} ({})",
        b.category,
        b.month,
        format_amount(b.monthly_limit),
        b.id
    );
    Ok(())
}

async fn budget_edit(args: &[String], session: &Session) -> Result<()> {
    let pos = positional(args);
    let [id, limit] = pos.as_slice() else {
        anyhow::bail!("Usage: spendwise budget edit <id> <limit>");
    };
    let patch = BudgetPatch {
        monthly_limit: Some(parse_amount(limit)?),
    };
    let b = session
        .budgets()
        .update(id, patch)
        .await
        .map_err(store_failure("update budget"))?;
    println!(
        "{} budget for {} is now {}",
        b.category,
        b.month,
        format_amount(b.monthly_limit)
    );
    Ok(())
}

// ── Export ───────────────────────────────────────────────────

async fn cli_export(args: &[String], session: &Session, today: NaiveDate) -> Result<()> {
    let month = month_arg(flag(args, "--month"), today)?;

    // Output path is the first non-flag argument
    let output_path = positional(args)
        .first()
        .map(|a| PathBuf::from(shellexpand(a)))
        .unwrap_or_else(|| PathBuf::from(export::default_file_name(month)));

    let expenses = session.expenses().list().await;
    let count = export::export_month_to_path(&output_path, &expenses, month)?;
    if count == 0 {
        println!("No expenses for {month}");
    } else {
        println!("Exported {count} expenses to {}", output_path.display());
    }
    Ok(())
}

// ── Output helpers ───────────────────────────────────────────

fn print_expense_line(e: &Expense) {
    println!(
        "  {}  {:<18} {:>12}  {:<15} {}",
        e.date,
        e.category.as_str(),
        format_amount(e.amount),
        truncate(&e.payment_method, 15),
        truncate(e.notes_or_empty(), 30)
    );
}

fn print_series(series: &[TrendPoint]) {
    let max = series.iter().map(|p| p.amount).max().unwrap_or_default();
    for point in series {
        println!(
            "  {:>5}  {:>12}  {}",
            point.label,
            format_amount(point.amount),
            progress_bar(share_percent(point.amount, max), BAR_WIDTH)
        );
    }
}

fn category_names() -> String {
    Category::all()
        .iter()
        .map(|c| c.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn store_failure(action: &'static str) -> impl FnOnce(StoreError) -> anyhow::Error {
    move |e| anyhow::anyhow!("Failed to {action}: {}", e.message())
}

// ── Argument parsing ─────────────────────────────────────────

/// Value following `name`, e.g. `--month 2024-03`.
fn flag<'a>(args: &'a [String], name: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == name)
        .map(|w| w[1].as_str())
}

/// Arguments that are neither flags nor flag values. Every flag takes a value.
fn positional(args: &[String]) -> Vec<&str> {
    let mut out = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg.starts_with("--") {
            iter.next();
        } else {
            out.push(arg.as_str());
        }
    }
    out
}

fn month_arg(raw: Option<&str>, today: NaiveDate) -> Result<MonthKey> {
    match raw {
        Some(s) => Ok(s.parse::<MonthKey>()?),
        None => Ok(MonthKey::of(today)),
    }
}

/// Positive amount; `₹`, `$` and thousands separators are ignored.
pub(crate) fn parse_amount(s: &str) -> Result<Decimal> {
    let cleaned = s.replace(['₹', '$', ','], "").trim().to_string();
    let amount = Decimal::from_str(&cleaned)
        .with_context(|| format!("Failed to parse '{s}' as an amount"))?;
    if amount <= Decimal::ZERO {
        anyhow::bail!("Amount must be greater than zero, got {s}");
    }
    Ok(amount)
}

pub(crate) fn parse_category(s: &str) -> Result<Category> {
    Category::from_name(s)
        .with_context(|| format!("Unknown category '{s}'. Choose one of: {}", category_names()))
}

pub(crate) fn parse_method(s: &str) -> Result<String> {
    PAYMENT_METHODS
        .iter()
        .find(|m| m.eq_ignore_ascii_case(s.trim()))
        .map(|m| m.to_string())
        .with_context(|| {
            format!(
                "Unknown payment method '{s}'. Choose one of: {}",
                PAYMENT_METHODS.join(", ")
            )
        })
}

pub(crate) fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{s}', expected YYYY-MM-DD"))
}

pub(crate) fn shellexpand(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
        format!("{home}/{rest}")
    } else {
        path.to_string()
    }
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;

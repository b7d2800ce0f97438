//! Derived figures for the summary, report and budget views.
//!
//! Everything here is a pure function of the cached rows and a month or date
//! window. Empty input yields zeroed output; nothing fails.

mod budget_status;
mod view;

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::models::{Category, DateWindow, Expense, MonthKey};

pub(crate) use budget_status::{BudgetOverview, Utilization};
pub(crate) use view::Views;

/// Chart colors, handed out by position.
pub(crate) const PALETTE: [&str; 8] = [
    "#3B82F6", "#10B981", "#F59E0B", "#EF4444", "#8B5CF6", "#F97316", "#06B6D4", "#84CC16",
];

pub(crate) fn palette_color(index: usize) -> &'static str {
    PALETTE[index % PALETTE.len()]
}

/// Number of expenses listed in a monthly report.
pub(crate) const REPORT_TOP_N: usize = 10;
/// Number of expenses listed in a summary.
pub(crate) const SUMMARY_TOP_N: usize = 5;
const TOP_METHODS: usize = 3;

pub(crate) fn in_window(
    expenses: &[Expense],
    window: DateWindow,
) -> impl Iterator<Item = &Expense> + '_ {
    expenses.iter().filter(move |e| window.contains(e.date))
}

pub(crate) fn in_month(expenses: &[Expense], month: MonthKey) -> impl Iterator<Item = &Expense> + '_ {
    in_window(expenses, DateWindow::month(month))
}

pub(crate) fn total<'a>(expenses: impl IntoIterator<Item = &'a Expense>) -> Decimal {
    expenses.into_iter().map(|e| e.amount).sum()
}

pub(crate) fn monthly_total(expenses: &[Expense], month: MonthKey) -> Decimal {
    total(in_month(expenses, month))
}

// ── Month over month ──────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct MonthOverMonth {
    pub current: Decimal,
    pub previous: Decimal,
    /// `current - previous`, signed.
    pub delta: Decimal,
    /// Percent of the previous month with one decimal place, or "0" when the
    /// previous month has no spending.
    pub percent_change: String,
}

impl MonthOverMonth {
    pub(crate) fn between(expenses: &[Expense], month: MonthKey) -> Self {
        let current = monthly_total(expenses, month);
        let previous = monthly_total(expenses, month.prev());
        let delta = current - previous;
        Self {
            current,
            previous,
            delta,
            percent_change: percent_change(delta, previous),
        }
    }
}

fn percent_change(delta: Decimal, previous: Decimal) -> String {
    if previous.is_zero() {
        return "0".to_string();
    }
    let pct = delta
        .checked_div(previous)
        .and_then(|r| r.checked_mul(Decimal::ONE_HUNDRED))
        .unwrap_or(Decimal::ZERO)
        .round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero);
    format!("{pct:.1}")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SpendingInsight {
    SpentMore(Decimal),
    Saved(Decimal),
    Same,
}

/// How this month compares with the last one.
pub(crate) fn spending_insight(mom: &MonthOverMonth) -> SpendingInsight {
    if mom.delta > Decimal::ZERO {
        SpendingInsight::SpentMore(mom.delta)
    } else if mom.delta < Decimal::ZERO {
        SpendingInsight::Saved(mom.delta.abs())
    } else {
        SpendingInsight::Same
    }
}

// ── Breakdowns ────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CategoryTotal {
    pub category: Category,
    pub amount: Decimal,
    pub color: &'static str,
}

/// Sum per category in first-encountered order, colored by position.
pub(crate) fn category_breakdown<'a>(
    expenses: impl IntoIterator<Item = &'a Expense>,
) -> Vec<CategoryTotal> {
    let mut totals: Vec<(Category, Decimal)> = Vec::new();
    for e in expenses {
        match totals.iter_mut().find(|(c, _)| *c == e.category) {
            Some((_, amount)) => *amount += e.amount,
            None => totals.push((e.category, e.amount)),
        }
    }
    totals
        .into_iter()
        .enumerate()
        .map(|(i, (category, amount))| CategoryTotal {
            category,
            amount,
            color: palette_color(i),
        })
        .collect()
}

/// Largest first; equal amounts keep their order. Colors follow the new
/// positions.
pub(crate) fn sorted_desc(mut breakdown: Vec<CategoryTotal>) -> Vec<CategoryTotal> {
    breakdown.sort_by(|a, b| b.amount.cmp(&a.amount));
    for (i, entry) in breakdown.iter_mut().enumerate() {
        entry.color = palette_color(i);
    }
    breakdown
}

/// The category with the highest total; the earliest one wins a tie.
pub(crate) fn top_category(breakdown: &[CategoryTotal]) -> Option<CategoryTotal> {
    breakdown
        .iter()
        .fold(None::<&CategoryTotal>, |best, c| match best {
            Some(b) if b.amount >= c.amount => Some(b),
            _ => Some(c),
        })
        .cloned()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct MethodCount {
    pub method: String,
    pub count: usize,
}

/// The three most used payment methods by number of expenses.
pub(crate) fn payment_method_ranking<'a>(
    expenses: impl IntoIterator<Item = &'a Expense>,
) -> Vec<MethodCount> {
    let mut counts: Vec<MethodCount> = Vec::new();
    for e in expenses {
        match counts.iter_mut().find(|m| m.method == e.payment_method) {
            Some(m) => m.count += 1,
            None => counts.push(MethodCount {
                method: e.payment_method.clone(),
                count: 1,
            }),
        }
    }
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts.truncate(TOP_METHODS);
    counts
}

// ── Series ────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct TrendPoint {
    pub date: NaiveDate,
    pub label: String,
    pub amount: Decimal,
}

/// One point per calendar day of `window`, days without spending included.
/// `label` is a chrono format string such as `"%m/%d"`.
pub(crate) fn trend_series(expenses: &[Expense], window: DateWindow, label: &str) -> Vec<TrendPoint> {
    window
        .days()
        .map(|day| TrendPoint {
            date: day,
            label: day.format(label).to_string(),
            amount: total(expenses.iter().filter(|e| e.date == day)),
        })
        .collect()
}

/// The `n` largest expenses; equal amounts keep their list order.
pub(crate) fn top_expenses<'a>(
    expenses: impl IntoIterator<Item = &'a Expense>,
    n: usize,
) -> Vec<Expense> {
    let mut sorted: Vec<&Expense> = expenses.into_iter().collect();
    sorted.sort_by(|a, b| b.amount.cmp(&a.amount));
    sorted.into_iter().take(n).cloned().collect()
}

/// Average spend per calendar day of the month.
pub(crate) fn daily_average(total: Decimal, month: MonthKey) -> Decimal {
    if total.is_zero() {
        return Decimal::ZERO;
    }
    total / Decimal::from(month.days())
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct MonthTotal {
    pub month: MonthKey,
    pub label: String,
    pub amount: Decimal,
}

/// Twelve monthly totals for `year`, labelled Jan..Dec.
pub(crate) fn yearly_overview(expenses: &[Expense], year: i32) -> Vec<MonthTotal> {
    (1..=12)
        .filter_map(|m| MonthKey::new(year, m))
        .map(|month| MonthTotal {
            month,
            label: month.first_day().format("%b").to_string(),
            amount: monthly_total(expenses, month),
        })
        .collect()
}

// ── Views ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Dashboard {
    pub month: MonthKey,
    pub totals: MonthOverMonth,
    pub transaction_count: usize,
    pub breakdown: Vec<CategoryTotal>,
    pub top_category: Option<CategoryTotal>,
    pub top_methods: Vec<MethodCount>,
    pub trend: Vec<TrendPoint>,
    /// Latest expenses of the month in list order.
    pub recent: Vec<Expense>,
    /// Largest expenses of the month.
    pub top_expenses: Vec<Expense>,
}

impl Dashboard {
    /// Summary of the month containing `today`, with a trend covering the
    /// calendar month that ends on `today`.
    pub(crate) fn compute(expenses: &[Expense], today: NaiveDate) -> Self {
        let month = MonthKey::of(today);
        let current: Vec<&Expense> = in_month(expenses, month).collect();
        let breakdown = category_breakdown(current.iter().copied());
        Self {
            month,
            totals: MonthOverMonth::between(expenses, month),
            transaction_count: current.len(),
            top_category: top_category(&breakdown),
            breakdown,
            top_methods: payment_method_ranking(current.iter().copied()),
            trend: trend_series(expenses, DateWindow::trailing_month(today), "%m/%d"),
            recent: current.iter().take(SUMMARY_TOP_N).map(|e| (*e).clone()).collect(),
            top_expenses: top_expenses(current.iter().copied(), SUMMARY_TOP_N),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct MonthlyReport {
    pub month: MonthKey,
    pub total: Decimal,
    pub transaction_count: usize,
    pub daily_average: Decimal,
    /// Largest category first.
    pub breakdown: Vec<CategoryTotal>,
    /// Every day of the month, labelled by day of month.
    pub daily: Vec<TrendPoint>,
    pub top_expenses: Vec<Expense>,
}

impl MonthlyReport {
    pub(crate) fn compute(expenses: &[Expense], month: MonthKey) -> Self {
        let rows: Vec<&Expense> = in_month(expenses, month).collect();
        let total = total(rows.iter().copied());
        Self {
            month,
            total,
            transaction_count: rows.len(),
            daily_average: daily_average(total, month),
            breakdown: sorted_desc(category_breakdown(rows.iter().copied())),
            daily: trend_series(expenses, DateWindow::month(month), "%d"),
            top_expenses: top_expenses(rows.iter().copied(), REPORT_TOP_N),
        }
    }
}

// ── Filtering ─────────────────────────────────────────────────

/// Expense list filter. Empty fields match everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct ExpenseFilter {
    /// Case-insensitive substring of the notes or the category name.
    pub search: String,
    pub category: Option<Category>,
    pub payment_method: Option<String>,
    pub month: Option<MonthKey>,
}

impl ExpenseFilter {
    pub(crate) fn matches(&self, expense: &Expense) -> bool {
        let needle = self.search.trim().to_lowercase();
        let matches_search = needle.is_empty()
            || expense.notes_or_empty().to_lowercase().contains(&needle)
            || expense.category.as_str().to_lowercase().contains(&needle);
        matches_search
            && self.category.map_or(true, |c| c == expense.category)
            && self
                .payment_method
                .as_deref()
                .map_or(true, |m| m == expense.payment_method)
            && self.month.map_or(true, |m| m.contains(expense.date))
    }

    pub(crate) fn apply<'a>(&self, expenses: &'a [Expense]) -> Vec<&'a Expense> {
        expenses.iter().filter(|e| self.matches(e)).collect()
    }
}

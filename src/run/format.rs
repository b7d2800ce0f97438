use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::analytics::{SpendingInsight, Utilization};

/// Format a decimal amount with thousand separators and 2 decimal places.
/// e.g. `1234567.89` → `"₹1,234,567.89"`
pub(crate) fn format_amount(val: Decimal) -> String {
    let abs = val.abs();
    let formatted = format!("{abs:.2}");
    let mut parts = formatted.split('.');
    let int_part = parts.next().unwrap_or("0");
    let dec_part = parts.next().unwrap_or("00");

    let with_commas: String = int_part
        .as_bytes()
        .rchunks(3)
        .rev()
        .map(|chunk| std::str::from_utf8(chunk).unwrap_or(""))
        .collect::<Vec<_>>()
        .join(",");

    if val < Decimal::ZERO {
        format!("-₹{with_commas}.{dec_part}")
    } else {
        format!("₹{with_commas}.{dec_part}")
    }
}

/// Truncate a string to `max` visible characters, appending "…" if truncated.
pub(crate) fn truncate(s: &str, max: usize) -> String {
    if max == 0 {
        return String::new();
    }
    if s.chars().count() <= max {
        return s.to_string();
    }
    let truncated: String = s.chars().take(max.saturating_sub(1)).collect();
    format!("{truncated}…")
}

/// `[████░░░░]` filled to `percent` (0..=100) of `width`.
pub(crate) fn progress_bar(percent: Decimal, width: usize) -> String {
    let clamped = percent.clamp(Decimal::ZERO, Decimal::ONE_HUNDRED);
    let filled = (clamped * Decimal::from(width) / Decimal::ONE_HUNDRED)
        .floor()
        .to_usize()
        .unwrap_or(0)
        .min(width);
    format!("[{}{}]", "█".repeat(filled), "░".repeat(width - filled))
}

/// Share of `total` taken by `part`, as a percentage; zero when `total` is zero.
pub(crate) fn share_percent(part: Decimal, total: Decimal) -> Decimal {
    if total.is_zero() {
        return Decimal::ZERO;
    }
    part / total * Decimal::ONE_HUNDRED
}

pub(crate) fn format_percent(value: Decimal) -> String {
    format!("{:.1}%", value.round_dp(1))
}

pub(crate) fn format_utilization(utilization: Utilization) -> String {
    match utilization {
        Utilization::Percent(p) => format_percent(p),
        Utilization::Unbounded => "∞%".to_string(),
    }
}

/// "₹30.00 left" or "₹12.00 over".
pub(crate) fn format_remaining(remaining: Decimal) -> String {
    if remaining < Decimal::ZERO {
        format!("{} over", format_amount(remaining.abs()))
    } else {
        format!("{} left", format_amount(remaining))
    }
}

pub(crate) fn insight_sentence(insight: SpendingInsight) -> String {
    match insight {
        SpendingInsight::SpentMore(delta) => {
            format!("You spent {} more than last month", format_amount(delta))
        }
        SpendingInsight::Saved(delta) => {
            format!("You saved {} compared to last month", format_amount(delta))
        }
        SpendingInsight::Same => "Your spending is the same as last month".to_string(),
    }
}

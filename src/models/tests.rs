#![allow(clippy::unwrap_used)]

use chrono::NaiveDate;
use rust_decimal_macros::dec;

use super::*;

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

// ── Category ──────────────────────────────────────────────────

#[test]
fn test_category_from_name() {
    assert_eq!(Category::from_name("Food & Dining"), Some(Category::FoodAndDining));
    assert_eq!(Category::from_name("food"), Some(Category::FoodAndDining));
    assert_eq!(Category::from_name("TRAVEL"), Some(Category::Travel));
    assert_eq!(
        Category::from_name("bills & utilities"),
        Some(Category::BillsAndUtilities)
    );
    assert_eq!(Category::from_name("groceries"), None);
}

#[test]
fn test_category_parse_falls_back_to_others() {
    assert_eq!(Category::parse("Healthcare"), Category::Healthcare);
    assert_eq!(Category::parse("Pets"), Category::Others);
    assert_eq!(Category::parse(""), Category::Others);
}

#[test]
fn test_category_all_has_nine_distinct() {
    let all = Category::all();
    assert_eq!(all.len(), 9);
    for cat in all {
        assert_eq!(Category::from_name(cat.as_str()), Some(*cat));
    }
}

#[test]
fn test_category_serde_uses_display_name() {
    let json = serde_json::to_string(&Category::BillsAndUtilities).unwrap();
    assert_eq!(json, "\"Bills & Utilities\"");
    let back: Category = serde_json::from_str("\"Food & Dining\"").unwrap();
    assert_eq!(back, Category::FoodAndDining);
}

// ── MonthKey ──────────────────────────────────────────────────

#[test]
fn test_month_key_parse_and_display() {
    let m: MonthKey = "2024-03".parse().unwrap();
    assert_eq!(m.year(), 2024);
    assert_eq!(m.month(), 3);
    assert_eq!(m.to_string(), "2024-03");
}

#[test]
fn test_month_key_rejects_bad_input() {
    assert!("2024-13".parse::<MonthKey>().is_err());
    assert!("2024-3".parse::<MonthKey>().is_err());
    assert!("202403".parse::<MonthKey>().is_err());
    assert!("march".parse::<MonthKey>().is_err());
    assert!("".parse::<MonthKey>().is_err());
}

#[test]
fn test_month_key_bounds() {
    let feb_leap: MonthKey = "2024-02".parse().unwrap();
    assert_eq!(feb_leap.first_day(), date("2024-02-01"));
    assert_eq!(feb_leap.last_day(), date("2024-02-29"));
    assert_eq!(feb_leap.days(), 29);

    let feb: MonthKey = "2023-02".parse().unwrap();
    assert_eq!(feb.last_day(), date("2023-02-28"));

    let dec: MonthKey = "2024-12".parse().unwrap();
    assert_eq!(dec.last_day(), date("2024-12-31"));
}

#[test]
fn test_month_key_prev_next_across_year() {
    let jan: MonthKey = "2024-01".parse().unwrap();
    assert_eq!(jan.prev().to_string(), "2023-12");
    assert_eq!(jan.prev().next(), jan);
    let dec: MonthKey = "2024-12".parse().unwrap();
    assert_eq!(dec.next().to_string(), "2025-01");
}

#[test]
fn test_month_key_contains_is_inclusive() {
    let m: MonthKey = "2024-03".parse().unwrap();
    assert!(m.contains(date("2024-03-01")));
    assert!(m.contains(date("2024-03-31")));
    assert!(!m.contains(date("2024-02-29")));
    assert!(!m.contains(date("2024-04-01")));
}

#[test]
fn test_month_key_of_date() {
    assert_eq!(MonthKey::of(date("2024-03-17")).to_string(), "2024-03");
}

#[test]
fn test_month_key_long_name() {
    let m: MonthKey = "2024-03".parse().unwrap();
    assert_eq!(m.long_name(), "March 2024");
}

// ── DateWindow ────────────────────────────────────────────────

#[test]
fn test_window_days_inclusive() {
    let w = DateWindow::new(date("2024-03-01"), date("2024-03-05"));
    let days: Vec<_> = w.days().collect();
    assert_eq!(days.len(), 5);
    assert_eq!(days[0], date("2024-03-01"));
    assert_eq!(days[4], date("2024-03-05"));
}

#[test]
fn test_window_single_day() {
    let w = DateWindow::new(date("2024-03-01"), date("2024-03-01"));
    assert_eq!(w.days().count(), 1);
}

#[test]
fn test_window_inverted_is_empty() {
    let w = DateWindow::new(date("2024-03-05"), date("2024-03-01"));
    assert_eq!(w.days().count(), 0);
}

#[test]
fn test_trailing_month_window() {
    let w = DateWindow::trailing_month(date("2024-03-31"));
    assert_eq!(w.start, date("2024-02-29"));
    assert_eq!(w.end, date("2024-03-31"));
}

// ── Wire format ───────────────────────────────────────────────

#[test]
fn test_expense_deserializes_from_row() {
    let json = r#"{
        "id": "e1",
        "user_id": "u1",
        "amount": 12.5,
        "category": "Travel",
        "date": "2024-03-05",
        "payment_method": "UPI",
        "notes": null,
        "created_at": "2024-03-05T10:00:00+00:00",
        "updated_at": "2024-03-05T10:00:00+00:00"
    }"#;
    let e: Expense = serde_json::from_str(json).unwrap();
    assert_eq!(e.amount, dec!(12.5));
    assert_eq!(e.category, Category::Travel);
    assert_eq!(e.date, date("2024-03-05"));
    assert_eq!(e.notes_or_empty(), "");
}

#[test]
fn test_expense_date_with_time_is_cut_to_date() {
    let json = r#"{
        "id": "e1", "user_id": "u1", "amount": "3", "category": "Shopping",
        "date": "2024-03-05T23:59:59Z", "payment_method": "Cash"
    }"#;
    let e: Expense = serde_json::from_str(json).unwrap();
    assert_eq!(e.date, date("2024-03-05"));
}

#[test]
fn test_budget_month_round_trips_as_string() {
    let json = r#"{
        "id": "b1", "user_id": "u1", "category": "Food & Dining",
        "monthly_limit": 120, "month": "2024-03", "current_spent": 0
    }"#;
    let b: Budget = serde_json::from_str(json).unwrap();
    assert_eq!(b.month.to_string(), "2024-03");
    let out = serde_json::to_value(&b).unwrap();
    assert_eq!(out["month"], "2024-03");
}

#[test]
fn test_patch_serializes_only_set_fields() {
    let patch = ExpensePatch {
        notes: Some("lunch".into()),
        ..Default::default()
    };
    let out = serde_json::to_value(&patch).unwrap();
    assert_eq!(out, serde_json::json!({ "notes": "lunch" }));
    assert!(!patch.is_empty());
    assert!(ExpensePatch::default().is_empty());
}

// ── Record ────────────────────────────────────────────────────

fn draft() -> NewExpense {
    NewExpense {
        amount: dec!(100),
        category: Category::FoodAndDining,
        date: date("2024-03-05"),
        payment_method: "Cash".into(),
        notes: Some("groceries".into()),
    }
}

#[test]
fn test_from_draft_stamps_server_fields() {
    let e = Expense::from_draft("e1".into(), "u1".into(), draft(), "t0".into());
    assert_eq!(e.id(), "e1");
    assert_eq!(e.owner(), "u1");
    assert_eq!(e.created_at, "t0");
    assert_eq!(e.updated_at, "t0");
    assert_eq!(e.order_key(), "2024-03-05");
}

#[test]
fn test_apply_patch_keeps_untouched_fields() {
    let mut e = Expense::from_draft("e1".into(), "u1".into(), draft(), "t0".into());
    e.apply_patch(
        &ExpensePatch {
            amount: Some(dec!(80)),
            ..Default::default()
        },
        "t1".into(),
    );
    assert_eq!(e.amount, dec!(80));
    assert_eq!(e.category, Category::FoodAndDining);
    assert_eq!(e.notes.as_deref(), Some("groceries"));
    assert_eq!(e.created_at, "t0");
    assert_eq!(e.updated_at, "t1");
}

#[test]
fn test_budget_patch_only_moves_limit() {
    let mut b = Budget::from_draft(
        "b1".into(),
        "u1".into(),
        NewBudget {
            category: Category::Travel,
            monthly_limit: dec!(500),
            month: "2024-03".parse().unwrap(),
        },
        "t0".into(),
    );
    b.apply_patch(
        &BudgetPatch {
            monthly_limit: Some(dec!(650)),
        },
        "t1".into(),
    );
    assert_eq!(b.monthly_limit, dec!(650));
    assert_eq!(b.category, Category::Travel);
    assert_eq!(b.month.to_string(), "2024-03");
}

#![allow(clippy::unwrap_used)]

use super::*;
use chrono::NaiveDate;
use rust_decimal_macros::dec;

use crate::models::Category;

fn expense(id: &str, category: Category, amount: Decimal, on: &str) -> Expense {
    Expense {
        id: id.into(),
        user_id: "u1".into(),
        amount,
        category,
        date: NaiveDate::parse_from_str(on, "%Y-%m-%d").unwrap(),
        payment_method: "UPI".into(),
        notes: None,
        created_at: String::new(),
        updated_at: String::new(),
    }
}

fn march() -> MonthKey {
    "2024-03".parse().unwrap()
}

fn export_to_string(expenses: &[Expense], month: MonthKey) -> (usize, String) {
    let mut buf = Vec::new();
    let rows = write_month(&mut buf, expenses, month).unwrap();
    (rows, String::from_utf8(buf).unwrap())
}

// ── plain_amount ──────────────────────────────────────────────

#[test]
fn test_plain_amount() {
    assert_eq!(plain_amount(dec!(100)), "100");
    assert_eq!(plain_amount(dec!(12.50)), "12.5");
    assert_eq!(plain_amount(dec!(1234567.89)), "1234567.89");
    assert_eq!(plain_amount(dec!(0.10)), "0.1");
}

// ── write_month ───────────────────────────────────────────────

#[test]
fn test_export_march_scenario() {
    let expenses = vec![
        expense("e1", Category::FoodAndDining, dec!(100), "2024-03-05"),
        expense("e2", Category::FoodAndDining, dec!(50), "2024-03-20"),
        expense("e3", Category::Travel, dec!(200), "2024-03-10"),
    ];
    let (rows, out) = export_to_string(&expenses, march());
    assert_eq!(rows, 3);

    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(
        lines,
        vec![
            "Date,Category,Amount,Payment Method,Notes",
            "2024-03-05,Food & Dining,100,UPI,",
            "2024-03-20,Food & Dining,50,UPI,",
            "2024-03-10,Travel,200,UPI,",
        ]
    );
}

#[test]
fn test_export_skips_other_months() {
    let expenses = vec![
        expense("a", Category::Others, dec!(1), "2024-02-29"),
        expense("b", Category::Others, dec!(2.25), "2024-03-31"),
        expense("c", Category::Others, dec!(3), "2024-04-01"),
    ];
    let (rows, out) = export_to_string(&expenses, march());
    assert_eq!(rows, 1);
    assert_eq!(out.lines().nth(1), Some("2024-03-31,Others,2.25,UPI,"));
}

#[test]
fn test_export_empty_has_header_only() {
    let (rows, out) = export_to_string(&[], march());
    assert_eq!(rows, 0);
    assert_eq!(out.lines().count(), 1);
}

#[test]
fn test_export_quotes_notes_with_delimiters() {
    let mut e = expense("a", Category::Shopping, dec!(9.99), "2024-03-02");
    e.notes = Some("socks, shoes".into());
    e.payment_method = "Credit Card".into();
    let (_, out) = export_to_string(&[e], march());
    assert_eq!(
        out.lines().nth(1),
        Some("2024-03-02,Shopping,9.99,Credit Card,\"socks, shoes\"")
    );

    // Reading it back yields the original field
    let mut rdr = csv::Reader::from_reader(out.as_bytes());
    let record = rdr.records().next().unwrap().unwrap();
    assert_eq!(&record[4], "socks, shoes");
}

// ── export_month_to_path ──────────────────────────────────────

#[test]
fn test_export_to_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(default_file_name(march()));
    assert!(path.ends_with("expenses-2024-03.csv"));

    let expenses = vec![expense("a", Category::Travel, dec!(40), "2024-03-02")];
    let rows = export_month_to_path(&path, &expenses, march()).unwrap();
    assert_eq!(rows, 1);

    let content = std::fs::read_to_string(&path).unwrap();
    assert_eq!(content.lines().count(), 2);
}

#[test]
fn test_export_to_missing_directory_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing").join("out.csv");
    let err = export_month_to_path(&path, &[], march()).unwrap_err();
    assert!(err.to_string().contains("Failed to create"));
}

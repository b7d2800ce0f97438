#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal_macros::dec;

use super::*;
use crate::store::SqliteStore;

fn args(raw: &[&str]) -> Vec<String> {
    raw.iter().map(|s| s.to_string()).collect()
}

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn session() -> Session {
    let store = Arc::new(SqliteStore::open_in_memory().unwrap());
    Session::new(store, Some("u1".into()))
}

// ── Argument parsing ─────────────────────────────────────────

#[test]
fn test_flag_value() {
    let a = args(&["12", "food", "--method", "Cash", "--notes", "lunch"]);
    assert_eq!(flag(&a, "--method"), Some("Cash"));
    assert_eq!(flag(&a, "--notes"), Some("lunch"));
    assert_eq!(flag(&a, "--date"), None);
}

#[test]
fn test_flag_without_value() {
    let a = args(&["12", "--notes"]);
    assert_eq!(flag(&a, "--notes"), None);
}

#[test]
fn test_positional_skips_flag_values() {
    let a = args(&["--month", "2024-03", "out.csv", "--notes", "x", "extra"]);
    assert_eq!(positional(&a), vec!["out.csv", "extra"]);
}

#[test]
fn test_split_user_flag() {
    let a = args(&["--user", "alice", "summary"]);
    let (user, rest) = split_user_flag(&a).unwrap();
    assert_eq!(user.as_deref(), Some("alice"));
    assert_eq!(rest, &a[2..]);

    let b = args(&["summary", "--user", "alice"]);
    let (user, rest) = split_user_flag(&b).unwrap();
    assert_eq!(user, None);
    assert_eq!(rest.len(), 3);
}

#[test]
fn test_split_user_flag_needs_value() {
    assert!(split_user_flag(&args(&["--user"])).is_err());
    assert!(split_user_flag(&args(&["--user", " "])).is_err());
}

#[test]
fn test_parse_amount() {
    assert_eq!(parse_amount("1,250.50").unwrap(), dec!(1250.50));
    assert_eq!(parse_amount("₹99").unwrap(), dec!(99));
    assert_eq!(parse_amount("$5").unwrap(), dec!(5));
}

#[test]
fn test_parse_amount_rejects_non_positive() {
    assert!(parse_amount("0").is_err());
    assert!(parse_amount("-10").is_err());
    assert!(parse_amount("ten").is_err());
}

#[test]
fn test_parse_category_is_strict() {
    assert_eq!(parse_category("food").unwrap(), Category::FoodAndDining);
    assert_eq!(parse_category("Bills & Utilities").unwrap(), Category::BillsAndUtilities);
    let err = parse_category("groceries").unwrap_err();
    assert!(err.to_string().contains("Unknown category 'groceries'"));
}

#[test]
fn test_parse_method_normalizes_case() {
    assert_eq!(parse_method("credit card").unwrap(), "Credit Card");
    assert_eq!(parse_method("upi").unwrap(), "UPI");
    assert!(parse_method("cheque").is_err());
}

#[test]
fn test_parse_date() {
    assert_eq!(parse_date("2024-03-05").unwrap(), date("2024-03-05"));
    assert!(parse_date("05/03/2024").is_err());
}

#[test]
fn test_shellexpand_leaves_plain_paths() {
    assert_eq!(shellexpand("out/expenses.csv"), "out/expenses.csv");
}

// ── Commands ─────────────────────────────────────────────────

#[tokio::test]
async fn test_add_uses_defaults() {
    let session = session();
    let today = date("2024-03-15");
    as_cli(&args(&["add", "120", "food"]), &session, today)
        .await
        .unwrap();

    let rows = session.expenses().snapshot();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].amount, dec!(120));
    assert_eq!(rows[0].category, Category::FoodAndDining);
    assert_eq!(rows[0].date, today);
    assert_eq!(rows[0].payment_method, "UPI");
    assert_eq!(rows[0].notes, None);
}

#[tokio::test]
async fn test_add_with_flags() {
    let session = session();
    as_cli(
        &args(&[
            "add", "45.5", "travel", "--date", "2024-02-29", "--method", "cash", "--notes",
            "metro card",
        ]),
        &session,
        date("2024-03-15"),
    )
    .await
    .unwrap();

    let rows = session.expenses().snapshot();
    assert_eq!(rows[0].date, date("2024-02-29"));
    assert_eq!(rows[0].payment_method, "Cash");
    assert_eq!(rows[0].notes.as_deref(), Some("metro card"));
}

#[tokio::test]
async fn test_add_missing_arguments() {
    let session = session();
    let err = as_cli(&args(&["add", "120"]), &session, date("2024-03-15"))
        .await
        .unwrap_err();
    assert!(err.to_string().starts_with("Usage: spendwise add"));
    assert!(session.expenses().snapshot().is_empty());
}

#[tokio::test]
async fn test_edit_and_rm() {
    let session = session();
    let today = date("2024-03-15");
    as_cli(&args(&["add", "120", "food"]), &session, today)
        .await
        .unwrap();
    let id = session.expenses().snapshot()[0].id.clone();

    as_cli(&args(&["edit", id.as_str(), "--amount", "80"]), &session, today)
        .await
        .unwrap();
    assert_eq!(session.expenses().snapshot()[0].amount, dec!(80));

    let err = as_cli(&args(&["edit", id.as_str()]), &session, today)
        .await
        .unwrap_err();
    assert!(err.to_string().starts_with("Nothing to change"));

    as_cli(&args(&["rm", id.as_str()]), &session, today).await.unwrap();
    assert!(session.expenses().snapshot().is_empty());
}

#[tokio::test]
async fn test_budget_set_refuses_duplicate() {
    let session = session();
    let today = date("2024-03-15");
    as_cli(&args(&["budget", "set", "food", "500"]), &session, today)
        .await
        .unwrap();

    let err = as_cli(&args(&["budget", "set", "Food & Dining", "700"]), &session, today)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("already exists"));

    // Another month is fine
    as_cli(
        &args(&["budget", "set", "food", "700", "--month", "2024-04"]),
        &session,
        today,
    )
    .await
    .unwrap();
    assert_eq!(session.budgets().snapshot().len(), 2);
}

#[tokio::test]
async fn test_budget_edit_changes_limit() {
    let session = session();
    let today = date("2024-03-15");
    as_cli(&args(&["budget", "set", "travel", "500"]), &session, today)
        .await
        .unwrap();
    let id = session.budgets().snapshot()[0].id.clone();

    as_cli(&args(&["budget", "edit", id.as_str(), "650"]), &session, today)
        .await
        .unwrap();
    assert_eq!(session.budgets().snapshot()[0].monthly_limit, dec!(650));
}

#[tokio::test]
async fn test_export_writes_month() {
    let session = session();
    let today = date("2024-03-15");
    as_cli(&args(&["add", "100", "food", "--date", "2024-03-05"]), &session, today)
        .await
        .unwrap();
    as_cli(&args(&["add", "40", "travel", "--date", "2024-02-10"]), &session, today)
        .await
        .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("march.csv");
    as_cli(
        &args(&["export", path.to_str().unwrap(), "--month", "2024-03"]),
        &session,
        today,
    )
    .await
    .unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    assert_eq!(content.lines().count(), 2);
    assert!(content.contains("2024-03-05,Food & Dining,100,UPI,"));
}

#[tokio::test]
async fn test_reports_run_on_empty_store() {
    let session = session();
    let today = date("2024-03-15");
    for cmd in [
        &["summary"][..],
        &["summary", "2024-01"],
        &["report"],
        &["trend"],
        &["year"],
        &["expenses"],
        &["budgets"],
    ] {
        as_cli(&args(cmd), &session, today).await.unwrap();
    }
}

#[tokio::test]
async fn test_invalid_month_argument() {
    let session = session();
    let err = as_cli(&args(&["report", "2024-13"]), &session, date("2024-03-15"))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "invalid month '2024-13', expected YYYY-MM");
}

#[tokio::test]
async fn test_unknown_command() {
    let session = session();
    let err = as_cli(&args(&["frobnicate"]), &session, date("2024-03-15"))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Unknown command: frobnicate");
}

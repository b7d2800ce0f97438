pub(crate) const SCHEMA_V1: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS expenses (
    id              TEXT PRIMARY KEY,
    user_id         TEXT NOT NULL,
    amount          TEXT NOT NULL,
    category        TEXT NOT NULL,
    date            TEXT NOT NULL,
    payment_method  TEXT NOT NULL DEFAULT '',
    notes           TEXT,
    created_at      TEXT NOT NULL,
    updated_at      TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_expenses_user_date ON expenses(user_id, date);

CREATE TABLE IF NOT EXISTS budgets (
    id             TEXT PRIMARY KEY,
    user_id        TEXT NOT NULL,
    category       TEXT NOT NULL,
    monthly_limit  TEXT NOT NULL,
    month          TEXT NOT NULL,
    created_at     TEXT NOT NULL,
    updated_at     TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_budgets_user_month ON budgets(user_id, month);
"#;

pub(crate) const CURRENT_VERSION: i32 = 1;

/// Migrations from version N to N+1.
/// Each entry is (from_version, sql).
pub(crate) const MIGRATIONS: &[(i32, &str)] = &[
    // Future migrations go here:
    // (1, "ALTER TABLE expenses ADD COLUMN receipt_url TEXT;"),
];

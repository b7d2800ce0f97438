use anyhow::Context;
use async_trait::async_trait;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use rust_decimal::Decimal;
use std::path::Path;
use std::str::FromStr;
use std::sync::Mutex;

use super::{schema, StoreError, Table};
use crate::models::*;

/// Local backend. Assigns ids and timestamps the way the hosted service
/// would, so rows coming back look the same to the session.
pub(crate) struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub(crate) fn open(path: &Path) -> anyhow::Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")
            .context("Failed to set database pragmas")?;
        migrate(&conn).context("Database migration failed")?;
        tracing::debug!(path = %path.display(), "opened sqlite store");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    #[cfg(test)]
    pub(crate) fn open_in_memory() -> anyhow::Result<Self> {
        let conn = Connection::open_in_memory()?;
        migrate(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn with_conn<T>(
        &self,
        f: impl FnOnce(&Connection) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| StoreError::Database("connection lock poisoned".into()))?;
        f(&conn)
    }
}

fn migrate(conn: &Connection) -> rusqlite::Result<()> {
    let has_version_table: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
        [],
        |row| row.get(0),
    )?;

    if !has_version_table {
        // Fresh database - apply full schema
        conn.execute_batch(schema::SCHEMA_V1)?;
        conn.execute(
            "INSERT INTO schema_version (version) VALUES (?1)",
            params![schema::CURRENT_VERSION],
        )?;
        return Ok(());
    }

    let current: i32 = conn
        .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
            row.get(0)
        })
        .unwrap_or(0);

    for &(from_version, sql) in schema::MIGRATIONS {
        if current <= from_version {
            conn.execute_batch(sql)?;
        }
    }

    if current < schema::CURRENT_VERSION {
        conn.execute(
            "UPDATE schema_version SET version = ?1",
            params![schema::CURRENT_VERSION],
        )?;
    }

    Ok(())
}

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}

fn decimal_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<Decimal> {
    let raw: String = row.get(idx)?;
    Decimal::from_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn conversion_failure(idx: usize, msg: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, msg.into())
}

// ── Expenses ──────────────────────────────────────────────────

const EXPENSE_COLUMNS: &str =
    "id, user_id, amount, category, date, payment_method, notes, created_at, updated_at";

fn expense_from_row(row: &Row<'_>) -> rusqlite::Result<Expense> {
    let date_str: String = row.get(4)?;
    let date = date_only::parse(&date_str)
        .ok_or_else(|| conversion_failure(4, format!("invalid date '{date_str}'")))?;
    Ok(Expense {
        id: row.get(0)?,
        user_id: row.get(1)?,
        amount: decimal_col(row, 2)?,
        category: Category::parse(&row.get::<_, String>(3)?),
        date,
        payment_method: row.get(5)?,
        notes: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

fn write_expense(conn: &Connection, e: &Expense) -> rusqlite::Result<usize> {
    conn.execute(
        "INSERT INTO expenses (id, user_id, amount, category, date, payment_method, notes, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
         ON CONFLICT(id) DO UPDATE SET
            amount = ?3, category = ?4, date = ?5, payment_method = ?6, notes = ?7, updated_at = ?9",
        params![
            e.id,
            e.user_id,
            e.amount.to_string(),
            e.category.as_str(),
            e.date.format("%Y-%m-%d").to_string(),
            e.payment_method,
            e.notes,
            e.created_at,
            e.updated_at,
        ],
    )
}

fn get_expense(conn: &Connection, owner: &str, id: &str) -> rusqlite::Result<Option<Expense>> {
    conn.query_row(
        &format!("SELECT {EXPENSE_COLUMNS} FROM expenses WHERE id = ?1 AND user_id = ?2"),
        params![id, owner],
        expense_from_row,
    )
    .optional()
}

#[async_trait]
impl Table<Expense> for SqliteStore {
    async fn select_owned(&self, owner: &str) -> Result<Vec<Expense>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {EXPENSE_COLUMNS} FROM expenses WHERE user_id = ?1
                 ORDER BY date DESC, created_at DESC"
            ))?;
            let rows = stmt.query_map(params![owner], expense_from_row)?;
            Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
        })
    }

    async fn insert(&self, owner: &str, draft: &NewExpense) -> Result<Expense, StoreError> {
        let expense = Expense::from_draft(new_id(), owner.to_string(), draft.clone(), now());
        self.with_conn(|conn| {
            write_expense(conn, &expense)?;
            Ok(())
        })?;
        Ok(expense)
    }

    async fn update(&self, owner: &str, id: &str, patch: &ExpensePatch) -> Result<Expense, StoreError> {
        self.with_conn(|conn| {
            let mut expense = get_expense(conn, owner, id)?.ok_or_else(|| StoreError::NotFound {
                table: Expense::TABLE,
                id: id.to_string(),
            })?;
            expense.apply_patch(patch, now());
            write_expense(conn, &expense)?;
            Ok(expense)
        })
    }

    async fn delete(&self, owner: &str, id: &str) -> Result<(), StoreError> {
        self.with_conn(|conn| {
            let removed = conn.execute(
                "DELETE FROM expenses WHERE id = ?1 AND user_id = ?2",
                params![id, owner],
            )?;
            if removed == 0 {
                return Err(StoreError::NotFound {
                    table: Expense::TABLE,
                    id: id.to_string(),
                });
            }
            Ok(())
        })
    }
}

// ── Budgets ───────────────────────────────────────────────────

const BUDGET_COLUMNS: &str = "id, user_id, category, monthly_limit, month, created_at, updated_at";

fn budget_from_row(row: &Row<'_>) -> rusqlite::Result<Budget> {
    let month_str: String = row.get(4)?;
    let month = MonthKey::from_str(&month_str).map_err(|e| conversion_failure(4, e.to_string()))?;
    Ok(Budget {
        id: row.get(0)?,
        user_id: row.get(1)?,
        category: Category::parse(&row.get::<_, String>(2)?),
        monthly_limit: decimal_col(row, 3)?,
        month,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

fn write_budget(conn: &Connection, b: &Budget) -> rusqlite::Result<usize> {
    conn.execute(
        "INSERT INTO budgets (id, user_id, category, monthly_limit, month, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
         ON CONFLICT(id) DO UPDATE SET monthly_limit = ?4, updated_at = ?7",
        params![
            b.id,
            b.user_id,
            b.category.as_str(),
            b.monthly_limit.to_string(),
            b.month.to_string(),
            b.created_at,
            b.updated_at,
        ],
    )
}

fn get_budget(conn: &Connection, owner: &str, id: &str) -> rusqlite::Result<Option<Budget>> {
    conn.query_row(
        &format!("SELECT {BUDGET_COLUMNS} FROM budgets WHERE id = ?1 AND user_id = ?2"),
        params![id, owner],
        budget_from_row,
    )
    .optional()
}

#[async_trait]
impl Table<Budget> for SqliteStore {
    async fn select_owned(&self, owner: &str) -> Result<Vec<Budget>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {BUDGET_COLUMNS} FROM budgets WHERE user_id = ?1
                 ORDER BY month DESC, created_at DESC"
            ))?;
            let rows = stmt.query_map(params![owner], budget_from_row)?;
            Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
        })
    }

    async fn insert(&self, owner: &str, draft: &NewBudget) -> Result<Budget, StoreError> {
        let budget = Budget::from_draft(new_id(), owner.to_string(), draft.clone(), now());
        self.with_conn(|conn| {
            write_budget(conn, &budget)?;
            Ok(())
        })?;
        Ok(budget)
    }

    async fn update(&self, owner: &str, id: &str, patch: &BudgetPatch) -> Result<Budget, StoreError> {
        self.with_conn(|conn| {
            let mut budget = get_budget(conn, owner, id)?.ok_or_else(|| StoreError::NotFound {
                table: Budget::TABLE,
                id: id.to_string(),
            })?;
            budget.apply_patch(patch, now());
            write_budget(conn, &budget)?;
            Ok(budget)
        })
    }

    async fn delete(&self, owner: &str, id: &str) -> Result<(), StoreError> {
        self.with_conn(|conn| {
            let removed = conn.execute(
                "DELETE FROM budgets WHERE id = ?1 AND user_id = ?2",
                params![id, owner],
            )?;
            if removed == 0 {
                return Err(StoreError::NotFound {
                    table: Budget::TABLE,
                    id: id.to_string(),
                });
            }
            Ok(())
        })
    }
}

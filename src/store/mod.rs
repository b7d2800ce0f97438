//! Remote record stores.
//!
//! The session talks to a backend only through [`Table`], once per record
//! type. Three backends exist: an HTTP one speaking the PostgREST dialect,
//! a local SQLite file, and the degraded [`Unconfigured`] store used when no
//! endpoint is set.

mod rest;
mod schema;
mod sqlite;
mod unconfigured;

use async_trait::async_trait;

use crate::models::Record;

pub(crate) use rest::RestStore;
pub(crate) use sqlite::SqliteStore;
pub(crate) use unconfigured::Unconfigured;

pub(crate) const NOT_CONFIGURED: &str = "remote store is not configured";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("{NOT_CONFIGURED}")]
    NotConfigured,
    #[error("not signed in")]
    SignedOut,
    /// The request never got a usable answer.
    #[error("transport error: {0}")]
    Transport(String),
    /// The backend answered with an error.
    #[error("request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("unexpected response: {0}")]
    Decode(String),
    #[error("{table} row '{id}' not found")]
    NotFound { table: &'static str, id: String },
    #[error("database error: {0}")]
    Database(String),
}

impl StoreError {
    /// Human-readable message for display.
    pub fn message(&self) -> String {
        match self {
            Self::Rejected { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Database(e.to_string())
    }
}

/// One user-owned collection on the backend.
#[async_trait]
pub(crate) trait Table<R: Record>: Send + Sync {
    /// All rows owned by `owner`, newest `R::ORDER_BY` first.
    async fn select_owned(&self, owner: &str) -> Result<Vec<R>, StoreError>;

    /// Insert a row for `owner` and return it as stored.
    async fn insert(&self, owner: &str, draft: &R::Draft) -> Result<R, StoreError>;

    /// Apply a partial update to a row owned by `owner` and return the full
    /// row as stored. `NotFound` when `owner` has no such row.
    async fn update(&self, owner: &str, id: &str, patch: &R::Patch) -> Result<R, StoreError>;

    /// `NotFound` when `owner` has no such row.
    async fn delete(&self, owner: &str, id: &str) -> Result<(), StoreError>;
}

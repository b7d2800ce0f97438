//! Session-scoped access to the user's expenses and budgets.
//!
//! A [`Session`] owns one cache per collection and mirrors every confirmed
//! write into it. Nothing here returns a store failure as anything other
//! than `Err(StoreError)`; listing failures are logged and the last-known
//! rows stay in place.

mod cache;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;
use tracing::{debug, error, warn};

use crate::models::{Budget, Expense, Record};
use crate::store::{StoreError, Table};

use cache::RecordCache;

pub(crate) struct Session {
    user_id: Option<String>,
    expenses: RecordSet<Expense>,
    budgets: RecordSet<Budget>,
    revision: watch::Sender<u64>,
}

impl Session {
    pub(crate) fn new<S>(store: Arc<S>, user_id: Option<String>) -> Self
    where
        S: Table<Expense> + Table<Budget> + 'static,
    {
        let expense_table: Arc<dyn Table<Expense>> = store.clone();
        let budget_table: Arc<dyn Table<Budget>> = store;
        let (revision, _) = watch::channel(0);
        Self {
            user_id: user_id.filter(|u| !u.trim().is_empty()),
            expenses: RecordSet::new(expense_table),
            budgets: RecordSet::new(budget_table),
            revision,
        }
    }

    pub(crate) fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    /// Switch to another user. Both caches start over empty.
    pub(crate) fn sign_in(&mut self, user_id: impl Into<String>) {
        self.user_id = Some(user_id.into());
        self.reset();
    }

    #[cfg(test)]
    pub(crate) fn sign_out(&mut self) {
        self.user_id = None;
        self.reset();
    }

    fn reset(&mut self) {
        self.expenses.lock().clear();
        self.budgets.lock().clear();
        bump(&self.revision);
    }

    pub(crate) fn expenses(&self) -> Records<'_, Expense> {
        Records {
            set: &self.expenses,
            owner: self.user_id.as_deref(),
            revision: &self.revision,
        }
    }

    pub(crate) fn budgets(&self) -> Records<'_, Budget> {
        Records {
            set: &self.budgets,
            owner: self.user_id.as_deref(),
            revision: &self.revision,
        }
    }

    /// List both collections concurrently.
    pub(crate) async fn refresh(&self) {
        let (expenses, budgets) = (self.expenses(), self.budgets());
        tokio::join!(expenses.list(), budgets.list());
    }

    /// Bumped after every change to either cache.
    #[cfg(test)]
    pub(crate) fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    pub(crate) fn revision(&self) -> u64 {
        *self.revision.borrow()
    }
}

fn bump(revision: &watch::Sender<u64>) {
    revision.send_modify(|r| *r += 1);
}

struct RecordSet<R: Record> {
    table: Arc<dyn Table<R>>,
    cache: Mutex<RecordCache<R>>,
}

impl<R: Record> RecordSet<R> {
    fn new(table: Arc<dyn Table<R>>) -> Self {
        Self {
            table,
            cache: Mutex::new(RecordCache::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, RecordCache<R>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// One collection as seen by the signed-in user.
pub(crate) struct Records<'a, R: Record> {
    set: &'a RecordSet<R>,
    owner: Option<&'a str>,
    revision: &'a watch::Sender<u64>,
}

impl<R: Record> Records<'_, R> {
    /// Read-only view of the cached rows.
    pub(crate) fn snapshot(&self) -> Arc<Vec<R>> {
        self.set.lock().snapshot()
    }

    /// Reload from the store. Signed out, this is a no-op returning nothing;
    /// on failure the last-known rows are returned unchanged.
    pub(crate) async fn list(&self) -> Arc<Vec<R>> {
        let Some(owner) = self.owner else {
            return Arc::new(Vec::new());
        };
        let ticket = self.set.lock().issue();
        match self.set.table.select_owned(owner).await {
            Ok(rows) => {
                let count = rows.len();
                if self.set.lock().apply_list(ticket, rows) {
                    debug!(table = R::TABLE, count, "cache refreshed");
                    bump(self.revision);
                } else {
                    warn!(table = R::TABLE, "discarded listing superseded by a newer response");
                }
            }
            Err(e) => {
                self.set.lock().settle(ticket);
                error!(table = R::TABLE, error = %e, "failed to list rows; keeping cached copy");
            }
        }
        self.snapshot()
    }

    pub(crate) async fn add(&self, draft: R::Draft) -> Result<R, StoreError> {
        let owner = self.owner.ok_or(StoreError::SignedOut)?;
        let ticket = self.set.lock().issue();
        let row = self.set.table.insert(owner, &draft).await.map_err(|e| {
            self.set.lock().settle(ticket);
            error!(table = R::TABLE, error = %e, "failed to add row");
            e
        })?;
        if self.set.lock().apply_insert(ticket, row.clone()) {
            debug!(table = R::TABLE, id = row.id(), "row added");
            bump(self.revision);
        } else {
            warn!(table = R::TABLE, id = row.id(), "insert response not applied to cache");
        }
        Ok(row)
    }

    pub(crate) async fn update(&self, id: &str, patch: R::Patch) -> Result<R, StoreError> {
        let owner = self.owner.ok_or(StoreError::SignedOut)?;
        let ticket = self.set.lock().issue();
        let row = self.set.table.update(owner, id, &patch).await.map_err(|e| {
            self.set.lock().settle(ticket);
            error!(table = R::TABLE, id, error = %e, "failed to update row");
            e
        })?;
        if self.set.lock().apply_update(ticket, row.clone()) {
            debug!(table = R::TABLE, id, "row updated");
            bump(self.revision);
        } else {
            warn!(table = R::TABLE, id, "update response not applied to cache");
        }
        Ok(row)
    }

    pub(crate) async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let owner = self.owner.ok_or(StoreError::SignedOut)?;
        let ticket = self.set.lock().issue();
        self.set.table.delete(owner, id).await.map_err(|e| {
            self.set.lock().settle(ticket);
            error!(table = R::TABLE, id, error = %e, "failed to delete row");
            e
        })?;
        if self.set.lock().apply_delete(ticket, id) {
            debug!(table = R::TABLE, id, "row deleted");
            bump(self.revision);
        }
        Ok(())
    }
}

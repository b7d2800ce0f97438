use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use crate::models::Record;

/// Sequence number handed out when a request is issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct Ticket(u64);

/// Last-known rows of one collection plus the bookkeeping needed to apply
/// responses that resolve out of order.
///
/// A response is applied only if no response to a later-issued request
/// covering the same row has been applied already. Deletes are terminal: a
/// deleted id leaves a tombstone and is never brought back by an older
/// insert, update or list.
///
/// Bookkeeping for ids is dropped once no response that could still arrive
/// was issued before it mattered: every pending request and the applied
/// listing are newer.
pub(crate) struct RecordCache<R> {
    rows: Arc<Vec<R>>,
    next_ticket: u64,
    /// Responses to requests issued before this ticket are dropped.
    floor: Ticket,
    /// Ticket of the list response currently reflected in `rows`.
    listed: Option<Ticket>,
    /// Ticket of the last applied insert/update per id.
    touched: HashMap<String, Ticket>,
    /// Per deleted id, the last ticket issued when the delete was confirmed.
    /// Requests issued after that see the row gone on the backend.
    tombstones: HashMap<String, Ticket>,
    /// Issued and not yet settled.
    pending: BTreeSet<Ticket>,
}

impl<R: Record> RecordCache<R> {
    pub(crate) fn new() -> Self {
        Self {
            rows: Arc::new(Vec::new()),
            next_ticket: 0,
            floor: Ticket(0),
            listed: None,
            touched: HashMap::new(),
            tombstones: HashMap::new(),
            pending: BTreeSet::new(),
        }
    }

    pub(crate) fn issue(&mut self) -> Ticket {
        self.next_ticket += 1;
        let ticket = Ticket(self.next_ticket);
        self.pending.insert(ticket);
        ticket
    }

    /// Mark a request as finished without a response to apply.
    pub(crate) fn settle(&mut self, ticket: Ticket) {
        self.pending.remove(&ticket);
    }

    pub(crate) fn snapshot(&self) -> Arc<Vec<R>> {
        Arc::clone(&self.rows)
    }

    /// Forget everything, e.g. when the session user changes. Tickets keep
    /// counting so in-flight responses from before the reset stay stale.
    pub(crate) fn clear(&mut self) {
        self.rows = Arc::new(Vec::new());
        self.next_ticket += 1;
        self.floor = Ticket(self.next_ticket);
        self.listed = None;
        self.touched.clear();
        self.tombstones.clear();
    }

    fn expired(&self, ticket: Ticket) -> bool {
        ticket < self.floor
    }

    fn newer_than(&self, id: &str, ticket: Ticket) -> bool {
        self.touched.get(id).is_some_and(|t| *t > ticket)
    }

    /// Replace the cache with a fresh listing. Returns whether it was applied.
    pub(crate) fn apply_list(&mut self, ticket: Ticket, fetched: Vec<R>) -> bool {
        self.settle(ticket);
        if self.expired(ticket) || self.listed.is_some_and(|t| t > ticket) {
            return false;
        }

        let mut seen = HashSet::new();
        let mut merged = Vec::with_capacity(fetched.len());
        for row in fetched {
            if self.tombstones.contains_key(row.id()) {
                continue;
            }
            seen.insert(row.id().to_string());
            if self.newer_than(row.id(), ticket) {
                // A later write already landed; keep the local copy.
                if let Some(local) = self.rows.iter().find(|r| r.id() == row.id()) {
                    merged.push(local.clone());
                    continue;
                }
            }
            merged.push(row);
        }

        // Rows written after this listing was requested are not in it yet.
        let fresher: Vec<R> = self
            .rows
            .iter()
            .filter(|r| !seen.contains(r.id()) && self.newer_than(r.id(), ticket))
            .cloned()
            .collect();

        let mut rows = fresher;
        rows.extend(merged);
        self.rows = Arc::new(rows);
        self.listed = Some(ticket);
        self.prune(ticket);
        true
    }

    /// Drop per-id entries older than both the applied listing and every
    /// pending request. No response that could still arrive is affected by
    /// them.
    fn prune(&mut self, listed: Ticket) {
        let horizon = self.pending.first().map_or(listed, |p| (*p).min(listed));
        self.touched.retain(|_, t| *t >= horizon);
        self.tombstones.retain(|_, t| *t >= horizon);
    }

    /// Prepend a newly created row.
    pub(crate) fn apply_insert(&mut self, ticket: Ticket, row: R) -> bool {
        self.settle(ticket);
        if self.expired(ticket)
            || self.tombstones.contains_key(row.id())
            || self.newer_than(row.id(), ticket)
        {
            return false;
        }
        if self.rows.iter().any(|r| r.id() == row.id()) {
            // Already brought in by a listing
            self.touched.insert(row.id().to_string(), ticket);
            return false;
        }
        self.touched.insert(row.id().to_string(), ticket);
        Arc::make_mut(&mut self.rows).insert(0, row);
        true
    }

    /// Replace the cached copy of an updated row.
    pub(crate) fn apply_update(&mut self, ticket: Ticket, row: R) -> bool {
        self.settle(ticket);
        if self.expired(ticket)
            || self.tombstones.contains_key(row.id())
            || self.newer_than(row.id(), ticket)
            || self.listed.is_some_and(|t| t > ticket)
        {
            return false;
        }
        let Some(pos) = self.rows.iter().position(|r| r.id() == row.id()) else {
            return false;
        };
        self.touched.insert(row.id().to_string(), ticket);
        Arc::make_mut(&mut self.rows)[pos] = row;
        true
    }

    pub(crate) fn apply_delete(&mut self, ticket: Ticket, id: &str) -> bool {
        self.settle(ticket);
        if self.expired(ticket) {
            return false;
        }
        let confirmed = Ticket(self.next_ticket);
        self.tombstones.insert(id.to_string(), confirmed);
        self.touched.remove(id);
        let before = self.rows.len();
        if self.rows.iter().any(|r| r.id() == id) {
            Arc::make_mut(&mut self.rows).retain(|r| r.id() != id);
        }
        self.rows.len() != before
    }
}

#[cfg(test)]
#[path = "cache_tests.rs"]
mod tests;

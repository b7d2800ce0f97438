use chrono::NaiveDate;

use super::{BudgetOverview, Dashboard, MonthlyReport};
use crate::models::MonthKey;
use crate::session::Session;

/// A derived value together with the inputs it was computed from.
struct Memo<K, V> {
    slot: Option<(K, V)>,
}

impl<K: PartialEq, V> Memo<K, V> {
    fn new() -> Self {
        Self { slot: None }
    }

    fn get_or_compute(&mut self, key: K, computed: &mut usize, f: impl FnOnce() -> V) -> &V {
        if self.slot.as_ref().is_some_and(|(k, _)| *k != key) {
            self.slot = None;
        }
        &self
            .slot
            .get_or_insert_with(|| {
                *computed += 1;
                (key, f())
            })
            .1
    }
}

/// Cached views over a session. A view is recomputed only when the session
/// revision or the selected month (or day) differs from the last call, so a
/// value computed from older data is never handed out after a change.
///
/// The memo pays off only when one `Views` outlives several reads. Each CLI
/// command builds a fresh one and reads a single view, so there it is just
/// the entry point to `Dashboard::compute` and friends.
pub(crate) struct Views {
    dashboard: Memo<(u64, NaiveDate), Dashboard>,
    report: Memo<(u64, MonthKey), MonthlyReport>,
    budgets: Memo<(u64, MonthKey), BudgetOverview>,
    computed: usize,
}

impl Views {
    pub(crate) fn new() -> Self {
        Self {
            dashboard: Memo::new(),
            report: Memo::new(),
            budgets: Memo::new(),
            computed: 0,
        }
    }

    pub(crate) fn dashboard(&mut self, session: &Session, today: NaiveDate) -> &Dashboard {
        self.dashboard
            .get_or_compute((session.revision(), today), &mut self.computed, || {
                Dashboard::compute(&session.expenses().snapshot(), today)
            })
    }

    pub(crate) fn report(&mut self, session: &Session, month: MonthKey) -> &MonthlyReport {
        self.report
            .get_or_compute((session.revision(), month), &mut self.computed, || {
                MonthlyReport::compute(&session.expenses().snapshot(), month)
            })
    }

    pub(crate) fn budgets(&mut self, session: &Session, month: MonthKey) -> &BudgetOverview {
        self.budgets
            .get_or_compute((session.revision(), month), &mut self.computed, || {
                BudgetOverview::compute(
                    &session.budgets().snapshot(),
                    &session.expenses().snapshot(),
                    month,
                )
            })
    }

    /// How many views have been computed so far.
    #[cfg(test)]
    pub(crate) fn computed(&self) -> usize {
        self.computed
    }
}

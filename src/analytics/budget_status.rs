use rust_decimal::Decimal;

use super::in_month;
use crate::models::{Budget, Category, Expense, MonthKey};

const APPROACHING_PERCENT: Decimal = Decimal::from_parts(80, 0, 0, false, 0);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BudgetStatus {
    WithinBudget,
    ApproachingLimit,
    OverBudget,
}

impl BudgetStatus {
    pub(crate) fn label(&self) -> &'static str {
        match self {
            Self::WithinBudget => "Within Budget",
            Self::ApproachingLimit => "Approaching Limit",
            Self::OverBudget => "Over Budget",
        }
    }
}

/// Spending as a share of the limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Utilization {
    Percent(Decimal),
    /// Something was spent against a limit of zero.
    Unbounded,
}

impl Utilization {
    pub(crate) fn of(spent: Decimal, limit: Decimal) -> Self {
        if limit <= Decimal::ZERO {
            return if spent > Decimal::ZERO {
                Self::Unbounded
            } else {
                Self::Percent(Decimal::ZERO)
            };
        }
        spent
            .checked_div(limit)
            .and_then(|r| r.checked_mul(Decimal::ONE_HUNDRED))
            .map_or(Self::Unbounded, Self::Percent)
    }

    pub(crate) fn status(&self) -> BudgetStatus {
        match *self {
            Self::Unbounded => BudgetStatus::OverBudget,
            Self::Percent(p) if p >= Decimal::ONE_HUNDRED => BudgetStatus::OverBudget,
            Self::Percent(p) if p >= APPROACHING_PERCENT => BudgetStatus::ApproachingLimit,
            Self::Percent(_) => BudgetStatus::WithinBudget,
        }
    }
}

/// A budget joined with what was spent in its category and month.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct BudgetUsage {
    pub budget: Budget,
    pub spent: Decimal,
}

impl BudgetUsage {
    pub(crate) fn new(budget: Budget, expenses: &[Expense]) -> Self {
        let spent = in_month(expenses, budget.month)
            .filter(|e| e.category == budget.category)
            .map(|e| e.amount)
            .sum();
        Self { budget, spent }
    }

    pub(crate) fn utilization(&self) -> Utilization {
        Utilization::of(self.spent, self.budget.monthly_limit)
    }

    pub(crate) fn status(&self) -> BudgetStatus {
        self.utilization().status()
    }

    /// Limit minus spending; negative when over.
    pub(crate) fn remaining(&self) -> Decimal {
        self.budget.monthly_limit - self.spent
    }

    /// Utilization clamped to 0..=100 for progress bars.
    pub(crate) fn fill_percent(&self) -> Decimal {
        match self.utilization() {
            Utilization::Percent(p) => p.clamp(Decimal::ZERO, Decimal::ONE_HUNDRED),
            Utilization::Unbounded => Decimal::ONE_HUNDRED,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct BudgetOverview {
    pub month: MonthKey,
    pub budgets: Vec<BudgetUsage>,
    pub total_budget: Decimal,
    pub total_spent: Decimal,
    pub over_budget_count: usize,
    pub approaching_limit_count: usize,
    /// Categories with more than one budget this month.
    pub duplicates: Vec<Category>,
}

impl BudgetOverview {
    pub(crate) fn compute(budgets: &[Budget], expenses: &[Expense], month: MonthKey) -> Self {
        let usages: Vec<BudgetUsage> = budgets
            .iter()
            .filter(|b| b.month == month)
            .map(|b| BudgetUsage::new(b.clone(), expenses))
            .collect();
        let count = |status: BudgetStatus| usages.iter().filter(|u| u.status() == status).count();
        Self {
            month,
            total_budget: usages.iter().map(|u| u.budget.monthly_limit).sum(),
            total_spent: usages.iter().map(|u| u.spent).sum(),
            over_budget_count: count(BudgetStatus::OverBudget),
            approaching_limit_count: count(BudgetStatus::ApproachingLimit),
            duplicates: duplicate_keys(budgets)
                .into_iter()
                .filter(|(_, m)| *m == month)
                .map(|(c, _)| c)
                .collect(),
            budgets: usages,
        }
    }
}

/// (category, month) pairs that have more than one budget, in first-seen
/// order. One budget per pair is a convention the stores do not enforce.
pub(crate) fn duplicate_keys(budgets: &[Budget]) -> Vec<(Category, MonthKey)> {
    let mut seen = std::collections::HashSet::new();
    let mut dupes = Vec::new();
    for b in budgets {
        let key = (b.category, b.month);
        if !seen.insert(key) && !dupes.contains(&key) {
            dupes.push(key);
        }
    }
    dupes
}

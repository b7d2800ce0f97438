use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{Category, MonthKey, Record};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    pub id: String,
    pub user_id: String,
    pub category: Category,
    pub monthly_limit: Decimal,
    pub month: MonthKey,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewBudget {
    pub category: Category,
    pub monthly_limit: Decimal,
    pub month: MonthKey,
}

/// Category and month are fixed once a budget exists; only the limit moves.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BudgetPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monthly_limit: Option<Decimal>,
}

impl Record for Budget {
    type Draft = NewBudget;
    type Patch = BudgetPatch;

    const TABLE: &'static str = "budgets";
    const ORDER_BY: &'static str = "month";

    fn id(&self) -> &str {
        &self.id
    }

    fn owner(&self) -> &str {
        &self.user_id
    }

    fn order_key(&self) -> String {
        self.month.to_string()
    }

    fn from_draft(id: String, owner: String, draft: NewBudget, timestamp: String) -> Self {
        Self {
            id,
            user_id: owner,
            category: draft.category,
            monthly_limit: draft.monthly_limit,
            month: draft.month,
            created_at: timestamp.clone(),
            updated_at: timestamp,
        }
    }

    fn apply_patch(&mut self, patch: &BudgetPatch, timestamp: String) {
        if let Some(limit) = patch.monthly_limit {
            self.monthly_limit = limit;
        }
        self.updated_at = timestamp;
    }
}

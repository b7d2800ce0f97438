use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::month::date_only;
use super::{Category, Record};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: String,
    pub user_id: String,
    pub amount: Decimal,
    pub category: Category,
    #[serde(with = "date_only")]
    pub date: NaiveDate,
    pub payment_method: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

impl Expense {
    pub fn notes_or_empty(&self) -> &str {
        self.notes.as_deref().unwrap_or("")
    }
}

/// What the caller submits for a new expense. Owner, id and timestamps are
/// filled in by the session and the store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewExpense {
    pub amount: Decimal,
    pub category: Category,
    #[serde(with = "date_only")]
    pub date: NaiveDate,
    pub payment_method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Partial update; only `Some` fields are sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExpensePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_opt_date"
    )]
    pub date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl ExpensePatch {
    pub fn is_empty(&self) -> bool {
        self.amount.is_none()
            && self.category.is_none()
            && self.date.is_none()
            && self.payment_method.is_none()
            && self.notes.is_none()
    }
}

fn serialize_opt_date<S: serde::Serializer>(
    date: &Option<NaiveDate>,
    s: S,
) -> Result<S::Ok, S::Error> {
    match date {
        Some(d) => date_only::serialize(d, s),
        None => s.serialize_none(),
    }
}

impl Record for Expense {
    type Draft = NewExpense;
    type Patch = ExpensePatch;

    const TABLE: &'static str = "expenses";
    const ORDER_BY: &'static str = "date";

    fn id(&self) -> &str {
        &self.id
    }

    fn owner(&self) -> &str {
        &self.user_id
    }

    fn order_key(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }

    fn from_draft(id: String, owner: String, draft: NewExpense, timestamp: String) -> Self {
        Self {
            id,
            user_id: owner,
            amount: draft.amount,
            category: draft.category,
            date: draft.date,
            payment_method: draft.payment_method,
            notes: draft.notes,
            created_at: timestamp.clone(),
            updated_at: timestamp,
        }
    }

    fn apply_patch(&mut self, patch: &ExpensePatch, timestamp: String) {
        if let Some(amount) = patch.amount {
            self.amount = amount;
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(date) = patch.date {
            self.date = date;
        }
        if let Some(ref method) = patch.payment_method {
            self.payment_method = method.clone();
        }
        if let Some(ref notes) = patch.notes {
            self.notes = Some(notes.clone());
        }
        self.updated_at = timestamp;
    }
}

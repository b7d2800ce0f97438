mod budget;
mod category;
mod expense;
mod month;
mod record;

pub use budget::{Budget, BudgetPatch, NewBudget};
pub use category::{Category, PAYMENT_METHODS};
pub use expense::{Expense, ExpensePatch, NewExpense};
pub(crate) use month::date_only;
pub use month::{DateWindow, MonthKey};
pub use record::Record;

#[cfg(test)]
mod tests;

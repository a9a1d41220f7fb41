//! Field checks applied before a record is accepted into the collection.

use expense_domain::Expense;

use crate::{expense_service::ExpenseService, CoreError};

pub struct ExpenseValidator;

impl ExpenseValidator {
    /// Title must be non-blank; amount must be finite and non-negative.
    pub fn validate_fields(expense: &Expense) -> Result<(), CoreError> {
        if expense.title.trim().is_empty() {
            return Err(CoreError::Validation("title must not be empty".into()));
        }
        if !expense.amount.is_finite() {
            return Err(CoreError::Validation(format!(
                "amount `{}` is not a number",
                expense.amount
            )));
        }
        if expense.amount < 0.0 {
            return Err(CoreError::Validation(format!(
                "amount {} must not be negative",
                expense.amount
            )));
        }
        Ok(())
    }

    /// Field checks plus identity checks for a record about to be added.
    pub fn validate_new(existing: &[Expense], expense: &Expense) -> Result<(), CoreError> {
        if expense.id.trim().is_empty() {
            return Err(CoreError::Validation("id must not be empty".into()));
        }
        if ExpenseService::contains(existing, &expense.id) {
            return Err(CoreError::DuplicateId(expense.id.clone()));
        }
        Self::validate_fields(expense)
    }
}

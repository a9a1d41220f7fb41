//! List operations over the canonical newest-first expense sequence.

use expense_domain::{Expense, ExpenseUpdate};

/// Stateless helpers that mutate an expense sequence in place.
pub struct ExpenseService;

impl ExpenseService {
    /// Places `expense` at the front so the sequence stays newest-first.
    pub fn add(expenses: &mut Vec<Expense>, expense: Expense) {
        expenses.insert(0, expense);
    }

    /// Replaces the fields of every entry whose id matches `edited.id`.
    ///
    /// Returns the number of entries touched; zero leaves the sequence untouched.
    pub fn update(expenses: &mut [Expense], edited: &Expense) -> usize {
        Self::patch(expenses, &edited.id, &ExpenseUpdate::from(edited))
    }

    /// Applies a partial update to every entry whose id matches `id`.
    pub fn patch(expenses: &mut [Expense], id: &str, update: &ExpenseUpdate) -> usize {
        let mut touched = 0;
        for expense in expenses.iter_mut().filter(|expense| expense.id == id) {
            expense.apply(update);
            touched += 1;
        }
        touched
    }

    /// Drops every entry with the given id, returning how many were removed.
    pub fn remove(expenses: &mut Vec<Expense>, id: &str) -> usize {
        let before = expenses.len();
        expenses.retain(|expense| expense.id != id);
        before - expenses.len()
    }

    pub fn find<'a>(expenses: &'a [Expense], id: &str) -> Option<&'a Expense> {
        expenses.iter().find(|expense| expense.id == id)
    }

    pub fn contains(expenses: &[Expense], id: &str) -> bool {
        Self::find(expenses, id).is_some()
    }
}

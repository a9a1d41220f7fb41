//! Derived read views: filtered sequence and running total.

use chrono::{DateTime, TimeZone};
use expense_domain::{Expense, ExpenseFilter};

pub struct FilterService;

impl FilterService {
    /// Entries passing `filter` at `now`, in the order of `expenses`.
    pub fn filtered<Tz: TimeZone>(
        expenses: &[Expense],
        filter: &ExpenseFilter,
        now: &DateTime<Tz>,
    ) -> Vec<Expense> {
        Self::filtered_refs(expenses, filter, now)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Borrowing variant of [`FilterService::filtered`].
    pub fn filtered_refs<'a, Tz: TimeZone>(
        expenses: &'a [Expense],
        filter: &ExpenseFilter,
        now: &DateTime<Tz>,
    ) -> Vec<&'a Expense> {
        expenses
            .iter()
            .filter(|expense| filter.matches(expense, now))
            .collect()
    }

    /// Sum of amounts. Empty input yields `0.0`.
    pub fn total<'a, I>(expenses: I) -> f64
    where
        I: IntoIterator<Item = &'a Expense>,
    {
        expenses.into_iter().map(|expense| expense.amount).sum()
    }
}

//! Category-wise aggregation backing the analytics chart.

use expense_domain::{Category, Expense};

/// Spending total for a single category.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryTotal {
    pub category: Category,
    pub total: f64,
    pub count: usize,
}

/// Per-category totals in first-appearance order plus their grand total.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryBreakdown {
    pub entries: Vec<CategoryTotal>,
    pub total: f64,
}

impl CategoryBreakdown {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, category: Category) -> Option<&CategoryTotal> {
        self.entries.iter().find(|entry| entry.category == category)
    }

    /// Percentage of the grand total spent in `category`; `0.0` when nothing was spent.
    pub fn share(&self, category: Category) -> f64 {
        if self.total == 0.0 {
            return 0.0;
        }
        self.get(category)
            .map(|entry| entry.total / self.total * 100.0)
            .unwrap_or(0.0)
    }
}

pub struct SummaryService;

impl SummaryService {
    pub fn breakdown<'a, I>(expenses: I) -> CategoryBreakdown
    where
        I: IntoIterator<Item = &'a Expense>,
    {
        let mut breakdown = CategoryBreakdown::default();
        for expense in expenses {
            breakdown.total += expense.amount;
            match breakdown
                .entries
                .iter_mut()
                .find(|entry| entry.category == expense.category)
            {
                Some(entry) => {
                    entry.total += expense.amount;
                    entry.count += 1;
                }
                None => breakdown.entries.push(CategoryTotal {
                    category: expense.category,
                    total: expense.amount,
                    count: 1,
                }),
            }
        }
        breakdown
    }
}

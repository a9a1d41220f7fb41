//! expense-domain
//!
//! Pure domain models (Expense, Category, DateRange, ExpenseFilter).
//! No I/O, no CLI, no storage. Only data types and core enums.

pub mod category;
pub mod expense;
pub mod filter;

pub use category::*;
pub use expense::*;
pub use filter::*;

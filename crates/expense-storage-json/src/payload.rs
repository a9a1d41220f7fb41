//! Text payload holding the whole expense collection under one key.
//!
//! The payload is a compact JSON array of records:
//! `[{"id":"1","title":"Coffee","amount":3.5,"category":"Food","date":"2024-01-01T00:00:00.000Z"}]`

use expense_core::CoreError;
use expense_domain::Expense;

pub fn encode_expenses(expenses: &[Expense]) -> Result<String, CoreError> {
    serde_json::to_string(expenses).map_err(|err| CoreError::Serde(err.to_string()))
}

pub fn decode_expenses(raw: &str) -> Result<Vec<Expense>, CoreError> {
    serde_json::from_str(raw).map_err(|err| CoreError::Serde(err.to_string()))
}

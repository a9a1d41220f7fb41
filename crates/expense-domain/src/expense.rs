//! Expense records and partial updates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::category::Category;

/// A single recorded monetary outlay.
///
/// `date` is the moment the expense occurred, not when it was entered. It
/// travels as an ISO-8601 string (`2024-01-01T00:00:00.000Z`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Expense {
    pub id: String,
    pub title: String,
    #[serde(deserialize_with = "nullable_amount")]
    pub amount: f64,
    pub category: Category,
    #[serde(with = "iso_timestamp")]
    pub date: DateTime<Utc>,
}

/// JSON has no NaN, so a non-finite amount is written as `null`. Read it back as NaN.
fn nullable_amount<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
}

impl Expense {
    /// Builds an expense with a freshly generated identifier.
    pub fn new(
        title: impl Into<String>,
        amount: f64,
        category: Category,
        date: DateTime<Utc>,
    ) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), title, amount, category, date)
    }

    /// Builds an expense using a caller-assigned identifier.
    pub fn with_id(
        id: impl Into<String>,
        title: impl Into<String>,
        amount: f64,
        category: Category,
        date: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            amount,
            category,
            date,
        }
    }

    /// Overwrites every field present in `update`; `id` never changes.
    pub fn apply(&mut self, update: &ExpenseUpdate) {
        if let Some(title) = &update.title {
            self.title = title.clone();
        }
        if let Some(amount) = update.amount {
            self.amount = amount;
        }
        if let Some(category) = update.category {
            self.category = category;
        }
        if let Some(date) = update.date {
            self.date = date;
        }
    }
}

/// Partial edit of an expense. Absent fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExpenseUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "iso_timestamp::option"
    )]
    pub date: Option<DateTime<Utc>>,
}

impl ExpenseUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.amount.is_none() && self.category.is_none() && self.date.is_none()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn amount(mut self, amount: f64) -> Self {
        self.amount = Some(amount);
        self
    }

    pub fn category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    pub fn date(mut self, date: DateTime<Utc>) -> Self {
        self.date = Some(date);
        self
    }
}

impl From<&Expense> for ExpenseUpdate {
    fn from(expense: &Expense) -> Self {
        Self {
            title: Some(expense.title.clone()),
            amount: Some(expense.amount),
            category: Some(expense.category),
            date: Some(expense.date),
        }
    }
}

/// Serde adapter writing timestamps as `YYYY-MM-DDTHH:MM:SS.mmmZ`.
///
/// Sub-millisecond precision is written out in full so a round trip is exact.
pub mod iso_timestamp {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn format(date: &DateTime<Utc>) -> String {
        let format = if date.timestamp_subsec_nanos() % 1_000_000 == 0 {
            SecondsFormat::Millis
        } else {
            SecondsFormat::AutoSi
        };
        date.to_rfc3339_opts(format, true)
    }

    pub fn parse(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
        DateTime::parse_from_rfc3339(raw.trim()).map(|date| date.with_timezone(&Utc))
    }

    pub fn serialize<S>(date: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format(date))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).map_err(de::Error::custom)
    }

    pub mod option {
        use chrono::{DateTime, Utc};
        use serde::{de, Deserialize, Deserializer, Serializer};

        pub fn serialize<S>(date: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            match date {
                Some(date) => serializer.serialize_some(&super::format(date)),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
        where
            D: Deserializer<'de>,
        {
            Option::<String>::deserialize(deserializer)?
                .map(|raw| super::parse(&raw).map_err(de::Error::custom))
                .transpose()
        }
    }
}

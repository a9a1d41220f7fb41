//! View filters narrowing which expenses are listed and summed.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Datelike, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::{category::Category, expense::Expense};

pub const MILLIS_PER_DAY: i64 = 86_400_000;

/// Relative time window applied to an expense's date.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DateRange {
    #[default]
    All,
    Day,
    Week,
    Month,
}

impl DateRange {
    pub const ALL: [DateRange; 4] = [
        DateRange::All,
        DateRange::Day,
        DateRange::Week,
        DateRange::Month,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DateRange::All => "all",
            DateRange::Day => "day",
            DateRange::Week => "week",
            DateRange::Month => "month",
        }
    }

    /// Human-facing picker label.
    pub fn label(self) -> &'static str {
        match self {
            DateRange::All => "All Time",
            DateRange::Day => "Today",
            DateRange::Week => "This Week",
            DateRange::Month => "This Month",
        }
    }

    /// Checks `date` against the window ending at `now`.
    ///
    /// `Day` and `Week` are rolling windows of 24h and 7x24h measured back
    /// from `now`; dates after `now` always pass them. `Month` is a calendar
    /// match evaluated in `now`'s timezone.
    pub fn contains<Tz: TimeZone>(self, date: DateTime<Utc>, now: &DateTime<Tz>) -> bool {
        match self {
            DateRange::All => true,
            DateRange::Day => elapsed_millis(date, now) < MILLIS_PER_DAY,
            DateRange::Week => elapsed_millis(date, now) < 7 * MILLIS_PER_DAY,
            DateRange::Month => {
                let local = date.with_timezone(&now.timezone());
                local.year() == now.year() && local.month() == now.month()
            }
        }
    }
}

fn elapsed_millis<Tz: TimeZone>(date: DateTime<Utc>, now: &DateTime<Tz>) -> i64 {
    (now.with_timezone(&Utc) - date).num_milliseconds()
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseDateRangeError(pub String);

impl fmt::Display for ParseDateRangeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown range `{}` (expected one of: all, day, week, month)",
            self.0
        )
    }
}

impl std::error::Error for ParseDateRangeError {}

impl FromStr for DateRange {
    type Err = ParseDateRangeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let needle = value.trim();
        DateRange::ALL
            .into_iter()
            .find(|range| range.as_str().eq_ignore_ascii_case(needle))
            .ok_or_else(|| ParseDateRangeError(needle.to_string()))
    }
}

/// Active view specification. Never persisted.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExpenseFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(default)]
    pub range: DateRange,
}

impl ExpenseFilter {
    pub fn new(category: Option<Category>, range: DateRange) -> Self {
        Self { category, range }
    }

    pub fn with_category(mut self, category: Option<Category>) -> Self {
        self.category = category;
        self
    }

    pub fn with_range(mut self, range: DateRange) -> Self {
        self.range = range;
        self
    }

    /// Returns `true` when the filter lets every expense through.
    pub fn is_unrestricted(&self) -> bool {
        self.category.is_none() && self.range == DateRange::All
    }

    /// Category predicate first, then the range predicate.
    pub fn matches<Tz: TimeZone>(&self, expense: &Expense, now: &DateTime<Tz>) -> bool {
        let category_ok = self
            .category
            .map_or(true, |category| expense.category == category);
        category_ok && self.range.contains(expense.date, now)
    }
}

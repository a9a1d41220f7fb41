//! Text rendering for expense lists, totals, and the category chart.

use chrono::{DateTime, FixedOffset, Utc};
use expense_core::CategoryBreakdown;
use expense_domain::{Expense, ExpenseFilter};

const BAR_WIDTH: usize = 24;

pub fn amount(symbol: &str, value: f64) -> String {
    if value.is_finite() {
        format!("{}{:.2}", symbol, value)
    } else {
        format!("{}{}", symbol, value)
    }
}

pub fn date(value: &DateTime<Utc>, offset: &FixedOffset) -> String {
    value.with_timezone(offset).format("%Y-%m-%d %H:%M").to_string()
}

/// `Food, This Week` style description of the active filter.
pub fn filter_label(filter: &ExpenseFilter) -> String {
    let category = filter
        .category
        .map(|category| category.as_str())
        .unwrap_or("All Categories");
    format!("{}, {}", category, filter.range.label())
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Alignment {
    Left,
    Right,
}

/// Column-aligned plain-text table.
pub struct Table {
    headers: Vec<&'static str>,
    alignments: Vec<Alignment>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(columns: &[(&'static str, Alignment)]) -> Self {
        Self {
            headers: columns.iter().map(|(header, _)| *header).collect(),
            alignments: columns.iter().map(|(_, alignment)| *alignment).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    fn widths(&self) -> Vec<usize> {
        self.headers
            .iter()
            .enumerate()
            .map(|(idx, header)| {
                self.rows
                    .iter()
                    .filter_map(|row| row.get(idx))
                    .map(|cell| visible_width(cell))
                    .fold(visible_width(header), usize::max)
            })
            .collect()
    }

    fn render_row(&self, cells: &[&str], widths: &[usize]) -> String {
        widths
            .iter()
            .enumerate()
            .map(|(idx, width)| {
                let cell = cells.get(idx).copied().unwrap_or("");
                let pad = " ".repeat(width.saturating_sub(visible_width(cell)));
                match self.alignments[idx] {
                    Alignment::Left => format!("{cell}{pad}"),
                    Alignment::Right => format!("{pad}{cell}"),
                }
            })
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    }

    pub fn render(&self) -> Vec<String> {
        let widths = self.widths();
        let mut lines = Vec::with_capacity(self.rows.len() + 2);
        lines.push(self.render_row(&self.headers, &widths));
        let rule_width = widths.iter().sum::<usize>() + 2 * widths.len().saturating_sub(1);
        lines.push("-".repeat(rule_width));
        for row in &self.rows {
            let cells: Vec<&str> = row.iter().map(String::as_str).collect();
            lines.push(self.render_row(&cells, &widths));
        }
        lines
    }
}

fn visible_width(text: &str) -> usize {
    text.chars().count()
}

pub fn expense_table(expenses: &[Expense], symbol: &str, offset: &FixedOffset) -> Table {
    let mut table = Table::new(&[
        ("ID", Alignment::Left),
        ("Date", Alignment::Left),
        ("Title", Alignment::Left),
        ("Category", Alignment::Left),
        ("Amount", Alignment::Right),
    ]);
    for expense in expenses {
        table.push(vec![
            expense.id.clone(),
            date(&expense.date, offset),
            expense.title.clone(),
            expense.category.to_string(),
            amount(symbol, expense.amount),
        ]);
    }
    table
}

/// One line per category: name, bar, percentage share, and amount.
pub fn chart_lines(breakdown: &CategoryBreakdown, symbol: &str) -> Vec<String> {
    let name_width = breakdown
        .entries
        .iter()
        .map(|entry| entry.category.as_str().len())
        .max()
        .unwrap_or(0);
    breakdown
        .entries
        .iter()
        .map(|entry| {
            let share = breakdown.share(entry.category);
            format!(
                "{:<name_width$}  {:<bar_width$}  {:>5.1}%  {}",
                entry.category.as_str(),
                bar(share),
                share,
                amount(symbol, entry.total),
                bar_width = BAR_WIDTH,
            )
        })
        .collect()
}

fn bar(share: f64) -> String {
    let filled = if share.is_finite() {
        ((share / 100.0) * BAR_WIDTH as f64).round().clamp(0.0, BAR_WIDTH as f64) as usize
    } else {
        0
    };
    "#".repeat(filled)
}

use expense_domain::{Category, DateRange, ExpenseFilter};

use crate::cli::core::{parse_category, parse_range, CommandError, CommandResult, ShellContext};
use crate::cli::format;
use crate::cli::io;
use crate::cli::output::{line as output_line, section as output_section};
use crate::cli::registry::CommandEntry;
use crate::errors::TrackerError;

const EMPTY_CHART: &str = "No expenses match the current filters.";

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![
        CommandEntry::new("list", "List filtered expenses, newest first", "list", cmd_list),
        CommandEntry::new(
            "filter",
            "Show or change the category and time range filter",
            "filter [category|all] [all|day|week|month] | filter reset",
            cmd_filter,
        ),
        CommandEntry::new("total", "Sum of the filtered expenses", "total", cmd_total),
        CommandEntry::new("chart", "Spending by category", "chart", cmd_chart),
        CommandEntry::new(
            "export",
            "Print the filtered expenses as JSON records",
            "export",
            cmd_export,
        ),
    ]
}

fn cmd_list(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let filtered = context.store.filtered();
    let symbol = &context.config.currency_symbol;
    output_section(format!("My Expenses ({})", format::filter_label(context.store.filter())));
    if filtered.is_empty() {
        io::print_info("No expenses to show.");
    } else {
        let table = format::expense_table(&filtered, symbol, &context.store.utc_offset());
        for row in table.render() {
            output_line(row);
        }
    }
    output_line(format!("Total: {}", format::amount(symbol, context.store.total())));
    Ok(())
}

fn cmd_filter(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let current = *context.store.filter();
    let next = match args {
        [] => {
            io::print_info(format!("Filter: {}", format::filter_label(&current)));
            return Ok(());
        }
        [word] if word.eq_ignore_ascii_case("reset") => ExpenseFilter::default(),
        [word] => match parse_category_choice(word) {
            Ok(category) => current.with_category(category),
            Err(category_err) => match parse_range(word) {
                Ok(range) if range != DateRange::All => current.with_range(range),
                _ => return Err(category_err),
            },
        },
        [category, range] => ExpenseFilter::new(parse_category_choice(category)?, parse_range(range)?),
        _ => {
            return Err(CommandError::InvalidArguments(
                "usage: filter [category|all] [all|day|week|month]".into(),
            ))
        }
    };
    context.store.set_filter(next);
    io::print_info(format!("Filter: {}", format::filter_label(&next)));
    Ok(())
}

/// `all` clears the category; anything else must name one.
fn parse_category_choice(input: &str) -> Result<Option<Category>, CommandError> {
    if input.trim().eq_ignore_ascii_case("all") {
        return Ok(None);
    }
    parse_category(input).map(Some)
}

fn cmd_total(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let symbol = &context.config.currency_symbol;
    output_line(format!("Total: {}", format::amount(symbol, context.store.total())));
    Ok(())
}

fn cmd_chart(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let breakdown = context.store.category_totals();
    output_section(format!(
        "Spending by Category ({})",
        format::filter_label(context.store.filter())
    ));
    if breakdown.is_empty() {
        output_line(EMPTY_CHART);
        return Ok(());
    }
    let symbol = &context.config.currency_symbol;
    for row in format::chart_lines(&breakdown, symbol) {
        output_line(row);
    }
    output_line(format!("Total: {}", format::amount(symbol, breakdown.total)));
    Ok(())
}

fn cmd_export(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let filtered = context.store.filtered();
    let json = serde_json::to_string_pretty(&filtered).map_err(TrackerError::from)?;
    output_line(json);
    Ok(())
}

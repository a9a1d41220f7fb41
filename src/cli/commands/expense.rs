use chrono::Utc;
use expense_domain::{Expense, ExpenseFilter, ExpenseUpdate};

use crate::cli::core::{
    parse_amount, parse_category, parse_date, CliMode, CommandError, CommandResult, ShellContext,
};
use crate::cli::format;
use crate::cli::io;
use crate::cli::output::{line as output_line, section as output_section};
use crate::cli::registry::CommandEntry;

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![
        CommandEntry::new(
            "add",
            "Record a new expense",
            "add <title> <amount> <category> [YYYY-MM-DD|RFC3339]",
            cmd_add,
        ),
        CommandEntry::new(
            "edit",
            "Change fields of an expense",
            "edit <id> [title=..] [amount=..] [category=..] [date=..]",
            cmd_edit,
        ),
        CommandEntry::new("delete", "Remove an expense", "delete <id>", cmd_delete),
        CommandEntry::new("show", "Show one expense in detail", "show <id>", cmd_show),
    ]
}

fn cmd_add(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [title, amount, category, rest @ ..] = args else {
        return Err(CommandError::InvalidArguments(
            "usage: add <title> <amount> <category> [date]".into(),
        ));
    };
    if title.trim().is_empty() {
        return Err(CommandError::InvalidArguments("title must not be blank".into()));
    }
    let amount = parse_amount(amount)?;
    let category = parse_category(category)?;
    let date = match rest {
        [] => context.store.now().with_timezone(&Utc),
        [date] => parse_date(date, &context.store.utc_offset())?,
        _ => {
            return Err(CommandError::InvalidArguments(
                "too many arguments; quote titles containing spaces".into(),
            ))
        }
    };

    let expense = Expense::new(title.trim(), amount, category, date);
    let id = expense.id.clone();
    context.store.add_expense(expense)?;
    context.store.set_filter(ExpenseFilter::default());
    io::print_success(format!("Added expense `{}`.", id));
    Ok(())
}

fn cmd_edit(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let Some((id, assignments)) = args.split_first() else {
        return Err(CommandError::InvalidArguments(
            "usage: edit <id> field=value...".into(),
        ));
    };
    if assignments.is_empty() {
        return Err(CommandError::InvalidArguments(
            "nothing to change; pass at least one field=value".into(),
        ));
    }

    let offset = context.store.utc_offset();
    let mut update = ExpenseUpdate::default();
    for assignment in assignments {
        let Some((field, value)) = assignment.split_once('=') else {
            return Err(CommandError::InvalidArguments(format!(
                "expected field=value, got `{}`",
                assignment
            )));
        };
        update = match field.trim().to_ascii_lowercase().as_str() {
            "title" => {
                if value.trim().is_empty() {
                    return Err(CommandError::InvalidArguments("title must not be blank".into()));
                }
                update.title(value.trim())
            }
            "amount" => update.amount(parse_amount(value)?),
            "category" => update.category(parse_category(value)?),
            "date" => update.date(parse_date(value, &offset)?),
            other => {
                return Err(CommandError::InvalidArguments(format!(
                    "unknown field `{}` (title, amount, category, date)",
                    other
                )))
            }
        };
    }

    if context.store.patch_expense(id, update)? {
        io::print_success(format!("Updated expense `{}`.", id));
    } else {
        io::print_warning(format!("No expense with id `{}`.", id));
    }
    Ok(())
}

fn cmd_delete(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [id] = args else {
        return Err(CommandError::InvalidArguments("usage: delete <id>".into()));
    };
    let Some(expense) = context.store.find(id) else {
        io::print_warning(format!("No expense with id `{}`.", id));
        return Ok(());
    };
    if context.mode == CliMode::Interactive {
        let prompt = format!("Delete `{}`?", expense.title);
        if !io::confirm_action(&context.theme, &prompt, false)? {
            io::print_info("Delete cancelled.");
            return Ok(());
        }
    }
    if context.store.delete_expense(id) {
        io::print_success(format!("Deleted expense `{}`.", id));
    }
    Ok(())
}

fn cmd_show(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [id] = args else {
        return Err(CommandError::InvalidArguments("usage: show <id>".into()));
    };
    let Some(expense) = context.store.find(id) else {
        return Err(CommandError::Message(format!("No expense with id `{}`.", id)));
    };
    let symbol = &context.config.currency_symbol;
    output_section(format!("Expense {}", expense.id));
    output_line(format!("  Title   : {}", expense.title));
    output_line(format!("  Amount  : {}", format::amount(symbol, expense.amount)));
    output_line(format!("  Category: {}", expense.category));
    output_line(format!(
        "  Date    : {}",
        format::date(&expense.date, &context.store.utc_offset())
    ));
    Ok(())
}

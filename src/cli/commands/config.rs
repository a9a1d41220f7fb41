use expense_config::{PersistenceMode, ValidationMode};

use crate::cli::core::{CliMode, CommandError, CommandResult, ShellContext};
use crate::cli::io;
use crate::cli::output::{self, line as output_line, section as output_section, OutputPreferences};
use crate::cli::registry::CommandEntry;

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![
        CommandEntry::new(
            "config",
            "Show or change configuration",
            "config [show | set <field> <value> | backup [note] | backups | restore <name>]",
            cmd_config,
        ),
        CommandEntry::new("backups", "List saved backups of the expense list", "backups", cmd_backups),
        CommandEntry::new("backup", "Snapshot the saved expense list", "backup [note]", cmd_backup),
        CommandEntry::new(
            "restore",
            "Replace the expense list with a backup",
            "restore <backup>",
            cmd_restore,
        ),
    ]
}

fn cmd_config(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    match args {
        [] | ["show"] => show_config(context),
        ["set", field, value @ ..] if !value.is_empty() => {
            set_config_field(context, field, &value.join(" "))
        }
        ["backup", note @ ..] => {
            let note = (!note.is_empty()).then(|| note.join(" "));
            let name = context
                .config_manager
                .backup(&context.config, note.as_deref())?;
            io::print_success(format!("Saved configuration backup `{}`.", name));
            Ok(())
        }
        ["backups"] => {
            let names = context.config_manager.list_backups()?;
            output_section("Configuration backups");
            if names.is_empty() {
                io::print_info("No configuration backups yet.");
            }
            for name in names {
                output_line(format!("  {}", name));
            }
            Ok(())
        }
        ["restore", name] => {
            context.config = context.config_manager.restore(name)?;
            apply_live_settings(context);
            io::print_success(format!("Restored configuration from `{}`.", name));
            io::print_hint("Storage, validation, and offset changes apply on next start.");
            Ok(())
        }
        _ => Err(CommandError::InvalidArguments(
            "usage: config [show | set <field> <value> | backup [note] | backups | restore <name>]"
                .into(),
        )),
    }
}

fn set_config_field(context: &mut ShellContext, field: &str, value: &str) -> CommandResult {
    let invalid = |expected: &str| {
        CommandError::InvalidArguments(format!("invalid value `{}` for {}; expected {}", value, field, expected))
    };
    let mut config = context.config.clone();
    match field.to_ascii_lowercase().as_str() {
        "currency" | "currency_symbol" => config.currency_symbol = value.to_string(),
        "color" | "color_output" => {
            config.color_output = parse_switch(value).ok_or_else(|| invalid("on|off"))?
        }
        "validation" => {
            config.validation = match value.to_ascii_lowercase().as_str() {
                "strict" => ValidationMode::Strict,
                "off" => ValidationMode::Off,
                _ => return Err(invalid("strict|off")),
            }
        }
        "persistence" => config.persistence.mode = PersistenceMode::from_str(value),
        "utc_offset" | "utc_offset_minutes" => {
            config.utc_offset_minutes = value
                .parse::<i32>()
                .ok()
                .filter(|minutes| minutes.abs() < 24 * 60)
                .ok_or_else(|| invalid("minutes between -1439 and 1439"))?
        }
        "retention" | "backup_retention" => {
            config.backup_retention = value
                .parse::<usize>()
                .ok()
                .filter(|count| *count > 0)
                .ok_or_else(|| invalid("a positive number"))?
        }
        "storage_key" => {
            if value.trim().is_empty() {
                return Err(invalid("a non-empty key"));
            }
            config.storage_key = value.trim().to_string()
        }
        other => {
            return Err(CommandError::InvalidArguments(format!(
                "unknown setting `{}` (currency, color, validation, persistence, utc_offset, retention, storage_key)",
                other
            )))
        }
    }
    context.config = context.config_manager.update(|stored| *stored = config)?;
    apply_live_settings(context);
    io::print_success(format!("Updated `{}`.", field));
    Ok(())
}

fn parse_switch(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "on" | "true" | "yes" | "1" => Some(true),
        "off" | "false" | "no" | "0" => Some(false),
        _ => None,
    }
}

/// Display settings take effect immediately; the rest apply when the store is next opened.
fn apply_live_settings(context: &ShellContext) {
    output::set_preferences(OutputPreferences {
        color: context.config.color_output && context.mode == CliMode::Interactive,
        ..output::current_preferences()
    });
}

fn show_config(context: &ShellContext) -> CommandResult {
    let config = &context.config;
    output_section("Configuration");
    output_line(format!("  Config file : {}", context.config_manager.config_path().display()));
    output_line(format!("  Data dir    : {}", context.storage.root().display()));
    output_line(format!("  Storage key : {}", config.storage_key));
    output_line(format!("  Validation  : {}", config.validation));
    output_line(format!("  Persistence : {:?}", context.store.persistence_mode()));
    output_line(format!("  UTC offset  : {}", context.store.utc_offset()));
    output_line(format!("  Currency    : {}", config.currency_symbol));
    output_line(format!("  Backups kept: {}", context.storage.retention()));
    let stats = context.store.writer_stats();
    output_line(format!(
        "  Writes      : {} written, {} coalesced, {} failed",
        stats.writes, stats.coalesced, stats.failures
    ));
    Ok(())
}

fn cmd_backups(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let backups = context.storage.list_backups(context.store.storage_key())?;
    output_section("Backups");
    if backups.is_empty() {
        io::print_info("No backups yet.");
        return Ok(());
    }
    for backup in backups {
        let created = backup
            .created_at
            .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "unknown".into());
        let kind = if backup.automatic { "auto" } else { "manual" };
        output_line(format!(
            "  {}  {}  {:<6}  {} bytes",
            backup.id, created, kind, backup.size_bytes
        ));
    }
    Ok(())
}

fn cmd_backup(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    context.store.flush()?;
    let note = (!args.is_empty()).then(|| args.join(" "));
    match context
        .storage
        .backup(context.store.storage_key(), note.as_deref())?
    {
        Some(info) => io::print_success(format!("Created backup `{}`.", info.id)),
        None => io::print_warning("Nothing saved yet; no backup created."),
    }
    Ok(())
}

fn cmd_restore(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [backup] = args else {
        return Err(CommandError::InvalidArguments("usage: restore <backup>".into()));
    };
    context.store.flush()?;
    context
        .storage
        .restore_backup(context.store.storage_key(), backup)?;
    let outcome = context.store.load_from_storage();
    io::print_success(format!("Restored `{}` ({:?}).", backup, outcome));
    Ok(())
}

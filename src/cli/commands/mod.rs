pub mod config;
pub mod expense;
pub mod system;
pub mod view;

use crate::cli::registry::CommandEntry;

pub(crate) fn all_definitions() -> Vec<CommandEntry> {
    let mut commands = Vec::new();
    commands.extend(expense::definitions());
    commands.extend(view::definitions());
    commands.extend(config::definitions());
    commands.extend(system::definitions());
    commands
}

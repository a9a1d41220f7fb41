use std::{path::PathBuf, sync::Arc};

use dialoguer::theme::ColorfulTheme;
use expense_config::{Config, ConfigManager};
use expense_storage_json::JsonFileStore;

use crate::{
    cli::{
        commands,
        core::CliError,
        io as cli_io,
        output::{self, OutputPreferences},
        registry::{CommandEntry, CommandRegistry},
    },
    store::{ExpenseStore, LoadOutcome, StoreOptions},
    utils::paths,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliMode {
    Interactive,
    Script,
}

pub struct ShellContext {
    pub mode: CliMode,
    pub registry: CommandRegistry,
    pub theme: ColorfulTheme,
    pub store: ExpenseStore,
    pub storage: JsonFileStore,
    pub config_manager: ConfigManager,
    pub config: Config,
    pub base_dir: PathBuf,
    pub last_command: Option<String>,
    pub running: bool,
}

impl ShellContext {
    pub fn new(mode: CliMode) -> Result<Self, CliError> {
        Self::with_base_dir(mode, paths::app_data_dir())
    }

    /// Loads configuration and the saved expenses found under `base_dir`.
    pub fn with_base_dir(mode: CliMode, base_dir: PathBuf) -> Result<Self, CliError> {
        let config_manager = ConfigManager::with_base_dir(base_dir.clone())?;
        let config = config_manager.load_or_init()?;

        output::set_preferences(OutputPreferences {
            color: config.color_output && mode == CliMode::Interactive,
            quiet_mode: false,
        });

        let storage = JsonFileStore::with_retention(
            config.resolve_data_dir(&base_dir),
            config.backup_retention,
        )?;
        let mut store = ExpenseStore::new(
            Arc::new(storage.clone()),
            StoreOptions::from_config(&config),
        );
        report_load(store.load_from_storage());

        Ok(Self {
            mode,
            registry: CommandRegistry::new(commands::all_definitions()),
            theme: ColorfulTheme::default(),
            store,
            storage,
            config_manager,
            config,
            base_dir,
            last_command: None,
            running: true,
        })
    }

    pub fn command_names(&self) -> Vec<&'static str> {
        self.registry.names().collect()
    }

    pub(crate) fn command(&self, name: &str) -> Option<&CommandEntry> {
        self.registry.get(name)
    }

    pub fn prompt(&self) -> String {
        let filter = self.store.filter();
        let category = filter
            .category
            .map(|category| category.as_str())
            .unwrap_or("all");
        format!("expenses [{} | {}]> ", category, filter.range)
    }

}

fn report_load(outcome: LoadOutcome) {
    match outcome {
        LoadOutcome::Restored(count) => {
            cli_io::print_info(format!("Loaded {} saved expense(s).", count))
        }
        LoadOutcome::Empty => {}
        LoadOutcome::Malformed => {
            cli_io::print_warning("Saved expenses could not be read; starting with an empty list.")
        }
        LoadOutcome::Unavailable => {
            cli_io::print_warning("Expense storage is unavailable; changes may not be saved.")
        }
    }
}

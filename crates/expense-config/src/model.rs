use serde::{de::Deserializer, Deserialize, Serialize};
use std::{
    fmt,
    path::{Path, PathBuf},
};

pub const DEFAULT_STORAGE_KEY: &str = "expenses_v1";

/// Stores user-configurable preferences for the expense store and CLI.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Key under which the whole expense collection is persisted.
    #[serde(default = "Config::default_storage_key")]
    pub storage_key: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Optional custom directory for stored data. Defaults to `<base>/data`.
    pub data_dir: Option<PathBuf>,

    #[serde(default = "Config::default_backup_retention")]
    pub backup_retention: usize,

    #[serde(default)]
    pub validation: ValidationMode,

    #[serde(default)]
    pub persistence: PersistenceSettings,

    /// Offset used for calendar-month filtering and date display.
    #[serde(default)]
    pub utc_offset_minutes: i32,

    #[serde(default = "Config::default_currency_symbol")]
    pub currency_symbol: String,

    #[serde(default = "Config::default_color_output")]
    pub color_output: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage_key: Self::default_storage_key(),
            data_dir: None,
            backup_retention: Self::default_backup_retention(),
            validation: ValidationMode::default(),
            persistence: PersistenceSettings::default(),
            utc_offset_minutes: 0,
            currency_symbol: Self::default_currency_symbol(),
            color_output: Self::default_color_output(),
        }
    }
}

impl Config {
    pub fn default_storage_key() -> String {
        DEFAULT_STORAGE_KEY.into()
    }

    pub fn default_backup_retention() -> usize {
        5
    }

    pub fn default_currency_symbol() -> String {
        "₹".into()
    }

    pub fn default_color_output() -> bool {
        true
    }

    pub fn resolve_data_dir(&self, base: &Path) -> PathBuf {
        match &self.data_dir {
            Some(path) => path.clone(),
            None => base.join("data"),
        }
    }
}

/// Whether the store checks records before accepting them.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ValidationMode {
    /// Reject blank titles, negative or non-numeric amounts, and reused ids.
    #[default]
    Strict,
    /// Accept every record as given.
    Off,
}

impl fmt::Display for ValidationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ValidationMode::Strict => "strict",
            ValidationMode::Off => "off",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PersistenceSettings {
    #[serde(default)]
    pub mode: PersistenceMode,
}

/// How snapshots reach durable storage.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PersistenceMode {
    /// Queue snapshots to a dedicated writer thread.
    Background,
    /// Write inline before the mutating call returns.
    Synchronous,
}

impl PersistenceMode {
    fn from_value(value: Option<String>) -> Self {
        value
            .map(|v| PersistenceMode::from_str(v.trim()))
            .unwrap_or_default()
    }

    pub fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "synchronous" | "sync" => PersistenceMode::Synchronous,
            _ => PersistenceMode::Background,
        }
    }
}

impl Default for PersistenceMode {
    fn default() -> Self {
        PersistenceMode::Background
    }
}

impl fmt::Display for PersistenceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PersistenceMode::Background => "background",
            PersistenceMode::Synchronous => "synchronous",
        };
        f.write_str(label)
    }
}

impl<'de> Deserialize<'de> for PersistenceMode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<String>::deserialize(deserializer)?;
        Ok(PersistenceMode::from_value(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config: Config = serde_json::from_str(r#"{"validation":"off"}"#).unwrap();
        assert_eq!(config.storage_key, DEFAULT_STORAGE_KEY);
        assert_eq!(config.validation, ValidationMode::Off);
        assert_eq!(config.persistence.mode, PersistenceMode::Background);
        assert_eq!(config.backup_retention, 5);
    }

    #[test]
    fn unknown_persistence_mode_falls_back_to_background() {
        let config: Config =
            serde_json::from_str(r#"{"persistence":{"mode":"eventually"}}"#).unwrap();
        assert_eq!(config.persistence.mode, PersistenceMode::Background);
        let config: Config = serde_json::from_str(r#"{"persistence":{"mode":"SYNC"}}"#).unwrap();
        assert_eq!(config.persistence.mode, PersistenceMode::Synchronous);
    }

    #[test]
    fn data_dir_defaults_under_base() {
        let config = Config::default();
        assert_eq!(
            config.resolve_data_dir(Path::new("/tmp/app")),
            PathBuf::from("/tmp/app/data")
        );
    }
}

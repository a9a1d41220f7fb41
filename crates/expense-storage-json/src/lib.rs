//! expense-storage-json
//!
//! Filesystem-backed [`KeyValueStore`] keeping one JSON document per key,
//! plus the record payload codec shared by every backend.

pub mod payload;

use std::{
    cmp::Reverse,
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

use chrono::{DateTime, NaiveDateTime, Utc};
use expense_core::{CoreError, KeyValueStore};

pub use payload::{decode_expenses, encode_expenses};

const VALUE_EXTENSION: &str = "json";
const BACKUP_DIR: &str = "backups";
const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M";
const TMP_SUFFIX: &str = "tmp";
/// Marks backups taken implicitly before an overwrite.
const AUTO_MARKER: &str = "auto";
const DEFAULT_RETENTION: usize = 5;

/// Stores each key as `<root>/<key>.json` and keeps rotating backups of
/// overwritten values under `<root>/backups/<key>/`.
///
/// Automatic backups (`<key>_<stamp>.auto.json`) and explicit ones
/// (`<key>_<stamp>[_<note>].json`) are rotated independently, and an explicit
/// backup never replaces an existing file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    root: PathBuf,
    backups_dir: PathBuf,
    retention: usize,
}

/// Describes a persisted backup of a key's previous value.
#[derive(Debug, Clone, PartialEq)]
pub struct BackupInfo {
    pub key: String,
    pub id: String,
    pub created_at: Option<DateTime<Utc>>,
    pub size_bytes: u64,
    pub path: PathBuf,
    /// Taken implicitly before an overwrite rather than on request.
    pub automatic: bool,
}

impl JsonFileStore {
    pub fn new(root: PathBuf) -> Result<Self, CoreError> {
        Self::with_retention(root, DEFAULT_RETENTION)
    }

    pub fn with_retention(root: PathBuf, retention: usize) -> Result<Self, CoreError> {
        let backups_dir = root.join(BACKUP_DIR);
        fs::create_dir_all(&root)?;
        fs::create_dir_all(&backups_dir)?;
        Ok(Self {
            root,
            backups_dir,
            retention: retention.max(1),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn retention(&self) -> usize {
        self.retention
    }

    pub fn key_path(&self, key: &str) -> PathBuf {
        self.root
            .join(format!("{}.{}", canonical_name(key), VALUE_EXTENSION))
    }

    pub fn backup_path(&self, key: &str, backup: &str) -> PathBuf {
        self.backup_dir(key).join(backup)
    }

    /// Snapshots the current value of `key`, labelled with an optional note.
    ///
    /// Returns `Ok(None)` when the key holds no value yet.
    pub fn backup(&self, key: &str, note: Option<&str>) -> Result<Option<BackupInfo>, CoreError> {
        let path = self.key_path(key);
        if !path.exists() {
            return Ok(None);
        }
        let dir = self.backup_dir(key);
        fs::create_dir_all(&dir)?;
        let mut stem = format!("{}_{}", canonical_name(key), backup_timestamp());
        if let Some(label) = sanitize_backup_note(note) {
            stem.push('_');
            stem.push_str(&label);
        }
        let file_name = unused_file_name(&dir, &stem);
        let backup_path = dir.join(&file_name);
        fs::copy(&path, &backup_path)?;
        self.prune_backups(key, false)?;
        Ok(Some(self.describe_backup(key, &file_name, backup_path)))
    }

    /// Lists backups of `key`, newest first.
    pub fn list_backups(&self, key: &str) -> Result<Vec<BackupInfo>, CoreError> {
        let dir = self.backup_dir(key);
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut entries = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(VALUE_EXTENSION) {
                continue;
            }
            if let Some(file_name) = path.file_name().and_then(|name| name.to_str()) {
                let file_name = file_name.to_string();
                entries.push(self.describe_backup(key, &file_name, path));
            }
        }
        // Stamps only resolve to the minute; file age breaks ties.
        entries.sort_by_cached_key(|info| {
            let modified = fs::metadata(&info.path)
                .and_then(|meta| meta.modified())
                .ok();
            Reverse((info.created_at, modified))
        });
        Ok(entries)
    }

    /// Writes a backup over the live value and returns the restored payload.
    ///
    /// The value being replaced is itself backed up first. `backup_id` must be
    /// a plain file name from [`list_backups`](Self::list_backups).
    pub fn restore_backup(&self, key: &str, backup_id: &str) -> Result<String, CoreError> {
        if !is_plain_file_name(backup_id) {
            return Err(CoreError::Storage(format!(
                "invalid backup id `{}`",
                backup_id
            )));
        }
        let backup_path = self.backup_path(key, backup_id);
        if !backup_path.is_file() {
            return Err(CoreError::Storage(format!(
                "backup `{}` not found",
                backup_id
            )));
        }
        let payload = fs::read_to_string(&backup_path)?;
        self.set(key, &payload)?;
        Ok(payload)
    }

    fn backup_dir(&self, key: &str) -> PathBuf {
        self.backups_dir.join(canonical_name(key))
    }

    fn describe_backup(&self, key: &str, file_name: &str, path: PathBuf) -> BackupInfo {
        let size_bytes = fs::metadata(&path).map(|meta| meta.len()).unwrap_or(0);
        BackupInfo {
            key: canonical_name(key),
            id: file_name.to_string(),
            created_at: parse_backup_timestamp(file_name),
            size_bytes,
            path,
            automatic: is_automatic(file_name),
        }
    }

    fn backup_existing_file(&self, key: &str, path: &Path) -> Result<(), CoreError> {
        if !path.exists() {
            return Ok(());
        }
        let dir = self.backup_dir(key);
        fs::create_dir_all(&dir)?;
        let file_name = format!(
            "{}_{}.{}.{}",
            canonical_name(key),
            backup_timestamp(),
            AUTO_MARKER,
            VALUE_EXTENSION
        );
        fs::copy(path, dir.join(file_name))?;
        self.prune_backups(key, true)
    }

    /// Keeps the newest `retention` backups of one kind.
    fn prune_backups(&self, key: &str, automatic: bool) -> Result<(), CoreError> {
        let entries = self.list_backups(key)?;
        let stale = entries
            .into_iter()
            .filter(|entry| entry.automatic == automatic)
            .skip(self.retention);
        for entry in stale {
            let _ = fs::remove_file(entry.path);
        }
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>, CoreError> {
        let path = self.key_path(key);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(path)?))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), CoreError> {
        let path = self.key_path(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        self.backup_existing_file(key, &path)?;
        let tmp = tmp_path(&path);
        write_atomic(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), CoreError> {
        let path = self.key_path(key);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }
}

fn backup_timestamp() -> String {
    Utc::now().format(BACKUP_TIMESTAMP_FORMAT).to_string()
}

fn canonical_name(name: &str) -> String {
    let sanitized: String = name
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'a'..='z' | '0'..='9' => c,
            _ => '_',
        })
        .collect();
    if sanitized.trim_matches('_').is_empty() {
        "store".into()
    } else {
        sanitized
    }
}

fn is_automatic(file_name: &str) -> bool {
    file_name.ends_with(&format!(".{}.{}", AUTO_MARKER, VALUE_EXTENSION))
}

fn is_plain_file_name(name: &str) -> bool {
    !name.trim().is_empty()
        && !name.contains("..")
        && !name.contains(|c: char| matches!(c, '/' | '\\' | '\0'))
}

/// First of `<stem>.json`, `<stem>-2.json`, ... not present in `dir`.
fn unused_file_name(dir: &Path, stem: &str) -> String {
    let mut file_name = format!("{}.{}", stem, VALUE_EXTENSION);
    let mut counter = 2;
    while dir.join(&file_name).exists() {
        file_name = format!("{}-{}.{}", stem, counter, VALUE_EXTENSION);
        counter += 1;
    }
    file_name
}

fn sanitize_backup_note(note: Option<&str>) -> Option<String> {
    let raw = note?.trim();
    if raw.is_empty() {
        return None;
    }
    let mut sanitized = String::new();
    let mut last_dash = false;
    for ch in raw.chars() {
        if ch.is_ascii_alphanumeric() {
            sanitized.push(ch.to_ascii_lowercase());
            last_dash = false;
        } else if (ch.is_whitespace() || matches!(ch, '-' | '.' | '_'))
            && !sanitized.is_empty()
            && !last_dash
        {
            sanitized.push('-');
            last_dash = true;
        }
    }
    let trimmed = sanitized.trim_matches('-').to_string();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

/// Reads the `YYYYMMDD_HHMM` stamp out of a backup file name.
///
/// Key slugs may themselves contain underscores, so the stamp is located as
/// the first pair of adjacent segments shaped like a date and a time.
fn parse_backup_timestamp(name: &str) -> Option<DateTime<Utc>> {
    let trimmed = name.strip_suffix(&format!(".{}", VALUE_EXTENSION))?;
    let segments = trimmed.split('_').collect::<Vec<_>>();
    segments.windows(2).rev().find_map(|pair| {
        let (date, time) = (pair[0], pair[1]);
        let time = time.split(|c| c == '-' || c == '.').next().unwrap_or(time);
        if !is_digits(date, 8) || !is_digits(time, 4) {
            return None;
        }
        NaiveDateTime::parse_from_str(&format!("{}{}", date, time), "%Y%m%d%H%M")
            .ok()
            .map(|naive| DateTime::from_naive_utc_and_offset(naive, Utc))
    })
}

fn is_digits(value: &str, len: usize) -> bool {
    value.len() == len && value.chars().all(|c| c.is_ascii_digit())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{}.{}", existing, TMP_SUFFIX),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

fn write_atomic(path: &Path, data: &str) -> Result<(), CoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = File::create(path)?;
    file.write_all(data.as_bytes())?;
    file.flush()?;
    Ok(())
}

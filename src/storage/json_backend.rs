use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard},
};
use tracing::{debug, info, warn};

use crate::{
    core::utils::ensure_dir,
    errors::{LedgerError, Result},
    ledger::{AppState, LedgerMeta, Meal},
};

use super::StateStore;

const STATE_FILE: &str = "state.json";
const BACKUP_DIR: &str = "backups";
const BACKUP_PREFIX: &str = "state";
const BACKUP_EXTENSION: &str = "json";
const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S%3f";
const TMP_SUFFIX: &str = "tmp";
const DEFAULT_RETENTION: usize = 5;

pub const STATE_SCHEMA_VERSION: u8 = 1;

/// On-disk document: the application state plus a schema marker.
#[derive(Debug, Serialize, Deserialize)]
struct StateDocument {
    #[serde(default = "StateDocument::schema_version_default")]
    schema_version: u8,
    #[serde(flatten)]
    state: AppState,
}

impl StateDocument {
    fn schema_version_default() -> u8 {
        STATE_SCHEMA_VERSION
    }
}

/// File-backed store keeping the whole state in one JSON document.
///
/// Every write goes to a temporary sibling that is renamed over the live
/// file, so readers observe either the old or the new state. Bulk
/// replacements snapshot the previous document into `backups/` first.
pub struct JsonStore {
    state_file: PathBuf,
    backups_dir: PathBuf,
    retention: usize,
    initial: LedgerMeta,
    lock: Mutex<()>,
}

impl JsonStore {
    pub fn new(root: PathBuf, retention: Option<usize>) -> Result<Self> {
        ensure_dir(&root)?;
        let backups_dir = root.join(BACKUP_DIR);
        ensure_dir(&backups_dir)?;
        Ok(Self {
            state_file: root.join(STATE_FILE),
            backups_dir,
            retention: retention.unwrap_or(DEFAULT_RETENTION).max(1),
            initial: LedgerMeta::default(),
            lock: Mutex::new(()),
        })
    }

    /// Metadata served before anything has been written.
    pub fn with_initial_meta(mut self, meta: LedgerMeta) -> Self {
        self.initial = meta;
        self
    }

    pub fn state_path(&self) -> &Path {
        &self.state_file
    }

    pub fn backups_dir(&self) -> &Path {
        &self.backups_dir
    }

    /// Writes a timestamped copy of the current document.
    pub fn backup(&self, note: Option<&str>) -> Result<Option<PathBuf>> {
        let _guard = self.guard();
        self.backup_locked(note)
    }

    /// Backup file names, newest first.
    pub fn list_backups(&self) -> Result<Vec<String>> {
        if !self.backups_dir.exists() {
            return Ok(Vec::new());
        }
        let mut entries = Vec::new();
        for entry in fs::read_dir(&self.backups_dir)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(BACKUP_EXTENSION) {
                continue;
            }
            if let Some(name) = path.file_name().and_then(|name| name.to_str()) {
                entries.push(name.to_string());
            }
        }
        entries.sort_by(|a, b| {
            parse_backup_timestamp(b)
                .cmp(&parse_backup_timestamp(a))
                .then_with(|| b.cmp(a))
        });
        Ok(entries)
    }

    /// Replaces the live state with a backup, backing up the live state first.
    pub fn restore_backup(&self, backup_name: &str) -> Result<AppState> {
        let path = self.backups_dir.join(backup_name);
        if !path.exists() {
            return Err(LedgerError::Storage(format!(
                "backup `{}` not found",
                backup_name
            )));
        }
        let restored = read_document(&path)?.state;
        restored.validate()?;
        self.replace_all(&restored)?;
        info!(backup = backup_name, "restored state from backup");
        Ok(restored)
    }

    fn guard(&self) -> MutexGuard<'_, ()> {
        self.lock.lock().expect("JsonStore lock poisoned")
    }

    fn read_state(&self) -> Result<AppState> {
        if !self.state_file.exists() {
            return Ok(AppState::new(self.initial, Vec::new()));
        }
        let document = read_document(&self.state_file)?;
        if document.schema_version > STATE_SCHEMA_VERSION {
            return Err(LedgerError::Storage(format!(
                "`{}` was written by a newer schema version ({})",
                self.state_file.display(),
                document.schema_version
            )));
        }
        Ok(document.state)
    }

    fn write_state(&self, state: &AppState) -> Result<()> {
        let document = StateDocument {
            schema_version: STATE_SCHEMA_VERSION,
            state: state.clone(),
        };
        let json = serde_json::to_string_pretty(&document)?;
        write_atomic(&self.state_file, &json)?;
        debug!(meals = state.meals.len(), "state written");
        Ok(())
    }

    fn modify<T, F>(&self, apply: F) -> Result<T>
    where
        F: FnOnce(&mut AppState) -> Result<T>,
    {
        let _guard = self.guard();
        let mut state = self.read_state()?;
        let value = apply(&mut state)?;
        self.write_state(&state)?;
        Ok(value)
    }

    fn backup_locked(&self, note: Option<&str>) -> Result<Option<PathBuf>> {
        if !self.state_file.exists() {
            return Ok(None);
        }
        ensure_dir(&self.backups_dir)?;
        let timestamp = self.next_backup_stamp()?.format(BACKUP_TIMESTAMP_FORMAT).to_string();
        let mut file_stem = format!("{}_{}", BACKUP_PREFIX, timestamp);
        if let Some(label) = sanitize_backup_note(note) {
            file_stem.push('_');
            file_stem.push_str(&label);
        }
        let path = self
            .backups_dir
            .join(format!("{}.{}", file_stem, BACKUP_EXTENSION));
        fs::copy(&self.state_file, &path)?;
        self.prune_backups()?;
        Ok(Some(path))
    }

    /// Millisecond stamp strictly newer than every existing backup.
    fn next_backup_stamp(&self) -> Result<DateTime<Utc>> {
        let now = Utc::now();
        let newest = self
            .list_backups()?
            .first()
            .and_then(|name| parse_backup_timestamp(name));
        Ok(match newest {
            Some(newest) if now <= newest => newest + Duration::milliseconds(1),
            _ => now,
        })
    }

    fn prune_backups(&self) -> Result<()> {
        let backups = self.list_backups()?;
        for name in backups.iter().skip(self.retention) {
            if let Err(err) = fs::remove_file(self.backups_dir.join(name)) {
                warn!(backup = name.as_str(), error = %err, "failed to prune backup");
            }
        }
        Ok(())
    }
}

impl StateStore for JsonStore {
    fn load_meta(&self) -> Result<LedgerMeta> {
        let _guard = self.guard();
        Ok(self.read_state()?.meta)
    }

    fn replace_meta(&self, meta: &LedgerMeta) -> Result<()> {
        self.modify(|state| {
            state.meta = *meta;
            Ok(())
        })
    }

    fn update_meta(
        &self,
        apply: &mut dyn FnMut(&mut LedgerMeta) -> Result<()>,
    ) -> Result<LedgerMeta> {
        self.modify(|state| {
            apply(&mut state.meta)?;
            Ok(state.meta)
        })
    }

    fn all_meals(&self) -> Result<Vec<Meal>> {
        let _guard = self.guard();
        Ok(self.read_state()?.meals)
    }

    fn append_meal(&self, meal: &Meal) -> Result<()> {
        self.modify(|state| {
            if state.meal(meal.id).is_some() {
                return Err(LedgerError::Storage(format!(
                    "meal {} already exists",
                    meal.id
                )));
            }
            state.meals.push(meal.clone());
            Ok(())
        })
    }

    fn replace_meal(&self, meal: &Meal) -> Result<()> {
        self.modify(|state| {
            let slot = state
                .meals
                .iter_mut()
                .find(|existing| existing.id == meal.id)
                .ok_or(LedgerError::MealNotFound(meal.id))?;
            *slot = meal.clone();
            Ok(())
        })
    }

    fn replace_all(&self, state: &AppState) -> Result<()> {
        let _guard = self.guard();
        if let Some(path) = self.backup_locked(Some("before-replace"))? {
            info!(backup = %path.display(), "previous state backed up");
        }
        self.write_state(state)
    }
}

fn read_document(path: &Path) -> Result<StateDocument> {
    let data = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&data)?)
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

/// Reads the timestamp out of `state_<date>_<time>[_note].json`.
///
/// `<time>` is `HHMMSSmmm`; older second-resolution `HHMMSS` names still parse.
fn parse_backup_timestamp(name: &str) -> Option<DateTime<Utc>> {
    let stem = name.strip_suffix(&format!(".{}", BACKUP_EXTENSION))?;
    let mut segments = stem.split('_');
    if segments.next()? != BACKUP_PREFIX {
        return None;
    }
    let date_part = segments.next()?;
    let time_part = segments.next()?;
    if !is_digits(date_part, 8) || !(is_digits(time_part, 6) || is_digits(time_part, 9)) {
        return None;
    }
    let (seconds, millis) = time_part.split_at(6);
    let millis: i64 = if millis.is_empty() { 0 } else { millis.parse().ok()? };
    NaiveDateTime::parse_from_str(&format!("{}{}", date_part, seconds), "%Y%m%d%H%M%S")
        .ok()
        .map(|naive| {
            DateTime::from_naive_utc_and_offset(naive, Utc) + Duration::milliseconds(millis)
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

/// Stages `data` next to `path` and renames it into place.
pub(crate) fn write_atomic(path: &Path, data: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    let tmp = tmp_path(path);
    let mut file = File::create(&tmp)?;
    file.write_all(data.as_bytes())?;
    file.sync_all()?;
    fs::rename(&tmp, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{Bank, MealType};
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn store_with_temp_dir() -> (JsonStore, TempDir) {
        let temp = TempDir::new().expect("temp dir");
        let store = JsonStore::new(temp.path().to_path_buf(), Some(3)).expect("json store");
        (store, temp)
    }

    fn sample_meal() -> Meal {
        Meal::new(
            MealType::Vegetarian,
            Utc.with_ymd_and_hms(2025, 1, 6, 12, 0, 0).unwrap(),
        )
    }

    #[test]
    fn empty_store_serves_initial_meta() {
        let (store, _guard) = store_with_temp_dir();
        let meta = LedgerMeta {
            bank: Bank::new(1, 1, 1),
            ..LedgerMeta::default()
        };
        let store = store.with_initial_meta(meta);
        assert_eq!(store.load_meta().unwrap(), meta);
        assert!(store.all_meals().unwrap().is_empty());
        assert!(!store.state_path().exists());
    }

    #[test]
    fn meals_and_meta_survive_reopen() {
        let (store, guard) = store_with_temp_dir();
        let meal = sample_meal();
        store.append_meal(&meal).unwrap();
        let meta = LedgerMeta {
            bank: Bank::new(2, 0, 1),
            ..LedgerMeta::default()
        };
        store.replace_meta(&meta).unwrap();

        let reopened = JsonStore::new(guard.path().to_path_buf(), None).unwrap();
        assert_eq!(reopened.load_meta().unwrap(), meta);
        assert_eq!(reopened.all_meals().unwrap(), vec![meal]);
    }

    #[test]
    fn duplicate_append_is_rejected() {
        let (store, _guard) = store_with_temp_dir();
        let meal = sample_meal();
        store.append_meal(&meal).unwrap();
        assert!(matches!(
            store.append_meal(&meal),
            Err(LedgerError::Storage(_))
        ));
    }

    #[test]
    fn replacing_unknown_meal_fails() {
        let (store, _guard) = store_with_temp_dir();
        let meal = sample_meal();
        assert!(matches!(
            store.replace_meal(&meal),
            Err(LedgerError::MealNotFound(id)) if id == meal.id
        ));
    }

    #[test]
    fn replace_all_keeps_a_backup_and_prunes() {
        let (store, _guard) = store_with_temp_dir();
        store.append_meal(&sample_meal()).unwrap();
        for _ in 0..5 {
            store.replace_all(&AppState::default()).unwrap();
        }
        let backups = store.list_backups().unwrap();
        assert!(!backups.is_empty());
        assert!(backups.len() <= 3, "retention exceeded: {backups:?}");
        assert!(backups.iter().all(|name| name.starts_with("state_")));
    }

    #[test]
    fn backup_names_sort_newest_first() {
        let names = [
            "state_20250101_120000.json",
            "state_20250301_080000_before-replace.json",
            "state_20250201_235959.json",
        ];
        let mut sorted = names.to_vec();
        sorted.sort_by(|a, b| parse_backup_timestamp(b).cmp(&parse_backup_timestamp(a)));
        assert_eq!(sorted[0], "state_20250301_080000_before-replace.json");
        assert_eq!(sorted[2], "state_20250101_120000.json");
    }

    #[test]
    fn millisecond_names_sort_after_legacy_names_of_the_same_second() {
        let legacy = parse_backup_timestamp("state_20250301_080000_before-replace.json").unwrap();
        let precise = parse_backup_timestamp("state_20250301_080000250_before-replace.json").unwrap();
        assert_eq!(precise - legacy, Duration::milliseconds(250));
        assert_eq!(parse_backup_timestamp("state_20250301_0800002.json"), None);
    }

    #[test]
    fn back_to_back_replacements_keep_every_backup() {
        let (store, _guard) = store_with_temp_dir();
        let meal = sample_meal();
        store
            .replace_all(&AppState::new(LedgerMeta::default(), vec![meal.clone()]))
            .unwrap();
        store.replace_all(&AppState::default()).unwrap();
        store.replace_all(&AppState::default()).unwrap();

        let backups = store.list_backups().unwrap();
        assert_eq!(backups.len(), 2, "{backups:?}");
        let oldest = read_document(&store.backups_dir().join(&backups[1])).unwrap();
        assert_eq!(oldest.state.meals, vec![meal]);
        let newest = read_document(&store.backups_dir().join(&backups[0])).unwrap();
        assert!(newest.state.meals.is_empty());
    }

    #[test]
    fn sanitize_note_collapses_separators() {
        assert_eq!(
            sanitize_backup_note(Some("  Before Import.v2 ")),
            Some("before-import-v2".to_string())
        );
        assert_eq!(sanitize_backup_note(Some("***")), None);
        assert_eq!(sanitize_backup_note(None), None);
    }
}

use chrono::NaiveDate;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::{
    core::{
        utils::{app_data_dir, config_file_in, ensure_dir},
        BookSettings,
    },
    errors::{LedgerError, Result},
    ledger::{default_anchor, parse_timezone, Goals, DEFAULT_TIMEZONE},
    storage::json_backend::write_atomic,
};

const DEFAULT_BACKUP_RETENTION: usize = 10;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// IANA identifier cycle boundaries are computed in.
    pub timezone: String,
    pub default_anchor: NaiveDate,
    pub default_goals: Goals,
    pub borrow_on_close: bool,
    pub max_meals_per_day: usize,
    pub backup_retention: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub legacy_snapshot: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timezone: DEFAULT_TIMEZONE.name().to_string(),
            default_anchor: default_anchor(),
            default_goals: Goals::default(),
            borrow_on_close: false,
            max_meals_per_day: 2,
            backup_retention: DEFAULT_BACKUP_RETENTION,
            legacy_snapshot: None,
        }
    }
}

impl Config {
    pub fn tz(&self) -> Result<Tz> {
        parse_timezone(&self.timezone)
    }

    pub fn book_settings(&self) -> Result<BookSettings> {
        if self.max_meals_per_day == 0 {
            return Err(LedgerError::Config(
                "max_meals_per_day must be at least 1".into(),
            ));
        }
        Ok(BookSettings {
            tz: self.tz()?,
            borrow_on_close: self.borrow_on_close,
            max_meals_per_day: self.max_meals_per_day,
            default_goals: self.default_goals,
            default_anchor: self.default_anchor,
        })
    }

    /// Sets one field from its textual `key`/`value` form.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let value = value.trim();
        match key {
            "timezone" => {
                parse_timezone(value)?;
                self.timezone = value.to_string();
            }
            "default_anchor" => {
                self.default_anchor = crate::ledger::parse_anchor(value)?;
            }
            "default_goals" => {
                self.default_goals = parse_goals(value)?;
            }
            "borrow_on_close" => {
                self.borrow_on_close = parse_flag(value)?;
            }
            "max_meals_per_day" => {
                let limit = parse_count(key, value)?;
                if limit == 0 {
                    return Err(LedgerError::Config(
                        "max_meals_per_day must be at least 1".into(),
                    ));
                }
                self.max_meals_per_day = limit;
            }
            "backup_retention" => {
                self.backup_retention = parse_count(key, value)?;
            }
            "legacy_snapshot" => {
                self.legacy_snapshot = if value.is_empty() {
                    None
                } else {
                    Some(PathBuf::from(value))
                };
            }
            other => {
                return Err(LedgerError::Config(format!("unknown setting `{}`", other)));
            }
        }
        Ok(())
    }

    pub fn entries(&self) -> Vec<(&'static str, String)> {
        vec![
            ("timezone", self.timezone.clone()),
            ("default_anchor", self.default_anchor.to_string()),
            (
                "default_goals",
                format!(
                    "{}/{}/{}",
                    self.default_goals.vegan, self.default_goals.vegetarian, self.default_goals.small
                ),
            ),
            ("borrow_on_close", self.borrow_on_close.to_string()),
            ("max_meals_per_day", self.max_meals_per_day.to_string()),
            ("backup_retention", self.backup_retention.to_string()),
            (
                "legacy_snapshot",
                self.legacy_snapshot
                    .as_ref()
                    .map(|path| path.display().to_string())
                    .unwrap_or_else(|| "-".into()),
            ),
        ]
    }
}

fn parse_flag(value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "on" | "yes" | "1" => Ok(true),
        "false" | "off" | "no" | "0" => Ok(false),
        other => Err(LedgerError::Config(format!("expected on/off, got `{}`", other))),
    }
}

/// `vegan/vegetarian/small`, e.g. `10/9/9`.
fn parse_goals(value: &str) -> Result<Goals> {
    let parts: Vec<&str> = value.split('/').map(str::trim).collect();
    let [vegan, vegetarian, small] = parts.as_slice() else {
        return Err(LedgerError::Config(
            "default_goals expects vegan/vegetarian/small".into(),
        ));
    };
    let count = |raw: &str| -> Result<u32> {
        raw.parse()
            .map_err(|_| LedgerError::Config(format!("`{}` is not a goal count", raw)))
    };
    Ok(Goals::new(count(*vegan)?, count(*vegetarian)?, count(*small)?))
}

fn parse_count(key: &str, value: &str) -> Result<usize> {
    value
        .parse()
        .map_err(|_| LedgerError::Config(format!("{} expects a whole number", key)))
}

pub struct ConfigManager {
    base: PathBuf,
    path: PathBuf,
}

impl ConfigManager {
    pub fn new() -> Result<Self> {
        Self::with_base_dir(app_data_dir())
    }

    pub fn with_base_dir(base: PathBuf) -> Result<Self> {
        ensure_dir(&base)?;
        Ok(Self {
            path: config_file_in(&base),
            base,
        })
    }

    pub fn load(&self) -> Result<Config> {
        if !self.path.exists() {
            return Ok(Config::default());
        }
        let data = fs::read_to_string(&self.path)?;
        let config: Config = serde_json::from_str(&data)
            .map_err(|err| LedgerError::Config(format!("{}: {}", self.path.display(), err)))?;
        config.tz()?;
        Ok(config)
    }

    pub fn save(&self, config: &Config) -> Result<()> {
        let json = serde_json::to_string_pretty(config)?;
        write_atomic(&self.path, &json)
    }

    pub fn base_dir(&self) -> &Path {
        &self.base
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#![allow(dead_code)]

use std::{path::PathBuf, sync::Arc, sync::Mutex};

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use mealbank::{
    core::{BookSettings, FixedClock, MealBook},
    ledger::Goals,
    storage::JsonStore,
};
use once_cell::sync::Lazy;
use tempfile::TempDir;

/// Holds TempDir guards so temporary folders live for the duration of the test run.
static TEST_DIRS: Lazy<Mutex<Vec<TempDir>>> = Lazy::new(|| Mutex::new(Vec::new()));

pub fn temp_root() -> PathBuf {
    let temp = TempDir::new().expect("create temp dir");
    let base = temp.path().to_path_buf();
    TEST_DIRS.lock().expect("lock temp dir registry").push(temp);
    base
}

pub fn utc(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn utc_settings() -> BookSettings {
    BookSettings {
        tz: chrono_tz::UTC,
        default_goals: Goals::new(3, 3, 3),
        ..BookSettings::default()
    }
}

/// A book over a fresh JSON store with a manually driven clock.
pub fn json_book(
    now: DateTime<Utc>,
    settings: BookSettings,
) -> (MealBook, Arc<JsonStore>, Arc<FixedClock>) {
    let store = Arc::new(
        JsonStore::new(temp_root().join("data"), Some(3))
            .expect("create json store")
            .with_initial_meta(settings.initial_meta()),
    );
    let clock = Arc::new(FixedClock::new(now));
    let book = MealBook::new(Box::new(store.clone()), clock.clone(), settings);
    (book, store, clock)
}

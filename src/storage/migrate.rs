use std::{fs, path::Path};

use tracing::info;

use crate::errors::Result;

use super::{exchange::parse_import, StateStore};

/// Result of looking for a pre-store snapshot file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationOutcome {
    NoLegacyData,
    /// The store already holds meals; the legacy file is left in place.
    StoreNotEmpty,
    Migrated { meals: usize },
}

/// Imports a legacy snapshot into an empty store, then deletes the file.
pub fn migrate_legacy_snapshot(store: &dyn StateStore, path: &Path) -> Result<MigrationOutcome> {
    if !path.exists() {
        return Ok(MigrationOutcome::NoLegacyData);
    }
    if !store.all_meals()?.is_empty() {
        return Ok(MigrationOutcome::StoreNotEmpty);
    }
    let raw = fs::read_to_string(path)?;
    let state = parse_import(&raw)?;
    store.replace_all(&state)?;
    fs::remove_file(path)?;
    info!(
        path = %path.display(),
        meals = state.meals.len(),
        "migrated legacy snapshot"
    );
    Ok(MigrationOutcome::Migrated {
        meals: state.meals.len(),
    })
}

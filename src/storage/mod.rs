//! Persistence boundary for meal history and ledger metadata.
//!
//! The accounting code never touches a store; [`crate::core::MealBook`] reads
//! snapshots through [`StateStore`] and writes results back through it.

pub mod exchange;
pub mod json_backend;
pub mod memory;
pub mod migrate;

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::errors::Result;
use crate::ledger::{AppState, LedgerMeta, Meal};

/// Narrow read/write contract every backend implements.
pub trait StateStore: Send + Sync {
    fn load_meta(&self) -> Result<LedgerMeta>;

    /// Replaces goals, bank, anchor, and banking marker in one write.
    fn replace_meta(&self, meta: &LedgerMeta) -> Result<()>;

    /// Read-modify-write of the metadata under the store's own lock.
    ///
    /// Nothing is written when `apply` fails. Returns the stored record.
    fn update_meta(
        &self,
        apply: &mut dyn FnMut(&mut LedgerMeta) -> Result<()>,
    ) -> Result<LedgerMeta>;

    fn all_meals(&self) -> Result<Vec<Meal>>;

    fn append_meal(&self, meal: &Meal) -> Result<()>;

    /// Overwrites the stored meal with the same id.
    fn replace_meal(&self, meal: &Meal) -> Result<()>;

    /// Swaps meals and metadata together; used by reset and import.
    fn replace_all(&self, state: &AppState) -> Result<()>;

    /// Meals whose timestamp lies in `[start, end)`.
    fn meals_between(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<Meal>> {
        let mut meals: Vec<Meal> = self
            .all_meals()?
            .into_iter()
            .filter(|meal| meal.at >= start && meal.at < end)
            .collect();
        meals.sort_by_key(|meal| meal.at);
        Ok(meals)
    }

    fn snapshot(&self) -> Result<AppState> {
        Ok(AppState::new(self.load_meta()?, self.all_meals()?))
    }
}

impl<S: StateStore + ?Sized> StateStore for Arc<S> {
    fn load_meta(&self) -> Result<LedgerMeta> {
        (**self).load_meta()
    }

    fn replace_meta(&self, meta: &LedgerMeta) -> Result<()> {
        (**self).replace_meta(meta)
    }

    fn update_meta(
        &self,
        apply: &mut dyn FnMut(&mut LedgerMeta) -> Result<()>,
    ) -> Result<LedgerMeta> {
        (**self).update_meta(apply)
    }

    fn all_meals(&self) -> Result<Vec<Meal>> {
        (**self).all_meals()
    }

    fn append_meal(&self, meal: &Meal) -> Result<()> {
        (**self).append_meal(meal)
    }

    fn replace_meal(&self, meal: &Meal) -> Result<()> {
        (**self).replace_meal(meal)
    }

    fn replace_all(&self, state: &AppState) -> Result<()> {
        (**self).replace_all(state)
    }
}

pub use exchange::{export_json, parse_import, ExportEnvelope};
pub use json_backend::{JsonStore, STATE_SCHEMA_VERSION};
pub use memory::MemoryStore;
pub use migrate::{migrate_legacy_snapshot, MigrationOutcome};

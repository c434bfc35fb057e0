use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::errors::{LedgerError, Result};
use crate::ledger::{AppState, LedgerMeta, Meal};

use super::StateStore;

/// Volatile store, used by tests and one-off computations.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<AppState>,
}

impl MemoryStore {
    pub fn new(state: AppState) -> Self {
        Self {
            state: RwLock::new(state),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, AppState> {
        self.state.read().expect("MemoryStore lock poisoned")
    }

    fn write(&self) -> RwLockWriteGuard<'_, AppState> {
        self.state.write().expect("MemoryStore lock poisoned")
    }
}

impl StateStore for MemoryStore {
    fn load_meta(&self) -> Result<LedgerMeta> {
        Ok(self.read().meta)
    }

    fn replace_meta(&self, meta: &LedgerMeta) -> Result<()> {
        self.write().meta = *meta;
        Ok(())
    }

    fn update_meta(
        &self,
        apply: &mut dyn FnMut(&mut LedgerMeta) -> Result<()>,
    ) -> Result<LedgerMeta> {
        let mut state = self.write();
        let mut meta = state.meta;
        apply(&mut meta)?;
        state.meta = meta;
        Ok(meta)
    }

    fn all_meals(&self) -> Result<Vec<Meal>> {
        Ok(self.read().meals.clone())
    }

    fn append_meal(&self, meal: &Meal) -> Result<()> {
        let mut state = self.write();
        if state.meal(meal.id).is_some() {
            return Err(LedgerError::Storage(format!(
                "meal {} already exists",
                meal.id
            )));
        }
        state.meals.push(meal.clone());
        Ok(())
    }

    fn replace_meal(&self, meal: &Meal) -> Result<()> {
        let mut state = self.write();
        let slot = state
            .meals
            .iter_mut()
            .find(|existing| existing.id == meal.id)
            .ok_or(LedgerError::MealNotFound(meal.id))?;
        *slot = meal.clone();
        Ok(())
    }

    fn replace_all(&self, state: &AppState) -> Result<()> {
        *self.write() = state.clone();
        Ok(())
    }
}

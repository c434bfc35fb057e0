use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use tracing::{debug, info};
use uuid::Uuid;

use crate::errors::{LedgerError, Result};
use crate::ledger::{
    add_to_bank, borrow_from_bank, convert_vegetarian, default_anchor, leftovers, meals_by_day,
    progress_for, AppState, Bank, BorrowOutcome, Credits, Cycle, CycleClock, CycleReport, Goals,
    LedgerMeta, Meal, MealType, DEFAULT_TIMEZONE,
};
use crate::storage::{export_json, parse_import, StateStore};

use super::clock::Clock;

/// Behaviour knobs the facade applies on top of the pure ledger functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookSettings {
    pub tz: Tz,
    /// Apply the bank borrow before banking leftovers when closing a cycle.
    pub borrow_on_close: bool,
    pub max_meals_per_day: usize,
    pub default_goals: Goals,
    pub default_anchor: NaiveDate,
}

impl Default for BookSettings {
    fn default() -> Self {
        Self {
            tz: DEFAULT_TIMEZONE,
            borrow_on_close: false,
            max_meals_per_day: 2,
            default_goals: Goals::default(),
            default_anchor: default_anchor(),
        }
    }
}

impl BookSettings {
    pub fn initial_meta(&self) -> LedgerMeta {
        LedgerMeta::with_defaults(self.default_goals, self.default_anchor)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleSelector {
    Current,
    Previous,
}

/// What closing a cycle did to the bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CloseOutcome {
    pub cycle: Cycle,
    pub leftovers: Credits,
    /// Present when the borrow was applied as part of the close.
    pub borrowed: Option<BorrowOutcome>,
    pub bank: Bank,
}

/// Caller-side lifecycle around the ledger: reads snapshots from a store,
/// runs the pure computations, and writes the results back.
pub struct MealBook {
    store: Box<dyn StateStore>,
    clock: Arc<dyn Clock>,
    settings: BookSettings,
}

impl MealBook {
    pub fn new(store: Box<dyn StateStore>, clock: Arc<dyn Clock>, settings: BookSettings) -> Self {
        Self {
            store,
            clock,
            settings,
        }
    }

    pub fn store(&self) -> &dyn StateStore {
        self.store.as_ref()
    }

    pub fn settings(&self) -> &BookSettings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut BookSettings {
        &mut self.settings
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn meta(&self) -> Result<LedgerMeta> {
        self.store.load_meta()
    }

    pub fn cycle_clock(&self) -> Result<CycleClock> {
        Ok(CycleClock::new(self.meta()?.anchor, self.settings.tz))
    }

    pub fn current_cycle(&self) -> Result<Cycle> {
        Ok(self.cycle_clock()?.cycle_at(self.now()))
    }

    pub fn select_cycle(&self, selector: CycleSelector) -> Result<Cycle> {
        let clock = self.cycle_clock()?;
        let current = clock.cycle_at(self.now());
        Ok(match selector {
            CycleSelector::Current => current,
            CycleSelector::Previous => clock.previous(&current),
        })
    }

    pub fn cycle_meals(&self, cycle: &Cycle) -> Result<Vec<Meal>> {
        self.store.meals_between(cycle.start, cycle.end)
    }

    pub fn report(&self) -> Result<CycleReport> {
        let meta = self.meta()?;
        let cycle = CycleClock::new(meta.anchor, self.settings.tz).cycle_at(self.now());
        let meals = self.cycle_meals(&cycle)?;
        Ok(CycleReport::build(cycle, &meals, &meta.goals, &meta.bank))
    }

    /// The current cycle's meals bucketed by local day.
    pub fn calendar(&self) -> Result<(Cycle, Vec<(NaiveDate, Vec<Meal>)>)> {
        let clock = self.cycle_clock()?;
        let cycle = clock.cycle_at(self.now());
        let meals = self.cycle_meals(&cycle)?;
        let days = meals_by_day(&meals, &cycle, &clock)
            .into_iter()
            .map(|(day, bucket)| (day, bucket.into_iter().cloned().collect()))
            .collect();
        Ok((cycle, days))
    }

    pub fn log_meal(&self, kind: MealType, notes: Option<String>) -> Result<Meal> {
        self.log_meal_at(kind, self.now(), notes)
    }

    pub fn log_meal_at(
        &self,
        kind: MealType,
        at: DateTime<Utc>,
        notes: Option<String>,
    ) -> Result<Meal> {
        let mut meal = Meal::new(kind, at);
        if let Some(notes) = notes {
            meal = meal.with_notes(notes);
        }
        self.store.append_meal(&meal)?;
        info!(meal = %meal.id, kind = %kind, at = %meal.at, "meal logged");
        Ok(meal)
    }

    /// Places a meal at local noon of `day`, respecting the per-day limit.
    pub fn plan_meal(&self, kind: MealType, day: NaiveDate) -> Result<Meal> {
        let clock = self.cycle_clock()?;
        let on_day = self
            .store
            .all_meals()?
            .iter()
            .filter(|meal| clock.day_of(meal.at) == day)
            .count();
        let limit = self.settings.max_meals_per_day;
        if on_day >= limit {
            return Err(LedgerError::DayFull { day, limit });
        }
        self.log_meal_at(kind, clock.local_noon(day), None)
    }

    /// Corrects the timestamp of an existing meal.
    pub fn retime_meal(&self, id: Uuid, at: DateTime<Utc>) -> Result<Meal> {
        let mut meal = self
            .store
            .all_meals()?
            .into_iter()
            .find(|meal| meal.id == id)
            .ok_or(LedgerError::MealNotFound(id))?;
        let previous = meal.at;
        meal.at = at;
        self.store.replace_meal(&meal)?;
        info!(meal = %id, from = %previous, to = %at, "meal retimed");
        Ok(meal)
    }

    /// Banks the leftovers of the selected cycle, at most once per cycle.
    pub fn close_cycle(&self, selector: CycleSelector) -> Result<CloseOutcome> {
        let cycle = self.select_cycle(selector)?;
        let meals = self.cycle_meals(&cycle)?;
        let mut borrowed = None;
        let meta = self.update_meta(|meta| {
            if meta
                .last_banked_cycle
                .is_some_and(|banked| banked >= cycle.first_day)
            {
                return Err(LedgerError::CycleAlreadyBanked(cycle.first_day));
            }
            let progress = progress_for(&meals, cycle.start, cycle.end);
            let mut bank = meta.bank;
            let already_borrowed = meta.last_borrowed_cycle == Some(cycle.first_day);
            if self.settings.borrow_on_close && !already_borrowed {
                let outcome = borrow_from_bank(&bank, &meta.goals, &progress);
                bank = outcome.bank_after;
                borrowed = Some(outcome);
                meta.last_borrowed_cycle = Some(cycle.first_day);
            }
            meta.bank = add_to_bank(&bank, &leftovers(&meta.goals, &progress));
            meta.last_banked_cycle = Some(cycle.first_day);
            Ok(())
        })?;
        let progress = progress_for(&meals, cycle.start, cycle.end);
        let outcome = CloseOutcome {
            cycle,
            leftovers: leftovers(&meta.goals, &progress),
            borrowed,
            bank: meta.bank,
        };
        info!(cycle = %cycle.first_day, bank = %meta.bank, "cycle closed");
        Ok(outcome)
    }

    /// What borrowing would do for the current cycle. Nothing is written.
    pub fn preview_borrow(&self) -> Result<BorrowOutcome> {
        Ok(self.report()?.borrow_preview)
    }

    /// Persists the borrow outcome for the current cycle, once per cycle.
    pub fn apply_borrow(&self) -> Result<BorrowOutcome> {
        let cycle = self.current_cycle()?;
        let meals = self.cycle_meals(&cycle)?;
        let mut applied = BorrowOutcome::default();
        self.update_meta(|meta| {
            if meta.last_borrowed_cycle == Some(cycle.first_day) {
                return Err(LedgerError::BorrowAlreadyApplied(cycle.first_day));
            }
            let progress = progress_for(&meals, cycle.start, cycle.end);
            applied = borrow_from_bank(&meta.bank, &meta.goals, &progress);
            meta.bank = applied.bank_after;
            meta.last_borrowed_cycle = Some(cycle.first_day);
            Ok(())
        })?;
        info!(cycle = %cycle.first_day, bank = %applied.bank_after, "borrow applied");
        Ok(applied)
    }

    pub fn convert_vegetarian(&self) -> Result<Bank> {
        let meta = self.update_meta(|meta| {
            meta.bank = convert_vegetarian(&meta.bank);
            Ok(())
        })?;
        info!(bank = %meta.bank, "vegetarian credit converted");
        Ok(meta.bank)
    }

    pub fn set_goals(&self, goals: Goals) -> Result<LedgerMeta> {
        self.update_meta(|meta| {
            meta.goals = goals;
            Ok(())
        })
    }

    pub fn set_anchor(&self, anchor: NaiveDate) -> Result<LedgerMeta> {
        self.update_meta(|meta| {
            meta.anchor = anchor;
            Ok(())
        })
    }

    /// Drops all meals and restores default goals, bank, and anchor.
    pub fn reset(&self) -> Result<AppState> {
        let state = AppState::new(self.settings.initial_meta(), Vec::new());
        self.store.replace_all(&state)?;
        info!("state reset to defaults");
        Ok(state)
    }

    pub fn export_json(&self) -> Result<String> {
        export_json(&self.store.snapshot()?, self.now())
    }

    pub fn import_json(&self, json: &str) -> Result<AppState> {
        let state = parse_import(json)?;
        self.store.replace_all(&state)?;
        info!(meals = state.meals.len(), "state imported");
        Ok(state)
    }

    /// Applies `apply` to the stored metadata while the store holds its lock.
    fn update_meta<F>(&self, mut apply: F) -> Result<LedgerMeta>
    where
        F: FnMut(&mut LedgerMeta) -> Result<()>,
    {
        let meta = self.store.update_meta(&mut apply)?;
        debug!(?meta, "metadata replaced");
        Ok(meta)
    }
}

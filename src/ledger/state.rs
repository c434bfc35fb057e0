use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::budget::{Bank, Goals};
use super::cycle::default_anchor;
use super::meal::Meal;
use crate::errors::{LedgerError, Result};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parses an anchor given either as `YYYY-MM-DD` or as a timestamp whose
/// leading date part is used (`2025-01-01T00:00:00.000Z`).
pub fn parse_anchor(raw: &str) -> Result<NaiveDate> {
    let trimmed = raw.trim();
    let date_part = trimmed.get(..10).unwrap_or(trimmed);
    NaiveDate::parse_from_str(date_part, DATE_FORMAT)
        .map_err(|err| LedgerError::InvalidDate(format!("`{}`: {}", raw, err)))
}

mod anchor_format {
    use chrono::NaiveDate;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&date.format(super::DATE_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_anchor(&raw).map_err(D::Error::custom)
    }
}

/// Small metadata record kept next to the meal history.
///
/// Stores replace it as a whole so concurrent field updates cannot
/// interleave.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LedgerMeta {
    pub goals: Goals,
    pub bank: Bank,
    #[serde(rename = "anchorISO", with = "anchor_format")]
    pub anchor: NaiveDate,
    /// First day of the most recently banked cycle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_banked_cycle: Option<NaiveDate>,
    /// First day of the most recent cycle whose borrow was persisted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_borrowed_cycle: Option<NaiveDate>,
}

impl Default for LedgerMeta {
    fn default() -> Self {
        Self {
            goals: Goals::default(),
            bank: Bank::default(),
            anchor: default_anchor(),
            last_banked_cycle: None,
            last_borrowed_cycle: None,
        }
    }
}

impl LedgerMeta {
    pub fn with_defaults(goals: Goals, anchor: NaiveDate) -> Self {
        Self {
            goals,
            anchor,
            ..Self::default()
        }
    }
}

/// Full application state as exchanged with a store or an export file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppState {
    #[serde(flatten)]
    pub meta: LedgerMeta,
    #[serde(default)]
    pub meals: Vec<Meal>,
}

impl AppState {
    pub fn new(meta: LedgerMeta, meals: Vec<Meal>) -> Self {
        Self { meta, meals }
    }

    pub fn meal(&self, id: Uuid) -> Option<&Meal> {
        self.meals.iter().find(|meal| meal.id == id)
    }

    /// Same metadata and the same meals, ignoring meal order.
    pub fn equivalent(&self, other: &AppState) -> bool {
        if self.meta != other.meta || self.meals.len() != other.meals.len() {
            return false;
        }
        let theirs: HashMap<Uuid, &Meal> = other.meals.iter().map(|meal| (meal.id, meal)).collect();
        self.meals
            .iter()
            .all(|meal| theirs.get(&meal.id).is_some_and(|other| *other == meal))
    }

    /// Rejects histories that reuse a meal id.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::with_capacity(self.meals.len());
        for meal in &self.meals {
            if !seen.insert(meal.id) {
                return Err(LedgerError::InvalidPayload(format!(
                    "duplicate meal id {}",
                    meal.id
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::meal::MealType;
    use chrono::{TimeZone, Utc};

    #[test]
    fn anchor_accepts_plain_dates_and_timestamps() {
        let expected = NaiveDate::from_ymd_opt(2025, 3, 4).unwrap();
        assert_eq!(parse_anchor("2025-03-04").unwrap(), expected);
        assert_eq!(parse_anchor("2025-03-04T00:00:00.000Z").unwrap(), expected);
        assert!(matches!(
            parse_anchor("04/03/2025"),
            Err(LedgerError::InvalidDate(_))
        ));
    }

    #[test]
    fn meta_serializes_anchor_under_legacy_key() {
        let json = serde_json::to_value(LedgerMeta::default()).unwrap();
        assert_eq!(json["anchorISO"], "2025-01-01");
        assert_eq!(json["goals"]["vegan"], 10);
        assert!(json.get("lastBankedCycle").is_none());
    }

    #[test]
    fn equivalence_ignores_meal_order() {
        let at = Utc.with_ymd_and_hms(2025, 1, 2, 12, 0, 0).unwrap();
        let first = Meal::new(MealType::Vegan, at);
        let second = Meal::new(MealType::Big, at);
        let a = AppState::new(LedgerMeta::default(), vec![first.clone(), second.clone()]);
        let b = AppState::new(LedgerMeta::default(), vec![second, first]);
        assert!(a.equivalent(&b));
        assert_ne!(a, b);
    }

    #[test]
    fn duplicate_meal_ids_fail_validation() {
        let at = Utc.with_ymd_and_hms(2025, 1, 2, 12, 0, 0).unwrap();
        let meal = Meal::new(MealType::Vegan, at);
        let state = AppState::new(LedgerMeta::default(), vec![meal.clone(), meal]);
        assert!(matches!(state.validate(), Err(LedgerError::InvalidPayload(_))));
    }
}

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::LedgerError;

/// Kinds of meal tracked against the budget.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum MealType {
    Vegan,
    Vegetarian,
    Small,
    Big,
}

impl MealType {
    pub const ALL: [MealType; 4] = [
        MealType::Vegan,
        MealType::Vegetarian,
        MealType::Small,
        MealType::Big,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MealType::Vegan => "vegan",
            MealType::Vegetarian => "vegetarian",
            MealType::Small => "small",
            MealType::Big => "big",
        }
    }

    /// Small-meat points consumed by one meal of this kind.
    pub fn small_points(&self) -> u32 {
        match self {
            MealType::Small => 1,
            MealType::Big => 2,
            MealType::Vegan | MealType::Vegetarian => 0,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MealType::Vegan => "Vegan",
            MealType::Vegetarian => "Vegetarian",
            MealType::Small => "Small meat",
            MealType::Big => "Big meat",
        }
    }
}

impl fmt::Display for MealType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MealType {
    type Err = LedgerError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "vegan" => Ok(MealType::Vegan),
            "vegetarian" | "veggie" => Ok(MealType::Vegetarian),
            "small" | "small-meat" | "smallmeat" => Ok(MealType::Small),
            "big" | "big-meat" | "bigmeat" => Ok(MealType::Big),
            other => Err(LedgerError::InvalidMealType(other.to_string())),
        }
    }
}

/// A single logged eating event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Meal {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: MealType,
    pub at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Meal {
    pub fn new(kind: MealType, at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            at,
            notes: None,
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        let notes = notes.into();
        self.notes = if notes.trim().is_empty() {
            None
        } else {
            Some(notes)
        };
        self
    }
}

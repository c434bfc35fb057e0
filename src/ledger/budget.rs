//! Budget accounting over the meals of one cycle.
//!
//! Every function here is a pure transform: inputs are borrowed snapshots and
//! results are fresh values. Persisting a result is always the caller's move.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::meal::{Meal, MealType};

/// The three lines a cycle is budgeted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BudgetLine {
    Vegan,
    Vegetarian,
    Small,
}

impl BudgetLine {
    pub const ALL: [BudgetLine; 3] = [BudgetLine::Vegan, BudgetLine::Vegetarian, BudgetLine::Small];

    pub fn label(&self) -> &'static str {
        match self {
            BudgetLine::Vegan => "Vegan",
            BudgetLine::Vegetarian => "Vegetarian",
            BudgetLine::Small => "Small meat (points)",
        }
    }
}

/// Per-cycle targets. Big meat draws on `small` at two points per meal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Goals {
    pub vegan: u32,
    pub vegetarian: u32,
    pub small: u32,
}

impl Default for Goals {
    fn default() -> Self {
        Self {
            vegan: 10,
            vegetarian: 9,
            small: 9,
        }
    }
}

impl Goals {
    pub fn new(vegan: u32, vegetarian: u32, small: u32) -> Self {
        Self {
            vegan,
            vegetarian,
            small,
        }
    }

    pub fn get(&self, line: BudgetLine) -> u32 {
        match line {
            BudgetLine::Vegan => self.vegan,
            BudgetLine::Vegetarian => self.vegetarian,
            BudgetLine::Small => self.small,
        }
    }
}

/// Rollover credit carried between cycles.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Bank {
    pub vegan: u32,
    pub vegetarian: u32,
    pub small: u32,
}

impl Bank {
    pub fn new(vegan: u32, vegetarian: u32, small: u32) -> Self {
        Self {
            vegan,
            vegetarian,
            small,
        }
    }

    pub fn get(&self, line: BudgetLine) -> u32 {
        match line {
            BudgetLine::Vegan => self.vegan,
            BudgetLine::Vegetarian => self.vegetarian,
            BudgetLine::Small => self.small,
        }
    }

    fn from_fn(mut f: impl FnMut(BudgetLine) -> u32) -> Self {
        Self {
            vegan: f(BudgetLine::Vegan),
            vegetarian: f(BudgetLine::Vegetarian),
            small: f(BudgetLine::Small),
        }
    }
}

impl fmt::Display for Bank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "vegan {} • vegetarian {} • small {}",
            self.vegan, self.vegetarian, self.small
        )
    }
}

/// Unsigned per-line quantities: leftovers, overage, or missing credit.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Credits {
    pub vegan: u32,
    pub vegetarian: u32,
    pub small: u32,
}

impl Credits {
    pub fn get(&self, line: BudgetLine) -> u32 {
        match line {
            BudgetLine::Vegan => self.vegan,
            BudgetLine::Vegetarian => self.vegetarian,
            BudgetLine::Small => self.small,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.vegan == 0 && self.vegetarian == 0 && self.small == 0
    }

    fn from_fn(mut f: impl FnMut(BudgetLine) -> u32) -> Self {
        Self {
            vegan: f(BudgetLine::Vegan),
            vegetarian: f(BudgetLine::Vegetarian),
            small: f(BudgetLine::Small),
        }
    }
}

/// Consumption tallied over one cycle.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    pub vegan: u32,
    pub vegetarian: u32,
    /// Small-meat points: one per small meal, two per big meal.
    pub small_points_used: u32,
    /// Display only; already folded into `small_points_used`.
    pub big_count: u32,
}

impl Progress {
    pub fn used(&self, line: BudgetLine) -> u32 {
        match line {
            BudgetLine::Vegan => self.vegan,
            BudgetLine::Vegetarian => self.vegetarian,
            BudgetLine::Small => self.small_points_used,
        }
    }

    fn record(&mut self, kind: MealType) {
        match kind {
            MealType::Vegan => self.vegan += 1,
            MealType::Vegetarian => self.vegetarian += 1,
            MealType::Small => self.small_points_used += kind.small_points(),
            MealType::Big => {
                self.small_points_used += kind.small_points();
                self.big_count += 1;
            }
        }
    }
}

/// What borrowing from the bank would do for an over-budget cycle.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BorrowOutcome {
    pub bank_after: Bank,
    pub missing: Credits,
}

/// Tallies the meals whose timestamp falls in `[start, end)`.
pub fn progress_for(meals: &[Meal], start: DateTime<Utc>, end: DateTime<Utc>) -> Progress {
    meals
        .iter()
        .filter(|meal| meal.at >= start && meal.at < end)
        .fold(Progress::default(), |mut progress, meal| {
            progress.record(meal.kind);
            progress
        })
}

/// Unused budget per line, clamped at zero.
pub fn leftovers(goals: &Goals, progress: &Progress) -> Credits {
    Credits::from_fn(|line| goals.get(line).saturating_sub(progress.used(line)))
}

/// Consumption beyond the goal per line, clamped at zero.
pub fn overage(goals: &Goals, progress: &Progress) -> Credits {
    Credits::from_fn(|line| progress.used(line).saturating_sub(goals.get(line)))
}

pub fn add_to_bank(bank: &Bank, leftover: &Credits) -> Bank {
    Bank::from_fn(|line| bank.get(line).saturating_add(leftover.get(line)))
}

/// Covers each line's overage from the bank as far as the bank allows.
pub fn borrow_from_bank(bank: &Bank, goals: &Goals, progress: &Progress) -> BorrowOutcome {
    let over = overage(goals, progress);
    let take = Credits::from_fn(|line| bank.get(line).min(over.get(line)));
    BorrowOutcome {
        bank_after: Bank::from_fn(|line| bank.get(line) - take.get(line)),
        missing: Credits::from_fn(|line| over.get(line) - take.get(line)),
    }
}

/// Exchanges every two banked vegetarian credits for one vegan and one small.
pub fn convert_vegetarian(bank: &Bank) -> Bank {
    let times = bank.vegetarian / 2;
    if times == 0 {
        return *bank;
    }
    Bank {
        vegan: bank.vegan.saturating_add(times),
        vegetarian: bank.vegetarian - times * 2,
        small: bank.small.saturating_add(times),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn window() -> (DateTime<Utc>, DateTime<Utc>) {
        let start = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        (start, start + Duration::days(14))
    }

    fn meal(kind: MealType, at: DateTime<Utc>) -> Meal {
        Meal::new(kind, at)
    }

    #[test]
    fn big_meals_cost_two_small_points() {
        let (start, end) = window();
        let at = start + Duration::hours(12);
        let meals = vec![meal(MealType::Big, at), meal(MealType::Small, at)];
        let progress = progress_for(&meals, start, end);
        assert_eq!(progress.small_points_used, 3);
        assert_eq!(progress.big_count, 1);
        assert_eq!(progress.vegan, 0);
    }

    #[test]
    fn progress_ignores_meals_outside_the_window() {
        let (start, end) = window();
        let meals = vec![
            meal(MealType::Vegan, start - Duration::seconds(1)),
            meal(MealType::Vegan, start),
            meal(MealType::Vegetarian, end - Duration::seconds(1)),
            meal(MealType::Vegetarian, end),
        ];
        let progress = progress_for(&meals, start, end);
        assert_eq!(progress.vegan, 1);
        assert_eq!(progress.vegetarian, 1);
    }

    #[test]
    fn empty_meal_list_gives_zero_progress() {
        let (start, end) = window();
        assert_eq!(progress_for(&[], start, end), Progress::default());
    }

    #[test]
    fn leftovers_clamp_overspent_lines() {
        let goals = Goals::new(2, 2, 2);
        let progress = Progress {
            vegan: 5,
            vegetarian: 1,
            small_points_used: 2,
            big_count: 1,
        };
        let left = leftovers(&goals, &progress);
        assert_eq!(
            left,
            Credits {
                vegan: 0,
                vegetarian: 1,
                small: 0
            }
        );
    }

    #[test]
    fn banking_accumulates_on_every_call() {
        let left = Credits {
            vegan: 1,
            vegetarian: 2,
            small: 3,
        };
        let once = add_to_bank(&Bank::default(), &left);
        let twice = add_to_bank(&once, &left);
        assert_eq!(once, Bank::new(1, 2, 3));
        assert_eq!(twice, Bank::new(2, 4, 6));
    }

    #[test]
    fn banking_saturates_instead_of_overflowing() {
        let full = Bank::new(u32::MAX, u32::MAX - 1, u32::MAX);
        let left = Credits {
            vegan: 2,
            vegetarian: 0,
            small: 1,
        };
        assert_eq!(
            add_to_bank(&full, &left),
            Bank::new(u32::MAX, u32::MAX - 1, u32::MAX)
        );
        let converted = convert_vegetarian(&full);
        assert_eq!(converted.vegan, u32::MAX);
        assert_eq!(converted.vegetarian, 0);
        assert_eq!(converted.small, u32::MAX);
    }

    #[test]
    fn borrowing_covers_overage_from_bank() {
        let bank = Bank::new(3, 0, 0);
        let goals = Goals::new(2, 2, 2);
        let progress = Progress {
            vegan: 5,
            ..Progress::default()
        };
        assert_eq!(overage(&goals, &progress).vegan, 3);
        let outcome = borrow_from_bank(&bank, &goals, &progress);
        assert_eq!(outcome.bank_after.vegan, 0);
        assert_eq!(outcome.missing.vegan, 0);
    }

    #[test]
    fn borrowing_reports_what_the_bank_cannot_cover() {
        let bank = Bank::new(1, 4, 1);
        let goals = Goals::new(2, 2, 2);
        let progress = Progress {
            vegan: 5,
            vegetarian: 3,
            small_points_used: 6,
            big_count: 3,
        };
        let outcome = borrow_from_bank(&bank, &goals, &progress);
        assert_eq!(outcome.bank_after, Bank::new(0, 3, 0));
        assert_eq!(
            outcome.missing,
            Credits {
                vegan: 2,
                vegetarian: 0,
                small: 3
            }
        );
    }

    #[test]
    fn borrowing_within_goal_leaves_bank_untouched() {
        let bank = Bank::new(4, 4, 4);
        let outcome = borrow_from_bank(&bank, &Goals::default(), &Progress::default());
        assert_eq!(outcome.bank_after, bank);
        assert!(outcome.missing.is_zero());
    }

    #[test]
    fn conversion_exchanges_pairs_of_vegetarian_credit() {
        assert_eq!(convert_vegetarian(&Bank::new(0, 5, 0)), Bank::new(2, 1, 2));
    }

    #[test]
    fn conversion_is_identity_below_two_and_idempotent_after() {
        assert_eq!(convert_vegetarian(&Bank::new(3, 1, 0)), Bank::new(3, 1, 0));
        let first = convert_vegetarian(&Bank::new(0, 4, 1));
        assert_eq!(first, Bank::new(2, 0, 3));
        assert_eq!(convert_vegetarian(&first), first);
    }
}

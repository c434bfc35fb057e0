use chrono::NaiveDate;
use serde::Serialize;

use super::budget::{
    borrow_from_bank, leftovers, progress_for, Bank, BorrowOutcome, BudgetLine, Credits, Goals,
    Progress,
};
use super::cycle::{Cycle, CycleClock};
use super::meal::Meal;

/// Standing of one budget line within a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LineStatus {
    pub used: u32,
    pub goal: u32,
    pub bank: u32,
}

impl LineStatus {
    /// Goal plus banked credit.
    pub fn allowance(&self) -> u32 {
        self.goal.saturating_add(self.bank)
    }

    /// Allowance left to spend; negative once the line is overspent.
    pub fn remaining(&self) -> i64 {
        i64::from(self.allowance()) - i64::from(self.used)
    }

    /// Fill level of the allowance, capped at 100.
    pub fn percent(&self) -> u32 {
        let allowance = self.allowance();
        if allowance == 0 {
            return if self.used > 0 { 100 } else { 0 };
        }
        let ratio = f64::from(self.used) / f64::from(allowance) * 100.0;
        (ratio.round() as u32).min(100)
    }
}

/// Everything a dashboard needs about the current cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    pub cycle: Cycle,
    pub progress: Progress,
    pub vegan: LineStatus,
    pub vegetarian: LineStatus,
    pub small: LineStatus,
    /// Leftovers if the cycle were closed now.
    pub leftovers: Credits,
    /// Advisory: what borrowing would do; never applied by building a report.
    pub borrow_preview: BorrowOutcome,
}

impl CycleReport {
    pub fn build(cycle: Cycle, meals: &[Meal], goals: &Goals, bank: &Bank) -> Self {
        let progress = progress_for(meals, cycle.start, cycle.end);
        let line = |line: BudgetLine| LineStatus {
            used: progress.used(line),
            goal: goals.get(line),
            bank: bank.get(line),
        };
        Self {
            cycle,
            vegan: line(BudgetLine::Vegan),
            vegetarian: line(BudgetLine::Vegetarian),
            small: line(BudgetLine::Small),
            leftovers: leftovers(goals, &progress),
            borrow_preview: borrow_from_bank(bank, goals, &progress),
            progress,
        }
    }

    pub fn line(&self, line: BudgetLine) -> &LineStatus {
        match line {
            BudgetLine::Vegan => &self.vegan,
            BudgetLine::Vegetarian => &self.vegetarian,
            BudgetLine::Small => &self.small,
        }
    }
}

/// Meals of `cycle` grouped by local calendar day, each day in time order.
pub fn meals_by_day<'a>(
    meals: &'a [Meal],
    cycle: &Cycle,
    clock: &CycleClock,
) -> Vec<(NaiveDate, Vec<&'a Meal>)> {
    let mut days: Vec<(NaiveDate, Vec<&Meal>)> = clock
        .days(cycle)
        .into_iter()
        .map(|day| (day, Vec::new()))
        .collect();
    for meal in meals.iter().filter(|meal| cycle.contains(meal.at)) {
        let day = clock.day_of(meal.at);
        if let Some((_, bucket)) = days.iter_mut().find(|(date, _)| *date == day) {
            bucket.push(meal);
        }
    }
    for (_, bucket) in days.iter_mut() {
        bucket.sort_by_key(|meal| meal.at);
    }
    days
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::meal::MealType;
    use chrono::{Duration, TimeZone, Utc};

    fn clock() -> CycleClock {
        CycleClock::new(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(), chrono_tz::UTC)
    }

    #[test]
    fn report_combines_goal_bank_and_usage() {
        let clock = clock();
        let cycle = clock.cycle_at(Utc.with_ymd_and_hms(2025, 1, 3, 9, 0, 0).unwrap());
        let at = cycle.start + Duration::hours(12);
        let meals = vec![
            Meal::new(MealType::Big, at),
            Meal::new(MealType::Big, at),
            Meal::new(MealType::Vegan, at),
        ];
        let report = CycleReport::build(cycle, &meals, &Goals::new(1, 9, 2), &Bank::new(0, 0, 1));

        assert_eq!(report.small.used, 4);
        assert_eq!(report.small.allowance(), 3);
        assert_eq!(report.small.remaining(), -1);
        assert_eq!(report.small.percent(), 100);
        assert_eq!(report.vegan.percent(), 100);
        assert_eq!(report.vegetarian.remaining(), 9);
        assert_eq!(report.leftovers.vegetarian, 9);
        assert_eq!(report.borrow_preview.missing.small, 1);
        assert_eq!(report.borrow_preview.bank_after.small, 0);
    }

    #[test]
    fn percent_handles_empty_allowance() {
        let idle = LineStatus {
            used: 0,
            goal: 0,
            bank: 0,
        };
        assert_eq!(idle.percent(), 0);
        let third = LineStatus {
            used: 1,
            goal: 3,
            bank: 0,
        };
        assert_eq!(third.percent(), 33);
    }

    #[test]
    fn allowance_saturates_on_a_huge_bank() {
        let status = LineStatus {
            used: 3,
            goal: 10,
            bank: u32::MAX,
        };
        assert_eq!(status.allowance(), u32::MAX);
        assert_eq!(status.remaining(), i64::from(u32::MAX) - 3);
        assert_eq!(status.percent(), 0);
    }

    #[test]
    fn meals_are_grouped_into_calendar_days() {
        let clock = clock();
        let cycle = clock.cycle_at(Utc.with_ymd_and_hms(2025, 1, 3, 9, 0, 0).unwrap());
        let second_day = cycle.start + Duration::days(1);
        let meals = vec![
            Meal::new(MealType::Vegan, second_day + Duration::hours(19)),
            Meal::new(MealType::Small, second_day + Duration::hours(12)),
            Meal::new(MealType::Big, cycle.end),
        ];
        let days = meals_by_day(&meals, &cycle, &clock);
        assert_eq!(days.len(), 14);
        assert!(days[0].1.is_empty());
        let kinds: Vec<_> = days[1].1.iter().map(|meal| meal.kind).collect();
        assert_eq!(kinds, vec![MealType::Small, MealType::Vegan]);
        assert_eq!(days.iter().map(|(_, meals)| meals.len()).sum::<usize>(), 2);
    }
}

use chrono::NaiveDate;
use chrono_tz::Tz;

use crate::ledger::{format_range, Bank, BudgetLine, Credits, CycleReport, LineStatus, Meal};

const BAR_WIDTH: usize = 20;

fn bar(status: &LineStatus) -> String {
    let filled = status.percent() as usize * BAR_WIDTH / 100;
    format!("{}{}", "#".repeat(filled), ".".repeat(BAR_WIDTH - filled))
}

/// Dashboard lines for the current cycle.
pub fn report_lines(report: &CycleReport, tz: Tz) -> Vec<String> {
    let mut lines = vec![format!("Cycle {}", format_range(&report.cycle, tz))];
    for line in BudgetLine::ALL {
        let status = report.line(line);
        lines.push(format!(
            "  {:<20} {:>3}/{:<3} [{}] {:>3}%  left {:>3}  (goal {}, bank {})",
            line.label(),
            status.used,
            status.allowance(),
            bar(status),
            status.percent(),
            status.remaining(),
            status.goal,
            status.bank,
        ));
    }
    if report.progress.big_count > 0 {
        lines.push(format!(
            "  Big meat meals: {} ({} points)",
            report.progress.big_count,
            report.progress.big_count * 2
        ));
    }
    lines.push(format!("  Leftovers if closed now: {}", credits(&report.leftovers)));
    let missing = &report.borrow_preview.missing;
    if report.borrow_preview.bank_after != bank_of(report) || !missing.is_zero() {
        lines.push(format!(
            "  Borrow preview: bank {} / still over {}",
            report.borrow_preview.bank_after,
            credits(missing)
        ));
    }
    lines
}

fn bank_of(report: &CycleReport) -> Bank {
    Bank::new(report.vegan.bank, report.vegetarian.bank, report.small.bank)
}

pub fn credits(credits: &Credits) -> String {
    format!(
        "vegan {}, vegetarian {}, small {}",
        credits.vegan, credits.vegetarian, credits.small
    )
}

pub fn meal_line(meal: &Meal, tz: Tz) -> String {
    let local = meal.at.with_timezone(&tz);
    let mut line = format!(
        "{}  {:<11} {}",
        local.format("%a %b %-d %H:%M"),
        meal.kind.label(),
        meal.id
    );
    if let Some(notes) = &meal.notes {
        line.push_str("  ");
        line.push_str(notes);
    }
    line
}

/// One row per local day; empty days show a dash.
pub fn calendar_lines(days: &[(NaiveDate, Vec<Meal>)], today: NaiveDate) -> Vec<String> {
    days.iter()
        .map(|(day, meals)| {
            let marker = if *day == today { '*' } else { ' ' };
            let entries = if meals.is_empty() {
                "-".to_string()
            } else {
                meals
                    .iter()
                    .map(|meal| meal.kind.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            };
            format!("{} {}  {}", marker, day.format("%a %b %d"), entries)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{CycleClock, Goals, MealType};
    use chrono::{TimeZone, Utc};

    #[test]
    fn report_renders_usage_and_preview() {
        let clock = CycleClock::new(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(), chrono_tz::UTC);
        let at = Utc.with_ymd_and_hms(2025, 1, 2, 12, 0, 0).unwrap();
        let cycle = clock.cycle_at(at);
        let meals = vec![
            Meal::new(MealType::Vegan, at),
            Meal::new(MealType::Big, at),
            Meal::new(MealType::Big, at),
        ];
        let report = CycleReport::build(cycle, &meals, &Goals::new(4, 2, 2), &Bank::new(0, 0, 1));
        let rendered = report_lines(&report, chrono_tz::UTC).join("\n");
        insta::assert_snapshot!(rendered, @r###"
        Cycle Jan 1–Jan 14
          Vegan                  1/4   [#####...............]  25%  left   3  (goal 4, bank 0)
          Vegetarian             0/2   [....................]   0%  left   2  (goal 2, bank 0)
          Small meat (points)    4/3   [####################] 100%  left  -1  (goal 2, bank 1)
          Big meat meals: 2 (4 points)
          Leftovers if closed now: vegan 3, vegetarian 2, small 0
          Borrow preview: bank vegan 0 • vegetarian 0 • small 0 / still over vegan 0, vegetarian 0, small 1
        "###);
    }

    #[test]
    fn calendar_marks_today_and_empty_days() {
        let day = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
        let at = Utc.with_ymd_and_hms(2025, 1, 6, 12, 0, 0).unwrap();
        let days = vec![
            (day, vec![Meal::new(MealType::Small, at), Meal::new(MealType::Vegan, at)]),
            (day.succ_opt().unwrap(), Vec::new()),
        ];
        let lines = calendar_lines(&days, day);
        assert_eq!(lines[0], "* Mon Jan 06  small, vegan");
        assert_eq!(lines[1], "  Tue Jan 07  -");
    }
}

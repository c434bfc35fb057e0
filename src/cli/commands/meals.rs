use uuid::Uuid;

use crate::cli::core::{CommandError, CommandResult, ShellContext};
use crate::cli::io;
use crate::cli::output::section;
use crate::cli::registry::CommandEntry;
use crate::cli::render;
use crate::ledger::MealType;

use super::{parse_day, parse_instant, usage_error};

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![
        CommandEntry::new(
            "log",
            "Record a meal eaten now",
            "log <vegan|vegetarian|small|big> [note...]",
            cmd_log,
        ),
        CommandEntry::new(
            "plan",
            "Place a meal at noon on a given day",
            "plan <vegan|vegetarian|small|big> <YYYY-MM-DD>",
            cmd_plan,
        ),
        CommandEntry::new(
            "meals",
            "List the meals of the current cycle",
            "meals",
            cmd_meals,
        ),
        CommandEntry::new(
            "retime",
            "Correct the timestamp of a logged meal",
            "retime <meal-id> <timestamp>",
            cmd_retime,
        ),
    ]
}

fn cmd_log(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let (kind, note) = match args.split_first() {
        Some((kind, rest)) => (kind.parse::<MealType>()?, rest.join(" ")),
        None => return Err(usage_error("log <type> [note...]")),
    };
    let notes = (!note.trim().is_empty()).then_some(note);
    let meal = context.book.log_meal(kind, notes)?;
    io::print_success(format!("Logged {} meal {}.", kind.label().to_lowercase(), meal.id));
    Ok(())
}

fn cmd_plan(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [kind, day] = args else {
        return Err(usage_error("plan <type> <YYYY-MM-DD>"));
    };
    let kind: MealType = kind.parse()?;
    let day = parse_day(day)?;
    let meal = context.book.plan_meal(kind, day)?;
    io::print_success(format!(
        "Planned {} meal for {} ({}).",
        kind.label().to_lowercase(),
        day,
        meal.id
    ));
    Ok(())
}

fn cmd_meals(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let cycle = context.book.current_cycle()?;
    let meals = context.book.cycle_meals(&cycle)?;
    let tz = context.book.settings().tz;
    section(format!("Meals ({})", meals.len()));
    if meals.is_empty() {
        io::print_info("No meals logged in this cycle yet.");
    }
    for meal in &meals {
        io::print_info(render::meal_line(meal, tz));
    }
    Ok(())
}

fn cmd_retime(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [id, at] = args else {
        return Err(usage_error("retime <meal-id> <timestamp>"));
    };
    let id = Uuid::parse_str(id)
        .map_err(|_| CommandError::InvalidArguments(format!("`{}` is not a meal id", id)))?;
    let meal = context.book.retime_meal(id, parse_instant(at)?)?;
    let local = meal.at.with_timezone(&context.book.settings().tz);
    io::print_success(format!(
        "Meal {} now at {}.",
        meal.id,
        local.format("%Y-%m-%d %H:%M %Z")
    ));
    Ok(())
}

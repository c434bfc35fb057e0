use crate::cli::core::{CommandResult, ShellContext};
use crate::cli::io;
use crate::cli::output::section;
use crate::cli::registry::CommandEntry;
use crate::cli::render;
use crate::core::CycleSelector;
use crate::ledger::format_range;

use super::usage_error;

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![
        CommandEntry::new(
            "status",
            "Show usage, allowance, and bank for the current cycle",
            "status",
            cmd_status,
        ),
        CommandEntry::new(
            "calendar",
            "List the current cycle day by day",
            "calendar",
            cmd_calendar,
        ),
        CommandEntry::new(
            "close",
            "Bank the leftovers of the current or previous cycle",
            "close [previous]",
            cmd_close,
        ),
        CommandEntry::new(
            "borrow",
            "Preview covering overage from the bank, or apply it",
            "borrow [apply]",
            cmd_borrow,
        ),
        CommandEntry::new(
            "convert",
            "Trade banked vegetarian credit 2:1 for vegan and small",
            "convert",
            cmd_convert,
        ),
    ]
}

fn cmd_status(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let report = context.book.report()?;
    let tz = context.book.settings().tz;
    section("Status");
    for line in render::report_lines(&report, tz) {
        io::print_info(line);
    }
    Ok(())
}

fn cmd_calendar(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let (cycle, days) = context.book.calendar()?;
    let clock = context.book.cycle_clock()?;
    let today = clock.day_of(context.book.now());
    section(format!("Calendar {}", clock.format_range(&cycle)));
    for line in render::calendar_lines(&days, today) {
        io::print_info(line);
    }
    Ok(())
}

fn cmd_close(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let selector = match args {
        [] => CycleSelector::Current,
        [which] if which.eq_ignore_ascii_case("previous") => CycleSelector::Previous,
        _ => return Err(usage_error("close [previous]")),
    };
    let outcome = context.book.close_cycle(selector)?;
    let tz = context.book.settings().tz;
    if let Some(borrowed) = outcome.borrowed {
        io::print_info(format!(
            "Borrowed from bank; still over: {}",
            render::credits(&borrowed.missing)
        ));
    }
    io::print_success(format!(
        "Closed cycle {}. Banked {}.",
        format_range(&outcome.cycle, tz),
        render::credits(&outcome.leftovers)
    ));
    io::print_info(format!("Bank: {}", outcome.bank));
    Ok(())
}

fn cmd_borrow(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    match args {
        [] => {
            let preview = context.book.preview_borrow()?;
            io::print_info(format!("Bank after borrowing: {}", preview.bank_after));
            io::print_info(format!("Still over budget: {}", render::credits(&preview.missing)));
            io::print_hint("Nothing was changed. Run `borrow apply` to persist.");
            Ok(())
        }
        [action] if action.eq_ignore_ascii_case("apply") => {
            let applied = context.book.apply_borrow()?;
            io::print_success(format!("Borrow applied. Bank: {}", applied.bank_after));
            if !applied.missing.is_zero() {
                io::print_warning(format!(
                    "Still over budget: {}",
                    render::credits(&applied.missing)
                ));
            }
            Ok(())
        }
        _ => Err(usage_error("borrow [apply]")),
    }
}

fn cmd_convert(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let before = context.book.meta()?.bank;
    let after = context.book.convert_vegetarian()?;
    if after == before {
        io::print_info("Nothing to convert: fewer than 2 vegetarian credits banked.");
    } else {
        io::print_success(format!("Converted. Bank: {}", after));
    }
    Ok(())
}

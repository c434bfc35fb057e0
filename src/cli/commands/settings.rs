use crate::cli::core::{CommandResult, ShellContext};
use crate::cli::io;
use crate::cli::output::section;
use crate::cli::registry::CommandEntry;
use crate::ledger::Goals;

use super::{parse_count, parse_day, usage_error};

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![
        CommandEntry::new(
            "goals",
            "Show or set per-cycle goals",
            "goals [<vegan> <vegetarian> <small>]",
            cmd_goals,
        ),
        CommandEntry::new(
            "anchor",
            "Show or move the date cycles are aligned to",
            "anchor [<YYYY-MM-DD>]",
            cmd_anchor,
        ),
        CommandEntry::new(
            "config",
            "Show or change preferences",
            "config [show | [set] <key> <value>]",
            cmd_config,
        ),
    ]
}

fn cmd_goals(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    match args {
        [] => {
            let goals = context.book.meta()?.goals;
            io::print_info(format!(
                "Goals per cycle: vegan {}, vegetarian {}, small points {}",
                goals.vegan, goals.vegetarian, goals.small
            ));
            Ok(())
        }
        [vegan, vegetarian, small] => {
            let goals = Goals::new(
                parse_count(vegan, "vegan")?,
                parse_count(vegetarian, "vegetarian")?,
                parse_count(small, "small")?,
            );
            context.book.set_goals(goals)?;
            io::print_success(format!(
                "Goals set to vegan {}, vegetarian {}, small points {}.",
                goals.vegan, goals.vegetarian, goals.small
            ));
            Ok(())
        }
        _ => Err(usage_error("goals [<vegan> <vegetarian> <small>]")),
    }
}

fn cmd_anchor(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    match args {
        [] => {
            let clock = context.book.cycle_clock()?;
            let cycle = context.book.current_cycle()?;
            io::print_info(format!(
                "Anchor {}; current cycle {}",
                clock.anchor(),
                clock.format_range(&cycle)
            ));
            Ok(())
        }
        [raw] => {
            let anchor = parse_day(raw)?;
            context.book.set_anchor(anchor)?;
            let cycle = context.book.current_cycle()?;
            io::print_success(format!(
                "Anchor set to {}. Current cycle {}.",
                anchor,
                context.book.cycle_clock()?.format_range(&cycle)
            ));
            Ok(())
        }
        _ => Err(usage_error("anchor [<YYYY-MM-DD>]")),
    }
}

fn cmd_config(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let (key, value) = match args {
        [] => return show_config(context),
        [show] if show.eq_ignore_ascii_case("show") => return show_config(context),
        [set, key, rest @ ..] if set.eq_ignore_ascii_case("set") && !rest.is_empty() => {
            (*key, rest.join(" "))
        }
        [key, rest @ ..] if !rest.is_empty() => (*key, rest.join(" ")),
        _ => return Err(usage_error("config [show | [set] <key> <value>]")),
    };
    let mut config = context.config.clone();
    config.set(key, &value)?;
    context.apply_config(config)?;
    io::print_success(format!("{} updated.", key));
    Ok(())
}

fn show_config(context: &ShellContext) -> CommandResult {
    section("Configuration");
    for (key, value) in context.config.entries() {
        io::print_info(format!("  {:<18} {}", key, value));
    }
    io::print_hint(format!("Stored in {}", context.config_manager.path().display()));
    Ok(())
}

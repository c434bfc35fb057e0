use std::fs;

use crate::cli::core::{CommandError, CommandResult, ShellContext};
use crate::cli::io;
use crate::cli::output::section;
use crate::cli::registry::CommandEntry;

use super::usage_error;

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![
        CommandEntry::new(
            "export",
            "Write goals, bank, anchor, and meals to a JSON file",
            "export <file>",
            cmd_export,
        ),
        CommandEntry::new(
            "import",
            "Replace everything with the contents of an export file",
            "import <file>",
            cmd_import,
        ),
        CommandEntry::new("backups", "List state backups", "backups", cmd_backups),
        CommandEntry::new(
            "restore",
            "Replace everything with a backup",
            "restore <backup>",
            cmd_restore,
        ),
        CommandEntry::new(
            "reset",
            "Delete all meals and restore default goals, bank, and anchor",
            "reset",
            cmd_reset,
        ),
    ]
}

fn cmd_export(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [path] = args else {
        return Err(usage_error("export <file>"));
    };
    let json = context.book.export_json()?;
    fs::write(path, json)?;
    io::print_success(format!("Exported to {}.", path));
    Ok(())
}

fn cmd_import(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [path] = args else {
        return Err(usage_error("import <file>"));
    };
    let raw = fs::read_to_string(path)?;
    if !context.confirm("Replace all meals and settings with the imported data?")? {
        io::print_info("Import cancelled.");
        return Ok(());
    }
    let state = context.book.import_json(&raw)?;
    io::print_success(format!("Imported {} meals.", state.meals.len()));
    Ok(())
}

fn cmd_backups(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let backups = context.store.list_backups()?;
    section("Backups");
    if backups.is_empty() {
        io::print_info("No backups yet.");
    }
    for (index, name) in backups.iter().enumerate() {
        io::print_info(format!("  {:>2}. {}", index + 1, name));
    }
    Ok(())
}

fn cmd_restore(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [reference] = args else {
        return Err(usage_error("restore <backup>"));
    };
    let name = resolve_backup(context, reference)?;
    if !context.confirm(&format!("Replace current data with `{}`?", name))? {
        io::print_info("Restore cancelled.");
        return Ok(());
    }
    let state = context.store.restore_backup(&name)?;
    io::print_success(format!("Restored {} ({} meals).", name, state.meals.len()));
    Ok(())
}

/// A backup is named either by file name or by its 1-based listing index.
fn resolve_backup(context: &ShellContext, reference: &str) -> Result<String, CommandError> {
    if let Ok(index) = reference.parse::<usize>() {
        let backups = context.store.list_backups()?;
        return index
            .checked_sub(1)
            .and_then(|idx| backups.get(idx).cloned())
            .ok_or_else(|| {
                CommandError::InvalidArguments(format!("no backup at position {}", index))
            });
    }
    Ok(reference.to_string())
}

fn cmd_reset(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    if !context.confirm("Delete all meals and reset goals, bank, and anchor?")? {
        io::print_info("Reset cancelled.");
        return Ok(());
    }
    context.book.reset()?;
    io::print_success("All data reset to defaults.");
    Ok(())
}

use crate::cli::core::{CommandError, CommandResult, ShellContext};
use crate::cli::help;
use crate::cli::io;
use crate::cli::output::section;
use crate::cli::registry::CommandEntry;
use crate::storage::STATE_SCHEMA_VERSION;
use crate::utils::build_info;

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![
        CommandEntry::new("version", "Show build metadata", "version", cmd_version),
        CommandEntry::new(
            "help",
            "Show available commands",
            "help [command]",
            cmd_help,
        ),
        CommandEntry::new("exit", "Leave the shell", "exit", cmd_exit),
    ]
}

fn cmd_version(_context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let info = build_info::current();
    section(info.summary());
    io::print_info(format!("  {:<8} v{}", "schema", STATE_SCHEMA_VERSION));
    for (label, value) in info.details() {
        io::print_info(format!("  {:<8} {}", label, value));
    }
    Ok(())
}

fn cmd_help(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    if let Some(name) = args.first() {
        match context.registry.get(&name.to_lowercase()) {
            Some(entry) => help::print_command(entry),
            None => context.suggest_command(name),
        }
        return Ok(());
    }
    help::print_overview(&context.registry);
    Ok(())
}

fn cmd_exit(_context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    Err(CommandError::ExitRequested)
}

use super::io;
use super::output::section;
use super::registry::{CommandEntry, CommandRegistry};

pub fn print_overview(registry: &CommandRegistry) {
    section("Available commands");
    for entry in registry.list() {
        io::print_info(format!("  {:<10} {}", entry.name, entry.description));
    }
    io::print_hint("Use `help <command>` for details.");
}

pub fn print_command(entry: &CommandEntry) {
    section(format!("Help: {}", entry.name));
    io::print_info(format!("  {}", entry.description));
    io::print_info(format!("  Usage: {}", entry.usage));
}

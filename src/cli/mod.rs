//! Interactive shell and script runner over [`crate::core::MealBook`].

pub mod commands;
pub mod core;
pub mod help;
pub mod io;
pub mod output;
pub mod registry;
pub mod render;
mod shell;

pub use self::core::{CliError, CliMode, CommandError, ShellContext};
pub use shell::run_cli;

use std::fmt;

use dialoguer::{theme::ColorfulTheme, Confirm};

use super::core::CommandError;
use super::output;

pub fn print_info(message: impl fmt::Display) {
    output::info(message);
}

pub fn print_warning(message: impl fmt::Display) {
    output::warning(message);
}

pub fn print_error(message: impl fmt::Display) {
    output::error(message);
}

pub fn print_success(message: impl fmt::Display) {
    output::success(message);
}

pub fn print_hint(message: impl fmt::Display) {
    output::hint(message);
}

/// Yes/no question on the terminal.
pub fn confirm_action(
    theme: &ColorfulTheme,
    prompt: &str,
    default: bool,
) -> Result<bool, CommandError> {
    Confirm::with_theme(theme)
        .with_prompt(prompt)
        .default(default)
        .interact()
        .map_err(CommandError::from)
}

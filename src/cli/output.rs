use colored::Colorize;
use std::fmt;

/// Message categories used by the shell output helpers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MessageKind {
    Info,
    Success,
    Warning,
    Error,
    Hint,
    Section,
}

/// Plain-text rendering before any colour is applied.
pub fn render(kind: MessageKind, message: impl fmt::Display) -> String {
    let text = message.to_string();
    match kind {
        MessageKind::Info => text,
        MessageKind::Success => format!("[ok] {}", text),
        MessageKind::Warning => format!("[!] {}", text),
        MessageKind::Error => format!("[x] {}", text),
        MessageKind::Hint => format!("    {}", text),
        MessageKind::Section => format!("=== {} ===", text.trim()),
    }
}

fn style(kind: MessageKind, text: String) -> String {
    match kind {
        MessageKind::Success => text.bright_green().to_string(),
        MessageKind::Warning => text.bright_yellow().to_string(),
        MessageKind::Error => text.bright_red().to_string(),
        MessageKind::Hint => text.dimmed().to_string(),
        MessageKind::Section => text.bold().to_string(),
        MessageKind::Info => text,
    }
}

pub fn print(kind: MessageKind, message: impl fmt::Display) {
    let styled = style(kind, render(kind, message));
    match kind {
        MessageKind::Section => println!("\n{}", styled),
        _ => println!("{}", styled),
    }
}

/// Disables ANSI styling, used when output is not a terminal.
pub fn disable_colors() {
    colored::control::set_override(false);
}

pub fn info(message: impl fmt::Display) {
    print(MessageKind::Info, message);
}

pub fn success(message: impl fmt::Display) {
    print(MessageKind::Success, message);
}

pub fn warning(message: impl fmt::Display) {
    print(MessageKind::Warning, message);
}

pub fn error(message: impl fmt::Display) {
    print(MessageKind::Error, message);
}

pub fn hint(message: impl fmt::Display) {
    print(MessageKind::Hint, message);
}

pub fn section(title: impl fmt::Display) {
    print(MessageKind::Section, title);
}

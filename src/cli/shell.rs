use std::{
    borrow::Cow,
    io::{self, BufRead},
};

use rustyline::{
    completion::{Completer, Pair},
    error::ReadlineError,
    highlight::Highlighter,
    hint::Hinter,
    history::DefaultHistory,
    validate::{ValidationContext, ValidationResult, Validator},
    Cmd, Context as ReadlineContext, Editor, Helper, KeyEvent,
};
use shell_words::split;

use super::core::{CliError, CliMode, CommandError, LoopControl, ShellContext, SCRIPT_ENV};
use super::output;
use crate::ledger::MealType;

pub fn run_cli() -> Result<(), CliError> {
    let mode = if std::env::var_os(SCRIPT_ENV).is_some() {
        CliMode::Script
    } else {
        CliMode::Interactive
    };
    if mode == CliMode::Script {
        output::disable_colors();
    }

    let mut context = ShellContext::new(mode)?;

    match mode {
        CliMode::Interactive => run_interactive(&mut context),
        CliMode::Script => run_script(&mut context),
    }
}

fn run_interactive(context: &mut ShellContext) -> Result<(), CliError> {
    let mut editor = Editor::<CommandHelper, DefaultHistory>::new()?;
    let helper = CommandHelper::new(context.command_names());
    editor.set_helper(Some(helper));
    editor.bind_sequence(KeyEvent::from('?'), Cmd::Complete);

    loop {
        if !context.running {
            break;
        }
        let prompt = context.prompt();
        let line = editor.readline(&prompt);

        match line {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }

                editor.add_history_entry(trimmed).ok();

                match handle_line(context, trimmed) {
                    Ok(LoopControl::Continue) => {}
                    Ok(LoopControl::Exit) => break,
                    Err(err) => context.report_error(err)?,
                }
            }
            Err(ReadlineError::Interrupted) => {
                if context.confirm_exit()? {
                    break;
                }
            }
            Err(ReadlineError::Eof) => {
                output::info("Bye.");
                break;
            }
            Err(err) => return Err(err.into()),
        }
    }

    Ok(())
}

fn run_script(context: &mut ShellContext) -> Result<(), CliError> {
    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        if !context.running {
            break;
        }
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        match handle_line(context, trimmed) {
            Ok(LoopControl::Continue) => {}
            Ok(LoopControl::Exit) => break,
            Err(err) => context.report_error(err)?,
        }
    }
    Ok(())
}

fn handle_line(context: &mut ShellContext, line: &str) -> Result<LoopControl, CommandError> {
    let tokens = match parse_command_line(line) {
        Ok(tokens) => tokens,
        Err(err) => {
            output::warning(format!("Could not parse input: {}", err));
            return Ok(LoopControl::Continue);
        }
    };

    if tokens.is_empty() {
        return Ok(LoopControl::Continue);
    }

    let raw = &tokens[0];
    let command = raw.to_lowercase();
    let args: Vec<&str> = tokens.iter().skip(1).map(String::as_str).collect();

    match context.dispatch(&command, raw, &args) {
        Ok(LoopControl::Exit) => {
            context.running = false;
            Ok(LoopControl::Exit)
        }
        other => other,
    }
}

struct CommandHelper {
    commands: Vec<&'static str>,
}

impl CommandHelper {
    fn new(mut commands: Vec<&'static str>) -> Self {
        commands.sort_unstable();
        commands.dedup();
        Self { commands }
    }

    /// Words offered after `command`; meal types for `log`/`plan`.
    fn arguments_for(command: &str) -> Vec<&'static str> {
        match command {
            "log" | "plan" => MealType::ALL.iter().map(MealType::as_str).collect(),
            "close" => vec!["previous"],
            "borrow" => vec!["apply"],
            "config" => vec!["show", "set"],
            _ => Vec::new(),
        }
    }
}

impl Helper for CommandHelper {}

impl Completer for CommandHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &ReadlineContext<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let before = &line[..pos];
        let start = before.rfind(' ').map_or(0, |idx| idx + 1);
        let needle = before[start..].to_ascii_lowercase();
        let words: Vec<&str> = before[..start].split_whitespace().collect();

        let pool = match words.as_slice() {
            [] => self.commands.clone(),
            [command] => Self::arguments_for(&command.to_ascii_lowercase()),
            _ => Vec::new(),
        };
        let candidates = pool
            .into_iter()
            .filter(|word| word.starts_with(&needle))
            .map(|word| Pair {
                display: word.to_string(),
                replacement: word.to_string(),
            })
            .collect();
        Ok((start, candidates))
    }
}

impl Hinter for CommandHelper {
    type Hint = String;
}

impl Highlighter for CommandHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        Cow::Borrowed(line)
    }
}

impl Validator for CommandHelper {
    fn validate(&self, _ctx: &mut ValidationContext) -> rustyline::Result<ValidationResult> {
        Ok(ValidationResult::Valid(None))
    }
}

pub(crate) fn parse_command_line(input: &str) -> Result<Vec<String>, shell_words::ParseError> {
    split(input)
}

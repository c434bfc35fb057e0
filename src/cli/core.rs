use std::{env, io, sync::Arc};

use chrono::{DateTime, Utc};
use dialoguer::theme::ColorfulTheme;
use strsim::levenshtein;
use thiserror::Error;

use crate::{
    config::{Config, ConfigManager},
    core::{
        utils::{data_dir_in, legacy_snapshot_in},
        Clock, FixedClock, MealBook, SystemClock,
    },
    errors::LedgerError,
    ledger::format_range,
    storage::{migrate_legacy_snapshot, JsonStore, MigrationOutcome},
};

use super::{commands, io as cli_io, registry::CommandRegistry};

/// Environment variable that switches the shell into script mode.
pub const SCRIPT_ENV: &str = "MEALBANK_CLI_SCRIPT";
/// Pins the shell clock to an RFC 3339 instant.
pub const NOW_ENV: &str = "MEALBANK_NOW";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliMode {
    Interactive,
    Script,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LoopControl {
    Continue,
    Exit,
}

pub type CommandResult = Result<(), CommandError>;

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("{0}")]
    InvalidArguments(String),
    #[error("{0}")]
    Message(String),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Core(#[from] LedgerError),
    #[error(transparent)]
    Dialoguer(#[from] dialoguer::Error),
    #[error("exit requested")]
    ExitRequested,
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] LedgerError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Readline(#[from] rustyline::error::ReadlineError),
    #[error(transparent)]
    Dialoguer(#[from] dialoguer::Error),
    #[error("Invalid input: {0}")]
    Input(String),
}

pub struct ShellContext {
    pub mode: CliMode,
    pub registry: CommandRegistry,
    pub theme: ColorfulTheme,
    pub book: MealBook,
    pub store: Arc<JsonStore>,
    pub config_manager: ConfigManager,
    pub config: Config,
    pub running: bool,
}

impl ShellContext {
    pub fn new(mode: CliMode) -> Result<Self, CliError> {
        let config_manager = ConfigManager::new()?;
        Self::with_config_manager(mode, config_manager)
    }

    pub fn with_config_manager(
        mode: CliMode,
        config_manager: ConfigManager,
    ) -> Result<Self, CliError> {
        let mut registry = CommandRegistry::new();
        commands::register_all(&mut registry);

        let config = config_manager.load()?;
        let settings = config.book_settings()?;
        let base = config_manager.base_dir().to_path_buf();
        let store = Arc::new(
            JsonStore::new(data_dir_in(&base), Some(config.backup_retention))?
                .with_initial_meta(settings.initial_meta()),
        );

        let legacy = config
            .legacy_snapshot
            .clone()
            .unwrap_or_else(|| legacy_snapshot_in(&base));
        if let MigrationOutcome::Migrated { meals } =
            migrate_legacy_snapshot(store.as_ref(), &legacy)?
        {
            cli_io::print_info(format!("Imported {} meals from {}.", meals, legacy.display()));
        }

        let book = MealBook::new(Box::new(store.clone()), clock_from_env()?, settings);

        Ok(Self {
            mode,
            registry,
            theme: ColorfulTheme::default(),
            book,
            store,
            config_manager,
            config,
            running: true,
        })
    }

    pub(crate) fn prompt(&self) -> String {
        match self.book.current_cycle() {
            Ok(cycle) => format!(
                "mealbank [{}]> ",
                format_range(&cycle, self.book.settings().tz)
            ),
            Err(_) => "mealbank> ".to_string(),
        }
    }

    pub(crate) fn command_names(&self) -> Vec<&'static str> {
        self.registry.names().collect()
    }

    pub(crate) fn dispatch(
        &mut self,
        command: &str,
        raw: &str,
        args: &[&str],
    ) -> Result<LoopControl, CommandError> {
        if let Some(handler) = self.registry.handler(command) {
            match handler(self, args) {
                Ok(()) => Ok(LoopControl::Continue),
                Err(CommandError::ExitRequested) => Ok(LoopControl::Exit),
                Err(err) => Err(err),
            }
        } else {
            self.suggest_command(raw);
            Ok(LoopControl::Continue)
        }
    }

    pub(crate) fn suggest_command(&self, input: &str) {
        cli_io::print_warning(format!(
            "Unknown command `{}`. Type `help` to see available commands.",
            input
        ));

        let best = self
            .registry
            .names()
            .map(|name| (levenshtein(name, &input.to_lowercase()), name))
            .min_by_key(|(distance, _)| *distance);
        if let Some((distance, name)) = best {
            if distance <= 3 {
                cli_io::print_info(format!("Did you mean `{}`?", name));
            }
        }
    }

    /// Destructive commands ask first; script mode assumes yes.
    pub(crate) fn confirm(&self, prompt: &str) -> Result<bool, CommandError> {
        if self.mode == CliMode::Script {
            return Ok(true);
        }
        cli_io::confirm_action(&self.theme, prompt, false)
    }

    pub(crate) fn confirm_exit(&self) -> Result<bool, CliError> {
        if self.mode == CliMode::Script {
            return Ok(true);
        }
        cli_io::confirm_action(&self.theme, "Exit shell?", true).map_err(|err| match err {
            CommandError::Dialoguer(err) => CliError::Dialoguer(err),
            other => CliError::Input(other.to_string()),
        })
    }

    pub(crate) fn report_error(&self, err: CommandError) -> Result<(), CliError> {
        match err {
            CommandError::ExitRequested => Ok(()),
            CommandError::InvalidArguments(message) => {
                cli_io::print_error(message);
                cli_io::print_hint("Use `help <command>` for usage details.");
                Ok(())
            }
            CommandError::Core(LedgerError::CycleAlreadyBanked(day)) => {
                cli_io::print_error(format!("The cycle starting {} was already closed.", day));
                Ok(())
            }
            CommandError::Core(LedgerError::BorrowAlreadyApplied(day)) => {
                cli_io::print_error(format!(
                    "The borrow for the cycle starting {} was already applied.",
                    day
                ));
                Ok(())
            }
            other => {
                cli_io::print_error(other.to_string());
                Ok(())
            }
        }
    }

    /// Re-applies book settings after the configuration changed.
    pub(crate) fn apply_config(&mut self, config: Config) -> CommandResult {
        let settings = config.book_settings()?;
        self.config_manager.save(&config)?;
        *self.book.settings_mut() = settings;
        self.config = config;
        Ok(())
    }
}

fn clock_from_env() -> Result<Arc<dyn Clock>, CliError> {
    match env::var(NOW_ENV) {
        Ok(raw) => {
            let now = DateTime::parse_from_rfc3339(raw.trim())
                .map_err(|err| CliError::Input(format!("{}: {}", NOW_ENV, err)))?
                .with_timezone(&Utc);
            Ok(Arc::new(FixedClock::new(now)))
        }
        Err(_) => Ok(Arc::new(SystemClock)),
    }
}

impl From<CliError> for CommandError {
    fn from(err: CliError) -> Self {
        match err {
            CliError::Core(err) => CommandError::Core(err),
            CliError::Io(err) => CommandError::Io(err),
            CliError::Dialoguer(err) => CommandError::Dialoguer(err),
            other => CommandError::Message(other.to_string()),
        }
    }
}

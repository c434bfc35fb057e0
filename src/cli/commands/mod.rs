pub mod cycle;
pub mod data;
pub mod meals;
pub mod settings;
pub mod system;

use chrono::{DateTime, NaiveDate, Utc};

use crate::ledger::parse_anchor;

use super::core::CommandError;
use super::registry::CommandRegistry;

pub(crate) fn register_all(registry: &mut CommandRegistry) {
    let groups = [
        cycle::definitions(),
        meals::definitions(),
        settings::definitions(),
        data::definitions(),
        system::definitions(),
    ];
    for entry in groups.into_iter().flatten() {
        registry.register(entry);
    }
}

pub(crate) fn usage_error(usage: &str) -> CommandError {
    CommandError::InvalidArguments(format!("usage: {}", usage))
}

pub(crate) fn parse_day(raw: &str) -> Result<NaiveDate, CommandError> {
    parse_anchor(raw).map_err(CommandError::from)
}

/// Accepts RFC 3339 or `YYYY-MM-DDTHH:MM` read as UTC.
pub(crate) fn parse_instant(raw: &str) -> Result<DateTime<Utc>, CommandError> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed.with_timezone(&Utc));
    }
    chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M")
        .map(|naive| naive.and_utc())
        .map_err(|_| {
            CommandError::InvalidArguments(format!(
                "`{}` is not a timestamp (expected e.g. 2025-01-03T12:30:00Z)",
                raw
            ))
        })
}

pub(crate) fn parse_count(raw: &str, what: &str) -> Result<u32, CommandError> {
    raw.parse().map_err(|_| {
        CommandError::InvalidArguments(format!("{} must be a whole number, got `{}`", what, raw))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn instants_accept_offsets_and_bare_minutes() {
        let expected = Utc.with_ymd_and_hms(2025, 1, 3, 11, 30, 0).unwrap();
        assert_eq!(parse_instant("2025-01-03T12:30:00+01:00").unwrap(), expected);
        assert_eq!(parse_instant("2025-01-03T11:30").unwrap(), expected);
        assert!(parse_instant("yesterday").is_err());
    }

    #[test]
    fn counts_reject_negative_values() {
        assert_eq!(parse_count("9", "vegan").unwrap(), 9);
        assert!(matches!(
            parse_count("-1", "vegan"),
            Err(CommandError::InvalidArguments(_))
        ));
    }
}

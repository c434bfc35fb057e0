use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{LedgerError, Result};
use crate::ledger::AppState;

/// Export file layout: `{ "exportedAt": …, "data": { goals, bank, anchorISO, meals } }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportEnvelope {
    pub exported_at: DateTime<Utc>,
    pub data: AppState,
}

pub fn export_json(state: &AppState, exported_at: DateTime<Utc>) -> Result<String> {
    let envelope = ExportEnvelope {
        exported_at,
        data: state.clone(),
    };
    Ok(serde_json::to_string_pretty(&envelope)?)
}

/// Reads an export envelope, or a bare `data` object, into a validated state.
pub fn parse_import(json: &str) -> Result<AppState> {
    let value: Value = serde_json::from_str(json)
        .map_err(|err| LedgerError::InvalidPayload(format!("not valid JSON: {}", err)))?;
    let data = match value {
        Value::Object(mut map) => match map.remove("data") {
            Some(inner) => inner,
            None => Value::Object(map),
        },
        _ => {
            return Err(LedgerError::InvalidPayload(
                "expected a JSON object".to_string(),
            ))
        }
    };
    let state: AppState =
        serde_json::from_value(data).map_err(|err| LedgerError::InvalidPayload(err.to_string()))?;
    state.validate()?;
    Ok(state)
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::navigation::GameState;
use crate::error::SaveError;

/// Serializable save record, keyed by the sheet it belongs to.
///
/// Flags travel as a list; their set-ness is rebuilt on load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveData {
    pub sheet_id: String,
    pub current_node_id: String,
    pub flags: Vec<String>,
    pub history: Vec<String>,
    pub saved_at: DateTime<Utc>,
}

impl SaveData {
    /// Snapshot a game state. Flags are sorted so the same state always
    /// produces the same record.
    pub fn capture(sheet_id: &str, state: &GameState, saved_at: DateTime<Utc>) -> Self {
        let mut flags: Vec<String> = state.flags.iter().cloned().collect();
        flags.sort();
        Self {
            sheet_id: sheet_id.to_string(),
            current_node_id: state.current_node_id.clone(),
            flags,
            history: state.history.clone(),
            saved_at,
        }
    }

    pub fn to_state(&self) -> GameState {
        GameState {
            current_node_id: self.current_node_id.clone(),
            flags: self.flags.iter().cloned().collect(),
            history: self.history.clone(),
        }
    }

    pub fn to_json(&self) -> Result<String, SaveError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(input: &str) -> Result<Self, SaveError> {
        Ok(serde_json::from_str(input)?)
    }

    /// Parse an exported save and check that it belongs to `expected_sheet`.
    pub fn import(input: &str, expected_sheet: &str) -> Result<Self, SaveError> {
        let save = Self::from_json(input)?;
        if save.sheet_id != expected_sheet {
            return Err(SaveError::SheetMismatch {
                expected: expected_sheet.to_string(),
                found: save.sheet_id,
            });
        }
        Ok(save)
    }
}

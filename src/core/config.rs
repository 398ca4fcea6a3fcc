/// Player configuration, loaded from RON.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::ConfigError;

/// How a blank-labelled choice is treated when it is not the only one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum UnlabeledChoicePolicy {
    /// Offer it as an ordinary button with an empty label. Auto-advance
    /// happens only when the filtered list is exactly one unlabeled choice.
    #[default]
    BlankLabel,
    /// The first unlabeled choice becomes the Continue affordance and the
    /// labelled ones are dropped.
    AutoAdvance,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Length of each half of a fade, in milliseconds.
    pub fade_duration_ms: u64,
    /// Time the screen stays fully black, in milliseconds.
    pub fade_hold_ms: u64,
    /// Prefix for short asset names in media cells.
    pub asset_base_url: Option<String>,
    /// Identifies the story in save records.
    pub sheet_id: String,
    pub continue_label: String,
    pub unlabeled_choices: UnlabeledChoicePolicy,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            fade_duration_ms: 600,
            fade_hold_ms: 50,
            asset_base_url: None,
            sheet_id: "local".to_string(),
            continue_label: "Continue".to_string(),
            unlabeled_choices: UnlabeledChoicePolicy::BlankLabel,
        }
    }
}

impl PlayerConfig {
    /// Load a config from a RON file.
    pub fn load_from_ron(path: &Path) -> Result<PlayerConfig, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    /// Parse and validate a config from a RON string.
    pub fn parse_ron(input: &str) -> Result<PlayerConfig, ConfigError> {
        let config: PlayerConfig = ron::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fade_duration_ms == 0 {
            return Err(ConfigError::Invalid(
                "fade_duration_ms must be greater than zero".to_string(),
            ));
        }
        if self.fade_hold_ms >= self.fade_duration_ms {
            return Err(ConfigError::Invalid(format!(
                "fade_hold_ms ({}) must be shorter than fade_duration_ms ({})",
                self.fade_hold_ms, self.fade_duration_ms
            )));
        }
        if self.sheet_id.trim().is_empty() {
            return Err(ConfigError::Invalid("sheet_id must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn fade_duration(&self) -> Duration {
        Duration::from_millis(self.fade_duration_ms)
    }

    pub fn fade_hold(&self) -> Duration {
        Duration::from_millis(self.fade_hold_ms)
    }

    pub fn asset_base(&self) -> Option<&str> {
        self.asset_base_url.as_deref()
    }
}

/// Error types shared across the loader, configuration, and save layers.
use thiserror::Error;

/// A spreadsheet could not be turned into a playable story.
///
/// Any of these aborts the whole load; no partial graph is exposed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SheetError {
    #[error("story sheet must have a header row and at least one data row")]
    MissingStoryRows,
    #[error("story sheet has no playable rows")]
    EmptyStory,
    #[error("metadata sheet must include a \"title\" key")]
    MissingTitle,
    #[error("start node '{0}' does not exist in the story sheet")]
    UnknownStartNode(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("invalid player config: {0}")]
    Invalid(String),
}

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("save JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("save file is for a different game (expected '{expected}', found '{found}')")]
    SheetMismatch { expected: String, found: String },
    #[error("save store error: {0}")]
    Store(String),
    #[error("saved node '{0}' does not exist in this story")]
    UnknownNode(String),
}

#[derive(Debug, Error)]
pub enum PlayerError {
    #[error("sheet error: {0}")]
    Sheet(#[from] SheetError),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("save error: {0}")]
    Save(#[from] SaveError),
    #[error("no story was given to the player")]
    MissingStory,
}

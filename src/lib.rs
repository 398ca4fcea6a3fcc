//! Storysheet: a spreadsheet-driven story graph engine.
//!
//! Two exported spreadsheet tabs (story rows and game metadata) become an
//! immutable node graph. A play session walks that graph on player input,
//! gates choices on accumulated flags, sequences fade transitions against
//! the moment the current node changes, and snapshots progress for saving.

pub mod core;
pub mod error;
pub mod schema;

pub use crate::core::config::PlayerConfig;
pub use crate::core::graph::{StoryBook, StoryGraph};
pub use crate::core::player::{ChoiceOutcome, StoryPlayer};
pub use crate::error::PlayerError;

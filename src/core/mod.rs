pub mod config;
pub mod filter;
pub mod graph;
pub mod metadata_sheet;
pub mod navigation;
pub mod observer;
pub mod persistence;
pub mod player;
pub mod stage;
pub mod story_sheet;
pub mod tabular;
pub mod transition;

pub mod media;
pub mod metadata;
pub mod node;
pub mod save;

use serde::{Deserialize, Serialize};

/// Game-level metadata from the metadata tab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub title: String,
    pub author: Option<String>,
    pub description: Option<String>,
    /// Entry point of the graph. May be absent in the sheet; the book loader
    /// fills it in with the first story node.
    pub start_node: Option<String>,
    /// Credits text (Markdown).
    pub credits: Option<String>,
    /// About text (Markdown).
    pub about: Option<String>,
    pub theme: Option<String>,
    pub version: Option<String>,
}

/// A metadata field recognized by the sheet mapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetadataField {
    Title,
    Author,
    Description,
    StartNode,
    Credits,
    About,
    Theme,
    Version,
}

/// Header aliases, lowercase. Matching is case-insensitive on trimmed text.
const ALIASES: &[(MetadataField, &[&str])] = &[
    (MetadataField::Title, &["title", "game title", "game_title", "name", "game name"]),
    (MetadataField::Author, &["author", "authors", "by", "creator"]),
    (MetadataField::Description, &["description", "tagline", "summary", "blurb"]),
    (
        MetadataField::StartNode,
        &["start_node", "startnode", "start node", "start", "first node"],
    ),
    (MetadataField::Credits, &["credits"]),
    (MetadataField::About, &["about"]),
    (MetadataField::Theme, &["theme"]),
    (MetadataField::Version, &["version", "game version"]),
];

impl MetadataField {
    /// Look up a header or key against the alias table.
    pub fn from_alias(label: &str) -> Option<Self> {
        let label = label.trim().to_lowercase();
        ALIASES
            .iter()
            .find(|(_, names)| names.contains(&label.as_str()))
            .map(|(field, _)| *field)
    }
}

impl Metadata {
    /// Store a value under `field`. Empty values are ignored.
    pub fn set(&mut self, field: MetadataField, value: String) {
        if value.is_empty() {
            return;
        }
        match field {
            MetadataField::Title => self.title = value,
            MetadataField::Author => self.author = Some(value),
            MetadataField::Description => self.description = Some(value),
            MetadataField::StartNode => self.start_node = Some(value),
            MetadataField::Credits => self.credits = Some(value),
            MetadataField::About => self.about = Some(value),
            MetadataField::Theme => self.theme = Some(value),
            MetadataField::Version => self.version = Some(value),
        }
    }
}

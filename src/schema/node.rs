use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

/// Node identifiers are the literal strings from the story tab's first column.
pub type NodeId = String;

/// Visual style for a choice button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ChoiceStyle {
    #[default]
    None,
    Danger,
    Subtle,
}

impl ChoiceStyle {
    /// Parse a style cell. Anything other than `danger` or `subtle` is "no style".
    pub fn from_cell(cell: &str) -> Self {
        match cell {
            "danger" => Self::Danger,
            "subtle" => Self::Subtle,
            _ => Self::None,
        }
    }
}

/// Which character slot the active speaker occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpeakerPosition {
    Left,
    Center,
    Right,
}

impl SpeakerPosition {
    /// Case-insensitive match; unrecognized values are unset.
    pub fn from_cell(cell: &str) -> Option<Self> {
        match cell.trim().to_lowercase().as_str() {
            "left" => Some(Self::Left),
            "center" => Some(Self::Center),
            "right" => Some(Self::Right),
            _ => None,
        }
    }
}

/// How the player arrives at a node.
///
/// Dispatched exactly once, when a choice targeting the node is resolved:
/// `Cut` and `Checkpoint` navigate immediately, only `Fade` runs the
/// transition sequencer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Transition {
    #[default]
    Cut,
    Fade,
    Checkpoint,
}

impl Transition {
    /// Case-insensitive match; unrecognized or empty values fall back to `Cut`.
    pub fn from_cell(cell: &str) -> Self {
        match cell.trim().to_lowercase().as_str() {
            "fade" => Self::Fade,
            "checkpoint" => Self::Checkpoint,
            _ => Self::Cut,
        }
    }

    /// Whether arriving at a node with this transition triggers an autosave.
    pub fn autosaves(&self) -> bool {
        matches!(self, Self::Fade | Self::Checkpoint)
    }
}

/// One outgoing edge of a story node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    /// Button label. Empty means "auto-advance" when it is the only choice.
    pub text: String,
    pub target: NodeId,
    #[serde(default)]
    pub style: ChoiceStyle,
}

impl Choice {
    pub fn is_unlabeled(&self) -> bool {
        self.text.is_empty()
    }
}

/// A single beat of narrative content plus its outgoing edges.
///
/// Built once while a story sheet is mapped and never mutated afterwards.
/// Media fields keep the raw cell text; see [`crate::schema::media::MediaCue`]
/// for how they are interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryNode {
    pub node_id: NodeId,
    pub speaker: Option<String>,
    pub text: String,
    pub speaker_position: Option<SpeakerPosition>,
    pub speaker_image: Option<String>,
    pub left_image: Option<String>,
    pub center_image: Option<String>,
    pub right_image: Option<String>,
    pub bg_image: Option<String>,
    #[serde(default)]
    pub transition: Transition,
    /// Zero choices marks an ending node.
    pub choices: Vec<Choice>,
    pub music: Option<String>,
    pub sound_effect: Option<String>,
    /// Flags granted on arrival. `None` when the cell was empty.
    pub set_flag: Option<Vec<String>>,
    /// Flags needed to be offered this node as a choice target.
    /// `None` means "no requirement".
    pub require_flag: Option<Vec<String>>,
}

impl StoryNode {
    /// A minimal node with text and no media; handy for building graphs in code.
    pub fn new(node_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            node_id: node_id.into(),
            speaker: None,
            text: text.into(),
            speaker_position: None,
            speaker_image: None,
            left_image: None,
            center_image: None,
            right_image: None,
            bg_image: None,
            transition: Transition::Cut,
            choices: Vec::new(),
            music: None,
            sound_effect: None,
            set_flag: None,
            require_flag: None,
        }
    }

    pub fn is_ending(&self) -> bool {
        self.choices.is_empty()
    }

    /// Exactly one choice and it has no label.
    pub fn is_auto_advance(&self) -> bool {
        self.choices.len() == 1 && self.choices[0].is_unlabeled()
    }

    /// Flags this node grants, empty if none.
    pub fn granted_flags(&self) -> &[String] {
        self.set_flag.as_deref().unwrap_or(&[])
    }

    /// Flags this node requires, empty if none.
    pub fn required_flags(&self) -> &[String] {
        self.require_flag.as_deref().unwrap_or(&[])
    }

    /// Returns true if `flags` satisfies this node's requirement.
    pub fn is_unlocked_by(&self, flags: &FxHashSet<String>) -> bool {
        self.required_flags().iter().all(|flag| flags.contains(flag))
    }

    /// Narrative text ready for display.
    ///
    /// Sheets sometimes store a literal backslash-n instead of a line break.
    pub fn display_text(&self) -> String {
        self.text.replace("\\n", "\n").trim().to_string()
    }
}

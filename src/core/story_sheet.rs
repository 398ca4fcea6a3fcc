/// Story tab mapping: fixed 26-column rows into story nodes.
///
/// Columns are positional (A through Z). Header text is ignored; a sheet
/// author can rename headers freely as long as the order is kept.

use crate::core::tabular::Row;
use crate::error::SheetError;
use crate::schema::node::{Choice, ChoiceStyle, SpeakerPosition, StoryNode, Transition};

/// Column indices of the story schema.
pub mod columns {
    pub const NODE_ID: usize = 0; // A
    pub const SPEAKER: usize = 1; // B
    pub const TEXT: usize = 2; // C
    pub const SPEAKER_POSITION: usize = 3; // D
    pub const SPEAKER_IMAGE: usize = 4; // E
    pub const LEFT_IMAGE: usize = 5; // F
    pub const CENTER_IMAGE: usize = 6; // G
    pub const RIGHT_IMAGE: usize = 7; // H
    pub const BG_IMAGE: usize = 8; // I
    pub const TRANSITION: usize = 9; // J
    /// First of four (text, target, style) groups, K through V.
    pub const FIRST_CHOICE: usize = 10;
    pub const CHOICE_GROUPS: usize = 4;
    pub const CHOICE_WIDTH: usize = 3;
    pub const MUSIC: usize = 22; // W
    pub const SOUND_EFFECT: usize = 23; // X
    pub const SET_FLAG: usize = 24; // Y
    pub const REQUIRE_FLAG: usize = 25; // Z

    pub const COUNT: usize = 26;
}

/// Header labels, in column order. Used when writing sheets.
pub const HEADERS: [&str; columns::COUNT] = [
    "node_id",
    "speaker",
    "text",
    "speaker_position",
    "speaker_image",
    "left_image",
    "center_image",
    "right_image",
    "bg_image",
    "transition",
    "choice_1_text",
    "choice_1_target",
    "choice_1_style",
    "choice_2_text",
    "choice_2_target",
    "choice_2_style",
    "choice_3_text",
    "choice_3_target",
    "choice_3_style",
    "choice_4_text",
    "choice_4_target",
    "choice_4_style",
    "music",
    "sound_effect",
    "set_flag",
    "require_flag",
];

/// Map story rows to nodes. The first row is the header.
///
/// Rows with an empty node id, or with neither text nor a first choice
/// target, are skipped without error.
pub fn map_story_rows(rows: &[Row]) -> Result<Vec<StoryNode>, SheetError> {
    if rows.len() < 2 {
        return Err(SheetError::MissingStoryRows);
    }

    Ok(rows[1..].iter().filter_map(map_row).collect())
}

fn cell(row: &Row, index: usize) -> &str {
    row.get(index).map(String::as_str).unwrap_or("")
}

fn optional(row: &Row, index: usize) -> Option<String> {
    let value = cell(row, index);
    (!value.is_empty()).then(|| value.to_string())
}

fn map_row(row: &Row) -> Option<StoryNode> {
    let node_id = cell(row, columns::NODE_ID);
    if node_id.is_empty() {
        return None;
    }

    let text = cell(row, columns::TEXT);
    if text.is_empty() && cell(row, columns::FIRST_CHOICE + 1).is_empty() {
        return None;
    }

    let choices = (0..columns::CHOICE_GROUPS)
        .filter_map(|group| parse_choice(row, columns::FIRST_CHOICE + group * columns::CHOICE_WIDTH))
        .collect();

    Some(StoryNode {
        node_id: node_id.to_string(),
        speaker: optional(row, columns::SPEAKER),
        text: text.to_string(),
        speaker_position: SpeakerPosition::from_cell(cell(row, columns::SPEAKER_POSITION)),
        speaker_image: optional(row, columns::SPEAKER_IMAGE),
        left_image: optional(row, columns::LEFT_IMAGE),
        center_image: optional(row, columns::CENTER_IMAGE),
        right_image: optional(row, columns::RIGHT_IMAGE),
        bg_image: optional(row, columns::BG_IMAGE),
        transition: Transition::from_cell(cell(row, columns::TRANSITION)),
        choices,
        music: optional(row, columns::MUSIC),
        sound_effect: optional(row, columns::SOUND_EFFECT),
        set_flag: parse_flags(cell(row, columns::SET_FLAG)),
        require_flag: parse_flags(cell(row, columns::REQUIRE_FLAG)),
    })
}

/// A choice group yields a choice only when its target cell is filled.
fn parse_choice(row: &Row, first: usize) -> Option<Choice> {
    let target = cell(row, first + 1);
    if target.is_empty() {
        return None;
    }
    Some(Choice {
        text: cell(row, first).to_string(),
        target: target.to_string(),
        style: ChoiceStyle::from_cell(cell(row, first + 2)),
    })
}

/// Split a comma-separated flag cell. An empty cell is `None` rather than
/// an empty list, so "no requirement" stays distinct.
pub fn parse_flags(value: &str) -> Option<Vec<String>> {
    if value.is_empty() {
        return None;
    }
    Some(
        value
            .split(',')
            .map(str::trim)
            .filter(|flag| !flag.is_empty())
            .map(str::to_string)
            .collect(),
    )
}

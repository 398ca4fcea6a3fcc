/// Persistent presentation state: background, character slots, music.
///
/// Media cells follow persistence by omission: an empty cell keeps what is
/// on screen, `clear`/`none` removes it, anything else replaces it.

use serde::Serialize;

use crate::schema::media::{resolve_asset_url, MediaCue};
use crate::schema::node::{SpeakerPosition, StoryNode};

/// What the audio collaborator should do with background music.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "command", content = "src", rename_all = "lowercase")]
pub enum MusicCommand {
    Play(String),
    Stop,
}

/// Side effects produced by entering one node.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StageUpdate {
    pub music: Option<MusicCommand>,
    /// One-shot, resolved URL.
    pub sound_effect: Option<String>,
    pub scene_changed: bool,
}

impl StageUpdate {
    /// Combine with an update that happened after this one.
    pub fn then(self, next: StageUpdate) -> StageUpdate {
        StageUpdate {
            music: next.music.or(self.music),
            sound_effect: next.sound_effect.or(self.sound_effect),
            scene_changed: self.scene_changed || next.scene_changed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stage {
    background: Option<String>,
    left: Option<String>,
    center: Option<String>,
    right: Option<String>,
    music: Option<String>,
    /// Scene-generation counter. Bumped whenever the background changes.
    scene: u64,
}

impl Stage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn background(&self) -> Option<&str> {
        self.background.as_deref()
    }

    pub fn slot(&self, position: SpeakerPosition) -> Option<&str> {
        match position {
            SpeakerPosition::Left => self.left.as_deref(),
            SpeakerPosition::Center => self.center.as_deref(),
            SpeakerPosition::Right => self.right.as_deref(),
        }
    }

    /// Track currently playing, if any.
    pub fn music(&self) -> Option<&str> {
        self.music.as_deref()
    }

    pub fn scene(&self) -> u64 {
        self.scene
    }

    /// Apply one node's media cells on top of the current stage.
    pub fn enter(&mut self, node: &StoryNode, asset_base: Option<&str>) -> StageUpdate {
        let mut update = StageUpdate::default();

        let background = match MediaCue::parse(node.bg_image.as_deref()) {
            MediaCue::Asset(value) => Some(Some(resolve_asset_url(asset_base, &value))),
            MediaCue::Clear => Some(None),
            MediaCue::Keep | MediaCue::Stop => None,
        };
        if let Some(background) = background {
            if background != self.background {
                self.scene += 1;
                self.left = None;
                self.center = None;
                self.right = None;
                update.scene_changed = true;
            }
            self.background = background;
        }

        for position in [
            SpeakerPosition::Left,
            SpeakerPosition::Center,
            SpeakerPosition::Right,
        ] {
            let cell = slot_cell(node, position);
            let cue = MediaCue::parse(cell);
            let slot = match position {
                SpeakerPosition::Left => &mut self.left,
                SpeakerPosition::Center => &mut self.center,
                SpeakerPosition::Right => &mut self.right,
            };
            match cue {
                MediaCue::Asset(value) => *slot = Some(resolve_asset_url(asset_base, &value)),
                MediaCue::Clear => *slot = None,
                MediaCue::Keep | MediaCue::Stop => {}
            }
        }

        update.music = match MediaCue::parse(node.music.as_deref()) {
            MediaCue::Asset(value) => {
                let src = resolve_asset_url(asset_base, &value);
                if self.music.as_deref() == Some(src.as_str()) {
                    None
                } else {
                    self.music = Some(src.clone());
                    Some(MusicCommand::Play(src))
                }
            }
            MediaCue::Stop | MediaCue::Clear => self.music.take().map(|_| MusicCommand::Stop),
            MediaCue::Keep => None,
        };

        update.sound_effect = match MediaCue::parse(node.sound_effect.as_deref()) {
            MediaCue::Asset(value) => Some(resolve_asset_url(asset_base, &value)),
            _ => None,
        };

        update
    }

    /// Clear everything for a new play-through. The scene counter keeps
    /// counting so listeners still see a change.
    pub fn reset(&mut self) -> StageUpdate {
        let music = self.music.take().map(|_| MusicCommand::Stop);
        let scene_changed = self.background.is_some()
            || self.left.is_some()
            || self.center.is_some()
            || self.right.is_some();
        let scene = if scene_changed { self.scene + 1 } else { self.scene };
        *self = Self {
            scene,
            ..Self::default()
        };
        StageUpdate {
            music,
            sound_effect: None,
            scene_changed,
        }
    }
}

/// The speaker image wins over the plain slot image in the speaker's slot.
fn slot_cell(node: &StoryNode, position: SpeakerPosition) -> Option<&str> {
    if node.speaker_position == Some(position) {
        if let Some(image) = node.speaker_image.as_deref().filter(|s| !s.is_empty()) {
            return Some(image);
        }
    }
    match position {
        SpeakerPosition::Left => node.left_image.as_deref(),
        SpeakerPosition::Center => node.center_image.as_deref(),
        SpeakerPosition::Right => node.right_image.as_deref(),
    }
}

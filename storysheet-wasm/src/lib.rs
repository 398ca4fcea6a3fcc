//! WASM bindings for storysheet, driving a web front end.
//!
//! Everything crossing the boundary is JSON text. The host owns the clock
//! and passes elapsed milliseconds to `select` and `tick`.

use std::time::Duration;
use wasm_bindgen::prelude::*;

use storysheet::core::config::PlayerConfig;
use storysheet::core::filter::ChoicePrompt;
use storysheet::core::player::{ChoiceOutcome, StoryPlayer};
use storysheet::core::stage::{Stage, StageUpdate};
use storysheet::core::transition::FadePhase;
use storysheet::schema::node::SpeakerPosition;

// ---------------------------------------------------------------------------
// JSON shapes sent to the host
// ---------------------------------------------------------------------------
#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct NodeView<'a> {
    node_id: &'a str,
    speaker: Option<&'a str>,
    speaker_position: Option<SpeakerPosition>,
    text: String,
    prompt: ChoicePrompt,
    continue_label: &'a str,
    stage: &'a Stage,
    phase: FadePhase,
    overlay_opacity: f32,
    flags: Vec<String>,
}

#[derive(serde::Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
enum OutcomeView {
    Navigated {
        update: StageUpdate,
        autosaved: bool,
    },
    FadeStarted { deadline_ms: Option<u64> },
    Ignored,
    NoSuchChoice,
    DanglingTarget,
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct TickView {
    phase: FadePhase,
    overlay_opacity: f32,
    animated: bool,
    deadline_ms: Option<u64>,
    update: Option<StageUpdate>,
    autosaved: bool,
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, JsError> {
    serde_json::to_string(value).map_err(|e| JsError::new(&format!("JSON error: {e}")))
}

fn millis(now_ms: f64) -> Duration {
    Duration::from_millis(now_ms.max(0.0) as u64)
}

fn deadline_ms(deadline: Option<Duration>) -> Option<u64> {
    deadline.map(|d| d.as_millis() as u64)
}

#[wasm_bindgen]
pub struct WebPlayer {
    player: StoryPlayer,
}

impl WebPlayer {
    /// Whether the node just entered wrote an autosave. Tells the host
    /// when to copy `saved_json` out.
    fn arrived_at_save_point(&self) -> bool {
        self.player
            .current_node()
            .is_some_and(|node| node.transition.autosaves())
            && self.player.has_save()
    }
}

#[wasm_bindgen]
impl WebPlayer {
    /// Build a player from the two exported tabs and an optional RON
    /// config (empty string for defaults).
    #[wasm_bindgen(constructor)]
    pub fn new(story_csv: &str, metadata_csv: &str, config_ron: &str) -> Result<WebPlayer, JsError> {
        let config = if config_ron.trim().is_empty() {
            PlayerConfig::default()
        } else {
            PlayerConfig::parse_ron(config_ron)
                .map_err(|e| JsError::new(&format!("Config error: {e}")))?
        };

        let player = StoryPlayer::builder()
            .with_sheets(story_csv, metadata_csv)
            .with_config(config)
            .build()
            .map_err(|e| JsError::new(&format!("Load error: {e}")))?;

        Ok(WebPlayer { player })
    }

    /// Start a new play-through. Returns the stage update as JSON.
    pub fn start(&mut self) -> Result<String, JsError> {
        let update = self.player.start();
        to_json(&update)
    }

    /// Resume from the in-memory save slot. Returns `null` when empty.
    pub fn continue_saved(&mut self) -> Result<String, JsError> {
        let update = self
            .player
            .continue_saved()
            .map_err(|e| JsError::new(&format!("Continue failed: {e}")))?;
        to_json(&update)
    }

    pub fn has_save(&self) -> bool {
        self.player.has_save()
    }

    pub fn restart(&mut self) -> Result<String, JsError> {
        let update = self.player.restart();
        to_json(&update)
    }

    /// Pick the `index`-th affordance of the current prompt.
    pub fn select(&mut self, index: usize, now_ms: f64) -> Result<String, JsError> {
        let view = match self.player.select(index, millis(now_ms)) {
            ChoiceOutcome::Navigated(update) => OutcomeView::Navigated {
                update,
                autosaved: self.arrived_at_save_point(),
            },
            ChoiceOutcome::FadeStarted => OutcomeView::FadeStarted {
                deadline_ms: deadline_ms(self.player.next_deadline()),
            },
            ChoiceOutcome::Ignored => OutcomeView::Ignored,
            ChoiceOutcome::NoSuchChoice => OutcomeView::NoSuchChoice,
            ChoiceOutcome::DanglingTarget => OutcomeView::DanglingTarget,
        };
        to_json(&view)
    }

    /// Advance the fade. Call again at `deadlineMs` while it is non-null.
    pub fn tick(&mut self, now_ms: f64) -> Result<String, JsError> {
        let update = self.player.tick(millis(now_ms));
        let phase = self.player.phase();
        let autosaved = update.is_some() && self.arrived_at_save_point();
        to_json(&TickView {
            phase,
            overlay_opacity: phase.opacity(),
            animated: phase.animates(),
            deadline_ms: deadline_ms(self.player.next_deadline()),
            update,
            autosaved,
        })
    }

    /// Current fade phase as its kebab-case name.
    pub fn phase(&self) -> Result<String, JsError> {
        to_json(&self.player.phase())
    }

    /// Everything needed to render the current node.
    pub fn view(&mut self) -> Result<String, JsError> {
        let prompt = self.player.prompt();
        let mut flags: Vec<String> = self.player.state().flags.iter().cloned().collect();
        flags.sort();

        let node = self
            .player
            .current_node()
            .ok_or_else(|| JsError::new("Current node is missing"))?;
        let phase = self.player.phase();
        to_json(&NodeView {
            node_id: &node.node_id,
            speaker: node.speaker.as_deref(),
            speaker_position: node.speaker_position,
            text: node.display_text(),
            prompt,
            continue_label: &self.player.config().continue_label,
            stage: self.player.stage(),
            phase,
            overlay_opacity: phase.opacity(),
            flags,
        })
    }

    pub fn metadata(&self) -> Result<String, JsError> {
        to_json(self.player.metadata())
    }

    /// The save slot as JSON, including fade and checkpoint autosaves.
    /// Hosts copy this into their own storage and hand it back through
    /// `import_save` after a reload. `undefined` when the slot is empty.
    pub fn saved_json(&self) -> Result<Option<String>, JsError> {
        self.player
            .saved_json()
            .map_err(|e| JsError::new(&format!("Save read failed: {e}")))
    }

    pub fn delete_save(&mut self) -> Result<(), JsError> {
        self.player
            .delete_save()
            .map_err(|e| JsError::new(&format!("Delete failed: {e}")))
    }

    pub fn export_save(&self) -> Result<String, JsError> {
        self.player
            .export_save()
            .map_err(|e| JsError::new(&format!("Export failed: {e}")))
    }

    /// Load a save exported earlier for this story and resume from it.
    pub fn import_save(&mut self, json: &str) -> Result<String, JsError> {
        let update = self
            .player
            .import_save(json)
            .map_err(|e| JsError::new(&format!("Import failed: {e}")))?;
        to_json(&update)
    }
}

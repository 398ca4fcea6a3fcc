/// Play session. Wires the story book, navigation, choice filter, fade
/// sequencer, stage, and save store together.
///
/// This is the only place a choice is resolved into a [`Transition`]:
/// `Fade` goes through the sequencer, `Cut` and `Checkpoint` navigate on the
/// spot. The player never reads a clock for timing; hosts pass elapsed time
/// to [`StoryPlayer::select`] and [`StoryPlayer::tick`].

use chrono::Utc;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::core::config::PlayerConfig;
use crate::core::filter::{filter_choices, ChoicePrompt};
use crate::core::graph::StoryBook;
use crate::core::navigation::{GameState, Navigator};
use crate::core::observer::{StoryEvent, StoryObserver, TracingObserver};
use crate::core::persistence::{MemorySaveStore, SaveStore};
use crate::core::stage::{Stage, StageUpdate};
use crate::core::transition::{FadePhase, FadeSequencer};
use crate::error::{PlayerError, SaveError};
use crate::schema::metadata::Metadata;
use crate::schema::node::{Choice, StoryNode, Transition};
use crate::schema::save::SaveData;

/// What happened to a selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChoiceOutcome {
    /// Cut or checkpoint: the current node already changed.
    Navigated(StageUpdate),
    /// The screen is fading out; the node switches on a later tick.
    FadeStarted,
    /// A fade is running and input is disabled.
    Ignored,
    /// No affordance at that index.
    NoSuchChoice,
    /// The choice points at a node that does not exist. Nothing happens.
    DanglingTarget,
}

/// The top-level play session. Built via `StoryPlayer::builder()`.
pub struct StoryPlayer {
    book: StoryBook,
    config: PlayerConfig,
    navigator: Navigator,
    sequencer: FadeSequencer,
    stage: Stage,
    observer: Box<dyn StoryObserver>,
    store: Box<dyn SaveStore>,
}

/// Builder for constructing a `StoryPlayer`.
pub struct StoryPlayerBuilder {
    book: Option<StoryBook>,
    sheets: Option<(String, String)>,
    config: Option<PlayerConfig>,
    config_path: Option<PathBuf>,
    observer: Option<Box<dyn StoryObserver>>,
    store: Option<Box<dyn SaveStore>>,
}

impl StoryPlayer {
    pub fn builder() -> StoryPlayerBuilder {
        StoryPlayerBuilder {
            book: None,
            sheets: None,
            config: None,
            config_path: None,
            observer: None,
            store: None,
        }
    }

    /// Begin a new play-through at the start node.
    pub fn start(&mut self) -> StageUpdate {
        self.cancel_transition();
        self.navigator.reset(self.book.start_node());
        let cleared = self.stage.reset();
        cleared.then(self.enter_current())
    }

    /// Abandon the current play-through and start over. The save slot is
    /// left alone.
    pub fn restart(&mut self) -> StageUpdate {
        self.start()
    }

    pub fn has_save(&self) -> bool {
        self.store.has_save(&self.config.sheet_id)
    }

    /// Resume from the save slot. `Ok(None)` when there is nothing saved.
    pub fn continue_saved(&mut self) -> Result<Option<StageUpdate>, PlayerError> {
        let Some(save) = self.store.load(&self.config.sheet_id)? else {
            return Ok(None);
        };
        self.resume(save.to_state()).map(Some)
    }

    /// Replace the whole story. Any running fade is dropped before the
    /// state is reset, so no stale phase fires against the new graph.
    pub fn load_book(&mut self, book: StoryBook) -> StageUpdate {
        self.cancel_transition();
        self.book = book;
        self.start()
    }

    /// Choices currently on offer, after flag filtering.
    pub fn visible_choices(&mut self) -> Vec<Choice> {
        let Some(node) = self.book.node(self.navigator.current_node_id()) else {
            return Vec::new();
        };
        filter_choices(
            &node.choices,
            &self.navigator.state().flags,
            self.book.graph(),
            self.observer.as_mut(),
        )
    }

    pub fn prompt(&mut self) -> ChoicePrompt {
        let choices = self.visible_choices();
        ChoicePrompt::classify(choices, self.config.unlabeled_choices)
    }

    /// Resolve the `index`-th affordance of the current prompt.
    pub fn select(&mut self, index: usize, now: Duration) -> ChoiceOutcome {
        if !self.sequencer.is_idle() {
            let phase = self.sequencer.phase();
            self.observer.on_event(&StoryEvent::InputIgnored { phase });
            return ChoiceOutcome::Ignored;
        }

        let prompt = self.prompt();
        let Some(choice) = prompt.get(index) else {
            return ChoiceOutcome::NoSuchChoice;
        };
        let target_id = choice.target.clone();
        let Some(target) = self.book.node(&target_id) else {
            self.observer
                .on_event(&StoryEvent::DanglingTarget { target: target_id });
            return ChoiceOutcome::DanglingTarget;
        };

        match target.transition {
            Transition::Fade => {
                let step = self.sequencer.begin(&target_id, target, now);
                self.observer.on_event(&StoryEvent::PhaseChanged {
                    from: step.from,
                    to: step.to,
                });
                ChoiceOutcome::FadeStarted
            }
            Transition::Cut | Transition::Checkpoint => {
                let target = target.clone();
                ChoiceOutcome::Navigated(self.arrive(&target_id, &target))
            }
        }
    }

    /// Advance the fade sequencer to `now`. Returns the stage update when
    /// the node switched during this tick.
    pub fn tick(&mut self, now: Duration) -> Option<StageUpdate> {
        let mut entered = None;
        for step in self.sequencer.poll(now) {
            self.observer.on_event(&StoryEvent::PhaseChanged {
                from: step.from,
                to: step.to,
            });
            if let Some(pending) = step.commit {
                entered = Some(self.arrive(&pending.target_id, &pending.target));
            }
        }
        entered
    }

    /// When the host should call `tick` next, if a fade is running.
    pub fn next_deadline(&self) -> Option<Duration> {
        self.sequencer.next_deadline()
    }

    /// Write the current state to the save slot.
    pub fn save(&mut self) -> Result<(), PlayerError> {
        let save = self.snapshot_save();
        self.store.save(&save)?;
        Ok(())
    }

    pub fn delete_save(&mut self) -> Result<(), PlayerError> {
        self.store.delete(&self.config.sheet_id)?;
        Ok(())
    }

    /// The record in the save slot, including autosaves from fade and
    /// checkpoint arrivals.
    pub fn saved(&self) -> Result<Option<SaveData>, PlayerError> {
        Ok(self.store.load(&self.config.sheet_id)?)
    }

    /// The save slot as save-file JSON, for hosts that persist it
    /// themselves.
    pub fn saved_json(&self) -> Result<Option<String>, PlayerError> {
        match self.saved()? {
            Some(save) => Ok(Some(save.to_json()?)),
            None => Ok(None),
        }
    }

    /// The current state as save-file JSON.
    pub fn export_save(&self) -> Result<String, PlayerError> {
        Ok(self.snapshot_save().to_json()?)
    }

    /// Load an exported save for this story, store it, and resume from it.
    pub fn import_save(&mut self, json: &str) -> Result<StageUpdate, PlayerError> {
        let save = SaveData::import(json, &self.config.sheet_id)?;
        let state = save.to_state();
        self.ensure_node(&state.current_node_id)?;
        self.store.save(&save)?;
        self.resume(state)
    }

    pub fn book(&self) -> &StoryBook {
        &self.book
    }

    pub fn metadata(&self) -> &Metadata {
        self.book.metadata()
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    pub fn state(&self) -> &GameState {
        self.navigator.state()
    }

    pub fn current_node(&self) -> Option<&StoryNode> {
        self.book.node(self.navigator.current_node_id())
    }

    pub fn phase(&self) -> FadePhase {
        self.sequencer.phase()
    }

    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    fn snapshot_save(&self) -> SaveData {
        SaveData::capture(&self.config.sheet_id, self.navigator.state(), Utc::now())
    }

    fn ensure_node(&self, node_id: &str) -> Result<(), SaveError> {
        if self.book.graph().contains(node_id) {
            Ok(())
        } else {
            Err(SaveError::UnknownNode(node_id.to_string()))
        }
    }

    fn resume(&mut self, state: GameState) -> Result<StageUpdate, PlayerError> {
        self.ensure_node(&state.current_node_id)?;
        self.cancel_transition();
        self.navigator.restore(state);
        let cleared = self.stage.reset();
        Ok(cleared.then(self.enter_current()))
    }

    fn cancel_transition(&mut self) {
        if self.sequencer.cancel() {
            self.observer.on_event(&StoryEvent::TransitionCancelled);
        }
    }

    /// Navigate, apply the node to the stage, and autosave on fade and
    /// checkpoint nodes.
    fn arrive(&mut self, target_id: &str, target: &StoryNode) -> StageUpdate {
        self.navigator.navigate(target_id, target);
        let update = self.enter_current();
        if target.transition.autosaves() {
            self.autosave();
        }
        update
    }

    fn enter_current(&mut self) -> StageUpdate {
        let Some(node) = self.book.node(self.navigator.current_node_id()) else {
            return StageUpdate::default();
        };
        let update = self.stage.enter(node, self.config.asset_base());
        self.observer.on_event(&StoryEvent::NodeEntered {
            node_id: node.node_id.clone(),
            scene: self.stage.scene(),
        });
        update
    }

    fn autosave(&mut self) {
        let save = self.snapshot_save();
        match self.store.save(&save) {
            Ok(()) => self.observer.on_event(&StoryEvent::Autosaved {
                node_id: save.current_node_id,
            }),
            Err(err) => self.observer.on_event(&StoryEvent::AutosaveFailed {
                reason: err.to_string(),
            }),
        }
    }
}

impl StoryPlayerBuilder {
    /// Play an already loaded book.
    pub fn with_book(mut self, book: StoryBook) -> Self {
        self.book = Some(book);
        self
    }

    /// Load the book from the two exported tabs during `build`.
    pub fn with_sheets(mut self, story_csv: &str, metadata_csv: &str) -> Self {
        self.sheets = Some((story_csv.to_string(), metadata_csv.to_string()));
        self
    }

    pub fn with_config(mut self, config: PlayerConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Read the config from a RON file during `build`.
    pub fn config_file(mut self, path: &Path) -> Self {
        self.config_path = Some(path.to_path_buf());
        self
    }

    /// Defaults to [`TracingObserver`].
    pub fn with_observer(mut self, observer: impl StoryObserver + 'static) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    /// Defaults to an empty [`MemorySaveStore`].
    pub fn with_save_store(mut self, store: impl SaveStore + 'static) -> Self {
        self.store = Some(Box::new(store));
        self
    }

    pub fn build(self) -> Result<StoryPlayer, PlayerError> {
        let mut observer = self
            .observer
            .unwrap_or_else(|| Box::new(TracingObserver));

        let config = match (self.config, self.config_path) {
            (Some(config), _) => {
                config.validate()?;
                config
            }
            (None, Some(path)) => PlayerConfig::load_from_ron(&path)?,
            (None, None) => PlayerConfig::default(),
        };

        let book = match (self.book, self.sheets) {
            (Some(book), _) => book,
            (None, Some((story, metadata))) => {
                StoryBook::from_csv(&story, &metadata, observer.as_mut())?
            }
            (None, None) => return Err(PlayerError::MissingStory),
        };

        let store = self
            .store
            .unwrap_or_else(|| Box::new(MemorySaveStore::new()));

        Ok(StoryPlayer {
            navigator: Navigator::new(book.start_node()),
            sequencer: FadeSequencer::new(config.fade_duration(), config.fade_hold()),
            stage: Stage::new(),
            book,
            config,
            observer,
            store,
        })
    }
}

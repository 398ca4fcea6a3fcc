/// Diagnostic events and the observer seam that receives them.
///
/// The engine never logs directly. Components report what happened to a
/// [`StoryObserver`]; the default [`TracingObserver`] turns events into
/// `tracing` records, tests use [`RecordingObserver`] to assert on them.

use std::cell::RefCell;
use std::rc::Rc;

use crate::core::transition::FadePhase;

/// Something worth knowing about while loading or playing a story.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoryEvent {
    /// A story book finished loading.
    SheetLoaded {
        title: String,
        nodes: usize,
        start_node: String,
    },
    /// Two rows used the same node id; the later row won.
    DuplicateNode { node_id: String },
    /// The metadata had no start node, so the first story node is used.
    StartNodeDefaulted { node_id: String },
    /// The metadata tab could be read as key/value or as a 2x2 columnar
    /// block. Key/value was used.
    AmbiguousMetadataLayout,
    /// A choice was filtered out because its target's flags are missing.
    ChoiceHidden {
        text: String,
        target: String,
        required: Vec<String>,
    },
    /// A choice points at a node that does not exist; navigation skipped.
    DanglingTarget { target: String },
    /// Input arrived while a fade was running and was dropped.
    InputIgnored { phase: FadePhase },
    /// The current node changed. `scene` is the scene-generation counter.
    NodeEntered { node_id: String, scene: u64 },
    PhaseChanged { from: FadePhase, to: FadePhase },
    /// A pending fade was abandoned (restart or reload).
    TransitionCancelled,
    Autosaved { node_id: String },
    AutosaveFailed { reason: String },
}

/// Receives engine events.
pub trait StoryObserver {
    fn on_event(&mut self, event: &StoryEvent);
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullObserver;

impl StoryObserver for NullObserver {
    fn on_event(&mut self, _event: &StoryEvent) {}
}

/// Forwards events to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl StoryObserver for TracingObserver {
    fn on_event(&mut self, event: &StoryEvent) {
        match event {
            StoryEvent::SheetLoaded {
                title,
                nodes,
                start_node,
            } => tracing::info!(%title, nodes, %start_node, "Story loaded"),
            StoryEvent::DuplicateNode { node_id } => {
                tracing::warn!(%node_id, "Duplicate node id, later row wins")
            }
            StoryEvent::StartNodeDefaulted { node_id } => {
                tracing::info!(%node_id, "No start node in metadata, defaulting to first node")
            }
            StoryEvent::AmbiguousMetadataLayout => tracing::warn!(
                "Metadata tab is two rows by two columns; reading it as key/value"
            ),
            StoryEvent::ChoiceHidden {
                text,
                target,
                required,
            } => tracing::debug!(
                text = if text.is_empty() { "(auto-advance)" } else { text.as_str() },
                %target,
                required = ?required,
                "Choice hidden"
            ),
            StoryEvent::DanglingTarget { target } => {
                tracing::warn!(%target, "Choice target does not exist")
            }
            StoryEvent::InputIgnored { phase } => {
                tracing::debug!(?phase, "Input ignored during transition")
            }
            StoryEvent::NodeEntered { node_id, scene } => {
                tracing::debug!(%node_id, scene, "Entered node")
            }
            StoryEvent::PhaseChanged { from, to } => {
                tracing::trace!(?from, ?to, "Fade phase changed")
            }
            StoryEvent::TransitionCancelled => tracing::debug!("Pending transition cancelled"),
            StoryEvent::Autosaved { node_id } => tracing::info!(%node_id, "Autosaved"),
            StoryEvent::AutosaveFailed { reason } => {
                tracing::error!(%reason, "Failed to save game data")
            }
        }
    }
}

/// Collects events into a shared list. Clones share the same list, so one
/// clone can be handed to a player while the test keeps the other.
#[derive(Debug, Clone, Default)]
pub struct RecordingObserver {
    events: Rc<RefCell<Vec<StoryEvent>>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<StoryEvent> {
        self.events.borrow().clone()
    }

    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }
}

impl StoryObserver for RecordingObserver {
    fn on_event(&mut self, event: &StoryEvent) {
        self.events.borrow_mut().push(event.clone());
    }
}

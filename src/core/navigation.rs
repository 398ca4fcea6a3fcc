/// Navigation state machine: current node, accumulated flags, history.
///
/// A pure reducer: every command is total and synchronous, and the caller
/// is responsible for only navigating to nodes that exist and passed the
/// choice filter.

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::schema::node::StoryNode;

/// Runtime position within a play-through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct GameState {
    pub current_node_id: String,
    /// Only grows during a play-through; cleared by reset.
    pub flags: FxHashSet<String>,
    /// Previously visited nodes, oldest first. Never ends with the current node
    /// right after a navigation.
    pub history: Vec<String>,
}

impl GameState {
    pub fn new(start_node_id: &str) -> Self {
        Self {
            current_node_id: start_node_id.to_string(),
            flags: FxHashSet::default(),
            history: Vec::new(),
        }
    }

    pub fn has_flag(&self, flag: &str) -> bool {
        self.flags.contains(flag)
    }
}

/// Commands accepted by the reducer.
#[derive(Debug, Clone)]
pub enum Command<'a> {
    Navigate {
        target_id: &'a str,
        target: &'a StoryNode,
    },
    Reset { start_node_id: &'a str },
    Restore(GameState),
}

/// Apply one command to a state, producing the next state.
pub fn reduce(state: &GameState, command: Command<'_>) -> GameState {
    match command {
        Command::Navigate { target_id, target } => {
            let mut flags = state.flags.clone();
            flags.extend(target.granted_flags().iter().cloned());
            let mut history = state.history.clone();
            history.push(state.current_node_id.clone());
            GameState {
                current_node_id: target_id.to_string(),
                flags,
                history,
            }
        }
        Command::Reset { start_node_id } => GameState::new(start_node_id),
        Command::Restore(saved) => saved,
    }
}

/// Owns the single [`GameState`] of a session and applies commands to it in
/// the order they are dispatched.
#[derive(Debug, Clone, Default)]
pub struct Navigator {
    state: GameState,
}

impl Navigator {
    pub fn new(start_node_id: &str) -> Self {
        Self {
            state: GameState::new(start_node_id),
        }
    }

    pub fn dispatch(&mut self, command: Command<'_>) {
        self.state = reduce(&self.state, command);
    }

    pub fn navigate(&mut self, target_id: &str, target: &StoryNode) {
        self.dispatch(Command::Navigate { target_id, target });
    }

    pub fn reset(&mut self, start_node_id: &str) {
        self.dispatch(Command::Reset { start_node_id });
    }

    pub fn restore(&mut self, saved: GameState) {
        self.dispatch(Command::Restore(saved));
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn current_node_id(&self) -> &str {
        &self.state.current_node_id
    }

    /// An owned copy of the current state, suitable for saving.
    pub fn snapshot(&self) -> GameState {
        self.state.clone()
    }
}

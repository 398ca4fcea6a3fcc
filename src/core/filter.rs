/// Flag-gated choice filtering.

use rustc_hash::FxHashSet;
use serde::Serialize;

use crate::core::config::UnlabeledChoicePolicy;
use crate::core::graph::StoryGraph;
use crate::core::observer::{StoryEvent, StoryObserver};
use crate::schema::node::Choice;

/// Return the choices whose targets are currently reachable, in input order.
///
/// A choice stays when its target is missing from the graph (the failure
/// surfaces at navigation time instead), when the target has no required
/// flags, or when `flags` holds every required flag. Hidden choices are
/// reported to the observer.
///
/// An empty result means the node should be treated as an ending; that
/// decision belongs to the caller.
pub fn filter_choices(
    choices: &[Choice],
    flags: &FxHashSet<String>,
    graph: &StoryGraph,
    observer: &mut dyn StoryObserver,
) -> Vec<Choice> {
    choices
        .iter()
        .filter(|choice| {
            let Some(target) = graph.get(&choice.target) else {
                return true;
            };
            if target.is_unlocked_by(flags) {
                return true;
            }
            observer.on_event(&StoryEvent::ChoiceHidden {
                text: choice.text.clone(),
                target: choice.target.clone(),
                required: target.required_flags().to_vec(),
            });
            false
        })
        .cloned()
        .collect()
}

/// What the player is offered at the current node, after filtering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "choices", rename_all = "lowercase")]
pub enum ChoicePrompt {
    /// Nothing left to pick; the story is over.
    Ending,
    /// A single affordance with the configured Continue label.
    Continue(Choice),
    Choose(Vec<Choice>),
}

impl ChoicePrompt {
    /// Classify an already-filtered choice list.
    pub fn classify(mut choices: Vec<Choice>, policy: UnlabeledChoicePolicy) -> Self {
        if choices.is_empty() {
            return Self::Ending;
        }
        if choices.len() == 1 && choices[0].is_unlabeled() {
            return Self::Continue(choices.remove(0));
        }
        match policy {
            UnlabeledChoicePolicy::BlankLabel => Self::Choose(choices),
            UnlabeledChoicePolicy::AutoAdvance => {
                match choices.iter().position(Choice::is_unlabeled) {
                    Some(index) => Self::Continue(choices.swap_remove(index)),
                    None => Self::Choose(choices),
                }
            }
        }
    }

    pub fn is_ending(&self) -> bool {
        matches!(self, Self::Ending)
    }

    /// The choice behind the `index`-th affordance. A Continue prompt has
    /// exactly one, at index 0.
    pub fn get(&self, index: usize) -> Option<&Choice> {
        match self {
            Self::Ending => None,
            Self::Continue(choice) => (index == 0).then_some(choice),
            Self::Choose(choices) => choices.get(index),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Ending => 0,
            Self::Continue(_) => 1,
            Self::Choose(choices) => choices.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Fade transition sequencer.
///
/// Four phases driven by scheduled wake-ups:
///
/// ```text
/// hidden --begin--> fading-out --D--> black --H--> fading-in --D--> hidden
/// ```
///
/// The navigation captured by `begin` is released only on entering `black`,
/// so content never changes while the overlay is below full opacity. Time is
/// supplied by the caller as elapsed [`Duration`]s; the sequencer never reads
/// a clock and never blocks.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::schema::node::StoryNode;

/// Visual state of the full-screen fade overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum FadePhase {
    /// Overlay invisible; input allowed.
    #[default]
    Hidden,
    /// Overlay animating to full opacity.
    FadingOut,
    /// Overlay fully opaque; the node switch happens on entry.
    Black,
    /// Overlay animating back to transparent.
    FadingIn,
}

impl FadePhase {
    /// Overlay opacity the presentation layer should target.
    pub fn opacity(&self) -> f32 {
        match self {
            Self::FadingOut | Self::Black => 1.0,
            Self::Hidden | Self::FadingIn => 0.0,
        }
    }

    /// Whether the overlay animates into this phase (`black` snaps).
    pub fn animates(&self) -> bool {
        matches!(self, Self::FadingOut | Self::FadingIn)
    }
}

/// A navigation captured at the start of a fade, committed at `black`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingNavigation {
    pub target_id: String,
    pub target: StoryNode,
}

/// One phase change. `commit` is set only on the change into `black`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseStep {
    pub from: FadePhase,
    pub to: FadePhase,
    /// When the change was scheduled to happen.
    pub at: Duration,
    pub commit: Option<PendingNavigation>,
}

#[derive(Debug, Clone)]
pub struct FadeSequencer {
    fade: Duration,
    hold: Duration,
    phase: FadePhase,
    pending: Option<PendingNavigation>,
    wake_at: Option<Duration>,
}

impl FadeSequencer {
    /// `fade` is the length of each half of the fade, `hold` the time spent
    /// fully black.
    pub fn new(fade: Duration, hold: Duration) -> Self {
        Self {
            fade,
            hold,
            phase: FadePhase::Hidden,
            pending: None,
            wake_at: None,
        }
    }

    pub fn phase(&self) -> FadePhase {
        self.phase
    }

    pub fn is_idle(&self) -> bool {
        self.phase == FadePhase::Hidden
    }

    pub fn pending(&self) -> Option<&PendingNavigation> {
        self.pending.as_ref()
    }

    /// When the next phase change is due, if one is scheduled.
    pub fn next_deadline(&self) -> Option<Duration> {
        self.wake_at
    }

    pub fn fade_duration(&self) -> Duration {
        self.fade
    }

    pub fn hold_duration(&self) -> Duration {
        self.hold
    }

    /// Start fading out toward `target`.
    ///
    /// Any scheduled wake-up is replaced and a previously captured target is
    /// overwritten; guarding against re-entry is the caller's job.
    pub fn begin(&mut self, target_id: &str, target: &StoryNode, now: Duration) -> PhaseStep {
        let from = self.phase;
        self.pending = Some(PendingNavigation {
            target_id: target_id.to_string(),
            target: target.clone(),
        });
        self.phase = FadePhase::FadingOut;
        self.wake_at = Some(now + self.fade);
        PhaseStep {
            from,
            to: FadePhase::FadingOut,
            at: now,
            commit: None,
        }
    }

    /// Drop the scheduled wake-up and the captured target and return to
    /// `hidden`. Returns false if there was nothing to cancel.
    pub fn cancel(&mut self) -> bool {
        let active = !self.is_idle() || self.pending.is_some();
        self.phase = FadePhase::Hidden;
        self.pending = None;
        self.wake_at = None;
        active
    }

    /// Fire every wake-up due at or before `now`, in order.
    ///
    /// Each next wake-up is scheduled from the previous deadline, not from
    /// `now`, so a late poll does not stretch the sequence.
    pub fn poll(&mut self, now: Duration) -> Vec<PhaseStep> {
        let mut steps = Vec::new();
        while let Some(at) = self.wake_at.filter(|at| *at <= now) {
            steps.push(self.fire(at));
        }
        steps
    }

    fn fire(&mut self, at: Duration) -> PhaseStep {
        let from = self.phase;
        let (to, wake_at, commit) = match from {
            FadePhase::FadingOut => (FadePhase::Black, Some(at + self.hold), self.pending.take()),
            FadePhase::Black => (FadePhase::FadingIn, Some(at + self.fade), None),
            FadePhase::FadingIn | FadePhase::Hidden => (FadePhase::Hidden, None, None),
        };
        self.phase = to;
        self.wake_at = wake_at;
        PhaseStep {
            from,
            to,
            at,
            commit,
        }
    }
}

//! Turn Lifecycle
//!
//! The single lifecycle value the coordinator keeps for the conversation. At
//! most one turn is in flight; `Submitted` and `Streaming` are the in-flight
//! states and the only ones in which new input is refused.

use serde::{Deserialize, Serialize};

/// Where the current model turn is
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnLifecycleState {
    /// No turn has been submitted yet
    #[default]
    Idle,
    /// Input sent, nothing received yet
    Submitted,
    /// Partial content is arriving
    Streaming,
    /// The turn finished (or was cancelled)
    Done,
    /// The transport reported a failure
    Errored,
}

impl TurnLifecycleState {
    /// Whether a new submission is allowed
    #[must_use]
    pub fn accepts_input(&self) -> bool {
        matches!(self, Self::Idle | Self::Done | Self::Errored)
    }

    /// Whether a turn is currently open
    #[must_use]
    pub fn is_in_flight(&self) -> bool {
        matches!(self, Self::Submitted | Self::Streaming)
    }

    /// Whether the transcript should show its loading indicator
    #[must_use]
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Streaming)
    }

    /// Whether the turn has ended one way or another
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Errored)
    }

    /// Human-readable description
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Idle => "Ready",
            Self::Submitted => "Thinking...",
            Self::Streaming => "Responding...",
            Self::Done => "Done",
            Self::Errored => "Error",
        }
    }
}

impl std::fmt::Display for TurnLifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.description())
    }
}

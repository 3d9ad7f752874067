//! Transcript Updates
//!
//! Change notifications pushed from the coordinator to a rendering layer. The
//! coordinator sends exactly one update per applied event, and every update
//! carries a full snapshot of the entry it touched plus the lifecycle state
//! after the event. A surface can therefore render from updates alone, or use
//! them as a cue to re-read `current_entries()`.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::lifecycle::TurnLifecycleState;
use crate::transcript::TranscriptEntry;

/// Identifier of one submitted turn
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TurnId(pub Uuid);

impl TurnId {
    /// Generate a new unique turn ID
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TurnId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TurnId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Messages from the coordinator to a rendering layer
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TranscriptUpdate {
    /// A new entry was pushed onto the transcript
    EntryAppended {
        /// Position of the new entry
        index: usize,
        /// Snapshot of the entry
        entry: TranscriptEntry,
        /// Lifecycle state after the event
        state: TurnLifecycleState,
    },

    /// An existing entry changed in place
    EntryUpdated {
        /// Position of the entry
        index: usize,
        /// Snapshot of the entry after the change
        entry: TranscriptEntry,
        /// Content size before the change
        previous_len: usize,
        /// Lifecycle state after the event
        state: TurnLifecycleState,
    },

    /// Only the lifecycle state changed
    StateChanged {
        /// The new state
        state: TurnLifecycleState,
    },
}

impl TranscriptUpdate {
    /// Lifecycle state after the event
    #[must_use]
    pub fn state(&self) -> TurnLifecycleState {
        match self {
            Self::EntryAppended { state, .. }
            | Self::EntryUpdated { state, .. }
            | Self::StateChanged { state } => *state,
        }
    }

    /// Entry snapshot and its index, if the event touched an entry
    #[must_use]
    pub fn entry(&self) -> Option<(usize, &TranscriptEntry)> {
        match self {
            Self::EntryAppended { index, entry, .. } | Self::EntryUpdated { index, entry, .. } => {
                Some((*index, entry))
            }
            Self::StateChanged { .. } => None,
        }
    }

    /// Whether the transcript grew: a new entry, or an entry whose content
    /// got longer. A surface following the latest output scrolls on these.
    #[must_use]
    pub fn is_growth(&self) -> bool {
        match self {
            Self::EntryAppended { .. } => true,
            Self::EntryUpdated {
                entry,
                previous_len,
                ..
            } => entry.content_len() > *previous_len,
            Self::StateChanged { .. } => false,
        }
    }
}

//! Auto-scroll follower.
//!
//! Tells a surface when to jump its viewport to the bottom of the transcript:
//! whenever an entry is added or an existing entry's content grows (streamed
//! text, accreting tool arguments, a call completing). Keeps one content size
//! per entry from the previous observation.

use crate::transcript::TranscriptEntry;

/// Scroll mode for the transcript viewport.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ScrollMode {
    /// Jump to the bottom whenever the transcript grows.
    #[default]
    FollowLatest,
    /// The user scrolled away; growth does not move the viewport.
    Detached,
}

/// Growth observer for a transcript.
#[derive(Debug, Clone, Default)]
pub struct ScrollFollower {
    /// Current scroll mode.
    pub mode: ScrollMode,
    /// Content size of each entry at the last observation.
    seen: Vec<usize>,
}

impl ScrollFollower {
    /// Creates a follower in follow mode with nothing observed yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if currently following output.
    #[must_use]
    pub fn is_following(&self) -> bool {
        self.mode == ScrollMode::FollowLatest
    }

    /// Stops following (the user scrolled up).
    pub fn detach(&mut self) {
        self.mode = ScrollMode::Detached;
    }

    /// Resumes following (the user scrolled back to the bottom).
    pub fn follow_latest(&mut self) {
        self.mode = ScrollMode::FollowLatest;
    }

    /// Records the current entries and reports whether the viewport should
    /// move to the bottom.
    ///
    /// True when following and the entry count grew or any entry's content got
    /// longer since the previous call.
    pub fn observe(&mut self, entries: &[TranscriptEntry]) -> bool {
        let grew = entries.len() > self.seen.len()
            || entries
                .iter()
                .zip(&self.seen)
                .any(|(entry, &seen)| entry.content_len() > seen);

        self.seen = entries.iter().map(TranscriptEntry::content_len).collect();
        grew && self.is_following()
    }
}

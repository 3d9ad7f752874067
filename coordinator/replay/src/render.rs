//! Plain-text rendering of transcript entries.

use uigen_core::{OperationDescriptor, Role, TranscriptEntry, TranscriptUpdate};

/// One line per entry, the way a chat panel would show it
pub fn entry_line(entry: &TranscriptEntry) -> String {
    match entry {
        TranscriptEntry::Message(message) => match message.role {
            Role::User => format!("> {}", message.body),
            Role::Assistant => message.body.clone(),
        },
        TranscriptEntry::Tool { invocation, .. } => badge(&invocation.descriptor()),
    }
}

/// Tool badge: spinner or check mark, then the stable label
pub fn badge(descriptor: &OperationDescriptor) -> String {
    let marker = if descriptor.is_succeeded() { '✓' } else { '…' };
    format!("[{marker}] {descriptor}")
}

/// What the surface saw while the session played
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceStats {
    /// Updates received
    pub updates: usize,
    /// Updates that would have moved the viewport
    pub scrolls: usize,
}

impl SurfaceStats {
    /// Count one update
    pub fn record(&mut self, update: &TranscriptUpdate) {
        self.updates += 1;
        if update.is_growth() {
            self.scrolls += 1;
        }
    }
}

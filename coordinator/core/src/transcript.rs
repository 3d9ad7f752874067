//! Transcript
//!
//! The ordered, append-only record of a conversation: user messages, assistant
//! text, and tool invocations interleaved in the order they arrived.
//!
//! Entries are never removed or reordered. The only in-place mutations are:
//! - appending text to the open assistant message,
//! - folding argument fragments (and a late tool name) into a pending tool call,
//! - flipping a tool call from pending to completed.

use serde::{Deserialize, Serialize};

use crate::invocation::ToolInvocation;

/// Transcript entry identifier
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntryId(pub String);

impl EntryId {
    /// Generate a new unique entry ID
    pub fn new() -> Self {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        let id = COUNTER.fetch_add(1, Ordering::SeqCst);
        Self(format!("entry_{id}"))
    }
}

impl Default for EntryId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EntryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Who wrote a text message
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// User input
    User,
    /// Model reply
    Assistant,
}

/// A text message in the transcript
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextMessage {
    /// Unique entry ID
    pub id: EntryId,
    /// Who wrote this message
    pub role: Role,
    /// Message body
    pub body: String,
    /// Whether more text may still be appended
    pub streaming: bool,
}

impl TextMessage {
    /// Create a finished user message
    pub fn user(body: impl Into<String>) -> Self {
        Self {
            id: EntryId::new(),
            role: Role::User,
            body: body.into(),
            streaming: false,
        }
    }

    /// Create an open assistant message seeded with its first chunk
    pub fn streaming_assistant(body: impl Into<String>) -> Self {
        Self {
            id: EntryId::new(),
            role: Role::Assistant,
            body: body.into(),
            streaming: true,
        }
    }

    /// Whether this is an assistant message still receiving text
    #[must_use]
    pub fn is_open_assistant(&self) -> bool {
        self.role == Role::Assistant && self.streaming
    }
}

/// One row of the transcript
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TranscriptEntry {
    /// User or assistant text
    Message(TextMessage),
    /// A tool call made by the model
    Tool {
        /// Unique entry ID
        id: EntryId,
        /// The call itself
        invocation: ToolInvocation,
    },
}

impl TranscriptEntry {
    /// Wrap a tool invocation in a new entry
    pub fn tool(invocation: ToolInvocation) -> Self {
        Self::Tool {
            id: EntryId::new(),
            invocation,
        }
    }

    /// Entry ID
    #[must_use]
    pub fn id(&self) -> &EntryId {
        match self {
            Self::Message(message) => &message.id,
            Self::Tool { id, .. } => id,
        }
    }

    /// Size of the renderable content, used to observe in-place growth
    #[must_use]
    pub fn content_len(&self) -> usize {
        match self {
            Self::Message(message) => message.body.len(),
            Self::Tool { invocation, .. } => invocation.content_len(),
        }
    }

    /// The tool invocation, if this is a tool entry
    #[must_use]
    pub fn as_tool(&self) -> Option<&ToolInvocation> {
        match self {
            Self::Tool { invocation, .. } => Some(invocation),
            Self::Message(_) => None,
        }
    }

    /// The text message, if this is a message entry
    #[must_use]
    pub fn as_message(&self) -> Option<&TextMessage> {
        match self {
            Self::Message(message) => Some(message),
            Self::Tool { .. } => None,
        }
    }
}

/// A prior message handed to the transport as conversation context
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryMessage {
    /// Who wrote it
    pub role: Role,
    /// What was said
    pub content: String,
}

/// The ordered entry sequence
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
}

impl Transcript {
    /// Create an empty transcript
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All entries in arrival order
    #[must_use]
    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    /// Number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the transcript has no entries
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry at `index`
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&TranscriptEntry> {
        self.entries.get(index)
    }

    /// Append an entry and return its index
    pub fn push(&mut self, entry: TranscriptEntry) -> usize {
        self.entries.push(entry);
        self.entries.len() - 1
    }

    /// Append a finished user message
    pub fn push_user(&mut self, body: impl Into<String>) -> usize {
        self.push(TranscriptEntry::Message(TextMessage::user(body)))
    }

    /// Add assistant text.
    ///
    /// Extends the last entry when it is an open assistant message, otherwise
    /// starts a new one so text after a tool call keeps its position. Returns
    /// the touched index and whether a new entry was appended.
    pub fn append_assistant_text(&mut self, text: &str) -> (usize, bool) {
        if let Some(TranscriptEntry::Message(message)) = self.entries.last_mut() {
            if message.is_open_assistant() {
                message.body.push_str(text);
                return (self.entries.len() - 1, false);
            }
        }
        let index = self.push(TranscriptEntry::Message(TextMessage::streaming_assistant(
            text,
        )));
        (index, true)
    }

    /// Find a tool invocation by call ID among the entries at or after `from`.
    ///
    /// Call IDs are only unique within a turn, so callers pass the index where
    /// the current turn starts.
    pub fn find_tool_mut(
        &mut self,
        from: usize,
        call_id: &str,
    ) -> Option<(usize, &mut ToolInvocation)> {
        self.entries
            .iter_mut()
            .enumerate()
            .skip(from)
            .find_map(|(index, entry)| match entry {
                TranscriptEntry::Tool { invocation, .. } if invocation.call_id == call_id => {
                    Some((index, invocation))
                }
                _ => None,
            })
    }

    /// Stop accepting text on every open assistant message.
    ///
    /// Returns the number of messages closed.
    pub fn close_open_messages(&mut self) -> usize {
        let mut closed = 0;
        for entry in &mut self.entries {
            if let TranscriptEntry::Message(message) = entry {
                if message.streaming {
                    message.streaming = false;
                    closed += 1;
                }
            }
        }
        closed
    }

    /// The most recent non-empty text messages, oldest first, capped at
    /// `limit` (0 = unlimited)
    #[must_use]
    pub fn history(&self, limit: usize) -> Vec<HistoryMessage> {
        let mut messages: Vec<HistoryMessage> = self
            .entries
            .iter()
            .filter_map(TranscriptEntry::as_message)
            .filter(|message| !message.body.is_empty())
            .map(|message| HistoryMessage {
                role: message.role,
                content: message.body.clone(),
            })
            .collect();

        if limit == 0 || messages.len() <= limit {
            return messages;
        }
        messages.split_off(messages.len() - limit)
    }
}

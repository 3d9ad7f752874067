//! Model Transport Traits
//!
//! Event and request types shared by every transport, and the
//! [`ModelTransport`] trait itself.
//!
//! # Wire form
//!
//! Events are externally tagged, snake case:
//!
//! ```text
//! {"text_delta": "Sure, "}
//! {"tool_call_delta": {"call_id": "1", "tool_name": "str_replace_editor", "args_delta": {...}}}
//! {"tool_result": {"call_id": "1", "result": {"success": true}}}
//! "turn_complete"
//! {"turn_error": "rate limited"}
//! ```
//!
//! Field names also accept their camel-case spelling (`callId`, `toolName`,
//! `argsDelta`).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc;

use crate::transcript::HistoryMessage;

/// A fragment of a tool call
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolCallDelta {
    /// Call this fragment belongs to
    #[serde(alias = "callId")]
    pub call_id: String,
    /// Tool identifier, usually only on the first fragment
    #[serde(default, alias = "toolName", skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
    /// Partial argument object
    #[serde(default, alias = "argsDelta", skip_serializing_if = "Option::is_none")]
    pub args_delta: Option<Value>,
}

impl ToolCallDelta {
    /// Create a fragment for `call_id`
    pub fn new(call_id: impl Into<String>) -> Self {
        Self {
            call_id: call_id.into(),
            tool_name: None,
            args_delta: None,
        }
    }

    /// Set the tool name
    #[must_use]
    pub fn with_tool_name(mut self, tool_name: impl Into<String>) -> Self {
        self.tool_name = Some(tool_name.into());
        self
    }

    /// Set the argument fragment
    #[must_use]
    pub fn with_args(mut self, args_delta: Value) -> Self {
        self.args_delta = Some(args_delta);
        self
    }
}

/// The outcome of a tool call
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    /// Call being completed
    #[serde(alias = "callId")]
    pub call_id: String,
    /// Opaque result payload
    #[serde(default)]
    pub result: Value,
}

/// Events streamed by a transport during one turn
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportEvent {
    /// A chunk of assistant text
    TextDelta(String),
    /// A fragment of a tool call
    ToolCallDelta(ToolCallDelta),
    /// A tool call finished
    ToolResult(ToolResult),
    /// The turn finished successfully
    TurnComplete,
    /// The turn failed
    TurnError(String),
}

impl TransportEvent {
    /// Shorthand for a text chunk
    pub fn text(text: impl Into<String>) -> Self {
        Self::TextDelta(text.into())
    }

    /// Shorthand for a tool result
    pub fn tool_result(call_id: impl Into<String>, result: Value) -> Self {
        Self::ToolResult(ToolResult {
            call_id: call_id.into(),
            result,
        })
    }

    /// Whether this event ends the turn
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::TurnComplete | Self::TurnError(_))
    }

    /// Whether this event carries partial turn content (text or a tool
    /// fragment)
    #[must_use]
    pub fn is_partial_content(&self) -> bool {
        matches!(self, Self::TextDelta(_) | Self::ToolCallDelta(_))
    }
}

/// What the transport needs to run one turn
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TurnRequest {
    /// The user's input
    pub prompt: String,
    /// Model to use (transport-specific identifier)
    pub model: String,
    /// System prompt
    pub system: Option<String>,
    /// Earlier messages, oldest first
    pub history: Vec<HistoryMessage>,
}

impl TurnRequest {
    /// Create a new request with prompt and model
    pub fn new(prompt: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            model: model.into(),
            ..Default::default()
        }
    }

    /// Set system prompt
    #[must_use]
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Set conversation history
    #[must_use]
    pub fn with_history(mut self, history: Vec<HistoryMessage>) -> Self {
        self.history = history;
        self
    }
}

/// Model transport trait
///
/// Implement this trait to connect the coordinator to a model provider.
#[async_trait]
pub trait ModelTransport: Send + Sync {
    /// Transport name (e.g., "scripted")
    fn name(&self) -> &str;

    /// Start a turn and get its event stream
    ///
    /// The channel closes once the turn is over. A channel that closes before
    /// `TurnComplete` or `TurnError` is treated as a failure.
    async fn open_stream(
        &self,
        request: &TurnRequest,
    ) -> anyhow::Result<mpsc::Receiver<TransportEvent>>;
}

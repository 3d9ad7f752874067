//! Tool Invocations
//!
//! One tool call inside a turn, as the transcript sees it. The model streams a
//! call's arguments in fragments, so an invocation's argument object is a
//! growing snapshot: every fragment is folded in as it arrives and the partial
//! state stays renderable the whole time.
//!
//! # Lifecycle
//!
//! ```text
//!   tool_call_delta ──► Pending ──(tool_result)──► Completed
//!         ▲   │                                       │
//!         └───┘ merge fragments                       └─ terminal
//! ```
//!
//! A `Completed` invocation never returns to `Pending`; late fragments and
//! duplicate results for it are ignored.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::interpreter::{self, OperationDescriptor};

/// Loosely-typed argument payload of a tool call
pub type ToolArgs = Map<String, Value>;

/// Where a tool invocation is in its lifecycle
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvocationState {
    /// Arguments or result still arriving
    #[default]
    Pending,
    /// A result has been attached
    Completed,
}

/// A single tool call emitted by the model
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocation {
    /// Identifier carried by every stream event for this call
    pub call_id: String,
    /// Tool identifier (empty until a fragment names it)
    pub tool_name: String,
    /// Argument snapshot, absent until the first argument fragment
    pub args: Option<ToolArgs>,
    /// Lifecycle state
    pub state: InvocationState,
    /// Opaque result payload, only set once completed
    pub result: Option<Value>,
}

impl ToolInvocation {
    /// Create a pending invocation with no arguments yet
    pub fn new(call_id: impl Into<String>, tool_name: impl Into<String>) -> Self {
        Self {
            call_id: call_id.into(),
            tool_name: tool_name.into(),
            args: None,
            state: InvocationState::Pending,
            result: None,
        }
    }

    /// Builder-style helper that seeds the argument snapshot
    #[must_use]
    pub fn with_args(mut self, args: ToolArgs) -> Self {
        self.args = Some(args);
        self
    }

    /// Whether a result has been attached
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.state == InvocationState::Completed
    }

    /// Completed with a truthy result
    #[must_use]
    pub fn is_succeeded(&self) -> bool {
        self.is_completed() && self.result.as_ref().is_some_and(is_truthy)
    }

    /// Fill in the tool name if the call does not have one yet.
    ///
    /// Returns true when the name changed.
    pub fn name_if_unnamed(&mut self, tool_name: &str) -> bool {
        if self.is_completed() || !self.tool_name.is_empty() || tool_name.is_empty() {
            return false;
        }
        self.tool_name = tool_name.to_string();
        true
    }

    /// Fold a partial argument object into the current snapshot.
    ///
    /// Keys in `fragment` overwrite matching keys, nested objects merge
    /// recursively, and keys the fragment does not mention are kept. Anything
    /// other than an object is ignored. Returns true when the snapshot was
    /// touched.
    pub fn merge_args(&mut self, fragment: &Value) -> bool {
        if self.is_completed() {
            return false;
        }
        let Value::Object(incoming) = fragment else {
            return false;
        };

        let args = self.args.get_or_insert_with(Map::new);
        merge_objects(args, incoming);
        true
    }

    /// Attach the result and mark the call completed.
    ///
    /// Returns false if the call was already completed; the first result wins.
    pub fn complete(&mut self, result: Value) -> bool {
        if self.is_completed() {
            return false;
        }
        self.result = Some(result);
        self.state = InvocationState::Completed;
        true
    }

    /// Size of the renderable content, used to detect in-place growth
    #[must_use]
    pub fn content_len(&self) -> usize {
        let args_len = self
            .args
            .as_ref()
            .and_then(|args| serde_json::to_string(args).ok())
            .map_or(0, |serialized| serialized.len());
        self.tool_name.len() + args_len + usize::from(self.is_completed())
    }

    /// Interpret this invocation for display
    #[must_use]
    pub fn descriptor(&self) -> OperationDescriptor {
        interpreter::interpret(
            &self.tool_name,
            self.args.as_ref(),
            self.state,
            self.result.as_ref(),
        )
    }
}

fn merge_objects(target: &mut ToolArgs, incoming: &ToolArgs) {
    for (key, value) in incoming {
        match (target.get_mut(key), value) {
            (Some(Value::Object(existing)), Value::Object(nested)) => {
                merge_objects(existing, nested);
            }
            _ => {
                target.insert(key.clone(), value.clone());
            }
        }
    }
}

/// JSON truthiness as a browser would see it
#[must_use]
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

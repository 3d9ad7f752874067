//! Model Transport
//!
//! The seam between the coordinator and whatever talks to the model provider.
//! A transport turns a [`TurnRequest`] into a channel of [`TransportEvent`]s;
//! the coordinator owns everything after that.
//!
//! # Available Transports
//!
//! - **Scripted**: replays pre-recorded turns (headless runs, tests)
//!
//! # Usage
//!
//! ```ignore
//! use uigen_core::transport::{ModelTransport, ScriptedTransport, TurnRequest};
//!
//! let transport = ScriptedTransport::new(vec![events]);
//! let rx = transport.open_stream(&TurnRequest::new("hi", "claude-haiku")).await?;
//! ```

mod scripted;
mod traits;

pub use scripted::{ScriptedTransport, ScriptedTurn, SessionScript};
pub use traits::{ModelTransport, ToolCallDelta, ToolResult, TransportEvent, TurnRequest};

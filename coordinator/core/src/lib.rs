//! uigen Core - Headless Transcript Coordination for the uigen chat client
//!
//! This crate holds the logic behind the chat panel of a UI-generating coding
//! agent, independent of any rendering framework. The agent edits files in a
//! virtual project through tool calls and streams its replies; this crate turns
//! that stream into a transcript a surface can paint.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         Surfaces                                 │
//! │   ┌───────────┐   ┌─────────────────┐   ┌───────────────────┐   │
//! │   │  Web chat │   │  uigen-replay   │   │  Tests / headless │   │
//! │   └─────┬─────┘   └────────┬────────┘   └─────────┬─────────┘   │
//! │         └──────────────────┴──────────────────────┘             │
//! │                            │                                     │
//! │              submit / cancel (down)                              │
//! │              TranscriptUpdate (up)                               │
//! └────────────────────────────┼─────────────────────────────────────┘
//!                              │
//! ┌────────────────────────────┼─────────────────────────────────────┐
//! │                       UIGEN CORE                                 │
//! │  ┌─────────────────────────┴─────────────────────────────────┐   │
//! │  │                     Coordinator                            │   │
//! │  │  ┌────────────┐  ┌────────────┐  ┌─────────────────────┐  │   │
//! │  │  │ Transcript │  │ Lifecycle  │  │ Interpreter (pure)  │  │   │
//! │  │  └────────────┘  └────────────┘  └─────────────────────┘  │   │
//! │  └─────────────────────────┬─────────────────────────────────┘   │
//! │                            │ TransportEvent                       │
//! │                   ┌────────┴────────┐                             │
//! │                   │ ModelTransport  │                             │
//! │                   └─────────────────┘                             │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Key Types
//!
//! - [`Coordinator`]: owns the transcript and the turn lifecycle
//! - [`TranscriptUpdate`]: change notifications sent to a surface
//! - [`TranscriptEntry`]: one row of the transcript (text or tool call)
//! - [`OperationDescriptor`]: human-facing label for a tool call
//! - [`ModelTransport`]: the seam to the model provider
//!
//! # Quick Start
//!
//! ```ignore
//! use uigen_core::{Coordinator, CoordinatorConfig, ScriptedTransport};
//! use tokio::sync::mpsc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let (tx, mut rx) = mpsc::channel(64);
//!     let transport = ScriptedTransport::new(recorded_turns);
//!     let mut coordinator = Coordinator::new(transport, CoordinatorConfig::from_env(), tx);
//!
//!     coordinator.submit("create a button").await?;
//!
//!     while coordinator.current_lifecycle_state().is_in_flight() {
//!         coordinator.poll_stream();
//!         while let Ok(update) = rx.try_recv() {
//!             // Render update
//!         }
//!     }
//! }
//! ```
//!
//! # Module Overview
//!
//! - [`interpreter`]: tool call → display descriptor
//! - [`invocation`]: tool calls and argument merging
//! - [`transcript`]: the append-only entry sequence
//! - [`lifecycle`]: turn lifecycle states
//! - [`coordinator`]: the state machine tying it together
//! - [`updates`]: notifications to surfaces
//! - [`transport`]: model transport trait and the scripted transport
//! - [`scroll`]: auto-scroll follower for surfaces
//! - [`config`]: TOML/env configuration

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod coordinator;
pub mod interpreter;
pub mod invocation;
pub mod lifecycle;
pub mod scroll;
pub mod transcript;
pub mod transport;
pub mod updates;

// Re-exports for convenience
pub use coordinator::{Coordinator, CoordinatorConfig, SubmitError};
pub use interpreter::{
    decompose_path, interpret, OperationDescriptor, OperationIcon, OperationVerb, PathParts,
    VisualStatus,
};
pub use invocation::{InvocationState, ToolArgs, ToolInvocation};
pub use lifecycle::TurnLifecycleState;
pub use scroll::ScrollFollower;
pub use transcript::{EntryId, HistoryMessage, Role, TextMessage, Transcript, TranscriptEntry};
pub use transport::{
    ModelTransport, ScriptedTransport, ScriptedTurn, SessionScript, ToolCallDelta, ToolResult,
    TransportEvent, TurnRequest,
};
pub use updates::{TranscriptUpdate, TurnId};

// Config exports
pub use config::{
    default_config_path, load_config, load_config_from_path, ConfigError, ConfigOverrides,
    ConfigSource, UigenConfigFile, UigenToml,
};

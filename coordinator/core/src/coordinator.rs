//! Coordinator - The Transcript Core
//!
//! The Coordinator owns the transcript and the turn lifecycle. It:
//! - admits at most one turn at a time,
//! - opens a stream on the model transport for each turn,
//! - folds the transport's events into the transcript in arrival order,
//! - pushes one [`TranscriptUpdate`] to the surface per applied event.
//!
//! # Design Philosophy
//!
//! The Coordinator is UI-agnostic. A surface reads `current_entries()` and
//! `current_lifecycle_state()` whenever it likes and listens on the update
//! channel for changes. Event application is serialized through `&mut self`,
//! so there are no locks around the transcript.
//!
//! Applying events never waits on the surface. Updates that do not fit in the
//! channel are queued in order and handed over as room frees up: on the next
//! `poll_stream`, or by `run_turn` / `flush_updates`, which do wait.
//!
//! # Lifecycle
//!
//! ```text
//!             submit                first text / tool fragment
//!   Idle ───────────────► Submitted ──────────────────────────► Streaming
//!    ▲                      │    │                                 │
//!    │                      │    └── turn_complete / cancel ──┐    │
//!    │                      │                                 ▼    │
//!    │                      │                                Done ◄┤ turn_complete / cancel
//!    │                      └── turn_error / open failure ─┐       │
//!    │                          stream gone                ▼       │
//!    │                                                 Errored ◄───┘ turn_error / stream closed
//!    │                                                     │
//!    └──────── Done and Errored accept the next submit ───┘
//! ```

use std::collections::VecDeque;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::{TryRecvError, TrySendError};

use crate::config::{DEFAULT_HISTORY_MESSAGES, DEFAULT_MODEL};
use crate::interpreter::OperationDescriptor;
use crate::invocation::ToolInvocation;
use crate::lifecycle::TurnLifecycleState;
use crate::transcript::{Transcript, TranscriptEntry};
use crate::transport::{ModelTransport, ToolCallDelta, ToolResult, TransportEvent, TurnRequest};
use crate::updates::{TranscriptUpdate, TurnId};

/// Coordinator configuration
#[derive(Clone, Debug)]
pub struct CoordinatorConfig {
    /// Model to request
    pub model: String,
    /// System prompt
    pub system_prompt: Option<String>,
    /// Prior messages sent as context (0 = all)
    pub history_messages: usize,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            system_prompt: None,
            history_messages: DEFAULT_HISTORY_MESSAGES,
        }
    }
}

impl CoordinatorConfig {
    /// Create configuration from environment variables
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_env_with(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_env_with<F>(env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            model: env("UIGEN_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            system_prompt: env("UIGEN_SYSTEM_PROMPT"),
            history_messages: env("UIGEN_HISTORY_MESSAGES")
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_HISTORY_MESSAGES),
        }
    }
}

/// Why a submission was refused
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum SubmitError {
    /// A turn is already submitted or streaming
    #[error("a turn is already in flight ({0:?})")]
    TurnInFlight(TurnLifecycleState),

    /// The input was empty or whitespace
    #[error("input is empty")]
    EmptyInput,
}

/// The Coordinator - headless transcript core
pub struct Coordinator<T: ModelTransport> {
    /// Configuration
    config: CoordinatorConfig,
    /// Model transport
    transport: T,
    /// Conversation so far
    transcript: Transcript,
    /// Current turn lifecycle
    state: TurnLifecycleState,
    /// Channel to send updates to the surface
    tx: mpsc::Sender<TranscriptUpdate>,
    /// Updates waiting for room in the surface channel
    backlog: VecDeque<TranscriptUpdate>,
    /// Event stream of the turn in flight
    stream_rx: Option<mpsc::Receiver<TransportEvent>>,
    /// Most recently submitted turn
    current_turn: Option<TurnId>,
    /// Index of the user entry that opened the current turn
    turn_start: usize,
    /// Failure reason of the last errored turn
    last_error: Option<String>,
}

impl<T: ModelTransport> Coordinator<T> {
    /// Create a new Coordinator with the given transport
    pub fn new(
        transport: T,
        config: CoordinatorConfig,
        tx: mpsc::Sender<TranscriptUpdate>,
    ) -> Self {
        Self {
            config,
            transport,
            transcript: Transcript::new(),
            state: TurnLifecycleState::Idle,
            tx,
            backlog: VecDeque::new(),
            stream_rx: None,
            current_turn: None,
            turn_start: 0,
            last_error: None,
        }
    }

    /// Get configuration
    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    /// Get the transport
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Entries in arrival order
    pub fn current_entries(&self) -> &[TranscriptEntry] {
        self.transcript.entries()
    }

    /// The whole transcript
    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Current lifecycle state
    pub fn current_lifecycle_state(&self) -> TurnLifecycleState {
        self.state
    }

    /// Whether the input affordance should be enabled
    pub fn accepts_input(&self) -> bool {
        self.state.accepts_input()
    }

    /// Whether the transcript's loading indicator should show
    pub fn is_loading(&self) -> bool {
        self.state.is_loading()
    }

    /// Most recently submitted turn
    pub fn current_turn(&self) -> Option<TurnId> {
        self.current_turn
    }

    /// Failure reason of the last errored turn
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Updates queued because the surface channel was full
    pub fn pending_updates(&self) -> usize {
        self.backlog.len()
    }

    /// Display descriptor for every tool entry, keyed by entry index
    pub fn descriptors(&self) -> Vec<(usize, OperationDescriptor)> {
        self.transcript
            .entries()
            .iter()
            .enumerate()
            .filter_map(|(index, entry)| entry.as_tool().map(|call| (index, call.descriptor())))
            .collect()
    }

    /// Submit user input and open a stream for the new turn.
    ///
    /// A transport that refuses to open a stream does not fail the call: the
    /// turn is admitted and immediately marked `Errored`. If this future is
    /// dropped before the stream opens, the next `poll_stream` or `run_turn`
    /// ends the turn as `Errored`.
    ///
    /// # Errors
    ///
    /// Returns [`SubmitError::TurnInFlight`] while a turn is submitted or
    /// streaming and [`SubmitError::EmptyInput`] for blank input. Neither
    /// touches the transcript or the lifecycle state.
    pub async fn submit(&mut self, text: &str) -> Result<TurnId, SubmitError> {
        if !self.state.accepts_input() {
            tracing::debug!(state = ?self.state, "Rejected submission while a turn is in flight");
            return Err(SubmitError::TurnInFlight(self.state));
        }
        if text.trim().is_empty() {
            return Err(SubmitError::EmptyInput);
        }

        let history = self.transcript.history(self.config.history_messages);
        let index = self.transcript.push_user(text);
        let turn_id = TurnId::new();

        self.turn_start = index;
        self.current_turn = Some(turn_id);
        self.last_error = None;
        self.stream_rx = None;
        self.state = TurnLifecycleState::Submitted;
        self.send_entry(index, None);

        tracing::info!(turn = %turn_id, transport = self.transport.name(), "Turn submitted");

        let mut request = TurnRequest::new(text, &self.config.model).with_history(history);
        if let Some(ref system) = self.config.system_prompt {
            request = request.with_system(system.clone());
        }

        match self.transport.open_stream(&request).await {
            Ok(rx) => {
                self.stream_rx = Some(rx);
            }
            Err(e) => {
                tracing::warn!(turn = %turn_id, error = %e, "Transport failed to open stream");
                self.fail(format!("{e:#}"));
            }
        }

        Ok(turn_id)
    }

    /// Apply every event currently buffered on the stream without waiting.
    ///
    /// Neither the stream nor the surface channel is waited on. Returns true if
    /// anything was processed (including noticing that the stream closed).
    pub fn poll_stream(&mut self) -> bool {
        self.drain_backlog();

        let (events, closed) = {
            let Some(rx) = self.stream_rx.as_mut() else {
                if self.state.is_in_flight() {
                    self.stream_closed();
                    return true;
                }
                return false;
            };

            let mut collected = Vec::new();
            let mut closed = false;
            loop {
                match rx.try_recv() {
                    Ok(event) => {
                        let is_terminal = event.is_terminal();
                        collected.push(event);
                        if is_terminal {
                            break;
                        }
                    }
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => {
                        closed = true;
                        break;
                    }
                }
            }
            (collected, closed)
        };

        let progressed = closed || !events.is_empty();

        for event in events {
            self.apply_event(event);
        }
        if closed {
            self.stream_closed();
        }

        progressed
    }

    /// Wait for events until the current turn ends, and return the final state.
    ///
    /// Also waits for the surface to take every queued update.
    pub async fn run_turn(&mut self) -> TurnLifecycleState {
        while self.state.is_in_flight() {
            self.flush_updates().await;

            let Some(rx) = self.stream_rx.as_mut() else {
                self.stream_closed();
                break;
            };
            let next = rx.recv().await;
            match next {
                Some(event) => {
                    self.apply_event(event);
                }
                None => self.stream_closed(),
            }
        }
        self.flush_updates().await;
        self.state
    }

    /// Wait until the surface has taken every queued update
    pub async fn flush_updates(&mut self) {
        while let Some(update) = self.backlog.pop_front() {
            if let Err(e) = self.tx.send(update).await {
                tracing::warn!("Failed to send update to surface: {}", e);
                self.backlog.clear();
            }
        }
    }

    /// Fold one transport event into the transcript.
    ///
    /// Returns true if the event changed anything. Events that arrive while no
    /// turn is in flight, fragments for completed calls, and results for
    /// unknown or completed calls are ignored.
    pub fn apply_event(&mut self, event: TransportEvent) -> bool {
        if !self.state.is_in_flight() {
            tracing::debug!(event = ?event, state = ?self.state, "Ignoring event outside a turn");
            return false;
        }

        let started = event.is_partial_content() && self.begin_streaming();

        match event {
            TransportEvent::TextDelta(text) => self.apply_text(&text, started),
            TransportEvent::ToolCallDelta(delta) => self.apply_tool_delta(delta, started),
            TransportEvent::ToolResult(result) => self.apply_tool_result(result),
            TransportEvent::TurnComplete => {
                self.finish_turn(TurnLifecycleState::Done);
                true
            }
            TransportEvent::TurnError(reason) => {
                tracing::warn!(reason = %reason, "Turn failed");
                self.fail(reason);
                true
            }
        }
    }

    /// Abandon the turn in flight.
    ///
    /// Everything received so far stays in the transcript and the turn ends as
    /// `Done`. Returns false if no turn was in flight.
    pub fn cancel(&mut self) -> bool {
        if !self.state.is_in_flight() {
            return false;
        }
        tracing::info!(turn = ?self.current_turn, "Turn cancelled");
        self.finish_turn(TurnLifecycleState::Done);
        true
    }

    /// `started` is true when this event moved the turn to `Streaming`
    fn apply_text(&mut self, text: &str, started: bool) -> bool {
        if text.is_empty() {
            if started {
                self.set_state(self.state);
            }
            return started;
        }

        let previous_len = self
            .transcript
            .entries()
            .last()
            .map_or(0, TranscriptEntry::content_len);
        let (index, appended) = self.transcript.append_assistant_text(text);
        self.send_entry(index, (!appended).then_some(previous_len));
        true
    }

    fn apply_tool_delta(&mut self, delta: ToolCallDelta, started: bool) -> bool {
        let ToolCallDelta {
            call_id,
            tool_name,
            args_delta,
        } = delta;

        let existing = self
            .transcript
            .find_tool_mut(self.turn_start, &call_id)
            .map(|(index, invocation)| {
                let previous_len = invocation.content_len();
                let named = tool_name
                    .as_deref()
                    .is_some_and(|name| invocation.name_if_unnamed(name));
                let merged = args_delta
                    .as_ref()
                    .is_some_and(|args| invocation.merge_args(args));
                (index, previous_len, named || merged)
            });

        match existing {
            Some((index, previous_len, true)) => {
                self.send_entry(index, Some(previous_len));
                true
            }
            Some(_) => {
                tracing::debug!(call_id = %call_id, "Ignoring fragment that changed nothing");
                if started {
                    self.set_state(self.state);
                }
                started
            }
            None => {
                let mut invocation = ToolInvocation::new(call_id, tool_name.unwrap_or_default());
                if let Some(ref args) = args_delta {
                    invocation.merge_args(args);
                }
                let index = self.transcript.push(TranscriptEntry::tool(invocation));
                self.send_entry(index, None);
                true
            }
        }
    }

    fn apply_tool_result(&mut self, result: ToolResult) -> bool {
        let ToolResult { call_id, result } = result;

        let completed = self
            .transcript
            .find_tool_mut(self.turn_start, &call_id)
            .map(|(index, invocation)| {
                let previous_len = invocation.content_len();
                (index, previous_len, invocation.complete(result))
            });

        match completed {
            Some((index, previous_len, true)) => {
                self.send_entry(index, Some(previous_len));
                true
            }
            Some(_) => {
                tracing::debug!(call_id = %call_id, "Ignoring duplicate tool result");
                false
            }
            None => {
                tracing::debug!(call_id = %call_id, "Ignoring tool result for unknown call");
                false
            }
        }
    }

    /// Move from `Submitted` to `Streaming`; true if the state changed
    fn begin_streaming(&mut self) -> bool {
        if self.state == TurnLifecycleState::Submitted {
            self.state = TurnLifecycleState::Streaming;
            return true;
        }
        false
    }

    fn stream_closed(&mut self) {
        self.stream_rx = None;
        if self.state.is_in_flight() {
            tracing::warn!(
                turn = ?self.current_turn,
                "Transport stream closed before the turn finished"
            );
            self.fail("stream closed before the turn completed".to_string());
        }
    }

    fn fail(&mut self, reason: String) {
        self.last_error = Some(reason);
        self.finish_turn(TurnLifecycleState::Errored);
    }

    fn finish_turn(&mut self, state: TurnLifecycleState) {
        self.transcript.close_open_messages();
        self.stream_rx = None;
        self.set_state(state);
        tracing::info!(turn = ?self.current_turn, state = ?state, "Turn finished");
    }

    /// Set state and notify the surface
    fn set_state(&mut self, state: TurnLifecycleState) {
        self.state = state;
        self.send(TranscriptUpdate::StateChanged { state });
    }

    /// Send a snapshot of the entry at `index`; `previous_len` marks an
    /// in-place update
    fn send_entry(&mut self, index: usize, previous_len: Option<usize>) {
        let Some(entry) = self.transcript.get(index).cloned() else {
            return;
        };
        let state = self.state;
        let update = match previous_len {
            Some(previous_len) => TranscriptUpdate::EntryUpdated {
                index,
                entry,
                previous_len,
                state,
            },
            None => TranscriptUpdate::EntryAppended {
                index,
                entry,
                state,
            },
        };
        self.send(update);
    }

    /// Queue an update for the surface and hand over what fits
    fn send(&mut self, update: TranscriptUpdate) {
        self.backlog.push_back(update);
        self.drain_backlog();
    }

    /// Move queued updates into the channel until it is full
    fn drain_backlog(&mut self) {
        while let Some(update) = self.backlog.pop_front() {
            match self.tx.try_send(update) {
                Ok(()) => {}
                Err(TrySendError::Full(update)) => {
                    self.backlog.push_front(update);
                    tracing::debug!(queued = self.backlog.len(), "Surface channel full");
                    return;
                }
                Err(TrySendError::Closed(_)) => {
                    tracing::warn!(
                        dropped = self.backlog.len() + 1,
                        "Surface channel closed, dropping updates"
                    );
                    self.backlog.clear();
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::ScriptedTransport;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn coordinator(
        turns: Vec<Vec<TransportEvent>>,
    ) -> (Coordinator<ScriptedTransport>, mpsc::Receiver<TranscriptUpdate>) {
        let (tx, rx) = mpsc::channel(256);
        let coordinator =
            Coordinator::new(ScriptedTransport::new(turns), CoordinatorConfig::default(), tx);
        (coordinator, rx)
    }

    fn drain(rx: &mut mpsc::Receiver<TranscriptUpdate>) -> Vec<TranscriptUpdate> {
        let mut updates = Vec::new();
        while let Ok(update) = rx.try_recv() {
            updates.push(update);
        }
        updates
    }

    #[tokio::test]
    async fn test_coordinator_creation() {
        let (coordinator, _rx) = coordinator(Vec::new());

        assert_eq!(coordinator.current_lifecycle_state(), TurnLifecycleState::Idle);
        assert!(coordinator.accepts_input());
        assert!(coordinator.current_entries().is_empty());
        assert_eq!(coordinator.transport().name(), "scripted");
    }

    #[tokio::test]
    async fn test_submit_appends_user_entry() {
        let (mut coordinator, mut rx) = coordinator(vec![vec![TransportEvent::TurnComplete]]);

        coordinator.submit("hello").await.unwrap();

        assert_eq!(
            coordinator.current_lifecycle_state(),
            TurnLifecycleState::Submitted
        );
        let updates = drain(&mut rx);
        assert_eq!(updates.len(), 1);
        assert!(matches!(
            updates[0],
            TranscriptUpdate::EntryAppended {
                index: 0,
                state: TurnLifecycleState::Submitted,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_poll_stream_applies_buffered_events() {
        let (mut coordinator, mut rx) = coordinator(vec![vec![
            TransportEvent::text("Hel"),
            TransportEvent::text("lo"),
            TransportEvent::TurnComplete,
        ]]);

        coordinator.submit("hi").await.unwrap();
        assert!(coordinator.poll_stream());
        assert!(!coordinator.poll_stream());

        assert_eq!(coordinator.current_lifecycle_state(), TurnLifecycleState::Done);
        let reply = coordinator.current_entries()[1].as_message().unwrap();
        assert_eq!(reply.body, "Hello");
        assert!(!reply.streaming);

        // user entry, two text updates, terminal state
        assert_eq!(drain(&mut rx).len(), 4);
    }

    #[tokio::test]
    async fn test_first_content_moves_to_streaming() {
        let (mut coordinator, mut rx) = coordinator(vec![vec![TransportEvent::text("a")]]);
        coordinator.submit("hi").await.unwrap();
        drain(&mut rx);

        assert!(coordinator.apply_event(TransportEvent::text("")));
        assert_eq!(
            coordinator.current_lifecycle_state(),
            TurnLifecycleState::Streaming
        );
        assert!(coordinator.is_loading());
        assert_eq!(
            drain(&mut rx),
            vec![TranscriptUpdate::StateChanged {
                state: TurnLifecycleState::Streaming
            }]
        );

        // Empty text only drives the transition
        assert!(!coordinator.apply_event(TransportEvent::text("")));
        assert_eq!(coordinator.current_entries().len(), 1);
    }

    #[tokio::test]
    async fn test_tool_result_does_not_start_streaming() {
        let (mut coordinator, _rx) = coordinator(vec![Vec::new()]);
        coordinator.submit("hi").await.unwrap();

        assert!(!coordinator.apply_event(TransportEvent::tool_result("1", json!(true))));
        assert_eq!(
            coordinator.current_lifecycle_state(),
            TurnLifecycleState::Submitted
        );

        assert!(coordinator.apply_event(TransportEvent::ToolCallDelta(ToolCallDelta::new("1"))));
        assert_eq!(
            coordinator.current_lifecycle_state(),
            TurnLifecycleState::Streaming
        );
    }

    #[tokio::test]
    async fn test_turn_complete_from_submitted() {
        let (mut coordinator, _rx) = coordinator(vec![vec![TransportEvent::TurnComplete]]);
        coordinator.submit("hi").await.unwrap();

        assert_eq!(coordinator.run_turn().await, TurnLifecycleState::Done);
        assert_eq!(coordinator.current_entries().len(), 1);
    }

    #[tokio::test]
    async fn test_open_failure_errors_turn() {
        let (mut coordinator, _rx) = coordinator(Vec::new());

        coordinator.submit("hi").await.unwrap();

        assert_eq!(
            coordinator.current_lifecycle_state(),
            TurnLifecycleState::Errored
        );
        assert!(coordinator.last_error().is_some());
        assert!(coordinator.accepts_input());
        assert_eq!(coordinator.current_entries().len(), 1);
    }

    #[tokio::test]
    async fn test_stream_closed_without_terminal_event_errors() {
        let (mut coordinator, _rx) = coordinator(vec![vec![TransportEvent::text("partial")]]);
        coordinator.submit("hi").await.unwrap();

        assert_eq!(coordinator.run_turn().await, TurnLifecycleState::Errored);
        assert_eq!(
            coordinator.last_error(),
            Some("stream closed before the turn completed")
        );
        assert_eq!(
            coordinator.current_entries()[1].as_message().unwrap().body,
            "partial"
        );
    }

    #[tokio::test]
    async fn test_events_outside_turn_ignored() {
        let (mut coordinator, mut rx) = coordinator(Vec::new());

        assert!(!coordinator.apply_event(TransportEvent::text("stale")));
        assert!(!coordinator.apply_event(TransportEvent::TurnComplete));
        assert!(coordinator.current_entries().is_empty());
        assert_eq!(coordinator.current_lifecycle_state(), TurnLifecycleState::Idle);
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn test_descriptors_follow_tool_entries() {
        let (mut coordinator, _rx) = coordinator(vec![vec![
            TransportEvent::text("Creating it."),
            TransportEvent::ToolCallDelta(
                ToolCallDelta::new("1")
                    .with_tool_name("file_manager")
                    .with_args(json!({"command": "delete", "path": "/a/Old.jsx"})),
            ),
            TransportEvent::TurnComplete,
        ]]);

        coordinator.submit("remove it").await.unwrap();
        coordinator.run_turn().await;

        let descriptors = coordinator.descriptors();
        assert_eq!(descriptors.len(), 1);
        assert_eq!(descriptors[0].0, 2);
        assert_eq!(descriptors[0].1.to_string(), "Deleting Old.jsx");
    }

    #[tokio::test]
    async fn test_history_sent_with_next_turn() {
        let (mut coordinator, _rx) = coordinator(vec![
            vec![TransportEvent::text("first reply"), TransportEvent::TurnComplete],
            vec![TransportEvent::TurnComplete],
        ]);

        coordinator.submit("one").await.unwrap();
        coordinator.run_turn().await;
        coordinator.submit("two").await.unwrap();
        coordinator.run_turn().await;

        assert_eq!(coordinator.transcript().history(0).len(), 3);
        assert!(coordinator.current_turn().is_some());
    }

    #[test]
    fn test_submit_error_display() {
        assert_eq!(SubmitError::EmptyInput.to_string(), "input is empty");
        assert!(SubmitError::TurnInFlight(TurnLifecycleState::Streaming)
            .to_string()
            .contains("Streaming"));
    }
}

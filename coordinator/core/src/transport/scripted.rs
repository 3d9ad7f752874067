//! Scripted transport
//!
//! Replays recorded turns instead of calling a model. Each `open_stream` call
//! takes the next recorded turn and hands back a channel with all of its
//! events already buffered, then closes it.

use std::collections::VecDeque;

use anyhow::anyhow;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use super::traits::{ModelTransport, TransportEvent, TurnRequest};

/// One recorded turn: the prompt that was sent and what came back
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ScriptedTurn {
    /// User input for the turn
    pub prompt: String,
    /// Events in arrival order
    #[serde(default)]
    pub events: Vec<TransportEvent>,
}

/// A recorded session, as stored on disk
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionScript {
    /// Turns in submission order
    #[serde(default)]
    pub turns: Vec<ScriptedTurn>,
}

impl SessionScript {
    /// Parse a session from JSON
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a valid session.
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    /// Build a transport that replays these turns
    #[must_use]
    pub fn transport(&self) -> ScriptedTransport {
        ScriptedTransport::new(self.turns.iter().map(|turn| turn.events.clone()).collect())
    }
}

/// Transport that replays pre-recorded turns
pub struct ScriptedTransport {
    turns: Mutex<VecDeque<Vec<TransportEvent>>>,
}

impl ScriptedTransport {
    /// Create a transport from per-turn event lists
    #[must_use]
    pub fn new(turns: Vec<Vec<TransportEvent>>) -> Self {
        Self {
            turns: Mutex::new(turns.into()),
        }
    }

    /// Turns not yet replayed
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.turns.lock().len()
    }
}

#[async_trait]
impl ModelTransport for ScriptedTransport {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn open_stream(
        &self,
        request: &TurnRequest,
    ) -> anyhow::Result<mpsc::Receiver<TransportEvent>> {
        let events = self
            .turns
            .lock()
            .pop_front()
            .ok_or_else(|| anyhow!("no scripted turn left for prompt {:?}", request.prompt))?;

        tracing::debug!(
            events = events.len(),
            model = %request.model,
            "Replaying scripted turn"
        );

        let (tx, rx) = mpsc::channel(events.len().max(1));
        for event in events {
            tx.try_send(event)
                .map_err(|e| anyhow!("scripted stream rejected event: {e}"))?;
        }
        Ok(rx)
    }
}

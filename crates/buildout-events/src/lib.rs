#![forbid(unsafe_code)]
#![warn(
    unused,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![allow(clippy::module_name_repetitions)]

//! Event bus for standardization runs.
//!
//! The bus provides a typed event enum, sequential identifiers, and replay of
//! recent events for subscribers that attach after a run has started.
//! Internally it uses `tokio::broadcast` with a bounded buffer; when the
//! channel overflows, the oldest events are dropped.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::sync::broadcast::{Receiver, Sender};
use uuid::Uuid;

/// Identifier assigned to each published event.
pub type EventId = u64;

/// Default buffer size for the in-memory replay ring.
const DEFAULT_REPLAY_CAPACITY: usize = 256;

/// States a standardization run moves through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    /// Waiting for a completed build.
    Idle,
    /// Validating metadata and computing the destination.
    Planning,
    /// Removing any previous standardized output.
    Cleaning,
    /// Copying platform output into the destination.
    Copying,
    /// Output is in place.
    Done,
    /// Opening the destination in the host file browser.
    Revealing,
    /// The build did not succeed or a step failed.
    Failed,
    /// Nothing to do for this build.
    Skipped,
}

impl RunState {
    /// Stable lowercase label used in logs and events.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Planning => "planning",
            Self::Cleaning => "cleaning",
            Self::Copying => "copying",
            Self::Done => "done",
            Self::Revealing => "revealing",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
        }
    }

    /// Whether no further transitions follow this state.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Failed | Self::Skipped)
    }
}

/// Typed events describing a standardization run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A completed build was received.
    RunStarted {
        /// Run identifier.
        run_id: Uuid,
        /// Host name of the build target.
        target: String,
        /// Build output location reported by the host.
        output_path: String,
    },
    /// The run moved to a new state.
    StateChanged {
        /// Run identifier.
        run_id: Uuid,
        /// State entered.
        state: RunState,
    },
    /// Standardized output was produced.
    RunCompleted {
        /// Run identifier.
        run_id: Uuid,
        /// Destination folder.
        destination: String,
        /// Number of files copied.
        files_copied: u64,
        /// Number of bytes copied.
        bytes_copied: u64,
    },
    /// The run stopped without producing output.
    RunFailed {
        /// Run identifier.
        run_id: Uuid,
        /// Operation that failed.
        operation: String,
        /// Human-readable failure summary.
        message: String,
    },
    /// The build needed no standardization.
    RunSkipped {
        /// Run identifier.
        run_id: Uuid,
        /// Host name of the build target.
        target: String,
        /// Why the run was skipped.
        reason: String,
    },
}

impl Event {
    /// Machine-friendly discriminator for consumers.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::RunStarted { .. } => "run_started",
            Self::StateChanged { .. } => "state_changed",
            Self::RunCompleted { .. } => "run_completed",
            Self::RunFailed { .. } => "run_failed",
            Self::RunSkipped { .. } => "run_skipped",
        }
    }

    /// Run the event belongs to.
    #[must_use]
    pub const fn run_id(&self) -> Uuid {
        match self {
            Self::RunStarted { run_id, .. }
            | Self::StateChanged { run_id, .. }
            | Self::RunCompleted { run_id, .. }
            | Self::RunFailed { run_id, .. }
            | Self::RunSkipped { run_id, .. } => *run_id,
        }
    }
}

/// Metadata wrapper around events. Each envelope tracks the event id and
/// emission timestamp.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EventEnvelope {
    /// Sequential identifier.
    pub id: EventId,
    /// Emission time.
    pub timestamp: DateTime<Utc>,
    /// Wrapped event.
    pub event: Event,
}

/// Shared event bus built on top of `tokio::broadcast`.
#[derive(Clone, Debug)]
pub struct EventBus {
    sender: Sender<EventEnvelope>,
    buffer: Arc<Mutex<VecDeque<EventEnvelope>>>,
    next_id: Arc<AtomicU64>,
    replay_capacity: usize,
}

impl EventBus {
    /// Construct a new bus with the provided capacity.
    ///
    /// The broadcast channel uses the same capacity as the replay buffer.
    /// A zero capacity is raised to one.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            buffer: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            next_id: Arc::new(AtomicU64::new(1)),
            replay_capacity: capacity,
        }
    }

    /// Construct a bus with the default buffer size.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_REPLAY_CAPACITY)
    }

    /// Publish a new event, assigning it a sequential identifier.
    ///
    /// Publishing never blocks and succeeds without subscribers.
    pub fn publish(&self, event: Event) -> EventId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let envelope = EventEnvelope {
            id,
            timestamp: Utc::now(),
            event,
        };

        {
            let mut buffer = self.buffer();
            if buffer.len() == self.replay_capacity {
                buffer.pop_front();
            }
            buffer.push_back(envelope.clone());
        }

        let _ = self.sender.send(envelope);
        id
    }

    /// Subscribe to the bus, replaying buffered events newer than `since_id`.
    #[must_use]
    pub fn subscribe(&self, since_id: Option<EventId>) -> EventStream {
        let mut backlog = VecDeque::new();
        // Hold the buffer lock while subscribing so no event is both replayed and received live.
        let buffer = self.buffer();
        if let Some(since) = since_id {
            backlog.extend(buffer.iter().filter(|item| item.id > since).cloned());
        }
        let receiver = self.sender.subscribe();
        drop(buffer);

        EventStream { backlog, receiver }
    }

    /// Events currently held in the replay buffer, oldest first.
    #[must_use]
    pub fn snapshot(&self) -> Vec<EventEnvelope> {
        self.buffer().iter().cloned().collect()
    }

    /// Returns the last assigned identifier, if any events have been published.
    #[must_use]
    pub fn last_event_id(&self) -> Option<EventId> {
        self.buffer().back().map(|event| event.id)
    }

    fn buffer(&self) -> MutexGuard<'_, VecDeque<EventEnvelope>> {
        self.buffer.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Stream wrapper that yields events either from the replay backlog or from the
/// live broadcast channel.
#[derive(Debug)]
pub struct EventStream {
    backlog: VecDeque<EventEnvelope>,
    receiver: Receiver<EventEnvelope>,
}

impl EventStream {
    /// Receive the next event, respecting the replay backlog first.
    ///
    /// Returns `None` once every bus handle has been dropped.
    pub async fn next(&mut self) -> Option<EventEnvelope> {
        if let Some(event) = self.backlog.pop_front() {
            return Some(event);
        }

        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(_)) => {}
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

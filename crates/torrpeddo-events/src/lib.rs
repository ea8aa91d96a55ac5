//! In-process event bus for transfer lifecycle notifications.
//!
//! Events carry sequential identifiers and the bus keeps a bounded replay ring so late
//! subscribers can catch up from a known id. Delivery uses `tokio::broadcast`; when a
//! subscriber lags, the oldest events are dropped for that subscriber only.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::{self, Receiver, Sender};

/// Identifier assigned to each published event.
pub type EventId = u64;

const DEFAULT_REPLAY_CAPACITY: usize = 1_024;

/// Transfer lifecycle events. Transfer identifiers are lowercase hex strings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A descriptor was accepted and a pending record created.
    TransferAdded {
        /// Transfer identifier.
        transfer_id: String,
        /// Where the descriptor came from (`magnet` or `metainfo`).
        source: String,
    },
    /// The engine accepted the transfer.
    TransferRegistered {
        /// Transfer identifier.
        transfer_id: String,
    },
    /// The engine rejected the transfer; the record is now terminal.
    RegistrationFailed {
        /// Transfer identifier.
        transfer_id: String,
        /// Engine-provided reason.
        message: String,
    },
    /// Transfer paused by the operator.
    TransferPaused {
        /// Transfer identifier.
        transfer_id: String,
    },
    /// Transfer resumed by the operator.
    TransferResumed {
        /// Transfer identifier.
        transfer_id: String,
    },
    /// Transfer detached from the engine but kept visible.
    TransferCancelled {
        /// Transfer identifier.
        transfer_id: String,
    },
    /// Transfer dropped from the registry.
    TransferRemoved {
        /// Transfer identifier.
        transfer_id: String,
        /// Whether payload deletion was requested.
        with_data: bool,
    },
    /// Payload deletion queued behind the grace interval.
    DeletionScheduled {
        /// Transfer identifier.
        transfer_id: String,
        /// Path that will be removed.
        path: String,
    },
    /// Payload deletion finished (or the path was already gone).
    DeletionCompleted {
        /// Transfer identifier.
        transfer_id: String,
        /// Path that was removed.
        path: String,
    },
    /// Payload deletion failed; the path may still exist.
    DeletionFailed {
        /// Transfer identifier.
        transfer_id: String,
        /// Path that could not be removed.
        path: String,
        /// Failure detail.
        message: String,
    },
    /// Default save directory changed.
    DirectoryChanged {
        /// New directory.
        path: String,
    },
    /// Engine health changed; empty means healthy.
    HealthChanged {
        /// Degraded components.
        degraded: Vec<String>,
    },
}

impl Event {
    /// Machine-friendly discriminator used for metrics labels.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::TransferAdded { .. } => "transfer_added",
            Self::TransferRegistered { .. } => "transfer_registered",
            Self::RegistrationFailed { .. } => "registration_failed",
            Self::TransferPaused { .. } => "transfer_paused",
            Self::TransferResumed { .. } => "transfer_resumed",
            Self::TransferCancelled { .. } => "transfer_cancelled",
            Self::TransferRemoved { .. } => "transfer_removed",
            Self::DeletionScheduled { .. } => "deletion_scheduled",
            Self::DeletionCompleted { .. } => "deletion_completed",
            Self::DeletionFailed { .. } => "deletion_failed",
            Self::DirectoryChanged { .. } => "directory_changed",
            Self::HealthChanged { .. } => "health_changed",
        }
    }

    /// Transfer identifier the event refers to, if any.
    #[must_use]
    pub fn transfer_id(&self) -> Option<&str> {
        match self {
            Self::TransferAdded { transfer_id, .. }
            | Self::TransferRegistered { transfer_id }
            | Self::RegistrationFailed { transfer_id, .. }
            | Self::TransferPaused { transfer_id }
            | Self::TransferResumed { transfer_id }
            | Self::TransferCancelled { transfer_id }
            | Self::TransferRemoved { transfer_id, .. }
            | Self::DeletionScheduled { transfer_id, .. }
            | Self::DeletionCompleted { transfer_id, .. }
            | Self::DeletionFailed { transfer_id, .. } => Some(transfer_id),
            Self::DirectoryChanged { .. } | Self::HealthChanged { .. } => None,
        }
    }
}

/// Event plus its sequence number and emission time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EventEnvelope {
    /// Sequential identifier.
    pub id: EventId,
    /// Emission timestamp.
    pub timestamp: DateTime<Utc>,
    /// Payload.
    pub event: Event,
}

/// Shared event bus built on top of `tokio::broadcast`.
#[derive(Clone)]
pub struct EventBus {
    sender: Sender<EventEnvelope>,
    buffer: Arc<Mutex<VecDeque<EventEnvelope>>>,
    next_id: Arc<AtomicU64>,
    replay_capacity: usize,
}

impl EventBus {
    /// Construct a bus whose broadcast channel and replay ring share `capacity`.
    ///
    /// A zero capacity is bumped to one.
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

    /// Construct a bus with the default replay size.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_REPLAY_CAPACITY)
    }

    /// Publish an event, assigning it the next sequential identifier.
    pub fn publish(&self, event: Event) -> EventId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let envelope = EventEnvelope {
            id,
            timestamp: Utc::now(),
            event,
        };

        {
            let mut buffer = self.ring();
            if buffer.len() == self.replay_capacity {
                buffer.pop_front();
            }
            buffer.push_back(envelope.clone());
        }

        let _ = self.sender.send(envelope);
        id
    }

    /// Subscribe to live events, first replaying buffered events newer than `since_id`.
    #[must_use]
    pub fn subscribe(&self, since_id: Option<EventId>) -> EventStream {
        let receiver = self.sender.subscribe();
        let backlog = since_id.map_or_else(VecDeque::new, |since| {
            self.ring()
                .iter()
                .filter(|item| item.id > since)
                .cloned()
                .collect()
        });
        EventStream { backlog, receiver }
    }

    /// Last assigned identifier, if anything has been published.
    #[must_use]
    pub fn last_event_id(&self) -> Option<EventId> {
        self.ring().back().map(|event| event.id)
    }

    fn ring(&self) -> MutexGuard<'_, VecDeque<EventEnvelope>> {
        self.buffer.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Yields replayed events first, then live ones.
pub struct EventStream {
    backlog: VecDeque<EventEnvelope>,
    receiver: Receiver<EventEnvelope>,
}

impl EventStream {
    /// Receive the next event; `None` once the bus is gone.
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

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::time::Duration;
    use tokio::task;
    use tokio::time::timeout;

    fn removed(index: usize) -> Event {
        Event::TransferRemoved {
            transfer_id: format!("{index:040x}"),
            with_data: index % 2 == 0,
        }
    }

    #[tokio::test]
    async fn sequential_ids_and_replay() {
        let bus = EventBus::with_capacity(16);

        let mut last_id = 0;
        for i in 0..5 {
            last_id = bus.publish(removed(i));
        }
        assert_eq!(last_id, 5);
        assert_eq!(bus.last_event_id(), Some(5));

        let mut stream = bus.subscribe(Some(2));
        let mut received = Vec::new();
        for _ in 0..3 {
            if let Some(event) = stream.next().await {
                received.push(event.id);
            }
        }
        assert_eq!(received, vec![3, 4, 5]);
    }

    #[tokio::test]
    async fn replay_ring_drops_oldest_when_full() {
        let bus = EventBus::with_capacity(2);
        for i in 0..4 {
            bus.publish(removed(i));
        }
        let mut stream = bus.subscribe(Some(0));
        assert_eq!(stream.next().await.map(|event| event.id), Some(3));
        assert_eq!(stream.next().await.map(|event| event.id), Some(4));
    }

    #[test]
    fn events_serialize_with_snake_case_tag() {
        let event = Event::DeletionFailed {
            transfer_id: "ab".into(),
            path: "/tmp/x".into(),
            message: "busy".into(),
        };
        let json = serde_json::to_value(&event).expect("serialize");
        assert_eq!(json["type"], "deletion_failed");
        assert_eq!(event.kind(), "deletion_failed");
        assert_eq!(event.transfer_id(), Some("ab"));
        assert_eq!(
            Event::DirectoryChanged { path: "/d".into() }.transfer_id(),
            None
        );
    }

    #[tokio::test]
    async fn concurrent_publishers_are_all_delivered() {
        let bus = Arc::new(EventBus::with_capacity(512));
        let mut stream = bus.subscribe(None);

        let publisher = {
            let bus = Arc::clone(&bus);
            task::spawn(async move {
                for i in 0..300 {
                    bus.publish(removed(i));
                }
            })
        };

        let consumer = task::spawn(async move {
            let mut ids = HashSet::new();
            while ids.len() < 300 {
                match stream.next().await {
                    Some(event) => {
                        ids.insert(event.id);
                    }
                    None => break,
                }
            }
            ids
        });

        publisher.await.expect("publisher task panicked");
        let ids = timeout(Duration::from_secs(5), consumer)
            .await
            .expect("consumer timed out")
            .expect("consumer task panicked");
        assert_eq!(ids.len(), 300);
    }
}

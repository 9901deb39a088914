//! Live update hub: fan-out of "state changed" events to WebSocket sessions.
//!
//! One process-wide broadcast channel carries every event; each session keeps
//! the set of service channels it joined and filters queue events against it
//! (slot events go to everyone, as the original system broadcast them
//! globally). Delivery is at-most-once and best-effort: no ack, no replay,
//! and a lagging subscriber simply drops events.

use serde::Serialize;
use tokio::sync::broadcast;

use crate::models::SlotOwner;
use crate::queue::QueueStatus;

/// Buffers connection-time bursts; a receiver further behind than this lags.
const BROADCAST_CAPACITY: usize = 256;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum LiveEvent {
    QueueUpdated {
        service_id: String,
        queue: QueueStatus,
        action: String,
    },
    SlotUpdated {
        slot_id: Option<String>,
        owner: Option<SlotOwner>,
        action: String,
    },
}

impl LiveEvent {
    pub fn queue_updated(service_id: &str, queue: QueueStatus, action: &str) -> Self {
        LiveEvent::QueueUpdated {
            service_id: service_id.to_string(),
            queue,
            action: action.to_string(),
        }
    }

    pub fn slot_updated(slot_id: Option<&str>, owner: Option<SlotOwner>, action: &str) -> Self {
        LiveEvent::SlotUpdated {
            slot_id: slot_id.map(str::to_string),
            owner,
            action: action.to_string(),
        }
    }
}

#[derive(Clone)]
pub struct LiveHub {
    tx: broadcast::Sender<LiveEvent>,
}

impl Default for LiveHub {
    fn default() -> Self {
        Self::new()
    }
}

impl LiveHub {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self { tx }
    }

    /// Publish after the store write completes. Fan-out is outside any commit
    /// boundary; send errors (no subscribers) are ignored.
    pub fn publish(&self, event: LiveEvent) {
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LiveEvent> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_status() -> QueueStatus {
        QueueStatus {
            queue: Vec::new(),
            queue_length: 0,
            avg_wait_time: 0,
            service: None,
        }
    }

    #[tokio::test]
    async fn subscriber_receives_published_events() {
        let hub = LiveHub::new();
        let mut rx = hub.subscribe();

        hub.publish(LiveEvent::queue_updated("svc-1", empty_status(), "user-joined"));

        match rx.recv().await.unwrap() {
            LiveEvent::QueueUpdated {
                service_id, action, ..
            } => {
                assert_eq!(service_id, "svc-1");
                assert_eq!(action, "user-joined");
            }
            other => panic!("expected QueueUpdated, got {other:?}"),
        }
    }

    #[test]
    fn publish_without_subscribers_is_a_no_op() {
        let hub = LiveHub::new();
        assert_eq!(hub.subscriber_count(), 0);
        hub.publish(LiveEvent::slot_updated(Some("slot-1"), None, "booked"));
    }

    #[tokio::test]
    async fn events_fan_out_to_every_subscriber() {
        let hub = LiveHub::new();
        let mut a = hub.subscribe();
        let mut b = hub.subscribe();
        assert_eq!(hub.subscriber_count(), 2);

        hub.publish(LiveEvent::slot_updated(None, None, "cancelled"));

        for rx in [&mut a, &mut b] {
            match rx.recv().await.unwrap() {
                LiveEvent::SlotUpdated { action, .. } => assert_eq!(action, "cancelled"),
                other => panic!("expected SlotUpdated, got {other:?}"),
            }
        }
    }
}

//! Event bus publishing crowd lifecycle changes.
//!
//! Downstream systems (HUD counters, audio cues) react to spawns and
//! despawns by draining the bus once per frame instead of polling the
//! registry.

use crossbeam_channel::{bounded, Receiver, Sender};
use glam::Vec3;
use joyride_common::ids::AgentId;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Default event channel capacity.
const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Why an agent was removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DespawnReason {
    /// Beyond the despawn distance from the player
    OutOfRange,
    /// Behind the player for longer than the allowed delay
    BehindPlayer,
}

/// Crowd changes other systems can react to.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum CrowdEvent {
    /// A pedestrian entered the world
    Spawned {
        /// Agent created
        agent: AgentId,
        /// World position it appeared at
        position: Vec3,
    },
    /// A pedestrian left the world
    Despawned {
        /// Agent removed
        agent: AgentId,
        /// Which predicate fired
        reason: DespawnReason,
    },
}

/// Bus broadcasting crowd events to subscribers.
#[derive(Debug)]
pub struct EventBus {
    /// Sender for broadcasting events
    sender: Sender<CrowdEvent>,
    /// Receiver for collecting events
    receiver: Receiver<CrowdEvent>,
    /// Channel capacity
    capacity: usize,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}

impl EventBus {
    /// Creates a new event bus with the given capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity);
        Self {
            sender,
            receiver,
            capacity,
        }
    }

    /// Publishes an event to the bus.
    ///
    /// Non-blocking; when the bus is full the event is dropped with a
    /// warning.
    pub fn publish(&self, event: CrowdEvent) {
        if self.sender.try_send(event).is_err() {
            warn!("Event bus full, dropping {:?}", event);
        }
    }

    /// Drains all pending events.
    pub fn drain(&self) -> Vec<CrowdEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.receiver.try_recv() {
            events.push(event);
        }
        events
    }

    /// Returns the number of pending events.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }

    /// Returns the channel capacity.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Creates a new sender handle for publishing events.
    #[must_use]
    pub fn sender(&self) -> Sender<CrowdEvent> {
        self.sender.clone()
    }
}

//! Event emission interface. The coordinator reports what happened; the
//! notification and UI layers subscribe from outside.

use crossbeam_channel::{Receiver, Sender, TrySendError};
use serde::Serialize;
use shared::{AntId, ColonyId, ResourceId, ResourceKind, TrailType};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum ForagingEvent {
    ColonyRegistered {
        colony: ColonyId,
    },
    ColonyUnregistered {
        colony: ColonyId,
        ants_released: usize,
    },
    ResourcePickedUp {
        tick: u64,
        ant: AntId,
        resource: ResourceId,
        kind: ResourceKind,
        amount: u32,
    },
    ResourceDelivered {
        tick: u64,
        ant: AntId,
        colony: ColonyId,
        kind: ResourceKind,
        amount: u32,
    },
    ResourceDepleted {
        tick: u64,
        resource: ResourceId,
    },
    ScentMarkerPlaced {
        x: f32,
        y: f32,
        trail: TrailType,
        strength: f32,
    },
    PheromoneAreaCleared {
        x: f32,
        y: f32,
        radius: f32,
        cells: usize,
    },
    AgentFailed {
        tick: u64,
        ant: AntId,
        reason: String,
    },
}

/// Receives every event the coordinator emits. Must not block.
pub trait EventSink: Send {
    fn emit(&mut self, event: &ForagingEvent);
}

/// Writes events to the `tracing` log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&mut self, event: &ForagingEvent) {
        match event {
            ForagingEvent::AgentFailed { tick, ant, reason } => {
                warn!(tick, ant = %ant, reason = %reason, "Agent skipped this tick");
            }
            ForagingEvent::ResourceDepleted { tick, resource } => {
                info!(tick, resource = %resource, "Resource node depleted");
            }
            ForagingEvent::ColonyRegistered { .. } | ForagingEvent::ColonyUnregistered { .. } => {
                info!(?event, "Colony lifecycle");
            }
            other => debug!(event = ?other, "Foraging event"),
        }
    }
}

/// Forwards events over a bounded channel. Events are dropped, never
/// waited on, when the subscriber falls behind.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: Sender<ForagingEvent>,
    dropped: u64,
}

impl ChannelSink {
    pub fn bounded(capacity: usize) -> (Self, Receiver<ForagingEvent>) {
        let (tx, rx) = crossbeam_channel::bounded(capacity);
        (Self { tx, dropped: 0 }, rx)
    }

    /// Events lost because the channel was full or closed.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

impl EventSink for ChannelSink {
    fn emit(&mut self, event: &ForagingEvent) {
        match self.tx.try_send(event.clone()) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => {
                self.dropped += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_sink_forwards_and_counts_drops() {
        let (mut sink, rx) = ChannelSink::bounded(1);
        let event = ForagingEvent::ColonyRegistered {
            colony: ColonyId(1),
        };
        sink.emit(&event);
        sink.emit(&event);
        assert_eq!(rx.try_recv().unwrap(), event);
        assert_eq!(sink.dropped(), 1);
        drop(rx);
        sink.emit(&event);
        assert_eq!(sink.dropped(), 2);
    }

    #[test]
    fn events_serialize_tagged() {
        let json = serde_json::to_value(ForagingEvent::ResourceDepleted {
            tick: 4,
            resource: ResourceId(2),
        })
        .unwrap();
        assert_eq!(json["event"], "resourceDepleted");
        assert_eq!(json["resource"], 2);
    }
}

//! Domain event notifier
//!
//! Status changes are announced after their transaction commits. Delivery
//! is fire-and-forget: a notifier never fails the operation that emitted
//! the event, and having no listener is normal.
//!
//! Wire shape: `{ "event": "trip:dispatched", "payload": { ... } }`.
//! Trip and maintenance events carry the full record; vehicle and driver
//! events carry `{ id, status }`.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::models::{DriverStatus, MaintenanceLog, Trip, VehicleStatus};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct VehicleStatusChange {
    pub id: i64,
    pub status: VehicleStatus,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DriverStatusChange {
    pub id: i64,
    pub status: DriverStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", content = "payload")]
pub enum FleetEvent {
    #[serde(rename = "trip:created")]
    TripCreated(Trip),
    #[serde(rename = "trip:dispatched")]
    TripDispatched(Trip),
    #[serde(rename = "trip:completed")]
    TripCompleted(Trip),
    #[serde(rename = "trip:cancelled")]
    TripCancelled(Trip),
    #[serde(rename = "vehicle:status_updated")]
    VehicleStatusUpdated(VehicleStatusChange),
    #[serde(rename = "driver:status_updated")]
    DriverStatusUpdated(DriverStatusChange),
    #[serde(rename = "maintenance:alert")]
    MaintenanceAlert(MaintenanceLog),
    #[serde(rename = "maintenance:completed")]
    MaintenanceCompleted(MaintenanceLog),
    #[serde(rename = "maintenance:deleted")]
    MaintenanceDeleted(MaintenanceLog),
}

impl FleetEvent {
    pub fn vehicle_status(id: i64, status: VehicleStatus) -> Self {
        FleetEvent::VehicleStatusUpdated(VehicleStatusChange { id, status })
    }

    pub fn driver_status(id: i64, status: DriverStatus) -> Self {
        FleetEvent::DriverStatusUpdated(DriverStatusChange { id, status })
    }

    /// Wire name of the event
    pub fn name(&self) -> &'static str {
        match self {
            FleetEvent::TripCreated(_) => "trip:created",
            FleetEvent::TripDispatched(_) => "trip:dispatched",
            FleetEvent::TripCompleted(_) => "trip:completed",
            FleetEvent::TripCancelled(_) => "trip:cancelled",
            FleetEvent::VehicleStatusUpdated(_) => "vehicle:status_updated",
            FleetEvent::DriverStatusUpdated(_) => "driver:status_updated",
            FleetEvent::MaintenanceAlert(_) => "maintenance:alert",
            FleetEvent::MaintenanceCompleted(_) => "maintenance:completed",
            FleetEvent::MaintenanceDeleted(_) => "maintenance:deleted",
        }
    }
}

pub trait EventNotifier: Send + Sync {
    fn notify(&self, event: FleetEvent);
}

/// Fan-out over a tokio broadcast channel. Slow subscribers lag and lose
/// the oldest events; they never block publishers.
#[derive(Clone)]
pub struct BroadcastNotifier {
    sender: broadcast::Sender<FleetEvent>,
}

impl BroadcastNotifier {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<FleetEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl EventNotifier for BroadcastNotifier {
    fn notify(&self, event: FleetEvent) {
        let name = event.name();
        match self.sender.send(event) {
            Ok(receivers) => debug!("📣 {} delivered to {} subscriber(s)", name, receivers),
            Err(_) => debug!("📣 {} emitted with no subscribers", name),
        }
    }
}

/// Log every event published on `notifier` until the channel closes.
pub fn spawn_event_logger(notifier: &BroadcastNotifier) -> tokio::task::JoinHandle<()> {
    let mut receiver = notifier.subscribe();
    tokio::spawn(async move {
        loop {
            match receiver.recv().await {
                Ok(event) => info!(event = event.name(), "Fleet event"),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!("Event logger lagged, skipped {} event(s)", skipped)
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_event_wire_shape() {
        let event = FleetEvent::vehicle_status(4, VehicleStatus::OnTrip);
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "vehicle:status_updated");
        assert_eq!(json["payload"]["id"], 4);
        assert_eq!(json["payload"]["status"], "on_trip");
        assert_eq!(event.name(), "vehicle:status_updated");
    }

    #[tokio::test]
    async fn test_broadcast_reaches_subscribers() {
        let notifier = BroadcastNotifier::new(16);
        let mut rx = notifier.subscribe();
        notifier.notify(FleetEvent::driver_status(2, DriverStatus::OffDuty));

        let received = rx.recv().await.unwrap();
        assert_eq!(received, FleetEvent::driver_status(2, DriverStatus::OffDuty));
    }

    #[test]
    fn test_broadcast_without_subscribers_is_fine() {
        let notifier = BroadcastNotifier::new(4);
        assert_eq!(notifier.subscriber_count(), 0);
        notifier.notify(FleetEvent::vehicle_status(1, VehicleStatus::Available));
    }
}

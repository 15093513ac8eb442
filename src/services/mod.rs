//! Services module
//!
//! Fleet coordination core: the trip and maintenance lifecycles, plus the
//! clock and event notifier they are wired with.

pub mod clock;
pub mod maintenance_service;
pub mod notifier;
pub mod trip_service;

pub use clock::{Clock, FixedClock, SystemClock};
pub use maintenance_service::MaintenanceService;
pub use notifier::{BroadcastNotifier, EventNotifier, FleetEvent};
pub use trip_service::TripService;

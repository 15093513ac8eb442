//! Domain models
//!
//! Rows of the `vehicles`, `drivers`, `trips` and `maintenance_logs`
//! tables, plus the inputs of the coordination operations.

pub mod actor;
pub mod driver;
pub mod maintenance;
pub mod trip;
pub mod vehicle;

pub use actor::{Actor, Role};
pub use driver::{Driver, DriverStatus, NewDriver};
pub use maintenance::{
    MaintenanceFilters, MaintenanceListing, MaintenanceLog, MaintenanceLogChanges, MaintenanceStatus, NewMaintenanceLog,
};
pub use trip::{NewTrip, Trip, TripFilters, TripListing, TripStatus};
pub use vehicle::{NewVehicle, Vehicle, VehicleStatus, VehicleType};

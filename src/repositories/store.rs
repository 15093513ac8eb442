//! Entity store contract
//!
//! The coordination services never talk to a database directly. They open a
//! [`StoreTransaction`], lock the rows they are about to inspect, write the
//! new state and commit. Anything that fails before `commit` leaves the
//! store untouched.
//!
//! Lock order inside one transaction is always trip or maintenance log
//! first, then vehicle, then driver.

use async_trait::async_trait;
use rust_decimal::Decimal;
use tracing::warn;

use crate::models::{
    Driver, MaintenanceFilters, MaintenanceListing, MaintenanceLog, NewMaintenanceLog, NewTrip, Trip, TripFilters,
    TripListing, Vehicle,
};
use crate::utils::errors::FleetResult;

#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Open a read-write transaction.
    async fn begin(&self) -> FleetResult<Box<dyn StoreTransaction>>;

    async fn get_vehicle(&self, id: i64) -> FleetResult<Option<Vehicle>>;

    async fn get_driver(&self, id: i64) -> FleetResult<Option<Driver>>;

    async fn get_trip(&self, id: i64) -> FleetResult<Option<Trip>>;

    async fn get_maintenance_log(&self, id: i64) -> FleetResult<Option<MaintenanceLog>>;

    /// Newest first, joined with vehicle and driver names
    async fn list_trips(&self, filters: &TripFilters) -> FleetResult<Vec<TripListing>>;

    /// Most recent service date first, joined with the vehicle name and plate
    async fn list_maintenance_logs(&self, filters: &MaintenanceFilters) -> FleetResult<Vec<MaintenanceListing>>;
}

/// One atomic unit of work. Dropping it without `commit` rolls it back.
#[async_trait]
pub trait StoreTransaction: Send {
    /// Read a vehicle and hold an exclusive lock on it until the
    /// transaction ends.
    async fn lock_vehicle(&mut self, id: i64) -> FleetResult<Option<Vehicle>>;

    async fn lock_driver(&mut self, id: i64) -> FleetResult<Option<Driver>>;

    async fn lock_trip(&mut self, id: i64) -> FleetResult<Option<Trip>>;

    async fn lock_maintenance_log(&mut self, id: i64) -> FleetResult<Option<MaintenanceLog>>;

    /// Insert a `draft` trip. A missing revenue is stored as zero.
    async fn insert_trip(&mut self, trip: &NewTrip, start_odometer: Decimal) -> FleetResult<Trip>;

    /// Persist status, end odometer and lifecycle timestamps.
    async fn save_trip(&mut self, trip: &Trip) -> FleetResult<()>;

    /// Persist status and odometer.
    async fn save_vehicle(&mut self, vehicle: &Vehicle) -> FleetResult<()>;

    /// Persist status and trip counters.
    async fn save_driver(&mut self, driver: &Driver) -> FleetResult<()>;

    /// Insert an `in_progress` log.
    async fn insert_maintenance_log(&mut self, log: &NewMaintenanceLog) -> FleetResult<MaintenanceLog>;

    /// Persist the editable fields, status and completion date.
    async fn save_maintenance_log(&mut self, log: &MaintenanceLog) -> FleetResult<()>;

    async fn delete_maintenance_log(&mut self, id: i64) -> FleetResult<()>;

    /// Number of `in_progress` logs for a vehicle, as seen by this
    /// transaction. Callers hold the vehicle lock, so the count cannot
    /// change under them.
    async fn count_open_maintenance_logs(&mut self, vehicle_id: i64) -> FleetResult<i64>;

    async fn commit(&mut self) -> FleetResult<()>;

    async fn rollback(&mut self) -> FleetResult<()>;
}

/// Commit `tx` when `outcome` succeeded, roll it back otherwise.
///
/// A failed commit surfaces as the commit error. A failed rollback is only
/// logged and the original error is returned.
pub async fn finish<T>(mut tx: Box<dyn StoreTransaction>, outcome: FleetResult<T>) -> FleetResult<T> {
    match outcome {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(e) => {
            if let Err(rollback_error) = tx.rollback().await {
                warn!("Rollback failed after '{}': {}", e, rollback_error);
            }
            Err(e)
        }
    }
}

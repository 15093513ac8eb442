//! Trip lifecycle
//!
//! Sole writer of trip status, and of the vehicle/driver status changes a
//! trip causes. Each operation runs in one store transaction: every check
//! happens before the first write, and events go out only after commit.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use tracing::{info, warn};

use super::clock::Clock;
use super::notifier::{EventNotifier, FleetEvent};
use crate::models::{Actor, Driver, NewTrip, Trip, TripFilters, TripListing, TripStatus, Vehicle};
use crate::repositories::{finish, EntityStore, StoreTransaction};
use crate::utils::errors::{FleetError, FleetResult};

/// Trip plus the resources whose status moved with it.
struct TripTransition {
    trip: Trip,
    vehicle: Option<Vehicle>,
    driver: Option<Driver>,
}

#[derive(Clone)]
pub struct TripService {
    store: Arc<dyn EntityStore>,
    notifier: Arc<dyn EventNotifier>,
    clock: Arc<dyn Clock>,
}

impl TripService {
    pub fn new(store: Arc<dyn EntityStore>, notifier: Arc<dyn EventNotifier>, clock: Arc<dyn Clock>) -> Self {
        Self { store, notifier, clock }
    }

    /// Create a `draft` trip after checking, in order: vehicle exists,
    /// cargo fits, driver exists, license valid today, license category
    /// matches, vehicle available, driver available.
    pub async fn create(&self, actor: &Actor, input: NewTrip) -> FleetResult<Trip> {
        let today = self.clock.today();
        let mut tx = self.store.begin().await?;
        let outcome = create_in(tx.as_mut(), &input, today).await;
        let trip = finish(tx, outcome).await.map_err(|e| log_rejection("create", actor, e))?;

        info!(
            actor = %actor,
            "✅ Trip {} created: vehicle {} / driver {}, {} -> {}",
            trip.id, trip.vehicle_id, trip.driver_id, trip.origin, trip.destination
        );
        self.notifier.notify(FleetEvent::TripCreated(trip.clone()));
        Ok(trip)
    }

    /// `draft -> dispatched`; reserves vehicle and driver.
    pub async fn dispatch(&self, actor: &Actor, trip_id: i64) -> FleetResult<Trip> {
        let now = self.clock.now();
        let mut tx = self.store.begin().await?;
        let outcome = dispatch_in(tx.as_mut(), trip_id, now).await;
        let transition = finish(tx, outcome).await.map_err(|e| log_rejection("dispatch", actor, e))?;

        info!(actor = %actor, "🚚 Trip {} dispatched", trip_id);
        Ok(self.announce(FleetEvent::TripDispatched(transition.trip.clone()), transition))
    }

    /// `dispatched -> completed`; frees vehicle and driver and records the
    /// vehicle's new odometer.
    pub async fn complete(&self, actor: &Actor, trip_id: i64, end_odometer: Decimal) -> FleetResult<Trip> {
        let now = self.clock.now();
        let mut tx = self.store.begin().await?;
        let outcome = complete_in(tx.as_mut(), trip_id, end_odometer, now).await;
        let transition = finish(tx, outcome).await.map_err(|e| log_rejection("complete", actor, e))?;

        info!(
            actor = %actor,
            "🏁 Trip {} completed at {} km",
            trip_id, end_odometer
        );
        Ok(self.announce(FleetEvent::TripCompleted(transition.trip.clone()), transition))
    }

    /// `draft|dispatched -> cancelled`. A dispatched trip gives its vehicle
    /// and driver back; a draft never held them.
    pub async fn cancel(&self, actor: &Actor, trip_id: i64) -> FleetResult<Trip> {
        let mut tx = self.store.begin().await?;
        let outcome = cancel_in(tx.as_mut(), trip_id).await;
        let transition = finish(tx, outcome).await.map_err(|e| log_rejection("cancel", actor, e))?;

        info!(actor = %actor, "🛑 Trip {} cancelled", trip_id);
        Ok(self.announce(FleetEvent::TripCancelled(transition.trip.clone()), transition))
    }

    pub async fn get(&self, trip_id: i64) -> FleetResult<Trip> {
        self.store
            .get_trip(trip_id)
            .await?
            .ok_or_else(|| FleetError::not_found("Trip", trip_id))
    }

    pub async fn list(&self, filters: &TripFilters) -> FleetResult<Vec<TripListing>> {
        self.store.list_trips(filters).await
    }

    fn announce(&self, trip_event: FleetEvent, transition: TripTransition) -> Trip {
        self.notifier.notify(trip_event);
        if let Some(vehicle) = &transition.vehicle {
            self.notifier.notify(FleetEvent::vehicle_status(vehicle.id, vehicle.status));
        }
        if let Some(driver) = &transition.driver {
            self.notifier.notify(FleetEvent::driver_status(driver.id, driver.status));
        }
        transition.trip
    }
}

fn log_rejection(operation: &str, actor: &Actor, e: FleetError) -> FleetError {
    if e.is_retryable() {
        tracing::error!(actor = %actor, "❌ Trip {} failed: {}", operation, e);
    } else {
        warn!(actor = %actor, code = e.kind(), "Trip {} rejected: {}", operation, e);
    }
    e
}

async fn lock_vehicle(tx: &mut dyn StoreTransaction, id: i64) -> FleetResult<Vehicle> {
    tx.lock_vehicle(id).await?.ok_or_else(|| FleetError::not_found("Vehicle", id))
}

async fn lock_driver(tx: &mut dyn StoreTransaction, id: i64) -> FleetResult<Driver> {
    tx.lock_driver(id).await?.ok_or_else(|| FleetError::not_found("Driver", id))
}

async fn lock_trip(tx: &mut dyn StoreTransaction, id: i64) -> FleetResult<Trip> {
    tx.lock_trip(id).await?.ok_or_else(|| FleetError::not_found("Trip", id))
}

fn ensure_assignable(vehicle: &Vehicle, driver: &Driver) -> FleetResult<()> {
    if !vehicle.status.is_assignable() {
        return Err(FleetError::VehicleUnavailable {
            vehicle_id: vehicle.id,
            current_status: vehicle.status,
        });
    }
    if !driver.status.is_assignable() {
        return Err(FleetError::DriverUnavailable {
            driver_id: driver.id,
            current_status: driver.status,
        });
    }
    Ok(())
}

async fn create_in(tx: &mut dyn StoreTransaction, input: &NewTrip, today: NaiveDate) -> FleetResult<Trip> {
    let vehicle = lock_vehicle(tx, input.vehicle_id).await?;
    if !vehicle.can_carry(input.cargo_weight_kg) {
        return Err(FleetError::CapacityExceeded {
            max_capacity: vehicle.max_load_capacity_kg,
            requested: input.cargo_weight_kg,
        });
    }

    let driver = lock_driver(tx, input.driver_id).await?;
    if !driver.license_valid_on(today) {
        return Err(FleetError::LicenseExpired {
            expiry_date: driver.license_expiry_date,
        });
    }
    if !driver.is_licensed_for(vehicle.vehicle_type) {
        return Err(FleetError::LicenseCategoryMismatch {
            driver_category: driver.license_category,
            vehicle_type: vehicle.vehicle_type,
        });
    }
    ensure_assignable(&vehicle, &driver)?;

    tx.insert_trip(input, vehicle.odometer_km).await
}

async fn dispatch_in(tx: &mut dyn StoreTransaction, trip_id: i64, now: DateTime<Utc>) -> FleetResult<TripTransition> {
    let mut trip = lock_trip(tx, trip_id).await?;
    if trip.status != TripStatus::Draft {
        return Err(FleetError::invalid_state("Trip", trip.id, trip.status, "trip is not in draft status"));
    }

    // Availability may have changed since the draft was created.
    let mut vehicle = lock_vehicle(tx, trip.vehicle_id).await?;
    let mut driver = lock_driver(tx, trip.driver_id).await?;
    ensure_assignable(&vehicle, &driver)?;

    trip.mark_dispatched(now);
    vehicle.assign_to_trip();
    driver.start_trip();

    tx.save_trip(&trip).await?;
    tx.save_vehicle(&vehicle).await?;
    tx.save_driver(&driver).await?;

    Ok(TripTransition {
        trip,
        vehicle: Some(vehicle),
        driver: Some(driver),
    })
}

async fn complete_in(
    tx: &mut dyn StoreTransaction,
    trip_id: i64,
    end_odometer: Decimal,
    now: DateTime<Utc>,
) -> FleetResult<TripTransition> {
    if end_odometer <= Decimal::ZERO {
        return Err(FleetError::InvalidInput("end odometer must be a positive number".to_string()));
    }

    let mut trip = lock_trip(tx, trip_id).await?;
    if trip.status != TripStatus::Dispatched {
        return Err(FleetError::invalid_state("Trip", trip.id, trip.status, "trip is not dispatched"));
    }
    if end_odometer < trip.start_odometer {
        return Err(FleetError::InvalidInput(format!(
            "end odometer {} is below start odometer {}",
            end_odometer, trip.start_odometer
        )));
    }

    let mut vehicle = lock_vehicle(tx, trip.vehicle_id).await?;
    let mut driver = lock_driver(tx, trip.driver_id).await?;

    trip.mark_completed(end_odometer, now);
    vehicle.finish_trip(end_odometer);
    driver.finish_trip();

    tx.save_trip(&trip).await?;
    tx.save_vehicle(&vehicle).await?;
    tx.save_driver(&driver).await?;

    Ok(TripTransition {
        trip,
        vehicle: Some(vehicle),
        driver: Some(driver),
    })
}

async fn cancel_in(tx: &mut dyn StoreTransaction, trip_id: i64) -> FleetResult<TripTransition> {
    let mut trip = lock_trip(tx, trip_id).await?;

    if trip.status.is_terminal() {
        return Err(FleetError::invalid_state(
            "Trip",
            trip.id,
            trip.status,
            "only draft or dispatched trips can be cancelled",
        ));
    }

    let (vehicle, driver) = if trip.status.holds_resources() {
        let mut vehicle = lock_vehicle(tx, trip.vehicle_id).await?;
        let mut driver = lock_driver(tx, trip.driver_id).await?;
        vehicle.release();
        driver.release();
        (Some(vehicle), Some(driver))
    } else {
        (None, None)
    };

    trip.mark_cancelled();
    tx.save_trip(&trip).await?;
    if let Some(vehicle) = &vehicle {
        tx.save_vehicle(vehicle).await?;
    }
    if let Some(driver) = &driver {
        tx.save_driver(driver).await?;
    }

    Ok(TripTransition { trip, vehicle, driver })
}

//! In-memory entity store
//!
//! Backs tests and local experiments. A transaction holds the table mutex
//! for its whole lifetime and works on a private copy of the tables, so
//! transactions are fully serialized and a rollback is simply dropping the
//! copy.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::store::{EntityStore, StoreTransaction};
use crate::models::{
    Driver, MaintenanceFilters, MaintenanceListing, MaintenanceLog, MaintenanceStatus, NewDriver, NewMaintenanceLog,
    NewTrip, NewVehicle, Trip, TripFilters, TripListing, TripStatus, Vehicle,
};
use crate::utils::errors::{FleetError, FleetResult};

#[derive(Debug, Clone, Default)]
struct Tables {
    vehicles: BTreeMap<i64, Vehicle>,
    drivers: BTreeMap<i64, Driver>,
    trips: BTreeMap<i64, Trip>,
    maintenance_logs: BTreeMap<i64, MaintenanceLog>,
    last_id: i64,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    fn trip_listing(&self, trip: &Trip) -> Option<TripListing> {
        let vehicle = self.vehicles.get(&trip.vehicle_id)?;
        let driver = self.drivers.get(&trip.driver_id)?;
        Some(TripListing {
            trip: trip.clone(),
            vehicle_name: vehicle.name.clone(),
            license_plate: vehicle.license_plate.clone(),
            driver_name: driver.name.clone(),
        })
    }

    fn maintenance_listing(&self, log: &MaintenanceLog) -> Option<MaintenanceListing> {
        let vehicle = self.vehicles.get(&log.vehicle_id)?;
        Some(MaintenanceListing {
            log: log.clone(),
            vehicle_name: vehicle.name.clone(),
            license_plate: vehicle.license_plate.clone(),
        })
    }
}

#[derive(Clone, Default)]
pub struct InMemoryEntityStore {
    tables: Arc<Mutex<Tables>>,
    fail_next_commit: Arc<AtomicBool>,
}

impl InMemoryEntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Administrative vehicle registration. License plates are unique.
    pub async fn insert_vehicle(&self, vehicle: NewVehicle) -> FleetResult<Vehicle> {
        let mut tables = self.tables.lock().await;
        if tables.vehicles.values().any(|v| v.license_plate == vehicle.license_plate) {
            return Err(FleetError::InvalidInput(format!(
                "License plate '{}' is already registered",
                vehicle.license_plate
            )));
        }
        let id = tables.next_id();
        let row = Vehicle {
            id,
            name: vehicle.name,
            model: vehicle.model,
            license_plate: vehicle.license_plate,
            vehicle_type: vehicle.vehicle_type,
            max_load_capacity_kg: vehicle.max_load_capacity_kg,
            odometer_km: vehicle.odometer_km,
            region: vehicle.region,
            acquisition_cost: vehicle.acquisition_cost,
            status: vehicle.status,
            created_at: Utc::now(),
        };
        tables.vehicles.insert(id, row.clone());
        Ok(row)
    }

    /// Administrative driver registration. License numbers are unique.
    pub async fn insert_driver(&self, driver: NewDriver) -> FleetResult<Driver> {
        let mut tables = self.tables.lock().await;
        if tables.drivers.values().any(|d| d.license_number == driver.license_number) {
            return Err(FleetError::InvalidInput(format!(
                "License number '{}' is already registered",
                driver.license_number
            )));
        }
        let id = tables.next_id();
        let row = Driver {
            id,
            name: driver.name,
            email: driver.email,
            phone: driver.phone,
            license_number: driver.license_number,
            license_category: driver.license_category,
            license_expiry_date: driver.license_expiry_date,
            status: driver.status,
            safety_score: driver.safety_score,
            total_trips: 0,
            completed_trips: 0,
            created_at: Utc::now(),
        };
        tables.drivers.insert(id, row.clone());
        Ok(row)
    }

    /// Make the next `commit` fail with a storage error, as a dropped
    /// database connection would.
    pub fn fail_next_commit(&self) {
        self.fail_next_commit.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl EntityStore for InMemoryEntityStore {
    async fn begin(&self) -> FleetResult<Box<dyn StoreTransaction>> {
        let guard = Arc::clone(&self.tables).lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(InMemoryTransaction {
            guard: Some(guard),
            working,
            fail_commit: Arc::clone(&self.fail_next_commit),
        }))
    }

    async fn get_vehicle(&self, id: i64) -> FleetResult<Option<Vehicle>> {
        Ok(self.tables.lock().await.vehicles.get(&id).cloned())
    }

    async fn get_driver(&self, id: i64) -> FleetResult<Option<Driver>> {
        Ok(self.tables.lock().await.drivers.get(&id).cloned())
    }

    async fn get_trip(&self, id: i64) -> FleetResult<Option<Trip>> {
        Ok(self.tables.lock().await.trips.get(&id).cloned())
    }

    async fn get_maintenance_log(&self, id: i64) -> FleetResult<Option<MaintenanceLog>> {
        Ok(self.tables.lock().await.maintenance_logs.get(&id).cloned())
    }

    async fn list_trips(&self, filters: &TripFilters) -> FleetResult<Vec<TripListing>> {
        let tables = self.tables.lock().await;
        // Ids are allocated in insertion order, so reverse id order is newest first.
        Ok(tables
            .trips
            .values()
            .rev()
            .filter(|trip| filters.matches(trip))
            .filter_map(|trip| tables.trip_listing(trip))
            .collect())
    }

    async fn list_maintenance_logs(&self, filters: &MaintenanceFilters) -> FleetResult<Vec<MaintenanceListing>> {
        let tables = self.tables.lock().await;
        let mut logs: Vec<MaintenanceListing> = tables
            .maintenance_logs
            .values()
            .filter(|log| filters.matches(log))
            .filter_map(|log| tables.maintenance_listing(log))
            .collect();
        logs.sort_by(|a, b| {
            b.log
                .service_date
                .cmp(&a.log.service_date)
                .then(b.log.id.cmp(&a.log.id))
        });
        Ok(logs)
    }
}

pub struct InMemoryTransaction {
    guard: Option<OwnedMutexGuard<Tables>>,
    working: Tables,
    fail_commit: Arc<AtomicBool>,
}

impl InMemoryTransaction {
    fn ensure_open(&self) -> FleetResult<()> {
        if self.guard.is_none() {
            return Err(FleetError::Storage("Transaction already finished".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl StoreTransaction for InMemoryTransaction {
    async fn lock_vehicle(&mut self, id: i64) -> FleetResult<Option<Vehicle>> {
        self.ensure_open()?;
        Ok(self.working.vehicles.get(&id).cloned())
    }

    async fn lock_driver(&mut self, id: i64) -> FleetResult<Option<Driver>> {
        self.ensure_open()?;
        Ok(self.working.drivers.get(&id).cloned())
    }

    async fn lock_trip(&mut self, id: i64) -> FleetResult<Option<Trip>> {
        self.ensure_open()?;
        Ok(self.working.trips.get(&id).cloned())
    }

    async fn lock_maintenance_log(&mut self, id: i64) -> FleetResult<Option<MaintenanceLog>> {
        self.ensure_open()?;
        Ok(self.working.maintenance_logs.get(&id).cloned())
    }

    async fn insert_trip(&mut self, trip: &NewTrip, start_odometer: Decimal) -> FleetResult<Trip> {
        self.ensure_open()?;
        if !self.working.vehicles.contains_key(&trip.vehicle_id) {
            return Err(FleetError::Storage(format!("Foreign key violation: vehicle {}", trip.vehicle_id)));
        }
        if !self.working.drivers.contains_key(&trip.driver_id) {
            return Err(FleetError::Storage(format!("Foreign key violation: driver {}", trip.driver_id)));
        }

        let id = self.working.next_id();
        let row = Trip {
            id,
            vehicle_id: trip.vehicle_id,
            driver_id: trip.driver_id,
            origin: trip.origin.clone(),
            destination: trip.destination.clone(),
            cargo_description: trip.cargo_description.clone(),
            cargo_weight_kg: trip.cargo_weight_kg,
            revenue: trip.revenue.unwrap_or(Decimal::ZERO),
            start_odometer,
            end_odometer: None,
            status: TripStatus::Draft,
            created_at: Utc::now(),
            dispatched_at: None,
            completed_at: None,
        };
        self.working.trips.insert(id, row.clone());
        Ok(row)
    }

    async fn save_trip(&mut self, trip: &Trip) -> FleetResult<()> {
        self.ensure_open()?;
        let row = self
            .working
            .trips
            .get_mut(&trip.id)
            .ok_or_else(|| FleetError::Storage(format!("Trip {} vanished mid-transaction", trip.id)))?;
        row.status = trip.status;
        row.end_odometer = trip.end_odometer;
        row.dispatched_at = trip.dispatched_at;
        row.completed_at = trip.completed_at;
        Ok(())
    }

    async fn save_vehicle(&mut self, vehicle: &Vehicle) -> FleetResult<()> {
        self.ensure_open()?;
        let row = self
            .working
            .vehicles
            .get_mut(&vehicle.id)
            .ok_or_else(|| FleetError::Storage(format!("Vehicle {} vanished mid-transaction", vehicle.id)))?;
        row.status = vehicle.status;
        row.odometer_km = vehicle.odometer_km;
        Ok(())
    }

    async fn save_driver(&mut self, driver: &Driver) -> FleetResult<()> {
        self.ensure_open()?;
        let row = self
            .working
            .drivers
            .get_mut(&driver.id)
            .ok_or_else(|| FleetError::Storage(format!("Driver {} vanished mid-transaction", driver.id)))?;
        row.status = driver.status;
        row.total_trips = driver.total_trips;
        row.completed_trips = driver.completed_trips;
        Ok(())
    }

    async fn insert_maintenance_log(&mut self, log: &NewMaintenanceLog) -> FleetResult<MaintenanceLog> {
        self.ensure_open()?;
        if !self.working.vehicles.contains_key(&log.vehicle_id) {
            return Err(FleetError::Storage(format!("Foreign key violation: vehicle {}", log.vehicle_id)));
        }

        let id = self.working.next_id();
        let row = MaintenanceLog {
            id,
            vehicle_id: log.vehicle_id,
            service_type: log.service_type.clone(),
            description: log.description.clone(),
            cost: log.cost,
            service_date: log.service_date,
            status: MaintenanceStatus::InProgress,
            completed_date: None,
            created_at: Utc::now(),
        };
        self.working.maintenance_logs.insert(id, row.clone());
        Ok(row)
    }

    async fn save_maintenance_log(&mut self, log: &MaintenanceLog) -> FleetResult<()> {
        self.ensure_open()?;
        let row = self
            .working
            .maintenance_logs
            .get_mut(&log.id)
            .ok_or_else(|| FleetError::Storage(format!("Maintenance log {} vanished mid-transaction", log.id)))?;
        row.service_type = log.service_type.clone();
        row.description = log.description.clone();
        row.cost = log.cost;
        row.service_date = log.service_date;
        row.status = log.status;
        row.completed_date = log.completed_date;
        Ok(())
    }

    async fn delete_maintenance_log(&mut self, id: i64) -> FleetResult<()> {
        self.ensure_open()?;
        self.working.maintenance_logs.remove(&id);
        Ok(())
    }

    async fn count_open_maintenance_logs(&mut self, vehicle_id: i64) -> FleetResult<i64> {
        self.ensure_open()?;
        let open = self
            .working
            .maintenance_logs
            .values()
            .filter(|log| log.vehicle_id == vehicle_id && log.is_open())
            .count();
        Ok(open as i64)
    }

    async fn commit(&mut self) -> FleetResult<()> {
        let mut guard = self
            .guard
            .take()
            .ok_or_else(|| FleetError::Storage("Transaction already finished".to_string()))?;
        if self.fail_commit.swap(false, Ordering::SeqCst) {
            return Err(FleetError::Storage("Simulated commit failure".to_string()));
        }
        *guard = std::mem::take(&mut self.working);
        Ok(())
    }

    async fn rollback(&mut self) -> FleetResult<()> {
        self.guard.take();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{VehicleStatus, VehicleType};

    #[tokio::test]
    async fn test_uncommitted_writes_are_discarded() {
        let store = InMemoryEntityStore::new();
        let vehicle = store
            .insert_vehicle(NewVehicle::new("Van 1", "VAN-001", VehicleType::Van, Decimal::from(800)))
            .await
            .unwrap();

        {
            let mut tx = store.begin().await.unwrap();
            let mut locked = tx.lock_vehicle(vehicle.id).await.unwrap().unwrap();
            locked.status = VehicleStatus::InShop;
            tx.save_vehicle(&locked).await.unwrap();
            // dropped without commit
        }

        let reloaded = store.get_vehicle(vehicle.id).await.unwrap().unwrap();
        assert_eq!(reloaded.status, VehicleStatus::Available);
    }

    #[tokio::test]
    async fn test_commit_publishes_writes() {
        let store = InMemoryEntityStore::new();
        let vehicle = store
            .insert_vehicle(NewVehicle::new("Van 1", "VAN-001", VehicleType::Van, Decimal::from(800)))
            .await
            .unwrap();

        let mut tx = store.begin().await.unwrap();
        let mut locked = tx.lock_vehicle(vehicle.id).await.unwrap().unwrap();
        locked.status = VehicleStatus::InShop;
        tx.save_vehicle(&locked).await.unwrap();
        tx.commit().await.unwrap();
        drop(tx);

        let reloaded = store.get_vehicle(vehicle.id).await.unwrap().unwrap();
        assert_eq!(reloaded.status, VehicleStatus::InShop);
    }

    #[tokio::test]
    async fn test_simulated_commit_failure_discards_writes() {
        let store = InMemoryEntityStore::new();
        let vehicle = store
            .insert_vehicle(NewVehicle::new("Van 1", "VAN-001", VehicleType::Van, Decimal::from(800)))
            .await
            .unwrap();
        store.fail_next_commit();

        let mut tx = store.begin().await.unwrap();
        let mut locked = tx.lock_vehicle(vehicle.id).await.unwrap().unwrap();
        locked.status = VehicleStatus::InShop;
        tx.save_vehicle(&locked).await.unwrap();
        let err = tx.commit().await.unwrap_err();
        assert!(err.is_retryable());
        drop(tx);

        let reloaded = store.get_vehicle(vehicle.id).await.unwrap().unwrap();
        assert_eq!(reloaded.status, VehicleStatus::Available);
    }

    #[tokio::test]
    async fn test_duplicate_license_plate_is_rejected() {
        let store = InMemoryEntityStore::new();
        store
            .insert_vehicle(NewVehicle::new("Van 1", "VAN-001", VehicleType::Van, Decimal::from(800)))
            .await
            .unwrap();

        let err = store
            .insert_vehicle(NewVehicle::new("Van 2", "VAN-001", VehicleType::Van, Decimal::from(900)))
            .await
            .unwrap_err();

        assert!(matches!(err, FleetError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_duplicate_license_number_is_rejected() {
        let store = InMemoryEntityStore::new();
        let expiry = chrono::NaiveDate::from_ymd_opt(2030, 1, 1).unwrap();
        store
            .insert_driver(NewDriver::new("Ana", "LIC-7", VehicleType::Van, expiry))
            .await
            .unwrap();

        let err = store
            .insert_driver(NewDriver::new("Ben", "LIC-7", VehicleType::Truck, expiry))
            .await
            .unwrap_err();

        assert!(matches!(err, FleetError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_open_log_count_sees_uncommitted_inserts() {
        let store = InMemoryEntityStore::new();
        let vehicle = store
            .insert_vehicle(NewVehicle::new("Van 1", "VAN-001", VehicleType::Van, Decimal::from(800)))
            .await
            .unwrap();
        let log = NewMaintenanceLog {
            vehicle_id: vehicle.id,
            service_type: "Brakes".to_string(),
            description: None,
            cost: Decimal::ZERO,
            service_date: chrono::NaiveDate::from_ymd_opt(2026, 10, 19).unwrap(),
        };

        let mut tx = store.begin().await.unwrap();
        let first = tx.insert_maintenance_log(&log).await.unwrap();
        tx.insert_maintenance_log(&log).await.unwrap();
        assert_eq!(tx.count_open_maintenance_logs(vehicle.id).await.unwrap(), 2);

        tx.delete_maintenance_log(first.id).await.unwrap();
        assert_eq!(tx.count_open_maintenance_logs(vehicle.id).await.unwrap(), 1);
        tx.rollback().await.unwrap();
    }
}

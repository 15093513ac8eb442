//! PostgreSQL entity store
//!
//! Row locks are taken with `SELECT ... FOR UPDATE`, so two transactions
//! touching the same vehicle or driver serialize on that row under the
//! default READ COMMITTED isolation.

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder, Transaction};
use tracing::debug;

use super::store::{EntityStore, StoreTransaction};
use crate::models::{
    Driver, MaintenanceFilters, MaintenanceListing, MaintenanceLog, NewMaintenanceLog, NewTrip, Trip, TripFilters,
    TripListing, Vehicle,
};
use crate::utils::errors::{FleetError, FleetResult};

#[derive(Clone)]
pub struct PgEntityStore {
    pool: PgPool,
}

impl PgEntityStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EntityStore for PgEntityStore {
    async fn begin(&self) -> FleetResult<Box<dyn StoreTransaction>> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| FleetError::Storage(format!("Error starting transaction: {}", e)))?;
        Ok(Box::new(PgStoreTransaction { tx: Some(tx) }))
    }

    async fn get_vehicle(&self, id: i64) -> FleetResult<Option<Vehicle>> {
        let vehicle = sqlx::query_as::<_, Vehicle>("SELECT * FROM vehicles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| FleetError::Storage(format!("Error finding vehicle: {}", e)))?;
        Ok(vehicle)
    }

    async fn get_driver(&self, id: i64) -> FleetResult<Option<Driver>> {
        let driver = sqlx::query_as::<_, Driver>("SELECT * FROM drivers WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| FleetError::Storage(format!("Error finding driver: {}", e)))?;
        Ok(driver)
    }

    async fn get_trip(&self, id: i64) -> FleetResult<Option<Trip>> {
        let trip = sqlx::query_as::<_, Trip>("SELECT * FROM trips WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| FleetError::Storage(format!("Error finding trip: {}", e)))?;
        Ok(trip)
    }

    async fn get_maintenance_log(&self, id: i64) -> FleetResult<Option<MaintenanceLog>> {
        let log = sqlx::query_as::<_, MaintenanceLog>("SELECT * FROM maintenance_logs WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| FleetError::Storage(format!("Error finding maintenance log: {}", e)))?;
        Ok(log)
    }

    async fn list_trips(&self, filters: &TripFilters) -> FleetResult<Vec<TripListing>> {
        let mut query = QueryBuilder::<Postgres>::new(
            r#"
            SELECT t.*, v.name AS vehicle_name, v.license_plate, d.name AS driver_name
            FROM trips t
            JOIN vehicles v ON v.id = t.vehicle_id
            JOIN drivers d ON d.id = t.driver_id
            WHERE 1=1
            "#,
        );
        if let Some(status) = filters.status {
            query.push(" AND t.status = ").push_bind(status);
        }
        if let Some(vehicle_id) = filters.vehicle_id {
            query.push(" AND t.vehicle_id = ").push_bind(vehicle_id);
        }
        if let Some(driver_id) = filters.driver_id {
            query.push(" AND t.driver_id = ").push_bind(driver_id);
        }
        query.push(" ORDER BY t.created_at DESC, t.id DESC");

        let trips = query
            .build_query_as::<TripListing>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| FleetError::Storage(format!("Error listing trips: {}", e)))?;
        Ok(trips)
    }

    async fn list_maintenance_logs(&self, filters: &MaintenanceFilters) -> FleetResult<Vec<MaintenanceListing>> {
        let mut query = QueryBuilder::<Postgres>::new(
            r#"
            SELECT m.*, v.name AS vehicle_name, v.license_plate
            FROM maintenance_logs m
            JOIN vehicles v ON v.id = m.vehicle_id
            WHERE 1=1
            "#,
        );
        if let Some(vehicle_id) = filters.vehicle_id {
            query.push(" AND m.vehicle_id = ").push_bind(vehicle_id);
        }
        if let Some(status) = filters.status {
            query.push(" AND m.status = ").push_bind(status);
        }
        if let Some(start_date) = filters.start_date {
            query.push(" AND m.service_date >= ").push_bind(start_date);
        }
        if let Some(end_date) = filters.end_date {
            query.push(" AND m.service_date <= ").push_bind(end_date);
        }
        query.push(" ORDER BY m.service_date DESC, m.id DESC");

        let logs = query
            .build_query_as::<MaintenanceListing>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| FleetError::Storage(format!("Error listing maintenance logs: {}", e)))?;
        Ok(logs)
    }
}

pub struct PgStoreTransaction {
    tx: Option<Transaction<'static, Postgres>>,
}

impl PgStoreTransaction {
    fn conn(&mut self) -> FleetResult<&mut PgConnection> {
        match self.tx.as_mut() {
            Some(tx) => Ok(&mut **tx),
            None => Err(FleetError::Storage("Transaction already finished".to_string())),
        }
    }
}

#[async_trait]
impl StoreTransaction for PgStoreTransaction {
    async fn lock_vehicle(&mut self, id: i64) -> FleetResult<Option<Vehicle>> {
        let vehicle = sqlx::query_as::<_, Vehicle>("SELECT * FROM vehicles WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(self.conn()?)
            .await
            .map_err(|e| FleetError::Storage(format!("Error locking vehicle: {}", e)))?;
        Ok(vehicle)
    }

    async fn lock_driver(&mut self, id: i64) -> FleetResult<Option<Driver>> {
        let driver = sqlx::query_as::<_, Driver>("SELECT * FROM drivers WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(self.conn()?)
            .await
            .map_err(|e| FleetError::Storage(format!("Error locking driver: {}", e)))?;
        Ok(driver)
    }

    async fn lock_trip(&mut self, id: i64) -> FleetResult<Option<Trip>> {
        let trip = sqlx::query_as::<_, Trip>("SELECT * FROM trips WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(self.conn()?)
            .await
            .map_err(|e| FleetError::Storage(format!("Error locking trip: {}", e)))?;
        Ok(trip)
    }

    async fn lock_maintenance_log(&mut self, id: i64) -> FleetResult<Option<MaintenanceLog>> {
        let log = sqlx::query_as::<_, MaintenanceLog>("SELECT * FROM maintenance_logs WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(self.conn()?)
            .await
            .map_err(|e| FleetError::Storage(format!("Error locking maintenance log: {}", e)))?;
        Ok(log)
    }

    async fn insert_trip(&mut self, trip: &NewTrip, start_odometer: Decimal) -> FleetResult<Trip> {
        let created = sqlx::query_as::<_, Trip>(
            r#"
            INSERT INTO trips (vehicle_id, driver_id, origin, destination, cargo_description, cargo_weight_kg, revenue, start_odometer)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(trip.vehicle_id)
        .bind(trip.driver_id)
        .bind(&trip.origin)
        .bind(&trip.destination)
        .bind(&trip.cargo_description)
        .bind(trip.cargo_weight_kg)
        .bind(trip.revenue.unwrap_or(Decimal::ZERO))
        .bind(start_odometer)
        .fetch_one(self.conn()?)
        .await
        .map_err(|e| FleetError::Storage(format!("Error creating trip: {}", e)))?;

        debug!("Inserted trip {} (draft)", created.id);
        Ok(created)
    }

    async fn save_trip(&mut self, trip: &Trip) -> FleetResult<()> {
        sqlx::query(
            r#"
            UPDATE trips
            SET status = $2, end_odometer = $3, dispatched_at = $4, completed_at = $5
            WHERE id = $1
            "#,
        )
        .bind(trip.id)
        .bind(trip.status)
        .bind(trip.end_odometer)
        .bind(trip.dispatched_at)
        .bind(trip.completed_at)
        .execute(self.conn()?)
        .await
        .map_err(|e| FleetError::Storage(format!("Error updating trip: {}", e)))?;
        Ok(())
    }

    async fn save_vehicle(&mut self, vehicle: &Vehicle) -> FleetResult<()> {
        sqlx::query("UPDATE vehicles SET status = $2, odometer_km = $3 WHERE id = $1")
            .bind(vehicle.id)
            .bind(vehicle.status)
            .bind(vehicle.odometer_km)
            .execute(self.conn()?)
            .await
            .map_err(|e| FleetError::Storage(format!("Error updating vehicle: {}", e)))?;
        Ok(())
    }

    async fn save_driver(&mut self, driver: &Driver) -> FleetResult<()> {
        sqlx::query("UPDATE drivers SET status = $2, total_trips = $3, completed_trips = $4 WHERE id = $1")
            .bind(driver.id)
            .bind(driver.status)
            .bind(driver.total_trips)
            .bind(driver.completed_trips)
            .execute(self.conn()?)
            .await
            .map_err(|e| FleetError::Storage(format!("Error updating driver: {}", e)))?;
        Ok(())
    }

    async fn insert_maintenance_log(&mut self, log: &NewMaintenanceLog) -> FleetResult<MaintenanceLog> {
        let created = sqlx::query_as::<_, MaintenanceLog>(
            r#"
            INSERT INTO maintenance_logs (vehicle_id, service_type, description, cost, service_date)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(log.vehicle_id)
        .bind(&log.service_type)
        .bind(&log.description)
        .bind(log.cost)
        .bind(log.service_date)
        .fetch_one(self.conn()?)
        .await
        .map_err(|e| FleetError::Storage(format!("Error creating maintenance log: {}", e)))?;

        debug!("Inserted maintenance log {} (in_progress)", created.id);
        Ok(created)
    }

    async fn save_maintenance_log(&mut self, log: &MaintenanceLog) -> FleetResult<()> {
        sqlx::query(
            r#"
            UPDATE maintenance_logs
            SET service_type = $2, description = $3, cost = $4, service_date = $5, status = $6, completed_date = $7
            WHERE id = $1
            "#,
        )
        .bind(log.id)
        .bind(&log.service_type)
        .bind(&log.description)
        .bind(log.cost)
        .bind(log.service_date)
        .bind(log.status)
        .bind(log.completed_date)
        .execute(self.conn()?)
        .await
        .map_err(|e| FleetError::Storage(format!("Error updating maintenance log: {}", e)))?;
        Ok(())
    }

    async fn delete_maintenance_log(&mut self, id: i64) -> FleetResult<()> {
        sqlx::query("DELETE FROM maintenance_logs WHERE id = $1")
            .bind(id)
            .execute(self.conn()?)
            .await
            .map_err(|e| FleetError::Storage(format!("Error deleting maintenance log: {}", e)))?;
        debug!("Deleted maintenance log {}", id);
        Ok(())
    }

    async fn count_open_maintenance_logs(&mut self, vehicle_id: i64) -> FleetResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM maintenance_logs WHERE vehicle_id = $1 AND status = 'in_progress'",
        )
        .bind(vehicle_id)
        .fetch_one(self.conn()?)
        .await
        .map_err(|e| FleetError::Storage(format!("Error counting maintenance logs: {}", e)))?;
        Ok(count)
    }

    async fn commit(&mut self) -> FleetResult<()> {
        let tx = self
            .tx
            .take()
            .ok_or_else(|| FleetError::Storage("Transaction already finished".to_string()))?;
        tx.commit()
            .await
            .map_err(|e| FleetError::Storage(format!("Error committing transaction: {}", e)))
    }

    async fn rollback(&mut self) -> FleetResult<()> {
        match self.tx.take() {
            Some(tx) => tx
                .rollback()
                .await
                .map_err(|e| FleetError::Storage(format!("Error rolling back transaction: {}", e))),
            None => Ok(()),
        }
    }
}

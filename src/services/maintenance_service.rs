//! Maintenance lifecycle
//!
//! Opening a log sends the vehicle to the shop. The vehicle comes back to
//! the available pool once its last open log is completed or deleted.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use super::clock::Clock;
use super::notifier::{EventNotifier, FleetEvent};
use crate::models::{
    Actor, MaintenanceFilters, MaintenanceListing, MaintenanceLog, MaintenanceLogChanges, NewMaintenanceLog, Vehicle,
    VehicleStatus,
};
use crate::repositories::{finish, EntityStore, StoreTransaction};
use crate::utils::errors::{FleetError, FleetResult};

struct LogTransition {
    log: MaintenanceLog,
    /// Set only when the vehicle status actually changed
    vehicle: Option<Vehicle>,
}

#[derive(Clone)]
pub struct MaintenanceService {
    store: Arc<dyn EntityStore>,
    notifier: Arc<dyn EventNotifier>,
    clock: Arc<dyn Clock>,
}

impl MaintenanceService {
    pub fn new(store: Arc<dyn EntityStore>, notifier: Arc<dyn EventNotifier>, clock: Arc<dyn Clock>) -> Self {
        Self { store, notifier, clock }
    }

    /// Open an `in_progress` log and force the vehicle `in_shop`.
    ///
    /// Vehicles out on a trip or retired are refused.
    pub async fn create_log(&self, actor: &Actor, input: NewMaintenanceLog) -> FleetResult<MaintenanceLog> {
        let mut tx = self.store.begin().await?;
        let outcome = create_log_in(tx.as_mut(), &input).await;
        let transition = finish(tx, outcome).await.map_err(|e| log_rejection("create", actor, e))?;

        info!(
            actor = %actor,
            "🔧 Maintenance log {} opened for vehicle {} ({})",
            transition.log.id, transition.log.vehicle_id, transition.log.service_type
        );
        self.notifier.notify(FleetEvent::MaintenanceAlert(transition.log.clone()));
        Ok(self.announce_vehicle(transition))
    }

    /// Close an `in_progress` log. The vehicle returns to `available` only
    /// when it is `in_shop` and no other log for it is still open.
    pub async fn complete_log(&self, actor: &Actor, log_id: i64) -> FleetResult<MaintenanceLog> {
        let now = self.clock.now();
        let mut tx = self.store.begin().await?;
        let outcome = complete_log_in(tx.as_mut(), log_id, now).await;
        let transition = finish(tx, outcome).await.map_err(|e| log_rejection("complete", actor, e))?;

        info!(actor = %actor, "✅ Maintenance log {} completed", log_id);
        self.notifier.notify(FleetEvent::MaintenanceCompleted(transition.log.clone()));
        Ok(self.announce_vehicle(transition))
    }

    /// Rewrite the descriptive fields of a log in any status. Status and
    /// vehicle stay as they are, and nothing is announced.
    pub async fn update_log(
        &self,
        actor: &Actor,
        log_id: i64,
        changes: MaintenanceLogChanges,
    ) -> FleetResult<MaintenanceLog> {
        let mut tx = self.store.begin().await?;
        let outcome = update_log_in(tx.as_mut(), log_id, changes).await;
        let log = finish(tx, outcome).await.map_err(|e| log_rejection("update", actor, e))?;

        info!(actor = %actor, "📝 Maintenance log {} updated", log.id);
        Ok(log)
    }

    /// Remove a log. Deleting the last open log of an `in_shop` vehicle
    /// returns the vehicle to `available`.
    pub async fn delete_log(&self, actor: &Actor, log_id: i64) -> FleetResult<MaintenanceLog> {
        let mut tx = self.store.begin().await?;
        let outcome = delete_log_in(tx.as_mut(), log_id).await;
        let transition = finish(tx, outcome).await.map_err(|e| log_rejection("delete", actor, e))?;

        info!(actor = %actor, "🗑️ Maintenance log {} deleted", log_id);
        self.notifier.notify(FleetEvent::MaintenanceDeleted(transition.log.clone()));
        Ok(self.announce_vehicle(transition))
    }

    pub async fn get(&self, log_id: i64) -> FleetResult<MaintenanceLog> {
        self.store
            .get_maintenance_log(log_id)
            .await?
            .ok_or_else(|| FleetError::not_found("Maintenance log", log_id))
    }

    pub async fn list(&self, filters: &MaintenanceFilters) -> FleetResult<Vec<MaintenanceListing>> {
        self.store.list_maintenance_logs(filters).await
    }

    fn announce_vehicle(&self, transition: LogTransition) -> MaintenanceLog {
        if let Some(vehicle) = &transition.vehicle {
            self.notifier.notify(FleetEvent::vehicle_status(vehicle.id, vehicle.status));
        }
        transition.log
    }
}

fn log_rejection(operation: &str, actor: &Actor, e: FleetError) -> FleetError {
    if e.is_retryable() {
        tracing::error!(actor = %actor, "❌ Maintenance {} failed: {}", operation, e);
    } else {
        warn!(actor = %actor, code = e.kind(), "Maintenance {} rejected: {}", operation, e);
    }
    e
}

async fn create_log_in(tx: &mut dyn StoreTransaction, input: &NewMaintenanceLog) -> FleetResult<LogTransition> {
    let mut vehicle = tx
        .lock_vehicle(input.vehicle_id)
        .await?
        .ok_or_else(|| FleetError::not_found("Vehicle", input.vehicle_id))?;

    if matches!(vehicle.status, VehicleStatus::OnTrip | VehicleStatus::Retired) {
        return Err(FleetError::VehicleUnavailable {
            vehicle_id: vehicle.id,
            current_status: vehicle.status,
        });
    }

    let log = tx.insert_maintenance_log(input).await?;
    let changed = vehicle.send_to_shop();
    if changed {
        tx.save_vehicle(&vehicle).await?;
    }

    Ok(LogTransition {
        log,
        vehicle: changed.then_some(vehicle),
    })
}

async fn complete_log_in(tx: &mut dyn StoreTransaction, log_id: i64, now: DateTime<Utc>) -> FleetResult<LogTransition> {
    let mut log = tx
        .lock_maintenance_log(log_id)
        .await?
        .ok_or_else(|| FleetError::not_found("Maintenance log", log_id))?;

    if !log.is_open() {
        return Err(FleetError::invalid_state(
            "Maintenance log",
            log.id,
            log.status,
            "maintenance log is already completed",
        ));
    }

    let vehicle = lock_log_vehicle(tx, &log).await?;

    log.mark_completed(now);
    tx.save_maintenance_log(&log).await?;

    let vehicle = leave_shop_if_idle(tx, vehicle).await?;
    Ok(LogTransition { log, vehicle })
}

async fn update_log_in(
    tx: &mut dyn StoreTransaction,
    log_id: i64,
    changes: MaintenanceLogChanges,
) -> FleetResult<MaintenanceLog> {
    let mut log = tx
        .lock_maintenance_log(log_id)
        .await?
        .ok_or_else(|| FleetError::not_found("Maintenance log", log_id))?;

    log.apply(changes);
    tx.save_maintenance_log(&log).await?;
    Ok(log)
}

async fn delete_log_in(tx: &mut dyn StoreTransaction, log_id: i64) -> FleetResult<LogTransition> {
    let log = tx
        .lock_maintenance_log(log_id)
        .await?
        .ok_or_else(|| FleetError::not_found("Maintenance log", log_id))?;

    let vehicle = lock_log_vehicle(tx, &log).await?;
    tx.delete_maintenance_log(log.id).await?;

    let vehicle = if log.is_open() {
        leave_shop_if_idle(tx, vehicle).await?
    } else {
        None
    };
    Ok(LogTransition { log, vehicle })
}

async fn lock_log_vehicle(tx: &mut dyn StoreTransaction, log: &MaintenanceLog) -> FleetResult<Vehicle> {
    tx.lock_vehicle(log.vehicle_id)
        .await?
        .ok_or_else(|| FleetError::not_found("Vehicle", log.vehicle_id))
}

/// `in_shop -> available` when no open log is left for the vehicle.
/// Returns the vehicle only if its status changed.
async fn leave_shop_if_idle(tx: &mut dyn StoreTransaction, mut vehicle: Vehicle) -> FleetResult<Option<Vehicle>> {
    if vehicle.status != VehicleStatus::InShop {
        return Ok(None);
    }
    if tx.count_open_maintenance_logs(vehicle.id).await? > 0 {
        return Ok(None);
    }

    let changed = vehicle.leave_shop();
    if changed {
        tx.save_vehicle(&vehicle).await?;
    }
    Ok(changed.then_some(vehicle))
}

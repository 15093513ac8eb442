//! Maintenance log model
//!
//! A log takes its vehicle out of the pool while it is `in_progress`.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};

/// Maintenance status - maps to the `maintenance_status` ENUM
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "maintenance_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MaintenanceStatus {
    InProgress,
    Completed,
}

impl MaintenanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MaintenanceStatus::InProgress => "in_progress",
            MaintenanceStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for MaintenanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct MaintenanceLog {
    pub id: i64,
    pub vehicle_id: i64,
    pub service_type: String,
    pub description: Option<String>,
    pub cost: Decimal,
    pub service_date: NaiveDate,
    pub status: MaintenanceStatus,
    pub completed_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl MaintenanceLog {
    pub fn is_open(&self) -> bool {
        self.status == MaintenanceStatus::InProgress
    }

    pub fn mark_completed(&mut self, now: DateTime<Utc>) {
        self.status = MaintenanceStatus::Completed;
        self.completed_date = Some(now);
    }

    pub fn apply(&mut self, changes: MaintenanceLogChanges) {
        self.service_type = changes.service_type;
        self.description = changes.description;
        self.cost = changes.cost;
        self.service_date = changes.service_date;
    }
}

/// Input of the maintenance `create_log` operation.
#[derive(Debug, Clone)]
pub struct NewMaintenanceLog {
    pub vehicle_id: i64,
    pub service_type: String,
    pub description: Option<String>,
    pub cost: Decimal,
    pub service_date: NaiveDate,
}

/// Replacement values for the editable fields of a log. Status and vehicle
/// are not editable.
#[derive(Debug, Clone)]
pub struct MaintenanceLogChanges {
    pub service_type: String,
    pub description: Option<String>,
    pub cost: Decimal,
    pub service_date: NaiveDate,
}

/// Log row joined with its vehicle's name and plate, for listings
#[derive(Debug, Clone, Serialize, FromRow, PartialEq)]
pub struct MaintenanceListing {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub log: MaintenanceLog,
    pub vehicle_name: String,
    pub license_plate: String,
}

/// Read-side filters for maintenance listings. Date bounds are inclusive.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MaintenanceFilters {
    pub vehicle_id: Option<i64>,
    pub status: Option<MaintenanceStatus>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl MaintenanceFilters {
    pub fn matches(&self, log: &MaintenanceLog) -> bool {
        self.vehicle_id.map_or(true, |id| log.vehicle_id == id)
            && self.status.map_or(true, |s| log.status == s)
            && self.start_date.map_or(true, |d| log.service_date >= d)
            && self.end_date.map_or(true, |d| log.service_date <= d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_range_filter_is_inclusive() {
        let day = NaiveDate::from_ymd_opt(2026, 5, 10).unwrap();
        let log = MaintenanceLog {
            id: 1,
            vehicle_id: 3,
            service_type: "Oil Change".to_string(),
            description: None,
            cost: Decimal::from(50),
            service_date: day,
            status: MaintenanceStatus::InProgress,
            completed_date: None,
            created_at: Utc::now(),
        };
        let filters = MaintenanceFilters { start_date: Some(day), end_date: Some(day), ..Default::default() };
        assert!(filters.matches(&log));

        let later = MaintenanceFilters { start_date: day.succ_opt(), ..Default::default() };
        assert!(!later.matches(&log));
    }
}

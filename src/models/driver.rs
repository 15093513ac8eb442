//! Driver model
//!
//! Maps the `drivers` table. Trip counters and status are written by the
//! trip lifecycle; everything else is administrative.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};

use super::vehicle::VehicleType;

/// Driver status - maps to the `driver_status` ENUM
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "driver_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DriverStatus {
    OnDuty,
    OnTrip,
    OffDuty,
    Suspended,
}

impl DriverStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DriverStatus::OnDuty => "on_duty",
            DriverStatus::OnTrip => "on_trip",
            DriverStatus::OffDuty => "off_duty",
            DriverStatus::Suspended => "suspended",
        }
    }

    pub fn is_assignable(&self) -> bool {
        !matches!(self, DriverStatus::OnTrip | DriverStatus::Suspended)
    }
}

impl fmt::Display for DriverStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Driver {
    pub id: i64,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub license_number: String,
    pub license_category: VehicleType,
    pub license_expiry_date: NaiveDate,
    pub status: DriverStatus,
    pub safety_score: Decimal,
    pub total_trips: i32,
    pub completed_trips: i32,
    pub created_at: DateTime<Utc>,
}

impl Driver {
    /// A license expiring today is still valid today.
    pub fn license_valid_on(&self, today: NaiveDate) -> bool {
        self.license_expiry_date >= today
    }

    pub fn is_licensed_for(&self, vehicle_type: VehicleType) -> bool {
        self.license_category == vehicle_type
    }

    pub fn start_trip(&mut self) {
        self.status = DriverStatus::OnTrip;
        self.total_trips = self.total_trips.saturating_add(1);
    }

    pub fn finish_trip(&mut self) {
        self.status = DriverStatus::OffDuty;
        self.completed_trips = self.completed_trips.saturating_add(1);
    }

    /// Give the driver back after a dispatched trip was cancelled.
    pub fn release(&mut self) {
        self.status = DriverStatus::OffDuty;
    }
}

/// Administrative registration of a driver. Not a core operation.
#[derive(Debug, Clone, Deserialize)]
pub struct NewDriver {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub license_number: String,
    pub license_category: VehicleType,
    pub license_expiry_date: NaiveDate,
    pub status: DriverStatus,
    pub safety_score: Decimal,
}

impl NewDriver {
    pub fn new(name: &str, license_number: &str, license_category: VehicleType, license_expiry_date: NaiveDate) -> Self {
        Self {
            name: name.to_string(),
            email: None,
            phone: None,
            license_number: license_number.to_string(),
            license_category,
            license_expiry_date,
            status: DriverStatus::OffDuty,
            safety_score: Decimal::from(100),
        }
    }

    pub fn with_status(mut self, status: DriverStatus) -> Self {
        self.status = status;
        self
    }
}

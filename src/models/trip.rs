//! Trip model
//!
//! A trip binds one vehicle and one driver between an origin and a
//! destination. Status only moves forward:
//!
//! ```text
//! draft --dispatch--> dispatched --complete--> completed
//!   |                     |
//!   +------cancel---------+-----> cancelled
//! ```

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};

/// Trip status - maps to the `trip_status` ENUM
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "trip_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TripStatus {
    Draft,
    Dispatched,
    Completed,
    Cancelled,
}

impl TripStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TripStatus::Draft => "draft",
            TripStatus::Dispatched => "dispatched",
            TripStatus::Completed => "completed",
            TripStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TripStatus::Completed | TripStatus::Cancelled)
    }

    /// Whether vehicle and driver are held by a trip in this status.
    pub fn holds_resources(&self) -> bool {
        matches!(self, TripStatus::Dispatched)
    }
}

impl fmt::Display for TripStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Trip {
    pub id: i64,
    pub vehicle_id: i64,
    pub driver_id: i64,
    pub origin: String,
    pub destination: String,
    pub cargo_description: Option<String>,
    pub cargo_weight_kg: Decimal,
    pub revenue: Decimal,
    pub start_odometer: Decimal,
    pub end_odometer: Option<Decimal>,
    pub status: TripStatus,
    pub created_at: DateTime<Utc>,
    pub dispatched_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Trip {
    pub fn mark_dispatched(&mut self, now: DateTime<Utc>) {
        self.status = TripStatus::Dispatched;
        self.dispatched_at = Some(now);
    }

    pub fn mark_completed(&mut self, end_odometer: Decimal, now: DateTime<Utc>) {
        self.status = TripStatus::Completed;
        self.end_odometer = Some(end_odometer);
        self.completed_at = Some(now);
    }

    pub fn mark_cancelled(&mut self) {
        self.status = TripStatus::Cancelled;
    }

    /// Distance covered, once the trip is completed.
    pub fn distance_km(&self) -> Option<Decimal> {
        self.end_odometer.map(|end| end - self.start_odometer)
    }
}

/// Trip row joined with the names shown next to it in listings
#[derive(Debug, Clone, Serialize, FromRow, PartialEq)]
pub struct TripListing {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub trip: Trip,
    pub vehicle_name: String,
    pub license_plate: String,
    pub driver_name: String,
}

/// Input of the trip `create` operation, already syntactically validated.
#[derive(Debug, Clone)]
pub struct NewTrip {
    pub vehicle_id: i64,
    pub driver_id: i64,
    pub origin: String,
    pub destination: String,
    pub cargo_description: Option<String>,
    pub cargo_weight_kg: Decimal,
    pub revenue: Option<Decimal>,
}

/// Read-side filters for trip listings
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TripFilters {
    pub status: Option<TripStatus>,
    pub vehicle_id: Option<i64>,
    pub driver_id: Option<i64>,
}

impl TripFilters {
    pub fn matches(&self, trip: &Trip) -> bool {
        self.status.map_or(true, |s| trip.status == s)
            && self.vehicle_id.map_or(true, |id| trip.vehicle_id == id)
            && self.driver_id.map_or(true, |id| trip.driver_id == id)
    }
}

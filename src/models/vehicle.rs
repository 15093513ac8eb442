//! Vehicle model
//!
//! Maps the `vehicles` table. The coordination core only ever touches
//! `status` and `odometer_km`; every other column is administrative.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};

/// Vehicle class. Doubles as the driver license category domain.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "vehicle_type")]
pub enum VehicleType {
    Truck,
    Van,
    Bike,
}

impl VehicleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleType::Truck => "Truck",
            VehicleType::Van => "Van",
            VehicleType::Bike => "Bike",
        }
    }
}

impl fmt::Display for VehicleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Vehicle status - maps to the `vehicle_status` ENUM
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "vehicle_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum VehicleStatus {
    Available,
    OnTrip,
    InShop,
    Retired,
}

impl VehicleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleStatus::Available => "available",
            VehicleStatus::OnTrip => "on_trip",
            VehicleStatus::InShop => "in_shop",
            VehicleStatus::Retired => "retired",
        }
    }

    /// Only an available vehicle can be attached to a trip.
    pub fn is_assignable(&self) -> bool {
        matches!(self, VehicleStatus::Available)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, VehicleStatus::Retired)
    }
}

impl fmt::Display for VehicleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Vehicle {
    pub id: i64,
    pub name: String,
    pub model: Option<String>,
    pub license_plate: String,
    pub vehicle_type: VehicleType,
    pub max_load_capacity_kg: Decimal,
    pub odometer_km: Decimal,
    pub region: Option<String>,
    pub acquisition_cost: Decimal,
    pub status: VehicleStatus,
    pub created_at: DateTime<Utc>,
}

impl Vehicle {
    pub fn can_carry(&self, cargo_weight_kg: Decimal) -> bool {
        cargo_weight_kg <= self.max_load_capacity_kg
    }

    /// Reserve the vehicle for a dispatched trip.
    pub fn assign_to_trip(&mut self) {
        self.status = VehicleStatus::OnTrip;
    }

    /// Release the vehicle at the end of a trip and record its new odometer.
    pub fn finish_trip(&mut self, end_odometer: Decimal) {
        self.odometer_km = end_odometer;
        self.release();
    }

    /// Return the vehicle to the pool. Retired vehicles stay retired.
    ///
    /// Returns `true` when the status actually changed.
    pub fn release(&mut self) -> bool {
        self.set_status(VehicleStatus::Available)
    }

    pub fn send_to_shop(&mut self) -> bool {
        self.set_status(VehicleStatus::InShop)
    }

    /// `in_shop -> available` once the last open maintenance log is closed.
    /// Any other status is left alone.
    pub fn leave_shop(&mut self) -> bool {
        self.status == VehicleStatus::InShop && self.set_status(VehicleStatus::Available)
    }

    fn set_status(&mut self, status: VehicleStatus) -> bool {
        if self.status.is_terminal() || self.status == status {
            return false;
        }
        self.status = status;
        true
    }
}

/// Administrative registration of a vehicle. Not a core operation; used to
/// seed stores.
#[derive(Debug, Clone, Deserialize)]
pub struct NewVehicle {
    pub name: String,
    pub model: Option<String>,
    pub license_plate: String,
    pub vehicle_type: VehicleType,
    pub max_load_capacity_kg: Decimal,
    pub odometer_km: Decimal,
    pub region: Option<String>,
    pub acquisition_cost: Decimal,
    pub status: VehicleStatus,
}

impl NewVehicle {
    pub fn new(name: &str, license_plate: &str, vehicle_type: VehicleType, max_load_capacity_kg: Decimal) -> Self {
        Self {
            name: name.to_string(),
            model: None,
            license_plate: license_plate.to_string(),
            vehicle_type,
            max_load_capacity_kg,
            odometer_km: Decimal::ZERO,
            region: None,
            acquisition_cost: Decimal::ZERO,
            status: VehicleStatus::Available,
        }
    }

    pub fn with_odometer(mut self, odometer_km: Decimal) -> Self {
        self.odometer_km = odometer_km;
        self
    }

    pub fn with_status(mut self, status: VehicleStatus) -> Self {
        self.status = status;
        self
    }
}

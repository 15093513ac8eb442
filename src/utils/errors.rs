//! Error handling
//!
//! Every failure of a coordination operation maps to exactly one
//! `FleetError` variant carrying enough context for a precise message.
//! Business-rule variants are raised before any write; `Storage` is the
//! only retryable kind.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

use crate::models::{DriverStatus, VehicleStatus, VehicleType};

#[derive(Error, Debug)]
pub enum FleetError {
    #[error("{entity} with id {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error("Cargo weight {requested} kg exceeds vehicle max capacity {max_capacity} kg")]
    CapacityExceeded { max_capacity: Decimal, requested: Decimal },

    #[error("Driver license expired on {expiry_date}")]
    LicenseExpired { expiry_date: NaiveDate },

    #[error("Driver license category {driver_category} does not match vehicle type {vehicle_type}")]
    LicenseCategoryMismatch {
        driver_category: VehicleType,
        vehicle_type: VehicleType,
    },

    #[error("Vehicle {vehicle_id} is not available (current status: {current_status})")]
    VehicleUnavailable {
        vehicle_id: i64,
        current_status: VehicleStatus,
    },

    #[error("Driver {driver_id} is not available (current status: {current_status})")]
    DriverUnavailable {
        driver_id: i64,
        current_status: DriverStatus,
    },

    #[error("{entity} {id} is {current_status}: {message}")]
    InvalidState {
        entity: &'static str,
        id: i64,
        current_status: String,
        message: String,
    },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Storage failure: {0}")]
    Storage(String),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),
}

impl From<sqlx::Error> for FleetError {
    fn from(e: sqlx::Error) -> Self {
        FleetError::Storage(e.to_string())
    }
}

impl FleetError {
    pub fn not_found(entity: &'static str, id: i64) -> Self {
        FleetError::NotFound { entity, id }
    }

    pub fn invalid_state(entity: &'static str, id: i64, current_status: impl ToString, message: &str) -> Self {
        FleetError::InvalidState {
            entity,
            id,
            current_status: current_status.to_string(),
            message: message.to_string(),
        }
    }

    /// Stable machine-readable code
    pub fn kind(&self) -> &'static str {
        match self {
            FleetError::NotFound { .. } => "NOT_FOUND",
            FleetError::CapacityExceeded { .. } => "CAPACITY_EXCEEDED",
            FleetError::LicenseExpired { .. } => "LICENSE_EXPIRED",
            FleetError::LicenseCategoryMismatch { .. } => "LICENSE_CATEGORY_MISMATCH",
            FleetError::VehicleUnavailable { .. } => "VEHICLE_UNAVAILABLE",
            FleetError::DriverUnavailable { .. } => "DRIVER_UNAVAILABLE",
            FleetError::InvalidState { .. } => "INVALID_STATE",
            FleetError::InvalidInput(_) => "INVALID_INPUT",
            FleetError::Storage(_) => "STORAGE_FAILURE",
            FleetError::Validation(_) => "VALIDATION_ERROR",
            FleetError::Unauthorized(_) => "UNAUTHORIZED",
            FleetError::Forbidden(_) => "FORBIDDEN",
        }
    }

    /// Only infrastructure failures are worth retrying; business rejections
    /// will fail the same way again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, FleetError::Storage(_))
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            FleetError::NotFound { .. } => StatusCode::NOT_FOUND,
            FleetError::CapacityExceeded { .. }
            | FleetError::LicenseExpired { .. }
            | FleetError::LicenseCategoryMismatch { .. }
            | FleetError::InvalidInput(_)
            | FleetError::Validation(_) => StatusCode::BAD_REQUEST,
            FleetError::VehicleUnavailable { .. }
            | FleetError::DriverUnavailable { .. }
            | FleetError::InvalidState { .. } => StatusCode::CONFLICT,
            FleetError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            FleetError::Forbidden(_) => StatusCode::FORBIDDEN,
            FleetError::Storage(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            FleetError::NotFound { entity, id } => Some(json!({ "entity": entity, "id": id })),
            FleetError::CapacityExceeded { max_capacity, requested } => Some(json!({
                "max_capacity": max_capacity,
                "requested": requested,
            })),
            FleetError::LicenseExpired { expiry_date } => Some(json!({ "expiry_date": expiry_date })),
            FleetError::LicenseCategoryMismatch { driver_category, vehicle_type } => Some(json!({
                "driver_category": driver_category,
                "vehicle_type": vehicle_type,
            })),
            FleetError::VehicleUnavailable { vehicle_id, current_status } => Some(json!({
                "vehicle_id": vehicle_id,
                "current_status": current_status,
            })),
            FleetError::DriverUnavailable { driver_id, current_status } => Some(json!({
                "driver_id": driver_id,
                "current_status": current_status,
            })),
            FleetError::InvalidState { entity, id, current_status, .. } => Some(json!({
                "entity": entity,
                "id": id,
                "current_status": current_status,
            })),
            FleetError::Validation(e) => Some(json!(e)),
            FleetError::Storage(_) => Some(json!({ "retryable": true })),
            FleetError::InvalidInput(_) | FleetError::Unauthorized(_) | FleetError::Forbidden(_) => None,
        }
    }
}

/// Error body returned by the API
#[derive(Debug, serde::Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl IntoResponse for FleetError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Storage messages can leak SQL; keep them in the logs only.
        let message = match &self {
            FleetError::Storage(msg) => {
                error!("Storage failure: {}", msg);
                "The operation could not be committed, please retry".to_string()
            }
            other => {
                warn!(code = other.kind(), "Request rejected: {}", other);
                other.to_string()
            }
        };

        let body = ErrorResponse {
            error: status.canonical_reason().unwrap_or("Error").to_string(),
            message,
            code: self.kind(),
            details: self.details(),
        };

        (status, Json(body)).into_response()
    }
}

/// Typed result for operations that can fail
pub type FleetResult<T> = Result<T, FleetError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_storage_is_retryable() {
        assert!(FleetError::Storage("connection reset".to_string()).is_retryable());
        assert!(!FleetError::not_found("Trip", 1).is_retryable());
        assert!(!FleetError::InvalidInput("x".to_string()).is_retryable());
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(FleetError::not_found("Vehicle", 3).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            FleetError::CapacityExceeded {
                max_capacity: Decimal::from(1000),
                requested: Decimal::from(1500),
            }
            .status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            FleetError::invalid_state("Trip", 1, "completed", "trip is not in draft status").status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(FleetError::Storage("down".to_string()).status_code(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_messages_carry_context() {
        let err = FleetError::VehicleUnavailable {
            vehicle_id: 4,
            current_status: VehicleStatus::InShop,
        };
        assert_eq!(err.to_string(), "Vehicle 4 is not available (current status: in_shop)");
        assert_eq!(err.kind(), "VEHICLE_UNAVAILABLE");

        let details = err.details().unwrap();
        assert_eq!(details["current_status"], "in_shop");
    }

    #[test]
    fn test_sqlx_errors_become_storage_failures() {
        let err: FleetError = sqlx::Error::PoolTimedOut.into();
        assert_eq!(err.kind(), "STORAGE_FAILURE");
    }
}

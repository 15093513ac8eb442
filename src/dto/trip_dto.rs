use rust_decimal::Decimal;
use serde::Deserialize;
use validator::Validate;

use crate::models::NewTrip;
use crate::utils::validation::{validate_non_negative, validate_not_blank};

// Request to create a trip
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTripRequest {
    pub vehicle_id: i64,
    pub driver_id: i64,

    #[validate(length(max = 255), custom = "validate_not_blank")]
    pub origin: String,

    #[validate(length(max = 255), custom = "validate_not_blank")]
    pub destination: String,

    pub cargo_description: Option<String>,

    #[validate(custom = "validate_non_negative")]
    pub cargo_weight_kg: Decimal,

    #[validate(custom = "validate_non_negative")]
    pub revenue: Option<Decimal>,
}

impl From<CreateTripRequest> for NewTrip {
    fn from(request: CreateTripRequest) -> Self {
        Self {
            vehicle_id: request.vehicle_id,
            driver_id: request.driver_id,
            origin: request.origin.trim().to_string(),
            destination: request.destination.trim().to_string(),
            cargo_description: request.cargo_description,
            cargo_weight_kg: request.cargo_weight_kg,
            revenue: request.revenue,
        }
    }
}

// Request to complete a dispatched trip
#[derive(Debug, Deserialize, Validate)]
pub struct CompleteTripRequest {
    #[validate(custom = "validate_non_negative")]
    pub end_odometer: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_blank_origin_is_rejected() {
        let request: CreateTripRequest = serde_json::from_value(json!({
            "vehicle_id": 1,
            "driver_id": 2,
            "origin": "  ",
            "destination": "Lyon",
            "cargo_weight_kg": 500
        }))
        .unwrap();

        let errors = request.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("origin"));
    }

    #[test]
    fn test_negative_weight_is_rejected() {
        let request: CreateTripRequest = serde_json::from_value(json!({
            "vehicle_id": 1,
            "driver_id": 2,
            "origin": "Paris",
            "destination": "Lyon",
            "cargo_weight_kg": -1
        }))
        .unwrap();

        assert!(request.validate().is_err());
    }

    #[test]
    fn test_conversion_trims_places() {
        let request: CreateTripRequest = serde_json::from_value(json!({
            "vehicle_id": 1,
            "driver_id": 2,
            "origin": " Paris ",
            "destination": "Lyon",
            "cargo_weight_kg": "250.5",
            "revenue": 1200
        }))
        .unwrap();
        assert!(request.validate().is_ok());

        let trip = NewTrip::from(request);
        assert_eq!(trip.origin, "Paris");
        assert_eq!(trip.cargo_weight_kg, Decimal::new(2505, 1));
        assert_eq!(trip.revenue, Some(Decimal::from(1200)));
    }
}

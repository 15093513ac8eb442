use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use validator::Validate;

use crate::models::{MaintenanceLogChanges, NewMaintenanceLog};
use crate::utils::validation::{validate_non_negative, validate_not_blank};

// Request to open a maintenance log
#[derive(Debug, Deserialize, Validate)]
pub struct CreateMaintenanceLogRequest {
    pub vehicle_id: i64,

    #[validate(length(max = 100), custom = "validate_not_blank")]
    pub service_type: String,

    pub description: Option<String>,

    #[serde(default)]
    #[validate(custom = "validate_non_negative")]
    pub cost: Decimal,

    pub service_date: NaiveDate,
}

impl From<CreateMaintenanceLogRequest> for NewMaintenanceLog {
    fn from(request: CreateMaintenanceLogRequest) -> Self {
        Self {
            vehicle_id: request.vehicle_id,
            service_type: request.service_type.trim().to_string(),
            description: request.description,
            cost: request.cost,
            service_date: request.service_date,
        }
    }
}

// Request to edit a maintenance log; every editable field is replaced
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateMaintenanceLogRequest {
    #[validate(length(max = 100), custom = "validate_not_blank")]
    pub service_type: String,

    pub description: Option<String>,

    #[serde(default)]
    #[validate(custom = "validate_non_negative")]
    pub cost: Decimal,

    pub service_date: NaiveDate,
}

impl From<UpdateMaintenanceLogRequest> for MaintenanceLogChanges {
    fn from(request: UpdateMaintenanceLogRequest) -> Self {
        Self {
            service_type: request.service_type.trim().to_string(),
            description: request.description,
            cost: request.cost,
            service_date: request.service_date,
        }
    }
}

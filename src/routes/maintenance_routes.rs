use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, patch, post},
    Extension, Json, Router,
};
use serde_json::json;
use validator::Validate;

use super::extract::{ApiJson, ApiPath, ApiQuery};
use crate::dto::maintenance_dto::{CreateMaintenanceLogRequest, UpdateMaintenanceLogRequest};
use crate::middleware::{require_permission, Permission};
use crate::models::{Actor, MaintenanceFilters, MaintenanceListing, MaintenanceLog};
use crate::state::AppState;
use crate::utils::errors::FleetResult;

pub fn create_maintenance_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_log).get(list_logs))
        .route("/:id", get(get_log).put(update_log).delete(delete_log))
        .route("/:id/complete", patch(complete_log))
}

async fn create_log(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    ApiJson(request): ApiJson<CreateMaintenanceLogRequest>,
) -> FleetResult<(StatusCode, Json<MaintenanceLog>)> {
    require_permission(&actor, Permission::ManageMaintenance)?;
    request.validate()?;
    let log = state.maintenance.create_log(&actor, request.into()).await?;
    Ok((StatusCode::CREATED, Json(log)))
}

async fn list_logs(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    ApiQuery(filters): ApiQuery<MaintenanceFilters>,
) -> FleetResult<Json<Vec<MaintenanceListing>>> {
    require_permission(&actor, Permission::ViewMaintenance)?;
    Ok(Json(state.maintenance.list(&filters).await?))
}

async fn get_log(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    ApiPath(id): ApiPath<i64>,
) -> FleetResult<Json<MaintenanceLog>> {
    require_permission(&actor, Permission::ViewMaintenance)?;
    Ok(Json(state.maintenance.get(id).await?))
}

async fn update_log(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(request): ApiJson<UpdateMaintenanceLogRequest>,
) -> FleetResult<Json<MaintenanceLog>> {
    require_permission(&actor, Permission::ManageMaintenance)?;
    request.validate()?;
    Ok(Json(state.maintenance.update_log(&actor, id, request.into()).await?))
}

async fn delete_log(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    ApiPath(id): ApiPath<i64>,
) -> FleetResult<Json<serde_json::Value>> {
    require_permission(&actor, Permission::ManageMaintenance)?;
    state.maintenance.delete_log(&actor, id).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Maintenance log deleted successfully"
    })))
}

async fn complete_log(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    ApiPath(id): ApiPath<i64>,
) -> FleetResult<Json<MaintenanceLog>> {
    require_permission(&actor, Permission::ManageMaintenance)?;
    Ok(Json(state.maintenance.complete_log(&actor, id).await?))
}

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, patch, post},
    Extension, Json, Router,
};
use validator::Validate;

use super::extract::{ApiJson, ApiPath, ApiQuery};
use crate::dto::trip_dto::{CompleteTripRequest, CreateTripRequest};
use crate::middleware::{require_permission, Permission};
use crate::models::{Actor, Trip, TripFilters, TripListing};
use crate::state::AppState;
use crate::utils::errors::FleetResult;

pub fn create_trip_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_trip).get(list_trips))
        .route("/:id", get(get_trip))
        .route("/:id/dispatch", patch(dispatch_trip))
        .route("/:id/complete", patch(complete_trip))
        .route("/:id/cancel", patch(cancel_trip))
}

async fn create_trip(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    ApiJson(request): ApiJson<CreateTripRequest>,
) -> FleetResult<(StatusCode, Json<Trip>)> {
    require_permission(&actor, Permission::ManageTrips)?;
    request.validate()?;
    let trip = state.trips.create(&actor, request.into()).await?;
    Ok((StatusCode::CREATED, Json(trip)))
}

async fn list_trips(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    ApiQuery(filters): ApiQuery<TripFilters>,
) -> FleetResult<Json<Vec<TripListing>>> {
    require_permission(&actor, Permission::ViewTrips)?;
    Ok(Json(state.trips.list(&filters).await?))
}

async fn get_trip(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    ApiPath(id): ApiPath<i64>,
) -> FleetResult<Json<Trip>> {
    require_permission(&actor, Permission::ViewTrips)?;
    Ok(Json(state.trips.get(id).await?))
}

async fn dispatch_trip(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    ApiPath(id): ApiPath<i64>,
) -> FleetResult<Json<Trip>> {
    require_permission(&actor, Permission::ManageTrips)?;
    Ok(Json(state.trips.dispatch(&actor, id).await?))
}

async fn complete_trip(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(request): ApiJson<CompleteTripRequest>,
) -> FleetResult<Json<Trip>> {
    require_permission(&actor, Permission::ManageTrips)?;
    request.validate()?;
    Ok(Json(state.trips.complete(&actor, id, request.end_odometer).await?))
}

async fn cancel_trip(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    ApiPath(id): ApiPath<i64>,
) -> FleetResult<Json<Trip>> {
    require_permission(&actor, Permission::ManageTrips)?;
    Ok(Json(state.trips.cancel(&actor, id).await?))
}

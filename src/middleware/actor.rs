//! Actor middleware
//!
//! Credentials are verified by the gateway in front of this service. It
//! forwards the authenticated identity as `x-actor-id` / `x-actor-role`;
//! this middleware only parses those headers into an [`Actor`] and injects
//! it into the request extensions. Permission checks are per route via
//! [`require_permission`].

use axum::{extract::Request, http::HeaderMap, middleware::Next, response::Response};

use crate::models::{Actor, Role};
use crate::utils::errors::{FleetError, FleetResult};

pub const ACTOR_ID_HEADER: &str = "x-actor-id";
pub const ACTOR_ROLE_HEADER: &str = "x-actor-role";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    ManageTrips,
    ManageMaintenance,
    ViewTrips,
    ViewMaintenance,
}

impl Permission {
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::ManageTrips => "manage_trips",
            Permission::ManageMaintenance => "manage_maintenance",
            Permission::ViewTrips => "view_trips",
            Permission::ViewMaintenance => "view_maintenance",
        }
    }
}

impl Role {
    /// Role to permission table. Fleet managers can do everything.
    pub fn permits(&self, permission: Permission) -> bool {
        match self {
            Role::FleetManager => true,
            Role::Dispatcher => matches!(
                permission,
                Permission::ManageTrips | Permission::ViewTrips | Permission::ViewMaintenance
            ),
            Role::SafetyOfficer => matches!(
                permission,
                Permission::ManageMaintenance | Permission::ViewTrips
            ),
            Role::FinancialAnalyst => matches!(
                permission,
                Permission::ViewTrips | Permission::ViewMaintenance
            ),
        }
    }
}

pub fn require_permission(actor: &Actor, permission: Permission) -> FleetResult<()> {
    if actor.role.permits(permission) {
        Ok(())
    } else {
        Err(FleetError::Forbidden(format!(
            "role {} lacks permission {}",
            actor.role,
            permission.as_str()
        )))
    }
}

fn actor_from_headers(headers: &HeaderMap) -> FleetResult<Actor> {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| FleetError::Unauthorized(format!("missing {} header", name)))
    };

    let user_id = header(ACTOR_ID_HEADER)?
        .parse::<i64>()
        .map_err(|_| FleetError::Unauthorized("invalid actor id".to_string()))?;
    let role = header(ACTOR_ROLE_HEADER)?
        .parse::<Role>()
        .map_err(FleetError::Unauthorized)?;

    Ok(Actor::new(user_id, role))
}

pub async fn actor_middleware(mut request: Request, next: Next) -> Result<Response, FleetError> {
    let actor = actor_from_headers(request.headers())?;
    request.extensions_mut().insert(actor);
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_permission_table() {
        assert!(Role::FleetManager.permits(Permission::ManageMaintenance));
        assert!(Role::Dispatcher.permits(Permission::ManageTrips));
        assert!(!Role::Dispatcher.permits(Permission::ManageMaintenance));
        assert!(Role::SafetyOfficer.permits(Permission::ManageMaintenance));
        assert!(!Role::SafetyOfficer.permits(Permission::ManageTrips));
        assert!(!Role::FinancialAnalyst.permits(Permission::ManageTrips));
        assert!(Role::FinancialAnalyst.permits(Permission::ViewMaintenance));
    }

    #[test]
    fn test_require_permission_reports_role() {
        let analyst = Actor::new(9, Role::FinancialAnalyst);
        let err = require_permission(&analyst, Permission::ManageTrips).unwrap_err();
        assert_eq!(err.kind(), "FORBIDDEN");
        assert!(err.to_string().contains("financial_analyst"));
    }

    #[test]
    fn test_actor_from_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(ACTOR_ID_HEADER, HeaderValue::from_static("42"));
        headers.insert(ACTOR_ROLE_HEADER, HeaderValue::from_static("dispatcher"));
        assert_eq!(actor_from_headers(&headers).unwrap(), Actor::new(42, Role::Dispatcher));

        headers.insert(ACTOR_ROLE_HEADER, HeaderValue::from_static("root"));
        assert_eq!(actor_from_headers(&headers).unwrap_err().kind(), "UNAUTHORIZED");

        headers.remove(ACTOR_ID_HEADER);
        assert_eq!(actor_from_headers(&headers).unwrap_err().kind(), "UNAUTHORIZED");
    }
}

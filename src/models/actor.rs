//! Actor model
//!
//! The identity performing an operation. Authentication happens upstream;
//! by the time an `Actor` exists it is trusted.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    FleetManager,
    Dispatcher,
    SafetyOfficer,
    FinancialAnalyst,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::FleetManager => "fleet_manager",
            Role::Dispatcher => "dispatcher",
            Role::SafetyOfficer => "safety_officer",
            Role::FinancialAnalyst => "financial_analyst",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fleet_manager" => Ok(Role::FleetManager),
            "dispatcher" => Ok(Role::Dispatcher),
            "safety_officer" => Ok(Role::SafetyOfficer),
            "financial_analyst" => Ok(Role::FinancialAnalyst),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

/// Authenticated user injected into requests
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub user_id: i64,
    pub role: Role,
}

impl Actor {
    pub fn new(user_id: i64, role: Role) -> Self {
        Self { user_id, role }
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.role, self.user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trips_through_str() {
        for role in [Role::FleetManager, Role::Dispatcher, Role::SafetyOfficer, Role::FinancialAnalyst] {
            assert_eq!(role.as_str().parse::<Role>(), Ok(role));
        }
        assert!("admin".parse::<Role>().is_err());
    }
}

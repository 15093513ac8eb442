//! Shared application state
//!
//! Handed to every axum handler. The store, notifier and clock are injected
//! once here and shared by both lifecycle services.

use std::sync::Arc;

use crate::config::EnvironmentConfig;
use crate::repositories::EntityStore;
use crate::services::{Clock, EventNotifier, MaintenanceService, TripService};

#[derive(Clone)]
pub struct AppState {
    pub config: EnvironmentConfig,
    pub trips: TripService,
    pub maintenance: MaintenanceService,
}

impl AppState {
    pub fn new(
        config: EnvironmentConfig,
        store: Arc<dyn EntityStore>,
        notifier: Arc<dyn EventNotifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config,
            trips: TripService::new(Arc::clone(&store), Arc::clone(&notifier), Arc::clone(&clock)),
            maintenance: MaintenanceService::new(store, notifier, clock),
        }
    }
}

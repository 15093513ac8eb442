#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;

use fleet_ops::models::{
    Actor, Driver, DriverStatus, NewDriver, NewMaintenanceLog, NewTrip, NewVehicle, Role, Vehicle, VehicleStatus,
    VehicleType,
};
use fleet_ops::repositories::{EntityStore, InMemoryEntityStore};
use fleet_ops::services::{EventNotifier, FixedClock, FleetEvent, MaintenanceService, TripService};

/// Keeps every event in emission order
#[derive(Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<FleetEvent>>,
}

impl RecordingNotifier {
    pub fn events(&self) -> Vec<FleetEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.events.lock().unwrap().iter().map(FleetEvent::name).collect()
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }
}

impl EventNotifier for RecordingNotifier {
    fn notify(&self, event: FleetEvent) {
        self.events.lock().unwrap().push(event);
    }
}

pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 19, 9, 30, 0).unwrap()
}

pub fn today() -> NaiveDate {
    now().date_naive()
}

pub fn kg(value: i64) -> Decimal {
    Decimal::from(value)
}

/// Suffix for license plates and numbers, unique across the test binary
pub fn unique_suffix() -> usize {
    static NEXT: AtomicUsize = AtomicUsize::new(1);
    NEXT.fetch_add(1, Ordering::Relaxed)
}

pub fn manager() -> Actor {
    Actor::new(1, Role::FleetManager)
}

/// Services wired to an in-memory store, a recording notifier and a clock
/// frozen at [`now`]. Seeds one truck and one truck-licensed driver.
pub struct Harness {
    pub store: InMemoryEntityStore,
    pub notifier: Arc<RecordingNotifier>,
    pub trips: TripService,
    pub maintenance: MaintenanceService,
    pub actor: Actor,
    pub vehicle: Vehicle,
    pub driver: Driver,
}

impl Harness {
    pub async fn new() -> Self {
        let store = InMemoryEntityStore::new();
        let notifier = Arc::new(RecordingNotifier::default());
        let clock = Arc::new(FixedClock(now()));

        let shared: Arc<dyn EntityStore> = Arc::new(store.clone());
        let trips = TripService::new(Arc::clone(&shared), notifier.clone(), clock.clone());
        let maintenance = MaintenanceService::new(shared, notifier.clone(), clock);

        let vehicle = store
            .insert_vehicle(
                NewVehicle::new("Truck 1", "TRK-001", VehicleType::Truck, kg(1000)).with_odometer(kg(10_000)),
            )
            .await
            .unwrap();
        let driver = store
            .insert_driver(NewDriver::new(
                "Alex Martin",
                "LIC-001",
                VehicleType::Truck,
                today() + Duration::days(30),
            ))
            .await
            .unwrap();

        Self {
            store,
            notifier,
            trips,
            maintenance,
            actor: manager(),
            vehicle,
            driver,
        }
    }

    pub async fn add_vehicle(&self, vehicle_type: VehicleType, status: VehicleStatus) -> Vehicle {
        let plate = format!("{}-{:03}", vehicle_type.as_str().to_uppercase(), unique_suffix());
        self.store
            .insert_vehicle(NewVehicle::new("Extra", &plate, vehicle_type, kg(1000)).with_status(status))
            .await
            .unwrap()
    }

    pub async fn add_driver(&self, category: VehicleType, expiry: NaiveDate, status: DriverStatus) -> Driver {
        let license = format!("LIC-X{:03}", unique_suffix());
        self.store
            .insert_driver(NewDriver::new("Extra driver", &license, category, expiry).with_status(status))
            .await
            .unwrap()
    }

    pub fn trip_input(&self, cargo_weight_kg: i64) -> NewTrip {
        trip_input(self.vehicle.id, self.driver.id, cargo_weight_kg)
    }

    pub fn log_input(&self) -> NewMaintenanceLog {
        NewMaintenanceLog {
            vehicle_id: self.vehicle.id,
            service_type: "Oil Change".to_string(),
            description: Some("10k service".to_string()),
            cost: kg(120),
            service_date: today(),
        }
    }

    pub async fn vehicle_status(&self, id: i64) -> VehicleStatus {
        self.store.get_vehicle(id).await.unwrap().unwrap().status
    }

    pub async fn driver_status(&self, id: i64) -> DriverStatus {
        self.store.get_driver(id).await.unwrap().unwrap().status
    }
}

pub fn trip_input(vehicle_id: i64, driver_id: i64, cargo_weight_kg: i64) -> NewTrip {
    NewTrip {
        vehicle_id,
        driver_id,
        origin: "Lyon".to_string(),
        destination: "Marseille".to_string(),
        cargo_description: Some("Pallets".to_string()),
        cargo_weight_kg: kg(cargo_weight_kg),
        revenue: None,
    }
}

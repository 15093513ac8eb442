mod common;

use chrono::Duration;
use futures::future::join_all;

use common::{today, trip_input, Harness};
use fleet_ops::models::{DriverStatus, TripFilters, TripStatus, VehicleStatus, VehicleType};
use fleet_ops::utils::errors::FleetError;

const CONTENDERS: usize = 8;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_dispatches_on_one_vehicle_admit_exactly_one() {
    let h = Harness::new().await;

    let mut trip_ids = Vec::new();
    for _ in 0..CONTENDERS {
        let driver = h.add_driver(VehicleType::Truck, today() + Duration::days(30), DriverStatus::OnDuty).await;
        let trip = h.trips.create(&h.actor, trip_input(h.vehicle.id, driver.id, 100)).await.unwrap();
        trip_ids.push(trip.id);
    }

    let handles = trip_ids.iter().map(|&id| {
        let trips = h.trips.clone();
        let actor = h.actor.clone();
        tokio::spawn(async move { trips.dispatch(&actor, id).await })
    });
    let results: Vec<_> = join_all(handles).await.into_iter().map(|joined| joined.unwrap()).collect();

    let winners = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1);
    for result in results.iter().filter_map(|r| r.as_ref().err()) {
        assert!(
            matches!(result, FleetError::VehicleUnavailable { current_status: VehicleStatus::OnTrip, .. }),
            "{result:?}"
        );
    }

    let dispatched = h
        .trips
        .list(&TripFilters {
            status: Some(TripStatus::Dispatched),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(dispatched.len(), 1);
    assert_eq!(h.vehicle_status(h.vehicle.id).await, VehicleStatus::OnTrip);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_dispatches_for_one_driver_admit_exactly_one() {
    let h = Harness::new().await;

    let mut trip_ids = Vec::new();
    for _ in 0..CONTENDERS {
        let vehicle = h.add_vehicle(VehicleType::Truck, VehicleStatus::Available).await;
        let trip = h.trips.create(&h.actor, trip_input(vehicle.id, h.driver.id, 100)).await.unwrap();
        trip_ids.push(trip.id);
    }

    let handles = trip_ids.iter().map(|&id| {
        let trips = h.trips.clone();
        let actor = h.actor.clone();
        tokio::spawn(async move { trips.dispatch(&actor, id).await })
    });
    let results: Vec<_> = join_all(handles).await.into_iter().map(|joined| joined.unwrap()).collect();

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results
        .iter()
        .filter_map(|r| r.as_ref().err())
        .all(|e| matches!(e, FleetError::DriverUnavailable { .. })));

    let driver_status = h.driver_status(h.driver.id).await;
    assert_eq!(driver_status, DriverStatus::OnTrip);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_maintenance_and_dispatch_race_never_leave_both_applied() {
    let h = Harness::new().await;
    let trip = h.trips.create(&h.actor, h.trip_input(100)).await.unwrap();

    let trips = h.trips.clone();
    let maintenance = h.maintenance.clone();
    let (actor_a, actor_b) = (h.actor.clone(), h.actor.clone());
    let log_input = h.log_input();

    let (dispatch, log) = tokio::join!(
        tokio::spawn(async move { trips.dispatch(&actor_a, trip.id).await }),
        tokio::spawn(async move { maintenance.create_log(&actor_b, log_input).await }),
    );
    let (dispatch, log) = (dispatch.unwrap(), log.unwrap());

    // Whichever committed first wins; the other sees the new status.
    assert!(dispatch.is_ok() != log.is_ok());
    let expected = if dispatch.is_ok() { VehicleStatus::OnTrip } else { VehicleStatus::InShop };
    assert_eq!(h.vehicle_status(h.vehicle.id).await, expected);
}

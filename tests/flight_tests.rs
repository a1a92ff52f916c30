// Flight tests - plan retries, arrival waits and cancellation

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::*;
use spacetraders_ship::config::FlightConfig;
use spacetraders_ship::telemetry::TradeCounters;
use spacetraders_ship::{Request, Shutdown, TraderError};

#[tokio::test]
async fn test_insufficient_fuel_buys_fuel_and_retries_once() {
    let transport = MockTransport::new();
    transport
        .on(Kind::ShipDetails, ship_json("OE-PM", 100, &[], None))
        .on(Kind::NewFlightPlan, insufficient_fuel_json(12))
        .on(Kind::NewFlightPlan, flight_plan_json("plan-1", "OE-CR", 30, 12))
        .on(Kind::Buy, trade_json("FUEL", 12));

    let mut ship = ship_for(&transport);
    ship.get_details().await.unwrap();
    let plan = ship.new_flight_plan("OE-CR").await.expect("plan after resupply");

    assert_eq!(plan.id, "plan-1");
    assert_eq!(transport.buys(), vec![("FUEL".to_string(), 12)]);

    let plan_requests: Vec<Request> = transport
        .calls()
        .into_iter()
        .filter(|r| matches!(r, Request::NewFlightPlan { .. }))
        .collect();
    assert_eq!(
        plan_requests,
        vec![
            Request::NewFlightPlan { destination: "OE-CR".to_string() },
            Request::NewFlightPlan { destination: "OE-CR".to_string() },
        ]
    );
}

#[tokio::test]
async fn test_unrelated_rejection_fails_without_retry() {
    let transport = MockTransport::new();
    transport.on(Kind::NewFlightPlan, error_json(400, "Destination is invalid"));

    let mut ship = ship_for(&transport);
    let err = ship.new_flight_plan("NOWHERE").await.unwrap_err();

    assert!(matches!(err, TraderError::ServerApplication { code: 400, .. }));
    assert_eq!(transport.count(Kind::NewFlightPlan), 1);
    assert!(transport.buys().is_empty());
    assert_eq!(ship.state().last_error.code, 400);
}

#[tokio::test]
async fn test_persistent_fuel_rejection_is_bounded() {
    let transport = MockTransport::new();
    transport
        .on(Kind::ShipDetails, ship_json("OE-PM", 100, &[], None))
        .on(Kind::NewFlightPlan, insufficient_fuel_json(5))
        .on(Kind::Buy, trade_json("FUEL", 5));

    let mut ship = ship_for(&transport).with_flight_config(FlightConfig {
        max_plan_attempts: 3,
        ..FlightConfig::default()
    });
    ship.get_details().await.unwrap();
    let err = ship.new_flight_plan("OE-CR").await.unwrap_err();

    assert!(matches!(
        err,
        TraderError::FlightPlanRejected { attempts: 3, .. }
    ));
    assert_eq!(transport.count(Kind::NewFlightPlan), 3);
    assert_eq!(transport.buys().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_fly_waits_for_sum_of_remaining_times() {
    let transport = MockTransport::new();
    transport
        .on(Kind::NewFlightPlan, flight_plan_json("plan-1", "OE-CR", 30, 8))
        .on(Kind::ShipDetails, ship_json("", 100, &[], Some("plan-1")))
        .on(Kind::ShipDetails, ship_json("OE-CR", 100, &[], None))
        .on(Kind::FlightPlan, flight_plan_json("plan-1", "OE-CR", 10, 8));

    let counters = Arc::new(TradeCounters::new());
    let mut ship = ship_for(&transport).with_observer(counters.clone());

    let started = tokio::time::Instant::now();
    ship.fly("OE-CR").await.expect("flight completes");

    // 30s reported + 5s grace, then one poll reporting 10s more.
    assert_eq!(started.elapsed(), Duration::from_secs(45));
    assert_eq!(transport.count(Kind::FlightPlan), 1);
    assert_eq!(transport.count(Kind::ShipDetails), 2);
    assert_eq!(ship.details().location(), "OE-CR");
    assert_eq!(counters.snapshot().fuel_consumed["ship-1"], 8);
}

#[tokio::test(start_paused = true)]
async fn test_fly_terminates_when_first_refresh_shows_arrival() {
    let transport = MockTransport::new();
    transport
        .on(Kind::NewFlightPlan, flight_plan_json("plan-1", "OE-CR", 20, 4))
        .on(Kind::ShipDetails, ship_json("OE-CR", 100, &[], None));

    let mut ship = ship_for(&transport);
    let started = tokio::time::Instant::now();
    ship.fly("OE-CR").await.unwrap();

    assert_eq!(started.elapsed(), Duration::from_secs(25));
    assert_eq!(transport.count(Kind::FlightPlan), 0);
}

#[tokio::test(start_paused = true)]
async fn test_zero_remaining_while_in_flight_uses_idle_poll() {
    let transport = MockTransport::new();
    transport
        .on(Kind::NewFlightPlan, flight_plan_json("plan-1", "OE-CR", 0, 4))
        .on(Kind::ShipDetails, ship_json("", 100, &[], Some("plan-1")))
        .on(Kind::ShipDetails, ship_json("", 100, &[], Some("plan-1")))
        .on(Kind::ShipDetails, ship_json("OE-CR", 100, &[], None))
        .on(Kind::FlightPlan, flight_plan_json("plan-1", "OE-CR", 0, 4));

    let mut ship = ship_for(&transport);
    let started = tokio::time::Instant::now();
    ship.fly("OE-CR").await.unwrap();

    // Grace, then two idle polls.
    assert_eq!(started.elapsed(), Duration::from_secs(7));
    assert_eq!(transport.count(Kind::FlightPlan), 2);
}

#[tokio::test(start_paused = true)]
async fn test_await_arrival_waits_out_existing_flight() {
    let transport = MockTransport::new();
    transport
        .on(Kind::ShipDetails, ship_json("", 100, &[], Some("plan-9")))
        .on(Kind::ShipDetails, ship_json("OE-CR", 100, &[], None))
        .on(Kind::FlightPlan, flight_plan_json("plan-9", "OE-CR", 40, 4));

    let mut ship = ship_for(&transport);
    let started = tokio::time::Instant::now();
    ship.await_arrival().await.unwrap();

    assert_eq!(started.elapsed(), Duration::from_secs(40));
    assert_eq!(ship.details().location(), "OE-CR");
}

#[tokio::test]
async fn test_get_flight_plan_when_docked_is_none() {
    let transport = MockTransport::new();
    transport.on(Kind::ShipDetails, ship_json("OE-PM", 100, &[], None));

    let mut ship = ship_for(&transport);
    ship.get_details().await.unwrap();

    assert!(ship.get_flight_plan().await.unwrap().is_none());
    assert_eq!(transport.count(Kind::FlightPlan), 0);
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_interrupts_flight_wait() {
    let transport = MockTransport::new();
    transport.on(Kind::NewFlightPlan, flight_plan_json("plan-1", "OE-CR", 3600, 4));

    let (trigger, shutdown) = Shutdown::new();
    let mut ship = ship_for(&transport).with_shutdown(shutdown);

    let flight = tokio::spawn(async move { ship.fly("OE-CR").await });
    tokio::time::sleep(Duration::from_secs(60)).await;
    trigger.trigger();

    let err = flight.await.expect("join").unwrap_err();
    assert!(err.is_cancelled());
    assert_eq!(transport.count(Kind::ShipDetails), 0);
}

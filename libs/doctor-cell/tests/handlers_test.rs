// libs/doctor-cell/tests/handlers_test.rs

use std::sync::Arc;

use axum::extract::{Extension, Path, Query, State};
use axum::Json;
use chrono::{NaiveDate, NaiveTime};
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use doctor_cell::handlers::{self, DoctorSearchQuery, SlotQuery};
use doctor_cell::models::{CreateAvailabilityRequest, DayOfWeek};
use shared_database::AppState;
use shared_models::error::AppError;
use shared_utils::test_utils::{MockStoreRows, TestConfig, TestUser};

fn state_for(mock_server: &MockServer) -> Arc<AppState> {
    TestConfig::with_store_url(&mock_server.uri()).to_state()
}

fn clock(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

// 2025-01-06 is a Monday.
fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 6).unwrap()
}

async fn mount_window(mock_server: &MockServer, doctor_id: &str, day: &str, start: &str, end: &str) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/availability"))
        .and(query_param("doctor_id", format!("eq.{}", doctor_id)))
        .and(query_param("day_of_week", format!("eq.{}", day)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreRows::availability_row(doctor_id, day, start, end)
        ])))
        .mount(mock_server)
        .await;
}

async fn mount_appointments(mock_server: &MockServer, rows: serde_json::Value) {
    // The scheduler must exclude cancelled bookings in the store query
    // itself; a request without the filter will not match this mock.
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("status", "neq.cancelled"))
        .respond_with(ResponseTemplate::new(200).set_body_json(rows))
        .mount(mock_server)
        .await;
}

#[tokio::test]
async fn open_monday_yields_sixteen_free_slots() {
    let mock_server = MockServer::start().await;
    let doctor_id = Uuid::new_v4().to_string();

    mount_window(&mock_server, &doctor_id, "monday", "09:00", "17:00").await;
    mount_appointments(&mock_server, json!([])).await;

    let result = handlers::get_available_slots(
        State(state_for(&mock_server)),
        Path(doctor_id.clone()),
        Query(SlotQuery { date: monday() }),
    )
    .await;

    let response = result.expect("slot query should succeed").0;
    let slots = response["available_slots"].as_array().unwrap();

    assert_eq!(slots.len(), 16);
    assert_eq!(slots[0]["time"], "09:00 - 09:30");
    assert_eq!(slots[15]["time"], "16:30 - 17:00");
    assert!(slots.iter().all(|slot| slot["is_available"] == true));
}

#[tokio::test]
async fn no_window_yields_empty_slot_list() {
    let mock_server = MockServer::start().await;
    let doctor_id = Uuid::new_v4().to_string();

    Mock::given(method("GET"))
        .and(path("/rest/v1/availability"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let result = handlers::get_available_slots(
        State(state_for(&mock_server)),
        Path(doctor_id),
        Query(SlotQuery { date: monday() }),
    )
    .await;

    let response = result.expect("slot query should succeed").0;
    assert_eq!(response["available_slots"], json!([]));
}

#[tokio::test]
async fn booked_slot_is_marked_unavailable() {
    let mock_server = MockServer::start().await;
    let doctor_id = Uuid::new_v4().to_string();
    let patient_id = Uuid::new_v4().to_string();

    mount_window(&mock_server, &doctor_id, "monday", "09:00", "17:00").await;
    mount_appointments(
        &mock_server,
        json!([MockStoreRows::appointment_row(
            &patient_id,
            &doctor_id,
            "2025-01-06",
            "10:00 - 10:30",
            "pending"
        )]),
    )
    .await;

    let result = handlers::get_available_slots(
        State(state_for(&mock_server)),
        Path(doctor_id),
        Query(SlotQuery { date: monday() }),
    )
    .await;

    let response = result.expect("slot query should succeed").0;
    let slots = response["available_slots"].as_array().unwrap();

    let taken: Vec<_> = slots.iter().filter(|slot| slot["is_available"] == false).collect();
    assert_eq!(taken.len(), 1);
    assert_eq!(taken[0]["time"], "10:00 - 10:30");
}

#[tokio::test]
async fn cancelled_bookings_are_excluded_by_the_store_query() {
    let mock_server = MockServer::start().await;
    let doctor_id = Uuid::new_v4().to_string();

    mount_window(&mock_server, &doctor_id, "monday", "09:00", "17:00").await;
    // The only booking at 10:00 is cancelled, so the filtered query
    // returns no rows and every slot stays free.
    mount_appointments(&mock_server, json!([])).await;

    let result = handlers::get_available_slots(
        State(state_for(&mock_server)),
        Path(doctor_id),
        Query(SlotQuery { date: monday() }),
    )
    .await;

    let response = result.expect("slot query should succeed").0;
    let slots = response["available_slots"].as_array().unwrap();
    assert_eq!(slots.len(), 16);
    assert!(slots.iter().all(|slot| slot["is_available"] == true));
}

#[tokio::test]
async fn legacy_capitalized_day_rows_still_deserialize() {
    let mock_server = MockServer::start().await;
    let doctor_id = Uuid::new_v4().to_string();

    // A row stored before labels were canonicalized; it parses through the
    // serde alias while the lookup itself uses the lowercase label.
    Mock::given(method("GET"))
        .and(path("/rest/v1/availability"))
        .and(query_param("day_of_week", "eq.monday"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreRows::availability_row(&doctor_id, "Monday", "09:00", "10:00")
        ])))
        .mount(&mock_server)
        .await;
    mount_appointments(&mock_server, json!([])).await;

    let result = handlers::get_available_slots(
        State(state_for(&mock_server)),
        Path(doctor_id),
        Query(SlotQuery { date: monday() }),
    )
    .await;

    let response = result.expect("slot query should succeed").0;
    assert_eq!(response["available_slots"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn create_availability_as_doctor() {
    let mock_server = MockServer::start().await;
    let doctor = TestUser::doctor("doctor@example.com");

    Mock::given(method("POST"))
        .and(path("/rest/v1/availability"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockStoreRows::availability_row(&doctor.id, "monday", "09:00", "17:00")
        ])))
        .mount(&mock_server)
        .await;

    let result = handlers::create_availability(
        State(state_for(&mock_server)),
        Extension(doctor.to_auth_user()),
        Json(CreateAvailabilityRequest {
            day_of_week: DayOfWeek::Monday,
            start_time: clock(9, 0),
            end_time: clock(17, 0),
        }),
    )
    .await;

    let response = result.expect("create_availability should succeed").0;
    assert_eq!(response["doctor_id"], doctor.id);
    assert_eq!(response["day_of_week"], "monday");
}

#[tokio::test]
async fn create_availability_requires_doctor_role() {
    let mock_server = MockServer::start().await;
    let patient = TestUser::patient("patient@example.com");

    let result = handlers::create_availability(
        State(state_for(&mock_server)),
        Extension(patient.to_auth_user()),
        Json(CreateAvailabilityRequest {
            day_of_week: DayOfWeek::Monday,
            start_time: clock(9, 0),
            end_time: clock(17, 0),
        }),
    )
    .await;

    match result.unwrap_err() {
        AppError::Auth(msg) => assert!(msg.contains("Only doctors")),
        other => panic!("Expected Auth error, got {:?}", other),
    }
}

#[tokio::test]
async fn create_availability_rejects_inverted_window() {
    let mock_server = MockServer::start().await;
    let doctor = TestUser::doctor("doctor@example.com");

    let result = handlers::create_availability(
        State(state_for(&mock_server)),
        Extension(doctor.to_auth_user()),
        Json(CreateAvailabilityRequest {
            day_of_week: DayOfWeek::Monday,
            start_time: clock(17, 0),
            end_time: clock(9, 0),
        }),
    )
    .await;

    match result.unwrap_err() {
        AppError::ValidationError(msg) => assert!(msg.contains("before")),
        other => panic!("Expected validation error, got {:?}", other),
    }
}

#[tokio::test]
async fn list_doctors_forwards_specialization_filter() {
    let mock_server = MockServer::start().await;
    let doctor_id = Uuid::new_v4().to_string();

    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .and(query_param("role", "eq.doctor"))
        .and(query_param("specialization", "ilike.*cardio*"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreRows::doctor_row(&doctor_id, "dr.heart@example.com", "Dr. Heart", "Cardiology")
        ])))
        .mount(&mock_server)
        .await;

    let result = handlers::list_doctors(
        State(state_for(&mock_server)),
        Query(DoctorSearchQuery {
            specialization: Some("cardio".to_string()),
        }),
    )
    .await;

    let response = result.expect("list_doctors should succeed").0;
    let doctors = response.as_array().unwrap();
    assert_eq!(doctors.len(), 1);
    assert_eq!(doctors[0]["specialization"], "Cardiology");
}

#[tokio::test]
async fn get_unknown_doctor_is_not_found() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let result = handlers::get_doctor(
        State(state_for(&mock_server)),
        Path(Uuid::new_v4().to_string()),
    )
    .await;

    match result.unwrap_err() {
        AppError::NotFound(msg) => assert!(msg.contains("Doctor not found")),
        other => panic!("Expected NotFound, got {:?}", other),
    }
}

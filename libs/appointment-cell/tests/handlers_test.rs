// libs/appointment-cell/tests/handlers_test.rs

use std::sync::Arc;

use axum::extract::{Extension, State};
use axum::Json;
use chrono::NaiveDate;
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use appointment_cell::handlers;
use appointment_cell::models::BookAppointmentRequest;
use appointment_cell::services::booking::DoctorLocks;
use shared_database::AppState;
use shared_models::error::AppError;
use shared_utils::test_utils::{MockStoreRows, TestConfig, TestUser};

fn state_for(mock_server: &MockServer) -> Arc<AppState> {
    TestConfig::with_store_url(&mock_server.uri()).to_state()
}

fn booking_request(doctor_id: Uuid) -> BookAppointmentRequest {
    BookAppointmentRequest {
        doctor_id,
        date: NaiveDate::from_ymd_opt(2025, 1, 6).unwrap(),
        time: "10:00 - 10:30".parse().unwrap(),
        reason: "Persistent headaches".to_string(),
    }
}

/// The existence check must carry the non-cancelled filter and the exact
/// slot label; requests without them will not match this mock.
async fn mount_existing_appointments(mock_server: &MockServer, rows: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("time", "eq.10:00 - 10:30"))
        .and(query_param("status", "neq.cancelled"))
        .respond_with(ResponseTemplate::new(200).set_body_json(rows))
        .mount(mock_server)
        .await;
}

#[tokio::test]
async fn booking_a_free_slot_creates_a_pending_appointment() {
    let mock_server = MockServer::start().await;
    let patient = TestUser::patient("pat@example.com");
    let doctor_id = Uuid::new_v4();

    mount_existing_appointments(&mock_server, json!([])).await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockStoreRows::appointment_row(
                &patient.id,
                &doctor_id.to_string(),
                "2025-01-06",
                "10:00 - 10:30",
                "pending"
            )
        ])))
        .mount(&mock_server)
        .await;

    let result = handlers::book_appointment(
        State(state_for(&mock_server)),
        Extension(patient.to_auth_user()),
        Extension(DoctorLocks::default()),
        Json(booking_request(doctor_id)),
    )
    .await;

    let response = result.expect("booking should succeed").0;
    assert_eq!(response["status"], "pending");
    assert_eq!(response["time"], "10:00 - 10:30");
    assert_eq!(response["patient_id"], patient.id);
}

#[tokio::test]
async fn booking_a_taken_slot_conflicts() {
    let mock_server = MockServer::start().await;
    let patient = TestUser::patient("pat@example.com");
    let doctor_id = Uuid::new_v4();

    mount_existing_appointments(
        &mock_server,
        json!([MockStoreRows::appointment_row(
            &Uuid::new_v4().to_string(),
            &doctor_id.to_string(),
            "2025-01-06",
            "10:00 - 10:30",
            "pending"
        )]),
    )
    .await;

    let result = handlers::book_appointment(
        State(state_for(&mock_server)),
        Extension(patient.to_auth_user()),
        Extension(DoctorLocks::default()),
        Json(booking_request(doctor_id)),
    )
    .await;

    match result.unwrap_err() {
        AppError::Conflict(msg) => assert!(msg.contains("already booked")),
        other => panic!("Expected Conflict, got {:?}", other),
    }
}

#[tokio::test]
async fn a_cancelled_booking_does_not_block_the_slot() {
    let mock_server = MockServer::start().await;
    let patient = TestUser::patient("pat@example.com");
    let doctor_id = Uuid::new_v4();

    // The only appointment at this slot is cancelled; the filtered
    // existence check therefore comes back empty and the booking goes
    // through.
    mount_existing_appointments(&mock_server, json!([])).await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockStoreRows::appointment_row(
                &patient.id,
                &doctor_id.to_string(),
                "2025-01-06",
                "10:00 - 10:30",
                "pending"
            )
        ])))
        .mount(&mock_server)
        .await;

    let result = handlers::book_appointment(
        State(state_for(&mock_server)),
        Extension(patient.to_auth_user()),
        Extension(DoctorLocks::default()),
        Json(booking_request(doctor_id)),
    )
    .await;

    assert!(result.is_ok(), "rebooking a cancelled slot should succeed");
}

#[tokio::test]
async fn booking_requires_a_reason() {
    let mock_server = MockServer::start().await;
    let patient = TestUser::patient("pat@example.com");

    let mut request = booking_request(Uuid::new_v4());
    request.reason = "   ".to_string();

    let result = handlers::book_appointment(
        State(state_for(&mock_server)),
        Extension(patient.to_auth_user()),
        Extension(DoctorLocks::default()),
        Json(request),
    )
    .await;

    match result.unwrap_err() {
        AppError::ValidationError(msg) => assert!(msg.contains("reason")),
        other => panic!("Expected validation error, got {:?}", other),
    }
}

#[tokio::test]
async fn my_appointments_embed_the_doctor_card() {
    let mock_server = MockServer::start().await;
    let patient = TestUser::patient("pat@example.com");
    let doctor_id = Uuid::new_v4().to_string();

    let mut row = MockStoreRows::appointment_row(
        &patient.id,
        &doctor_id,
        "2025-01-06",
        "10:00 - 10:30",
        "pending",
    );
    row["doctor"] = json!({
        "name": "Dr. Heart",
        "specialization": "Cardiology",
        "photo": null
    });

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("patient_id", format!("eq.{}", patient.id)))
        .and(query_param("order", "date.asc,time.asc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([row])))
        .mount(&mock_server)
        .await;

    let result = handlers::my_appointments(
        State(state_for(&mock_server)),
        Extension(patient.to_auth_user()),
        Extension(DoctorLocks::default()),
    )
    .await;

    let response = result.expect("listing should succeed").0;
    let appointments = response.as_array().unwrap();
    assert_eq!(appointments.len(), 1);
    assert_eq!(appointments[0]["doctor"]["name"], "Dr. Heart");
    assert_eq!(appointments[0]["time"], "10:00 - 10:30");
}

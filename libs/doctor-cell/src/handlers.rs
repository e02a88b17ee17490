use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{json, Value};

use shared_database::AppState;
use shared_models::auth::AuthUser;
use shared_models::error::AppError;

use crate::models::{CreateAvailabilityRequest, UpdateDoctorRequest};
use crate::services::{availability::AvailabilityService, doctor::DoctorService};

#[derive(Debug, Deserialize)]
pub struct DoctorSearchQuery {
    pub specialization: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SlotQuery {
    pub date: NaiveDate,
}

// ==============================================================================
// PUBLIC HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn list_doctors(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DoctorSearchQuery>,
) -> Result<Json<Value>, AppError> {
    let doctor_service = DoctorService::new(Arc::clone(&state.store));

    let doctors = doctor_service
        .list_doctors(query.specialization.as_deref())
        .await?;

    Ok(Json(json!(doctors)))
}

#[axum::debug_handler]
pub async fn get_doctor(
    State(state): State<Arc<AppState>>,
    Path(doctor_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let doctor_service = DoctorService::new(Arc::clone(&state.store));

    let doctor = doctor_service.get_doctor(&doctor_id).await?;

    Ok(Json(json!(doctor)))
}

#[axum::debug_handler]
pub async fn get_doctor_availability(
    State(state): State<Arc<AppState>>,
    Path(doctor_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let availability_service = AvailabilityService::new(Arc::clone(&state.store));

    let windows = availability_service.windows_for_doctor(&doctor_id).await?;

    Ok(Json(json!(windows)))
}

#[axum::debug_handler]
pub async fn get_available_slots(
    State(state): State<Arc<AppState>>,
    Path(doctor_id): Path<String>,
    Query(query): Query<SlotQuery>,
) -> Result<Json<Value>, AppError> {
    let availability_service = AvailabilityService::new(Arc::clone(&state.store));

    let slots = availability_service
        .available_slots(&doctor_id, query.date)
        .await?;

    Ok(Json(json!({
        "doctor_id": doctor_id,
        "date": query.date,
        "available_slots": slots
    })))
}

// ==============================================================================
// PROTECTED HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn update_doctor(
    State(state): State<Arc<AppState>>,
    Path(doctor_id): Path<String>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<UpdateDoctorRequest>,
) -> Result<Json<Value>, AppError> {
    // Only the doctor themselves may edit their card.
    if !user.is_doctor() || user.id != doctor_id {
        return Err(AppError::Auth("Access denied".to_string()));
    }

    let doctor_service = DoctorService::new(Arc::clone(&state.store));

    let updated = doctor_service.update_doctor(&doctor_id, request).await?;

    Ok(Json(json!(updated)))
}

#[axum::debug_handler]
pub async fn create_availability(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<CreateAvailabilityRequest>,
) -> Result<Json<Value>, AppError> {
    if !user.is_doctor() {
        return Err(AppError::Auth("Only doctors can add availability".to_string()));
    }

    let availability_service = AvailabilityService::new(Arc::clone(&state.store));

    let window = availability_service.create_window(&user.id, request).await?;

    Ok(Json(json!(window)))
}

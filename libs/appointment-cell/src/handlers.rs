use std::sync::Arc;

use axum::{
    extract::{Extension, State},
    Json,
};
use serde_json::{json, Value};

use shared_database::AppState;
use shared_models::auth::AuthUser;
use shared_models::error::AppError;

use crate::models::BookAppointmentRequest;
use crate::services::booking::{BookingService, DoctorLocks};

#[axum::debug_handler]
pub async fn book_appointment(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Extension(locks): Extension<DoctorLocks>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let booking_service = BookingService::new(Arc::clone(&state.store), locks);

    let appointment = booking_service.book_appointment(&user.id, request).await?;

    Ok(Json(json!(appointment)))
}

#[axum::debug_handler]
pub async fn my_appointments(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Extension(locks): Extension<DoctorLocks>,
) -> Result<Json<Value>, AppError> {
    let booking_service = BookingService::new(Arc::clone(&state.store), locks);

    let appointments = booking_service.appointments_for_patient(&user.id).await?;

    Ok(Json(json!(appointments)))
}

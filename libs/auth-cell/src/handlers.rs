use std::sync::Arc;

use axum::{
    extract::{Extension, State},
    Json,
};
use chrono::Duration;
use serde_json::{json, Value};
use tracing::debug;

use shared_database::AppState;
use shared_models::auth::{AuthUser, TokenResponse};
use shared_models::error::AppError;
use shared_utils::jwt::issue_token;

use crate::models::{LoginRequest, PhotoUpload, RegisterRequest, UpdateProfileRequest};
use crate::services::account::AccountService;

#[axum::debug_handler]
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RegisterRequest>,
) -> Result<Json<Value>, AppError> {
    let account_service = AccountService::new(Arc::clone(&state.store));

    let user = account_service.register(request).await?;

    Ok(Json(json!({
        "message": "User registered successfully",
        "user": user
    })))
}

#[axum::debug_handler]
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let account_service = AccountService::new(Arc::clone(&state.store));

    let record = account_service
        .verify_credentials(&request.email, &request.password)
        .await?;

    let token = issue_token(
        &record.id.to_string(),
        &record.email,
        record.role,
        &state.config.jwt_secret,
        Duration::hours(1),
    )
    .map_err(AppError::Internal)?;

    debug!("Issued token for user: {}", record.id);
    Ok(Json(TokenResponse { token }))
}

#[axum::debug_handler]
pub async fn me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Value>, AppError> {
    let account_service = AccountService::new(Arc::clone(&state.store));

    let profile = account_service.profile(&user.id).await?;

    Ok(Json(json!(profile)))
}

#[axum::debug_handler]
pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<UpdateProfileRequest>,
) -> Result<Json<Value>, AppError> {
    let account_service = AccountService::new(Arc::clone(&state.store));

    let updated = account_service.update_profile(&user.id, request).await?;

    Ok(Json(json!(updated)))
}

#[axum::debug_handler]
pub async fn upload_photo(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(upload): Json<PhotoUpload>,
) -> Result<Json<Value>, AppError> {
    let account_service = AccountService::new(Arc::clone(&state.store));

    let photo_url = account_service.set_photo(&user.id, &upload.file_data).await?;

    Ok(Json(json!({ "photo_url": photo_url })))
}

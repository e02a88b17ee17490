use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use shared_models::error::AppError;
use shared_models::user::{UserProfile, UserRole};

/// Full directory row, credential hash included. Never serialized to
/// clients; reads that leave the cell go through `UserProfile`.
#[derive(Debug, Clone, Deserialize)]
pub struct UserRecord {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: UserRole,
    pub specialization: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub photo: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Option<UserRole>,
    pub specialization: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<UserRole>,
    pub specialization: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub photo: Option<String>,
}

/// Base64 data-URL upload, e.g. "data:image/png;base64,...".
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PhotoUpload {
    pub file_data: String,
}

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("User already exists")]
    EmailTaken,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::EmailTaken => AppError::Conflict("User already exists".to_string()),
            AuthError::InvalidCredentials => AppError::Auth("Invalid credentials".to_string()),
            AuthError::Validation(msg) => AppError::ValidationError(msg),
            AuthError::NotFound(msg) => AppError::NotFound(msg),
            AuthError::Database(msg) => AppError::Database(msg),
        }
    }
}

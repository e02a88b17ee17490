use serde::{Deserialize, Serialize};

use crate::user::UserRole;

#[derive(Debug, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: String,
    pub email: Option<String>,
    pub role: Option<UserRole>,
    pub iat: Option<u64>,
    pub exp: Option<u64>,
}

/// The caller identity carried in request extensions once the bearer token
/// has been validated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    pub email: Option<String>,
    pub role: Option<UserRole>,
}

impl AuthUser {
    pub fn is_doctor(&self) -> bool {
        self.role == Some(UserRole::Doctor)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

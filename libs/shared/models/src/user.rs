use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Patient,
    Doctor,
    Admin,
}

impl Default for UserRole {
    fn default() -> Self {
        UserRole::Patient
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserRole::Patient => write!(f, "patient"),
            UserRole::Doctor => write!(f, "doctor"),
            UserRole::Admin => write!(f, "admin"),
        }
    }
}

/// Column projection used on every directory read so the credential hash
/// never leaves the store.
pub const PUBLIC_USER_COLUMNS: &str =
    "id,name,email,role,specialization,bio,location,photo,created_at,updated_at";

/// A user as served to clients. Doctor-only fields are plain Options; they
/// are meaningful only when `role` is doctor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub specialization: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub photo: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

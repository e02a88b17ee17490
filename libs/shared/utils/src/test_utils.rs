use std::sync::Arc;

use chrono::{Duration, Utc};
use serde_json::json;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::AppState;
use shared_models::auth::AuthUser;
use shared_models::user::UserRole;

use crate::jwt::issue_token;

pub struct TestConfig {
    pub jwt_secret: String,
    pub supabase_url: String,
    pub supabase_service_key: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "test-secret-key-for-jwt-validation-must-be-long-enough".to_string(),
            supabase_url: "http://localhost:54321".to_string(),
            supabase_service_key: "test-service-key".to_string(),
        }
    }
}

impl TestConfig {
    /// A config pointing at a mock server (usually wiremock's URI).
    pub fn with_store_url(url: &str) -> Self {
        Self {
            supabase_url: url.to_string(),
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            supabase_url: self.supabase_url.clone(),
            supabase_service_key: self.supabase_service_key.clone(),
            jwt_secret: self.jwt_secret.clone(),
            port: 5000,
        }
    }

    pub fn to_state(&self) -> Arc<AppState> {
        Arc::new(AppState::new(self.to_app_config()))
    }
}

pub struct TestUser {
    pub id: String,
    pub email: String,
    pub role: UserRole,
}

impl Default for TestUser {
    fn default() -> Self {
        Self::new("test@example.com", UserRole::Patient)
    }
}

impl TestUser {
    pub fn new(email: &str, role: UserRole) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email: email.to_string(),
            role,
        }
    }

    pub fn doctor(email: &str) -> Self {
        Self::new(email, UserRole::Doctor)
    }

    pub fn patient(email: &str) -> Self {
        Self::new(email, UserRole::Patient)
    }

    pub fn admin(email: &str) -> Self {
        Self::new(email, UserRole::Admin)
    }

    pub fn to_auth_user(&self) -> AuthUser {
        AuthUser {
            id: self.id.clone(),
            email: Some(self.email.clone()),
            role: Some(self.role),
        }
    }

    pub fn token(&self, secret: &str) -> String {
        issue_token(&self.id, &self.email, self.role, secret, Duration::hours(24))
            .expect("test token")
    }

    pub fn expired_token(&self, secret: &str) -> String {
        issue_token(&self.id, &self.email, self.role, secret, Duration::hours(-1))
            .expect("test token")
    }
}

/// Canned PostgREST rows for wiremock-backed tests.
pub struct MockStoreRows;

impl MockStoreRows {
    pub fn user_row(id: &str, email: &str, name: &str, role: &str) -> serde_json::Value {
        json!({
            "id": id,
            "name": name,
            "email": email,
            "role": role,
            "specialization": null,
            "bio": null,
            "location": null,
            "photo": null,
            "created_at": Utc::now().to_rfc3339(),
            "updated_at": Utc::now().to_rfc3339()
        })
    }

    pub fn doctor_row(id: &str, email: &str, name: &str, specialization: &str) -> serde_json::Value {
        let mut row = Self::user_row(id, email, name, "doctor");
        row["specialization"] = json!(specialization);
        row
    }

    pub fn availability_row(
        doctor_id: &str,
        day_of_week: &str,
        start_time: &str,
        end_time: &str,
    ) -> serde_json::Value {
        json!({
            "id": Uuid::new_v4().to_string(),
            "doctor_id": doctor_id,
            "day_of_week": day_of_week,
            "start_time": start_time,
            "end_time": end_time,
            "created_at": Utc::now().to_rfc3339()
        })
    }

    pub fn appointment_row(
        patient_id: &str,
        doctor_id: &str,
        date: &str,
        time: &str,
        status: &str,
    ) -> serde_json::Value {
        json!({
            "id": Uuid::new_v4().to_string(),
            "patient_id": patient_id,
            "doctor_id": doctor_id,
            "date": date,
            "time": time,
            "reason": "General check-up",
            "status": status,
            "created_at": Utc::now().to_rfc3339()
        })
    }
}

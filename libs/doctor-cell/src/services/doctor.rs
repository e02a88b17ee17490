use std::sync::Arc;

use chrono::Utc;
use reqwest::Method;
use serde_json::{json, Map, Value};
use tracing::debug;

use shared_database::supabase::SupabaseClient;
use shared_models::user::{UserProfile, PUBLIC_USER_COLUMNS};

use crate::models::{DoctorError, UpdateDoctorRequest};

pub struct DoctorService {
    store: Arc<SupabaseClient>,
}

impl DoctorService {
    pub fn new(store: Arc<SupabaseClient>) -> Self {
        Self { store }
    }

    /// List the doctor directory, optionally narrowed by a case-insensitive
    /// specialization substring.
    pub async fn list_doctors(
        &self,
        specialization: Option<&str>,
    ) -> Result<Vec<UserProfile>, DoctorError> {
        debug!("Listing doctors (specialization filter: {:?})", specialization);

        let mut path = format!(
            "/rest/v1/users?role=eq.doctor&select={}&order=name.asc",
            PUBLIC_USER_COLUMNS
        );

        if let Some(filter) = specialization {
            path.push_str(&format!("&specialization=ilike.*{}*", filter));
        }

        let doctors: Vec<UserProfile> = self
            .store
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| DoctorError::Database(e.to_string()))?;

        Ok(doctors)
    }

    pub async fn get_doctor(&self, doctor_id: &str) -> Result<UserProfile, DoctorError> {
        let path = format!(
            "/rest/v1/users?id=eq.{}&role=eq.doctor&select={}",
            doctor_id, PUBLIC_USER_COLUMNS
        );

        let result: Vec<UserProfile> = self
            .store
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| DoctorError::Database(e.to_string()))?;

        result.into_iter().next().ok_or(DoctorError::NotFound)
    }

    /// Doctor self-service update of the public card (bio, specialization,
    /// location).
    pub async fn update_doctor(
        &self,
        doctor_id: &str,
        request: UpdateDoctorRequest,
    ) -> Result<UserProfile, DoctorError> {
        debug!("Updating doctor profile: {}", doctor_id);

        let mut update_data = Map::new();
        if let Some(bio) = request.bio {
            update_data.insert("bio".to_string(), json!(bio));
        }
        if let Some(specialization) = request.specialization {
            update_data.insert("specialization".to_string(), json!(specialization));
        }
        if let Some(location) = request.location {
            update_data.insert("location".to_string(), json!(location));
        }
        update_data.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));

        let path = format!(
            "/rest/v1/users?id=eq.{}&role=eq.doctor&select={}",
            doctor_id, PUBLIC_USER_COLUMNS
        );
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            "Prefer",
            reqwest::header::HeaderValue::from_static("return=representation"),
        );

        let result: Vec<UserProfile> = self
            .store
            .request_with_headers(Method::PATCH, &path, Some(Value::Object(update_data)), Some(headers))
            .await
            .map_err(|e| DoctorError::Database(e.to_string()))?;

        result.into_iter().next().ok_or(DoctorError::NotFound)
    }
}

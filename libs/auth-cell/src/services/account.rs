use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chrono::Utc;
use reqwest::Method;
use serde_json::{json, Map, Value};
use tracing::debug;
use uuid::Uuid;

use shared_database::supabase::SupabaseClient;
use shared_models::user::{UserProfile, UserRole, PUBLIC_USER_COLUMNS};

use crate::models::{AuthError, RegisterRequest, UpdateProfileRequest, UserRecord};
use crate::services::password;

pub struct AccountService {
    store: Arc<SupabaseClient>,
}

impl AccountService {
    pub fn new(store: Arc<SupabaseClient>) -> Self {
        Self { store }
    }

    /// Create a directory entry for a new user. Fails with `EmailTaken`
    /// when the email is already registered.
    pub async fn register(&self, request: RegisterRequest) -> Result<UserProfile, AuthError> {
        debug!("Registering user: {}", request.email);

        if request.name.trim().is_empty()
            || request.email.trim().is_empty()
            || request.password.is_empty()
        {
            return Err(AuthError::Validation(
                "name, email and password are required".to_string(),
            ));
        }

        let existing: Vec<Value> = self
            .store
            .request(
                Method::GET,
                &format!("/rest/v1/users?email=eq.{}&select=id", request.email),
                None,
            )
            .await
            .map_err(|e| AuthError::Database(e.to_string()))?;

        if !existing.is_empty() {
            return Err(AuthError::EmailTaken);
        }

        let password_hash = password::hash_password(&request.password)
            .map_err(|e| AuthError::Database(e.to_string()))?;

        let user_data = json!({
            "name": request.name,
            "email": request.email,
            "password_hash": password_hash,
            "role": request.role.unwrap_or_default(),
            "specialization": request.specialization,
            "bio": request.bio,
            "location": request.location,
            "created_at": Utc::now().to_rfc3339(),
            "updated_at": Utc::now().to_rfc3339()
        });

        let created: Vec<UserProfile> = self
            .store
            .insert_returning(
                &format!("/rest/v1/users?select={}", PUBLIC_USER_COLUMNS),
                user_data,
            )
            .await
            .map_err(|e| AuthError::Database(e.to_string()))?;

        let profile = created
            .into_iter()
            .next()
            .ok_or_else(|| AuthError::Database("Failed to create user".to_string()))?;

        debug!("User registered with ID: {}", profile.id);
        Ok(profile)
    }

    /// Check a password against the stored hash. The same error covers an
    /// unknown email and a wrong password.
    pub async fn verify_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> Result<UserRecord, AuthError> {
        debug!("Verifying credentials for: {}", email);

        let result: Vec<UserRecord> = self
            .store
            .request(Method::GET, &format!("/rest/v1/users?email=eq.{}", email), None)
            .await
            .map_err(|e| AuthError::Database(e.to_string()))?;

        let record = result.into_iter().next().ok_or(AuthError::InvalidCredentials)?;

        let matches = password::verify_password(password, &record.password_hash)
            .map_err(|e| AuthError::Database(e.to_string()))?;

        if !matches {
            return Err(AuthError::InvalidCredentials);
        }

        Ok(record)
    }

    pub async fn profile(&self, user_id: &str) -> Result<UserProfile, AuthError> {
        let result: Vec<UserProfile> = self
            .store
            .request(
                Method::GET,
                &format!("/rest/v1/users?id=eq.{}&select={}", user_id, PUBLIC_USER_COLUMNS),
                None,
            )
            .await
            .map_err(|e| AuthError::Database(e.to_string()))?;

        result
            .into_iter()
            .next()
            .ok_or_else(|| AuthError::NotFound("User not found".to_string()))
    }

    pub async fn update_profile(
        &self,
        user_id: &str,
        request: UpdateProfileRequest,
    ) -> Result<UserProfile, AuthError> {
        debug!("Updating profile for user: {}", user_id);

        let update_data = build_profile_update(&request);

        let path = format!(
            "/rest/v1/users?id=eq.{}&select={}",
            user_id, PUBLIC_USER_COLUMNS
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
            .map_err(|e| AuthError::Database(e.to_string()))?;

        result
            .into_iter()
            .next()
            .ok_or_else(|| AuthError::NotFound("User not found".to_string()))
    }

    /// Store a profile photo and record its public URL on the user.
    pub async fn set_photo(&self, user_id: &str, file_data: &str) -> Result<String, AuthError> {
        debug!("Uploading photo for user: {}", user_id);

        // Strip an optional "data:image/...;base64," prefix.
        let parts: Vec<&str> = file_data.split(',').collect();
        let base64_data = if parts.len() > 1 { parts[1] } else { file_data };

        let image_data = BASE64
            .decode(base64_data)
            .map_err(|_| AuthError::Validation("file_data is not valid base64".to_string()))?;

        let file_ext = if file_data.contains("image/png") {
            "png"
        } else if file_data.contains("image/jpeg") || file_data.contains("image/jpg") {
            "jpg"
        } else {
            "png"
        };

        let object_path = format!("{}/{}.{}", user_id, Uuid::new_v4(), file_ext);

        self.store
            .upload_object(
                &format!("/storage/v1/object/avatars/{}", object_path),
                image_data,
                &format!("image/{}", file_ext),
            )
            .await
            .map_err(|e| AuthError::Database(e.to_string()))?;

        let public_url = self
            .store
            .public_url(&format!("/storage/v1/object/public/avatars/{}", object_path));

        let update_data = json!({
            "photo": public_url,
            "updated_at": Utc::now().to_rfc3339()
        });

        let _: Vec<Value> = self
            .store
            .request(
                Method::PATCH,
                &format!("/rest/v1/users?id=eq.{}", user_id),
                Some(update_data),
            )
            .await
            .map_err(|e| AuthError::Database(e.to_string()))?;

        Ok(public_url)
    }
}

/// Only provided fields are written; specialization is applied only when
/// the update declares the doctor role.
pub(crate) fn build_profile_update(request: &UpdateProfileRequest) -> Map<String, Value> {
    let mut update_data = Map::new();

    if let Some(name) = &request.name {
        update_data.insert("name".to_string(), json!(name));
    }
    if let Some(email) = &request.email {
        update_data.insert("email".to_string(), json!(email));
    }
    if let Some(role) = &request.role {
        update_data.insert("role".to_string(), json!(role));
    }
    if let Some(bio) = &request.bio {
        update_data.insert("bio".to_string(), json!(bio));
    }
    if let Some(location) = &request.location {
        update_data.insert("location".to_string(), json!(location));
    }
    if let Some(photo) = &request.photo {
        update_data.insert("photo".to_string(), json!(photo));
    }

    if request.role == Some(UserRole::Doctor) {
        if let Some(specialization) = &request.specialization {
            update_data.insert("specialization".to_string(), json!(specialization));
        }
    }

    update_data.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));

    update_data
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_request() -> UpdateProfileRequest {
        UpdateProfileRequest {
            name: None,
            email: None,
            role: None,
            specialization: None,
            bio: None,
            location: None,
            photo: None,
        }
    }

    #[test]
    fn specialization_requires_doctor_role() {
        let request = UpdateProfileRequest {
            specialization: Some("Cardiology".to_string()),
            ..empty_request()
        };

        let update = build_profile_update(&request);
        assert!(!update.contains_key("specialization"));

        let request = UpdateProfileRequest {
            role: Some(UserRole::Doctor),
            specialization: Some("Cardiology".to_string()),
            ..empty_request()
        };

        let update = build_profile_update(&request);
        assert_eq!(update["specialization"], json!("Cardiology"));
        assert_eq!(update["role"], json!("doctor"));
    }

    #[test]
    fn absent_fields_are_not_written() {
        let request = UpdateProfileRequest {
            bio: Some("Hello".to_string()),
            ..empty_request()
        };

        let update = build_profile_update(&request);
        assert_eq!(update["bio"], json!("Hello"));
        assert!(!update.contains_key("name"));
        assert!(!update.contains_key("email"));
        assert!(update.contains_key("updated_at"));
    }
}

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{NaiveDate, Utc};
use reqwest::Method;
use serde_json::json;
use tracing::{debug, warn};
use uuid::Uuid;

use doctor_cell::models::TimeRange;
use shared_database::supabase::SupabaseClient;

use crate::models::{
    Appointment, AppointmentStatus, AppointmentWithDoctor, BookAppointmentRequest, BookingError,
};

/// Per-doctor mutual exclusion for the check-then-insert pair. The store
/// carries no uniqueness constraint on (doctor, date, time), so two
/// concurrent bookings for the same doctor must be serialized here.
#[derive(Clone, Default)]
pub struct DoctorLocks {
    inner: Arc<Mutex<HashMap<Uuid, Arc<tokio::sync::Mutex<()>>>>>,
}

impl DoctorLocks {
    pub async fn acquire(&self, doctor_id: Uuid) -> tokio::sync::OwnedMutexGuard<()> {
        let lock = {
            let mut registry = self
                .inner
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            Arc::clone(registry.entry(doctor_id).or_default())
        };

        lock.lock_owned().await
    }
}

pub struct BookingService {
    store: Arc<SupabaseClient>,
    locks: DoctorLocks,
}

impl BookingService {
    pub fn new(store: Arc<SupabaseClient>, locks: DoctorLocks) -> Self {
        Self { store, locks }
    }

    /// Book a slot for a patient. At most one non-cancelled appointment may
    /// exist per (doctor, date, time); a taken slot fails with `SlotTaken`
    /// and nothing is written.
    pub async fn book_appointment(
        &self,
        patient_id: &str,
        request: BookAppointmentRequest,
    ) -> Result<Appointment, BookingError> {
        debug!(
            "Booking request: patient {} with doctor {} on {} at {}",
            patient_id, request.doctor_id, request.date, request.time
        );

        if request.reason.trim().is_empty() {
            return Err(BookingError::Validation("reason is required".to_string()));
        }

        // Holds back concurrent bookings for this doctor until the
        // check-then-insert below has completed.
        let _guard = self.locks.acquire(request.doctor_id).await;

        let existing = self
            .find_non_cancelled(request.doctor_id, request.date, request.time)
            .await?;

        if existing.is_some() {
            warn!(
                "Slot {} on {} already booked for doctor {}",
                request.time, request.date, request.doctor_id
            );
            return Err(BookingError::SlotTaken);
        }

        let appointment_data = json!({
            "patient_id": patient_id,
            "doctor_id": request.doctor_id,
            "date": request.date,
            "time": request.time,
            "reason": request.reason,
            "status": AppointmentStatus::Pending,
            "created_at": Utc::now().to_rfc3339()
        });

        let created: Vec<Appointment> = self
            .store
            .insert_returning("/rest/v1/appointments", appointment_data)
            .await
            .map_err(|e| BookingError::Database(e.to_string()))?;

        let appointment = created
            .into_iter()
            .next()
            .ok_or_else(|| BookingError::Database("Failed to create appointment".to_string()))?;

        debug!("Appointment created with ID: {}", appointment.id);
        Ok(appointment)
    }

    /// A patient's appointments with the doctor card embedded, ordered by
    /// date then time.
    pub async fn appointments_for_patient(
        &self,
        patient_id: &str,
    ) -> Result<Vec<AppointmentWithDoctor>, BookingError> {
        let path = format!(
            "/rest/v1/appointments?patient_id=eq.{}&select=*,doctor:users!doctor_id(name,specialization,photo)&order=date.asc,time.asc",
            patient_id
        );

        self.store
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| BookingError::Database(e.to_string()))
    }

    /// Exact-label lookup; cancelled entries do not block a slot.
    async fn find_non_cancelled(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
        time: TimeRange,
    ) -> Result<Option<Appointment>, BookingError> {
        let path = format!(
            "/rest/v1/appointments?doctor_id=eq.{}&date=eq.{}&time=eq.{}&status=neq.cancelled&limit=1",
            doctor_id, date, time
        );

        let result: Vec<Appointment> = self
            .store
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| BookingError::Database(e.to_string()))?;

        Ok(result.into_iter().next())
    }
}

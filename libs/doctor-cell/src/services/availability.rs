use std::collections::HashSet;
use std::sync::Arc;

use chrono::{Datelike, Duration, NaiveDate, NaiveTime, Utc};
use reqwest::Method;
use tracing::debug;

use shared_database::supabase::SupabaseClient;

use crate::models::{
    AvailabilityWindow, BookedSlot, CreateAvailabilityRequest, DayOfWeek, DoctorError, TimeRange,
    TimeSlot,
};

/// Fixed slot length; a trailing remainder shorter than this is dropped,
/// not clipped.
const SLOT_MINUTES: i64 = 30;

pub struct AvailabilityService {
    store: Arc<SupabaseClient>,
}

impl AvailabilityService {
    pub fn new(store: Arc<SupabaseClient>) -> Self {
        Self { store }
    }

    /// Record a recurring weekly window for a doctor. Windows are
    /// create-only; overlap between a doctor's windows is not validated.
    pub async fn create_window(
        &self,
        doctor_id: &str,
        request: CreateAvailabilityRequest,
    ) -> Result<AvailabilityWindow, DoctorError> {
        debug!("Creating availability window for doctor: {}", doctor_id);

        if request.start_time >= request.end_time {
            return Err(DoctorError::Validation(
                "start_time must be before end_time".to_string(),
            ));
        }

        let window_data = serde_json::json!({
            "doctor_id": doctor_id,
            "day_of_week": request.day_of_week,
            "start_time": request.start_time.format("%H:%M").to_string(),
            "end_time": request.end_time.format("%H:%M").to_string(),
            "created_at": Utc::now().to_rfc3339()
        });

        let created: Vec<AvailabilityWindow> = self
            .store
            .insert_returning("/rest/v1/availability", window_data)
            .await
            .map_err(|e| DoctorError::Database(e.to_string()))?;

        created
            .into_iter()
            .next()
            .ok_or_else(|| DoctorError::Database("Failed to create availability".to_string()))
    }

    pub async fn windows_for_doctor(
        &self,
        doctor_id: &str,
    ) -> Result<Vec<AvailabilityWindow>, DoctorError> {
        let path = format!("/rest/v1/availability?doctor_id=eq.{}", doctor_id);

        let windows: Vec<AvailabilityWindow> = self
            .store
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| DoctorError::Database(e.to_string()))?;

        Ok(windows)
    }

    /// The doctor's window for one day of the week, if any. Day labels are
    /// stored canonically, so equality here is the case-insensitive match.
    pub async fn find_window(
        &self,
        doctor_id: &str,
        day: DayOfWeek,
    ) -> Result<Option<AvailabilityWindow>, DoctorError> {
        let path = format!(
            "/rest/v1/availability?doctor_id=eq.{}&day_of_week=eq.{}&limit=1",
            doctor_id, day
        );

        let windows: Vec<AvailabilityWindow> = self
            .store
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| DoctorError::Database(e.to_string()))?;

        Ok(windows.into_iter().next())
    }

    /// Derive the bookable slots for a doctor on a calendar date: the
    /// day's window partitioned into 30-minute slots, each marked free
    /// unless a non-cancelled appointment already carries its label.
    /// No window for that weekday is an empty result, not an error.
    pub async fn available_slots(
        &self,
        doctor_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<TimeSlot>, DoctorError> {
        debug!("Calculating available slots for doctor {} on {}", doctor_id, date);

        let day = DayOfWeek::from(date.weekday());

        let Some(window) = self.find_window(doctor_id, day).await? else {
            debug!("No availability window for doctor {} on {}", doctor_id, day);
            return Ok(Vec::new());
        };

        let booked = self.booked_slots(doctor_id, date).await?;
        let booked: HashSet<TimeRange> = booked.into_iter().map(|slot| slot.time).collect();

        let slots = partition_into_slots(window.start_time, window.end_time)
            .into_iter()
            .map(|range| TimeSlot {
                is_available: !booked.contains(&range),
                time: range,
            })
            .collect::<Vec<_>>();

        debug!("Produced {} slots ({} booked)", slots.len(), booked.len());
        Ok(slots)
    }

    /// Non-cancelled ledger entries for the date; the status filter lives
    /// in the store query so cancelled slots free up immediately.
    async fn booked_slots(
        &self,
        doctor_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<BookedSlot>, DoctorError> {
        let path = format!(
            "/rest/v1/appointments?doctor_id=eq.{}&date=eq.{}&status=neq.cancelled&select=time",
            doctor_id, date
        );

        self.store
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| DoctorError::Database(e.to_string()))
    }
}

/// Partition `[start, end)` into consecutive 30-minute slots, in
/// chronological order. A partial trailing slot is dropped. Slots never
/// wrap past midnight.
pub fn partition_into_slots(start: NaiveTime, end: NaiveTime) -> Vec<TimeRange> {
    let mut slots = Vec::new();
    let mut cursor = start;

    loop {
        let (slot_end, wrapped) = cursor.overflowing_add_signed(Duration::minutes(SLOT_MINUTES));
        if wrapped != 0 || slot_end > end {
            break;
        }

        // new() cannot fail here: slot_end is strictly after cursor.
        if let Ok(range) = TimeRange::new(cursor, slot_end) {
            slots.push(range);
        }

        cursor = slot_end;
    }

    slots
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clock(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn full_day_window_yields_sixteen_slots() {
        let slots = partition_into_slots(clock(9, 0), clock(17, 0));

        assert_eq!(slots.len(), 16);
        assert_eq!(slots[0].to_string(), "09:00 - 09:30");
        assert_eq!(slots[15].to_string(), "16:30 - 17:00");
    }

    #[test]
    fn slots_are_chronological_and_contiguous() {
        let slots = partition_into_slots(clock(9, 0), clock(11, 0));

        for pair in slots.windows(2) {
            assert_eq!(pair[0].end(), pair[1].start());
        }
    }

    #[test]
    fn window_shorter_than_a_slot_yields_nothing() {
        assert!(partition_into_slots(clock(9, 0), clock(9, 20)).is_empty());
    }

    #[test]
    fn partial_trailing_slot_is_dropped() {
        let slots = partition_into_slots(clock(9, 0), clock(17, 15));

        assert_eq!(slots.last().unwrap().to_string(), "16:30 - 17:00");
    }

    #[test]
    fn unaligned_start_keeps_its_offset() {
        let slots = partition_into_slots(clock(9, 15), clock(10, 45));

        assert_eq!(slots.len(), 3);
        assert_eq!(slots[0].to_string(), "09:15 - 09:45");
        assert_eq!(slots[2].to_string(), "10:15 - 10:45");
    }

    #[test]
    fn late_window_does_not_wrap_past_midnight() {
        let slots = partition_into_slots(clock(23, 0), clock(23, 59));

        assert_eq!(slots.len(), 1);
        assert_eq!(slots[0].to_string(), "23:00 - 23:30");
    }

    #[test]
    fn inverted_window_yields_nothing() {
        assert!(partition_into_slots(clock(17, 0), clock(9, 0)).is_empty());
    }
}

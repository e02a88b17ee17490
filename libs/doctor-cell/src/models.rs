use chrono::{DateTime, NaiveTime, Utc, Weekday};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

use shared_models::error::AppError;

// ==============================================================================
// VALUE TYPES
// ==============================================================================

/// Canonical lowercase day labels; capitalized input is accepted so clients
/// may send "Monday" or "monday" interchangeably.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayOfWeek {
    #[serde(alias = "Monday", alias = "MONDAY")]
    Monday,
    #[serde(alias = "Tuesday", alias = "TUESDAY")]
    Tuesday,
    #[serde(alias = "Wednesday", alias = "WEDNESDAY")]
    Wednesday,
    #[serde(alias = "Thursday", alias = "THURSDAY")]
    Thursday,
    #[serde(alias = "Friday", alias = "FRIDAY")]
    Friday,
    #[serde(alias = "Saturday", alias = "SATURDAY")]
    Saturday,
    #[serde(alias = "Sunday", alias = "SUNDAY")]
    Sunday,
}

impl fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DayOfWeek::Monday => "monday",
            DayOfWeek::Tuesday => "tuesday",
            DayOfWeek::Wednesday => "wednesday",
            DayOfWeek::Thursday => "thursday",
            DayOfWeek::Friday => "friday",
            DayOfWeek::Saturday => "saturday",
            DayOfWeek::Sunday => "sunday",
        };
        write!(f, "{}", label)
    }
}

impl From<Weekday> for DayOfWeek {
    fn from(weekday: Weekday) -> Self {
        match weekday {
            Weekday::Mon => DayOfWeek::Monday,
            Weekday::Tue => DayOfWeek::Tuesday,
            Weekday::Wed => DayOfWeek::Wednesday,
            Weekday::Thu => DayOfWeek::Thursday,
            Weekday::Fri => DayOfWeek::Friday,
            Weekday::Sat => DayOfWeek::Saturday,
            Weekday::Sun => DayOfWeek::Sunday,
        }
    }
}

pub(crate) fn parse_clock(s: &str) -> Result<NaiveTime, chrono::ParseError> {
    // Stored values are "HH:MM"; tolerate a seconds component.
    NaiveTime::parse_from_str(s, "%H:%M").or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
}

/// Serde adapter for minute-resolution clock times ("09:00").
pub mod hhmm {
    use super::parse_clock;
    use chrono::NaiveTime;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format("%H:%M").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let s = String::deserialize(deserializer)?;
        parse_clock(&s).map_err(de::Error::custom)
    }
}

/// Half-open slot interval carried on the wire as `"HH:MM - HH:MM"`, the
/// atomic unit of booking. Construction rejects inverted ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeRange {
    start: NaiveTime,
    end: NaiveTime,
}

#[derive(Error, Debug)]
#[error("time range must be \"HH:MM - HH:MM\" with start before end")]
pub struct ParseTimeRangeError;

impl TimeRange {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Result<Self, ParseTimeRangeError> {
        if start >= end {
            return Err(ParseTimeRangeError);
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveTime {
        self.start
    }

    pub fn end(&self) -> NaiveTime {
        self.end
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {}",
            self.start.format("%H:%M"),
            self.end.format("%H:%M")
        )
    }
}

impl FromStr for TimeRange {
    type Err = ParseTimeRangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (start, end) = s.split_once(" - ").ok_or(ParseTimeRangeError)?;
        let start = parse_clock(start.trim()).map_err(|_| ParseTimeRangeError)?;
        let end = parse_clock(end.trim()).map_err(|_| ParseTimeRangeError)?;
        TimeRange::new(start, end)
    }
}

impl Serialize for TimeRange {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for TimeRange {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

// ==============================================================================
// AVAILABILITY MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityWindow {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub day_of_week: DayOfWeek,
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "hhmm")]
    pub end_time: NaiveTime,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateAvailabilityRequest {
    pub day_of_week: DayOfWeek,
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "hhmm")]
    pub end_time: NaiveTime,
}

/// One bookable slot of the day, flagged free or taken.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeSlot {
    pub time: TimeRange,
    pub is_available: bool,
}

/// Projection of a ledger row; only the slot label matters here.
#[derive(Debug, Clone, Deserialize)]
pub struct BookedSlot {
    pub time: TimeRange,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateDoctorRequest {
    pub bio: Option<String>,
    pub specialization: Option<String>,
    pub location: Option<String>,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Error, Debug)]
pub enum DoctorError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Doctor not found")]
    NotFound,

    #[error("Database error: {0}")]
    Database(String),
}

impl From<DoctorError> for AppError {
    fn from(err: DoctorError) -> Self {
        match err {
            DoctorError::Validation(msg) => AppError::ValidationError(msg),
            DoctorError::NotFound => AppError::NotFound("Doctor not found".to_string()),
            DoctorError::Database(msg) => AppError::Database(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, NaiveDate};

    #[test]
    fn time_range_round_trips_through_its_label() {
        let range: TimeRange = "09:00 - 09:30".parse().unwrap();
        assert_eq!(range.start(), NaiveTime::from_hms_opt(9, 0, 0).unwrap());
        assert_eq!(range.to_string(), "09:00 - 09:30");
    }

    #[test]
    fn inverted_or_malformed_ranges_are_rejected() {
        assert!("10:00 - 09:30".parse::<TimeRange>().is_err());
        assert!("10:00 - 10:00".parse::<TimeRange>().is_err());
        assert!("not a range".parse::<TimeRange>().is_err());
        assert!("25:00 - 26:00".parse::<TimeRange>().is_err());
    }

    #[test]
    fn day_of_week_accepts_capitalized_labels() {
        let day: DayOfWeek = serde_json::from_str("\"Monday\"").unwrap();
        assert_eq!(day, DayOfWeek::Monday);

        let day: DayOfWeek = serde_json::from_str("\"monday\"").unwrap();
        assert_eq!(day, DayOfWeek::Monday);

        assert_eq!(serde_json::to_string(&day).unwrap(), "\"monday\"");
    }

    #[test]
    fn day_of_week_matches_calendar_weekday() {
        // 2025-01-06 is a Monday.
        let date = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
        assert_eq!(DayOfWeek::from(date.weekday()), DayOfWeek::Monday);
    }
}

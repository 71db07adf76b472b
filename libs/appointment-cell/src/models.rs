use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use doctor_cell::models::Doctor;

/// Serde for slot times in canonical zero-padded 24-hour "HH:MM".
/// Accepts "9:00", "09:00" and "09:00:00" on input; always writes "09:00",
/// so equivalent spellings can never produce distinct slots.
pub mod time_hhmm {
    use chrono::NaiveTime;
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&time.format("%H:%M").to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(&raw, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(&raw, "%H:%M:%S"))
            .map_err(|_| serde::de::Error::custom(format!("invalid slot time: {}", raw)))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub date: NaiveDate,
    #[serde(with = "time_hhmm")]
    pub time: NaiveTime,
    pub doctor_id: Uuid,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Appointment with its doctor embedded, as returned by the listing queries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentWithDoctor {
    pub id: Uuid,
    pub date: NaiveDate,
    #[serde(with = "time_hhmm")]
    pub time: NaiveTime,
    pub doctor_id: Uuid,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub doctor: Option<Doctor>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookAppointmentRequest {
    pub date: NaiveDate,
    #[serde(with = "time_hhmm")]
    pub time: NaiveTime,
    pub doctor_id: Uuid,
    pub user_id: Uuid,
    // Sent by the mobile client; the stored row references user_id instead.
    pub patient_name: Option<String>,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum AppointmentError {
    #[error("Cannot book a date and time that has already passed")]
    PastDateTime,

    #[error("This slot is already booked")]
    SlotTaken,

    #[error("Appointment not found")]
    NotFound,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use appointment_cell::models::{time_hhmm, AppointmentWithDoctor};
use doctor_cell::models::Doctor;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsultationNote {
    pub id: Uuid,
    pub appointment_id: Uuid,
    pub doctor_id: Uuid,
    pub user_id: Uuid,
    pub symptoms: String,
    pub diagnosis: String,
    pub treatment: String,
    pub notes: Option<String>,
    pub visit_date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateConsultationNoteRequest {
    pub appointment_id: Uuid,
    pub doctor_id: Uuid,
    pub user_id: Uuid,
    pub symptoms: String,
    pub diagnosis: String,
    pub treatment: String,
    pub notes: Option<String>,
    // Defaults to today on the clinic clock when omitted.
    pub visit_date: Option<NaiveDate>,
}

/// A past visit as shown in the medical-history view: the appointment, its
/// doctor, and the consultation note when one was recorded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: Uuid,
    pub date: NaiveDate,
    #[serde(with = "time_hhmm")]
    pub time: NaiveTime,
    pub doctor_id: Uuid,
    pub user_id: Uuid,
    pub doctor: Option<Doctor>,
    pub consultation_note: Option<ConsultationNote>,
}

impl HistoryEntry {
    pub fn from_appointment(
        appointment: AppointmentWithDoctor,
        consultation_note: Option<ConsultationNote>,
    ) -> Self {
        Self {
            id: appointment.id,
            date: appointment.date,
            time: appointment.time,
            doctor_id: appointment.doctor_id,
            user_id: appointment.user_id,
            doctor: appointment.doctor,
            consultation_note,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserStats {
    pub total: usize,
    pub next: Option<AppointmentWithDoctor>,
    pub health_score: i32,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum PatientError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

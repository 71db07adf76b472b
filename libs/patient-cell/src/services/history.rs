use std::collections::HashMap;

use reqwest::Method;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use appointment_cell::services::booking::AppointmentBookingService;
use shared_config::AppConfig;
use shared_database::PostgrestClient;
use shared_utils::clinic_time;

use crate::models::{ConsultationNote, HistoryEntry, PatientError};

/// Medical-history view: the past half of the upcoming/past partition, each
/// visit joined with its doctor and consultation note.
pub struct HistoryService {
    db: PostgrestClient,
    appointments: AppointmentBookingService,
}

impl HistoryService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            db: PostgrestClient::new(config),
            appointments: AppointmentBookingService::new(config),
        }
    }

    pub async fn patient_history(
        &self,
        user_id: Uuid,
        auth_token: &str,
    ) -> Result<Vec<HistoryEntry>, PatientError> {
        debug!("Assembling medical history for user {}", user_id);

        let today = clinic_time::today_in_clinic_tz();

        let past = self
            .appointments
            .partition_past(user_id, today, auth_token)
            .await
            .map_err(|e| PatientError::DatabaseError(e.to_string()))?;

        let mut notes = self.notes_by_appointment(user_id, auth_token).await?;

        Ok(past
            .into_iter()
            .map(|appointment| {
                let note = notes.remove(&appointment.id);
                HistoryEntry::from_appointment(appointment, note)
            })
            .collect())
    }

    async fn notes_by_appointment(
        &self,
        user_id: Uuid,
        auth_token: &str,
    ) -> Result<HashMap<Uuid, ConsultationNote>, PatientError> {
        let path = format!("/rest/v1/consultation_notes?user_id=eq.{}", user_id);

        let result: Vec<Value> = self
            .db
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| PatientError::DatabaseError(e.to_string()))?;

        let notes = result
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<ConsultationNote>, _>>()
            .map_err(|e| {
                PatientError::DatabaseError(format!("Failed to parse consultation notes: {}", e))
            })?;

        // At most one note per appointment by convention; a duplicate would
        // simply overwrite here.
        Ok(notes
            .into_iter()
            .map(|note| (note.appointment_id, note))
            .collect())
    }
}

use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info};

use shared_config::AppConfig;
use shared_database::PostgrestClient;
use shared_utils::clinic_time;

use crate::models::{ConsultationNote, CreateConsultationNoteRequest, PatientError};

pub struct ConsultationService {
    db: PostgrestClient,
}

impl ConsultationService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            db: PostgrestClient::new(config),
        }
    }

    pub async fn create_note(
        &self,
        request: CreateConsultationNoteRequest,
        auth_token: &str,
    ) -> Result<ConsultationNote, PatientError> {
        debug!(
            "Recording consultation note for appointment {}",
            request.appointment_id
        );

        let visit_date = request
            .visit_date
            .unwrap_or_else(clinic_time::today_in_clinic_tz);

        let note_data = json!({
            "appointment_id": request.appointment_id,
            "doctor_id": request.doctor_id,
            "user_id": request.user_id,
            "symptoms": request.symptoms,
            "diagnosis": request.diagnosis,
            "treatment": request.treatment,
            "notes": request.notes,
            "visit_date": visit_date.format("%Y-%m-%d").to_string(),
        });

        let result: Vec<Value> = self
            .db
            .request_returning(
                Method::POST,
                "/rest/v1/consultation_notes",
                Some(auth_token),
                Some(note_data),
            )
            .await
            .map_err(|e| PatientError::DatabaseError(e.to_string()))?;

        let row = result
            .into_iter()
            .next()
            .ok_or_else(|| PatientError::DatabaseError("insert returned no row".to_string()))?;

        let note: ConsultationNote = serde_json::from_value(row).map_err(|e| {
            PatientError::DatabaseError(format!("Failed to parse consultation note: {}", e))
        })?;

        info!(
            "Consultation note {} recorded for appointment {}",
            note.id, note.appointment_id
        );

        Ok(note)
    }
}

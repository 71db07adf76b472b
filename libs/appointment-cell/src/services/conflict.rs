use chrono::{NaiveDate, NaiveTime};
use reqwest::Method;
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::PostgrestClient;

use crate::models::AppointmentError;

/// Exact-match slot occupancy check. A slot is the triple
/// (doctor_id, date, time); values are canonicalized before they get here,
/// so equality on the stored columns is sufficient.
pub struct SlotConflictService {
    db: PostgrestClient,
}

impl SlotConflictService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            db: PostgrestClient::new(config),
        }
    }

    pub async fn has_conflict(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
        time: NaiveTime,
        auth_token: &str,
    ) -> Result<bool, AppointmentError> {
        debug!(
            "Checking slot availability for doctor {} on {} at {}",
            doctor_id,
            date,
            time.format("%H:%M")
        );

        let path = format!(
            "/rest/v1/appointments?doctor_id=eq.{}&date=eq.{}&time=eq.{}&select=id",
            doctor_id,
            date.format("%Y-%m-%d"),
            time.format("%H:%M"),
        );

        let existing: Vec<Value> = self
            .db
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        let taken = !existing.is_empty();
        if taken {
            warn!(
                "Slot conflict for doctor {} on {} at {}",
                doctor_id,
                date,
                time.format("%H:%M")
            );
        }

        Ok(taken)
    }
}

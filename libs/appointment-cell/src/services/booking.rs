use chrono::{NaiveDate, Utc};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::{PostgrestClient, StorageError};
use shared_utils::clinic_time;

use crate::models::{Appointment, AppointmentError, AppointmentWithDoctor, BookAppointmentRequest};
use crate::services::conflict::SlotConflictService;

/// Appointment lifecycle: nonexistent -> booked -> deleted. Cancellation is
/// a hard delete; there is no persisted status column.
pub struct AppointmentBookingService {
    db: PostgrestClient,
    conflicts: SlotConflictService,
}

impl AppointmentBookingService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            db: PostgrestClient::new(config),
            conflicts: SlotConflictService::new(config),
        }
    }

    /// Book a slot for a patient. Rejects past date/times against the
    /// clinic clock, then occupied slots. The appointments table carries a
    /// unique constraint on (doctor_id, date, time), so an insert losing
    /// the check-then-insert race comes back as a conflict as well.
    pub async fn book_appointment(
        &self,
        request: BookAppointmentRequest,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        debug!(
            "Booking request for doctor {} on {} at {}",
            request.doctor_id,
            request.date,
            request.time.format("%H:%M")
        );

        if clinic_time::is_past_now(request.date, request.time) {
            return Err(AppointmentError::PastDateTime);
        }

        if self
            .conflicts
            .has_conflict(request.doctor_id, request.date, request.time, auth_token)
            .await?
        {
            return Err(AppointmentError::SlotTaken);
        }

        let appointment_data = json!({
            "date": request.date.format("%Y-%m-%d").to_string(),
            "time": request.time.format("%H:%M").to_string(),
            "doctor_id": request.doctor_id,
            "user_id": request.user_id,
            "created_at": Utc::now().to_rfc3339(),
        });

        let result: Vec<Value> = self
            .db
            .request_returning(
                Method::POST,
                "/rest/v1/appointments",
                Some(auth_token),
                Some(appointment_data),
            )
            .await
            .map_err(|e| match e {
                StorageError::Conflict(_) => AppointmentError::SlotTaken,
                other => AppointmentError::DatabaseError(other.to_string()),
            })?;

        let row = result
            .into_iter()
            .next()
            .ok_or_else(|| AppointmentError::DatabaseError("insert returned no row".to_string()))?;

        let appointment: Appointment = serde_json::from_value(row)
            .map_err(|e| AppointmentError::DatabaseError(format!("Failed to parse appointment: {}", e)))?;

        info!(
            "Appointment {} booked for user {} with doctor {}",
            appointment.id, appointment.user_id, appointment.doctor_id
        );

        Ok(appointment)
    }

    /// Hard-delete an appointment. No ownership check at this layer; the
    /// route's authorization decides who may call it.
    pub async fn cancel_appointment(
        &self,
        appointment_id: Uuid,
        auth_token: &str,
    ) -> Result<(), AppointmentError> {
        debug!("Cancelling appointment {}", appointment_id);

        let path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);

        // Asking for the deleted rows back distinguishes "deleted" from
        // "was never there" in a single call.
        let deleted: Vec<Value> = self
            .db
            .request_returning(Method::DELETE, &path, Some(auth_token), None)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        if deleted.is_empty() {
            return Err(AppointmentError::NotFound);
        }

        info!("Appointment {} cancelled", appointment_id);
        Ok(())
    }

    /// All appointments for a user, doctor embedded, most recent date first.
    pub async fn list_appointments(
        &self,
        user_id: Uuid,
        auth_token: &str,
    ) -> Result<Vec<AppointmentWithDoctor>, AppointmentError> {
        let path = format!(
            "/rest/v1/appointments?user_id=eq.{}&select=*,doctor:doctors(*)&order=date.desc",
            user_id
        );

        self.fetch_with_doctor(&path, auth_token).await
    }

    /// Subset of a user's appointments with date >= `as_of`, soonest first.
    pub async fn partition_upcoming(
        &self,
        user_id: Uuid,
        as_of: NaiveDate,
        auth_token: &str,
    ) -> Result<Vec<AppointmentWithDoctor>, AppointmentError> {
        let path = format!(
            "/rest/v1/appointments?user_id=eq.{}&date=gte.{}&select=*,doctor:doctors(*)&order=date.asc",
            user_id,
            as_of.format("%Y-%m-%d"),
        );

        self.fetch_with_doctor(&path, auth_token).await
    }

    /// Subset of a user's appointments with date < `as_of`, most recent
    /// first. Consultation notes are attached by the history aggregator.
    pub async fn partition_past(
        &self,
        user_id: Uuid,
        as_of: NaiveDate,
        auth_token: &str,
    ) -> Result<Vec<AppointmentWithDoctor>, AppointmentError> {
        let path = format!(
            "/rest/v1/appointments?user_id=eq.{}&date=lt.{}&select=*,doctor:doctors(*)&order=date.desc",
            user_id,
            as_of.format("%Y-%m-%d"),
        );

        self.fetch_with_doctor(&path, auth_token).await
    }

    /// Earliest appointment on or after `from`, by ascending date. Same-day
    /// ties resolve to storage order.
    pub async fn next_appointment(
        &self,
        user_id: Uuid,
        from: NaiveDate,
        auth_token: &str,
    ) -> Result<Option<AppointmentWithDoctor>, AppointmentError> {
        let path = format!(
            "/rest/v1/appointments?user_id=eq.{}&date=gte.{}&select=*,doctor:doctors(*)&order=date.asc&limit=1",
            user_id,
            from.format("%Y-%m-%d"),
        );

        let mut rows = self.fetch_with_doctor(&path, auth_token).await?;
        Ok(if rows.is_empty() {
            None
        } else {
            Some(rows.remove(0))
        })
    }

    async fn fetch_with_doctor(
        &self,
        path: &str,
        auth_token: &str,
    ) -> Result<Vec<AppointmentWithDoctor>, AppointmentError> {
        let result: Vec<Value> = self
            .db
            .request(Method::GET, path, Some(auth_token), None)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        result
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<AppointmentWithDoctor>, _>>()
            .map_err(|e| AppointmentError::DatabaseError(format!("Failed to parse appointments: {}", e)))
    }
}

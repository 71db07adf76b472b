use chrono::{Datelike, Duration, NaiveDate};
use tracing::debug;
use uuid::Uuid;

use appointment_cell::services::booking::AppointmentBookingService;
use shared_config::AppConfig;
use shared_utils::clinic_time;

use crate::models::{PatientError, UserStats};

/// Derive a bounded wellness indicator from a patient's appointment dates.
/// Deterministic, no side effects:
/// base 50, +10 per appointment capped at +30, +15 for activity in the
/// calendar month of `today`, +5 for a visit within the trailing 90 days,
/// capped at 100.
pub fn health_score(dates: &[NaiveDate], today: NaiveDate) -> i32 {
    let mut score = 50;

    score += (dates.len() as i32 * 10).min(30);

    let in_current_month = dates
        .iter()
        .any(|d| d.year() == today.year() && d.month() == today.month());
    if in_current_month {
        score += 15;
    }

    let window_start = today - Duration::days(90);
    let recent_visit = dates.iter().any(|d| *d >= window_start && *d <= today);
    if recent_visit {
        score += 5;
    }

    score.min(100)
}

pub struct StatsService {
    appointments: AppointmentBookingService,
}

impl StatsService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            appointments: AppointmentBookingService::new(config),
        }
    }

    pub async fn user_stats(
        &self,
        user_id: Uuid,
        auth_token: &str,
    ) -> Result<UserStats, PatientError> {
        debug!("Assembling stats for user {}", user_id);

        let today = clinic_time::today_in_clinic_tz();

        let all = self
            .appointments
            .list_appointments(user_id, auth_token)
            .await
            .map_err(|e| PatientError::DatabaseError(e.to_string()))?;

        let next = self
            .appointments
            .next_appointment(user_id, today, auth_token)
            .await
            .map_err(|e| PatientError::DatabaseError(e.to_string()))?;

        let dates: Vec<NaiveDate> = all.iter().map(|a| a.date).collect();

        Ok(UserStats {
            total: all.len(),
            next,
            health_score: health_score(&dates, today),
        })
    }
}

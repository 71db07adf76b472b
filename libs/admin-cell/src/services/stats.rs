use reqwest::Method;
use serde_json::Value;
use tracing::debug;

use shared_config::AppConfig;
use shared_database::PostgrestClient;

use crate::models::{AdminError, AdminStats};

/// Aggregate counters for the admin dashboard. Plain reads, no business
/// logic.
pub struct AdminStatsService {
    db: PostgrestClient,
}

impl AdminStatsService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            db: PostgrestClient::new(config),
        }
    }

    pub async fn admin_stats(&self, auth_token: &str) -> Result<AdminStats, AdminError> {
        debug!("Collecting admin counters");

        Ok(AdminStats {
            user_count: self.count_rows("users", auth_token).await?,
            doctor_count: self.count_rows("doctors", auth_token).await?,
            appointment_count: self.count_rows("appointments", auth_token).await?,
            review_count: self.count_rows("reviews", auth_token).await?,
        })
    }

    async fn count_rows(&self, table: &str, auth_token: &str) -> Result<usize, AdminError> {
        let path = format!("/rest/v1/{}?select=id", table);

        let rows: Vec<Value> = self
            .db
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| AdminError::DatabaseError(e.to_string()))?;

        Ok(rows.len())
    }
}

use reqwest::Method;
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::PostgrestClient;

use crate::models::{CreateReviewRequest, DoctorError, Review};

/// Reviews are create-only: never edited, never removed, and a patient may
/// leave any number of them for the same doctor.
pub struct ReviewService {
    db: PostgrestClient,
}

impl ReviewService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            db: PostgrestClient::new(config),
        }
    }

    pub async fn list_reviews(
        &self,
        doctor_id: Uuid,
        auth_token: Option<&str>,
    ) -> Result<Vec<Review>, DoctorError> {
        let path = format!("/rest/v1/reviews?doctor_id=eq.{}", doctor_id);
        let result: Vec<Value> = self
            .db
            .request(Method::GET, &path, auth_token, None)
            .await
            .map_err(|e| DoctorError::DatabaseError(e.to_string()))?;

        result
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<Review>, _>>()
            .map_err(|e| DoctorError::DatabaseError(format!("Failed to parse reviews: {}", e)))
    }

    pub async fn create_review(
        &self,
        request: CreateReviewRequest,
        auth_token: &str,
    ) -> Result<Review, DoctorError> {
        debug!("New review for doctor {}", request.doctor_id);

        if !(1..=5).contains(&request.rating) {
            return Err(DoctorError::ValidationError(
                "Rating must be between 1 and 5".to_string(),
            ));
        }

        let review_data = json!({
            "rating": request.rating,
            "comment": request.comment,
            "user_name": request.user_name,
            "doctor_id": request.doctor_id,
        });

        let result: Vec<Value> = self
            .db
            .request_returning(
                Method::POST,
                "/rest/v1/reviews",
                Some(auth_token),
                Some(review_data),
            )
            .await
            .map_err(|e| DoctorError::DatabaseError(e.to_string()))?;

        let row = result
            .into_iter()
            .next()
            .ok_or_else(|| DoctorError::DatabaseError("insert returned no row".to_string()))?;

        serde_json::from_value(row)
            .map_err(|e| DoctorError::DatabaseError(format!("Failed to parse review: {}", e)))
    }
}

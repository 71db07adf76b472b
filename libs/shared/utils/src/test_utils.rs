use std::sync::Arc;

use serde_json::json;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::AuthUser;

use crate::jwt;

pub struct TestConfig {
    pub jwt_secret: String,
    pub database_rest_url: String,
    pub database_api_key: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "test-secret-key-for-jwt-validation-must-be-long-enough".to_string(),
            database_rest_url: "http://localhost:54321".to_string(),
            database_api_key: "test-api-key".to_string(),
        }
    }
}

impl TestConfig {
    pub fn with_db_url(url: &str) -> Self {
        Self {
            database_rest_url: url.to_string(),
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            database_rest_url: self.database_rest_url.clone(),
            database_api_key: self.database_api_key.clone(),
            jwt_secret: self.jwt_secret.clone(),
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

pub struct TestUser {
    pub id: String,
    pub name: String,
    pub role: String,
}

impl Default for TestUser {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: "Test Patient".to_string(),
            role: "user".to_string(),
        }
    }
}

impl TestUser {
    pub fn new(name: &str, role: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            role: role.to_string(),
        }
    }

    pub fn patient(name: &str) -> Self {
        Self::new(name, "user")
    }

    pub fn admin(name: &str) -> Self {
        Self::new(name, "admin")
    }

    pub fn to_auth_user(&self) -> AuthUser {
        AuthUser {
            id: self.id.clone(),
            name: Some(self.name.clone()),
            role: Some(self.role.clone()),
        }
    }
}

pub struct JwtTestUtils;

impl JwtTestUtils {
    pub fn create_test_token(user: &TestUser, secret: &str, exp_hours: Option<i64>) -> String {
        jwt::create_token(&user.id, &user.name, &user.role, secret, exp_hours.unwrap_or(24))
            .expect("token creation should not fail in tests")
    }

    pub fn create_expired_token(user: &TestUser, secret: &str) -> String {
        Self::create_test_token(user, secret, Some(-1))
    }

    pub fn create_invalid_signature_token(user: &TestUser) -> String {
        Self::create_test_token(user, "wrong-secret", Some(24))
    }

    pub fn create_malformed_token() -> String {
        "invalid.token.format".to_string()
    }
}

/// Canned storage rows for wiremock-backed tests.
pub struct MockDbResponses;

impl MockDbResponses {
    pub fn user_row(id: &str, name: &str, email: &str, role: &str) -> serde_json::Value {
        json!({
            "id": id,
            "name": name,
            "email": email,
            "password_hash": "$argon2id$v=19$m=19456,t=2,p=1$c29tZXNhbHQ$hash",
            "role": role
        })
    }

    pub fn doctor_row(id: &str, name: &str, specialty: &str) -> serde_json::Value {
        json!({
            "id": id,
            "name": name,
            "specialty": specialty,
            "image": "https://cdn.example.com/placeholder-doctor.png",
            "address": "Boulevard de la Corniche, Casablanca",
            "latitude": 33.5700,
            "longitude": -7.6000
        })
    }

    pub fn appointment_row(
        id: &str,
        user_id: &str,
        doctor_id: &str,
        date: &str,
        time: &str,
    ) -> serde_json::Value {
        json!({
            "id": id,
            "date": date,
            "time": time,
            "doctor_id": doctor_id,
            "user_id": user_id,
            "created_at": "2026-01-01T00:00:00Z"
        })
    }

    pub fn review_row(doctor_id: &str, rating: i32, user_name: &str) -> serde_json::Value {
        json!({
            "id": Uuid::new_v4(),
            "rating": rating,
            "comment": "Very thorough",
            "user_name": user_name,
            "doctor_id": doctor_id
        })
    }

    pub fn consultation_note_row(
        appointment_id: &str,
        doctor_id: &str,
        user_id: &str,
    ) -> serde_json::Value {
        json!({
            "id": Uuid::new_v4(),
            "appointment_id": appointment_id,
            "doctor_id": doctor_id,
            "user_id": user_id,
            "symptoms": "Persistent cough",
            "diagnosis": "Seasonal bronchitis",
            "treatment": "Rest and fluids",
            "notes": "Follow up in two weeks",
            "visit_date": "2026-01-15"
        })
    }

    pub fn error_response(message: &str) -> serde_json::Value {
        json!({
            "message": message
        })
    }
}

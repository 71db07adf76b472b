use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const PLACEHOLDER_IMAGE_URL: &str = "https://cdn.example.com/placeholder-doctor.png";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Doctor {
    pub id: Uuid,
    pub name: String,
    pub specialty: String,
    pub image: String,
    pub address: Option<String>,
    // Map marker is omitted client-side when coordinates are absent.
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDoctorRequest {
    pub name: String,
    pub specialty: String,
    pub image: Option<String>,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateDoctorRequest {
    pub name: Option<String>,
    pub specialty: Option<String>,
    pub image: Option<String>,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub id: Uuid,
    pub rating: i32,
    pub comment: String,
    // Denormalized display name, not a foreign key.
    pub user_name: String,
    pub doctor_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateReviewRequest {
    pub rating: i32,
    pub comment: String,
    pub user_name: String,
    pub doctor_id: Uuid,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum DoctorError {
    #[error("Doctor not found")]
    NotFound,

    #[error("Cannot delete a doctor with existing appointments")]
    HasAppointments,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::PostgrestClient;

use crate::models::{
    CreateDoctorRequest, Doctor, DoctorError, UpdateDoctorRequest, PLACEHOLDER_IMAGE_URL,
};

pub struct DoctorService {
    db: PostgrestClient,
}

impl DoctorService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            db: PostgrestClient::new(config),
        }
    }

    pub async fn list_doctors(&self, auth_token: Option<&str>) -> Result<Vec<Doctor>, DoctorError> {
        let result: Vec<Value> = self
            .db
            .request(Method::GET, "/rest/v1/doctors?order=name.asc", auth_token, None)
            .await
            .map_err(|e| DoctorError::DatabaseError(e.to_string()))?;

        result
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<Doctor>, _>>()
            .map_err(|e| DoctorError::DatabaseError(format!("Failed to parse doctors: {}", e)))
    }

    pub async fn create_doctor(
        &self,
        request: CreateDoctorRequest,
        auth_token: &str,
    ) -> Result<Doctor, DoctorError> {
        debug!("Creating doctor profile for {}", request.name);

        if request.name.trim().is_empty() || request.specialty.trim().is_empty() {
            return Err(DoctorError::ValidationError(
                "Doctor name and specialty are required".to_string(),
            ));
        }

        let doctor_data = json!({
            "name": request.name,
            "specialty": request.specialty,
            "image": request.image.unwrap_or_else(|| PLACEHOLDER_IMAGE_URL.to_string()),
            "address": request.address,
            "latitude": request.latitude,
            "longitude": request.longitude,
        });

        let result: Vec<Value> = self
            .db
            .request_returning(
                Method::POST,
                "/rest/v1/doctors",
                Some(auth_token),
                Some(doctor_data),
            )
            .await
            .map_err(|e| DoctorError::DatabaseError(e.to_string()))?;

        let row = result
            .into_iter()
            .next()
            .ok_or_else(|| DoctorError::DatabaseError("insert returned no row".to_string()))?;

        let doctor: Doctor = serde_json::from_value(row)
            .map_err(|e| DoctorError::DatabaseError(format!("Failed to parse doctor: {}", e)))?;

        info!("Doctor {} created", doctor.id);
        Ok(doctor)
    }

    pub async fn update_doctor(
        &self,
        doctor_id: Uuid,
        request: UpdateDoctorRequest,
        auth_token: &str,
    ) -> Result<Doctor, DoctorError> {
        debug!("Updating doctor profile {}", doctor_id);

        let mut update_data = serde_json::Map::new();
        if let Some(name) = request.name {
            update_data.insert("name".to_string(), json!(name));
        }
        if let Some(specialty) = request.specialty {
            update_data.insert("specialty".to_string(), json!(specialty));
        }
        if let Some(image) = request.image {
            update_data.insert("image".to_string(), json!(image));
        }
        if let Some(address) = request.address {
            update_data.insert("address".to_string(), json!(address));
        }
        if let Some(latitude) = request.latitude {
            update_data.insert("latitude".to_string(), json!(latitude));
        }
        if let Some(longitude) = request.longitude {
            update_data.insert("longitude".to_string(), json!(longitude));
        }

        let path = format!("/rest/v1/doctors?id=eq.{}", doctor_id);
        let result: Vec<Value> = self
            .db
            .request_returning(
                Method::PATCH,
                &path,
                Some(auth_token),
                Some(Value::Object(update_data)),
            )
            .await
            .map_err(|e| DoctorError::DatabaseError(e.to_string()))?;

        let row = result.into_iter().next().ok_or(DoctorError::NotFound)?;

        serde_json::from_value(row)
            .map_err(|e| DoctorError::DatabaseError(format!("Failed to parse doctor: {}", e)))
    }

    /// Deletion is restrictive: a doctor still referenced by appointments
    /// cannot be removed, so no orphaned child rows can appear.
    pub async fn delete_doctor(
        &self,
        doctor_id: Uuid,
        auth_token: &str,
    ) -> Result<(), DoctorError> {
        debug!("Deleting doctor profile {}", doctor_id);

        let appointments_path = format!(
            "/rest/v1/appointments?doctor_id=eq.{}&select=id",
            doctor_id
        );
        let referencing: Vec<Value> = self
            .db
            .request(Method::GET, &appointments_path, Some(auth_token), None)
            .await
            .map_err(|e| DoctorError::DatabaseError(e.to_string()))?;

        if !referencing.is_empty() {
            return Err(DoctorError::HasAppointments);
        }

        let path = format!("/rest/v1/doctors?id=eq.{}", doctor_id);
        let deleted: Vec<Value> = self
            .db
            .request_returning(Method::DELETE, &path, Some(auth_token), None)
            .await
            .map_err(|e| DoctorError::DatabaseError(e.to_string()))?;

        if deleted.is_empty() {
            return Err(DoctorError::NotFound);
        }

        info!("Doctor {} deleted", doctor_id);
        Ok(())
    }
}

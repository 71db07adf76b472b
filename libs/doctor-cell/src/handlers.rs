use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::AuthUser;
use shared_models::error::AppError;
use shared_utils::extractor::require_admin;

use crate::models::{CreateDoctorRequest, CreateReviewRequest, DoctorError, UpdateDoctorRequest};
use crate::services::doctor::DoctorService;
use crate::services::review::ReviewService;

fn map_doctor_error(e: DoctorError) -> AppError {
    match e {
        DoctorError::NotFound => AppError::NotFound("Doctor not found".to_string()),
        DoctorError::HasAppointments => AppError::Conflict(e.to_string()),
        DoctorError::ValidationError(msg) => AppError::ValidationError(msg),
        DoctorError::DatabaseError(msg) => AppError::Database(msg),
    }
}

#[axum::debug_handler]
pub async fn list_doctors(
    State(state): State<Arc<AppConfig>>,
) -> Result<Json<Value>, AppError> {
    let doctors = DoctorService::new(&state)
        .list_doctors(None)
        .await
        .map_err(map_doctor_error)?;

    Ok(Json(json!(doctors)))
}

#[axum::debug_handler]
pub async fn create_doctor(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<CreateDoctorRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    require_admin(&user)?;

    let doctor = DoctorService::new(&state)
        .create_doctor(request, auth.token())
        .await
        .map_err(map_doctor_error)?;

    Ok((StatusCode::CREATED, Json(json!(doctor))))
}

#[axum::debug_handler]
pub async fn update_doctor(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<AuthUser>,
    Path(doctor_id): Path<Uuid>,
    Json(request): Json<UpdateDoctorRequest>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user)?;

    let doctor = DoctorService::new(&state)
        .update_doctor(doctor_id, request, auth.token())
        .await
        .map_err(map_doctor_error)?;

    Ok(Json(json!(doctor)))
}

#[axum::debug_handler]
pub async fn delete_doctor(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<AuthUser>,
    Path(doctor_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user)?;

    DoctorService::new(&state)
        .delete_doctor(doctor_id, auth.token())
        .await
        .map_err(map_doctor_error)?;

    Ok(Json(json!({
        "message": "Doctor deleted"
    })))
}

#[axum::debug_handler]
pub async fn list_reviews(
    State(state): State<Arc<AppConfig>>,
    Path(doctor_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let reviews = ReviewService::new(&state)
        .list_reviews(doctor_id, None)
        .await
        .map_err(map_doctor_error)?;

    Ok(Json(json!(reviews)))
}

#[axum::debug_handler]
pub async fn create_review(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(_user): Extension<AuthUser>,
    Json(request): Json<CreateReviewRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let review = ReviewService::new(&state)
        .create_review(request, auth.token())
        .await
        .map_err(map_doctor_error)?;

    Ok((StatusCode::CREATED, Json(json!(review))))
}

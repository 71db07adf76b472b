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

use crate::models::{CreateConsultationNoteRequest, PatientError};
use crate::services::consultation::ConsultationService;
use crate::services::history::HistoryService;
use crate::services::stats::StatsService;

fn map_patient_error(e: PatientError) -> AppError {
    match e {
        PatientError::ValidationError(msg) => AppError::ValidationError(msg),
        PatientError::DatabaseError(msg) => AppError::Database(msg),
    }
}

fn authorize_for_user(user: &AuthUser, user_id: Uuid) -> Result<(), AppError> {
    let is_self = user_id.to_string() == user.id;
    if !is_self && !user.is_admin() {
        return Err(AppError::Auth(
            "Not authorized to view this patient's data".to_string(),
        ));
    }
    Ok(())
}

#[axum::debug_handler]
pub async fn get_user_stats(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<AuthUser>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    authorize_for_user(&user, user_id)?;

    let stats = StatsService::new(&state)
        .user_stats(user_id, auth.token())
        .await
        .map_err(map_patient_error)?;

    Ok(Json(json!(stats)))
}

#[axum::debug_handler]
pub async fn get_patient_history(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<AuthUser>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    authorize_for_user(&user, user_id)?;

    let history = HistoryService::new(&state)
        .patient_history(user_id, auth.token())
        .await
        .map_err(map_patient_error)?;

    Ok(Json(json!(history)))
}

#[axum::debug_handler]
pub async fn create_consultation_note(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<CreateConsultationNoteRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    // Notes are written by clinical staff through the admin surface.
    if !user.is_admin() {
        return Err(AppError::Auth("Admin role required".to_string()));
    }

    let note = ConsultationService::new(&state)
        .create_note(request, auth.token())
        .await
        .map_err(map_patient_error)?;

    Ok((StatusCode::CREATED, Json(json!(note))))
}

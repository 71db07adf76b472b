use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::AuthUser;
use shared_models::error::AppError;
use shared_utils::clinic_time;

use crate::models::{AppointmentError, BookAppointmentRequest};
use crate::services::booking::AppointmentBookingService;

/// Optional listing filter. `upcoming` and `past` split the full listing at
/// today's date on the clinic clock; every appointment falls in exactly one
/// of the two.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentScope {
    Upcoming,
    Past,
}

#[derive(Debug, Deserialize)]
pub struct AppointmentQueryParams {
    pub user_id: Uuid,
    pub scope: Option<AppointmentScope>,
}

fn map_appointment_error(e: AppointmentError) -> AppError {
    match e {
        AppointmentError::PastDateTime => AppError::ValidationError(e.to_string()),
        AppointmentError::SlotTaken => {
            AppError::Conflict("This slot is already booked. Please choose another.".to_string())
        }
        AppointmentError::NotFound => AppError::NotFound("Appointment not found".to_string()),
        AppointmentError::ValidationError(msg) => AppError::ValidationError(msg),
        AppointmentError::DatabaseError(msg) => AppError::Database(msg),
    }
}

#[axum::debug_handler]
pub async fn book_appointment(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let token = auth.token();

    // Patients book for themselves; admins may book on a patient's behalf.
    let is_self = request.user_id.to_string() == user.id;
    if !is_self && !user.is_admin() {
        return Err(AppError::Auth(
            "Not authorized to book an appointment for this patient".to_string(),
        ));
    }

    let booking_service = AppointmentBookingService::new(&state);

    let appointment = booking_service
        .book_appointment(request, token)
        .await
        .map_err(map_appointment_error)?;

    Ok((StatusCode::CREATED, Json(json!(appointment))))
}

#[axum::debug_handler]
pub async fn cancel_appointment(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(_user): Extension<AuthUser>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();

    let booking_service = AppointmentBookingService::new(&state);

    booking_service
        .cancel_appointment(appointment_id, token)
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!({
        "message": "Appointment deleted"
    })))
}

#[axum::debug_handler]
pub async fn list_appointments(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<AppointmentQueryParams>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();

    let is_self = params.user_id.to_string() == user.id;
    if !is_self && !user.is_admin() {
        return Err(AppError::Auth(
            "Not authorized to view this patient's appointments".to_string(),
        ));
    }

    let booking_service = AppointmentBookingService::new(&state);

    let appointments = match params.scope {
        Some(AppointmentScope::Upcoming) => {
            booking_service
                .partition_upcoming(params.user_id, clinic_time::today_in_clinic_tz(), token)
                .await
        }
        Some(AppointmentScope::Past) => {
            booking_service
                .partition_past(params.user_id, clinic_time::today_in_clinic_tz(), token)
                .await
        }
        None => booking_service.list_appointments(params.user_id, token).await,
    }
    .map_err(map_appointment_error)?;

    Ok(Json(json!(appointments)))
}

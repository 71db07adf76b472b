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
use shared_utils::jwt::create_token;

use crate::models::{AccountError, LoginRequest, RegisterRequest};
use crate::services::account::AccountService;

const TOKEN_TTL_HOURS: i64 = 24;

fn map_account_error(e: AccountError) -> AppError {
    match e {
        AccountError::EmailTaken => AppError::Conflict(e.to_string()),
        AccountError::InvalidCredentials => AppError::Auth(e.to_string()),
        AccountError::NotFound => AppError::NotFound("User not found".to_string()),
        AccountError::AdminProtected => AppError::BadRequest(e.to_string()),
        AccountError::ValidationError(msg) => AppError::ValidationError(msg),
        AccountError::DatabaseError(msg) => AppError::Database(msg),
    }
}

#[axum::debug_handler]
pub async fn register(
    State(state): State<Arc<AppConfig>>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let user = AccountService::new(&state)
        .register(request)
        .await
        .map_err(map_account_error)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Account created",
            "user": user
        })),
    ))
}

#[axum::debug_handler]
pub async fn login(
    State(state): State<Arc<AppConfig>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<Value>, AppError> {
    let account = AccountService::new(&state)
        .login(request)
        .await
        .map_err(map_account_error)?;

    let token = create_token(
        &account.id.to_string(),
        &account.name,
        &account.role,
        &state.jwt_secret,
        TOKEN_TTL_HOURS,
    )
    .map_err(AppError::Internal)?;

    Ok(Json(json!({
        "user": {
            "id": account.id,
            "name": account.name,
            "role": account.role
        },
        "token": token
    })))
}

#[axum::debug_handler]
pub async fn list_users(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user)?;

    let users = AccountService::new(&state)
        .list_users(auth.token())
        .await
        .map_err(map_account_error)?;

    Ok(Json(json!(users)))
}

#[axum::debug_handler]
pub async fn delete_user(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<AuthUser>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user)?;

    AccountService::new(&state)
        .delete_user(user_id, auth.token())
        .await
        .map_err(map_account_error)?;

    Ok(Json(json!({
        "message": "User deleted"
    })))
}

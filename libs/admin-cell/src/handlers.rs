use std::sync::Arc;

use axum::{
    extract::{Extension, State},
    Json,
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_models::auth::AuthUser;
use shared_models::error::AppError;
use shared_utils::extractor::require_admin;

use crate::models::AdminError;
use crate::services::stats::AdminStatsService;

#[axum::debug_handler]
pub async fn get_admin_stats(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user)?;

    let stats = AdminStatsService::new(&state)
        .admin_stats(auth.token())
        .await
        .map_err(|AdminError::DatabaseError(msg)| AppError::Database(msg))?;

    Ok(Json(json!(stats)))
}

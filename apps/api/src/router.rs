use std::sync::Arc;

use axum::{routing::get, Router};

use admin_cell::router::admin_routes;
use appointment_cell::router::appointment_routes;
use auth_cell::router::auth_routes;
use doctor_cell::router::{doctor_routes, review_routes};
use patient_cell::router::patient_routes;
use shared_config::AppConfig;

pub fn create_router(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", get(|| async { "Clinic API is running!" }))
        .merge(auth_routes(state.clone()))
        .merge(patient_routes(state.clone()))
        .nest("/doctors", doctor_routes(state.clone()))
        .nest("/reviews", review_routes(state.clone()))
        .nest("/appointments", appointment_routes(state.clone()))
        .nest("/admin", admin_routes(state))
}

use std::sync::Arc;

use axum::{
    middleware,
    routing::post,
    Extension, Router,
};

use shared_database::AppState;
use shared_utils::extractor::auth_middleware;

use crate::handlers;
use crate::services::booking::DoctorLocks;

pub fn appointment_routes(state: Arc<AppState>) -> Router {
    // One lock registry per process; every booking handler shares it.
    let locks = DoctorLocks::default();

    Router::new()
        .route("/", post(handlers::book_appointment).get(handlers::my_appointments))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .layer(Extension(locks))
        .with_state(state)
}

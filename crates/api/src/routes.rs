use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use profiler_coordinator::ProfilingService;

use crate::handlers;

/// 创建 API 路由
pub fn create_router(service: Arc<ProfilingService>) -> Router {
    Router::new()
        .route("/api/v1/targets", get(handlers::list_targets))
        .route(
            "/api/v1/bundles",
            post(handlers::start_bundle).get(handlers::list_bundles),
        )
        .route("/api/v1/bundles/:bundle_id", get(handlers::get_bundle))
        .route(
            "/api/v1/bundles/:bundle_id/data",
            get(handlers::get_bundle_data),
        )
        .route(
            "/api/v1/profiles/:profile_id/data",
            get(handlers::get_profile_data),
        )
        .with_state(service)
}

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use profiler_coordinator::view::{
    GetBundleDataResponse, GetBundleResponse, GetProfileDataResponse, ListBundlesResponse,
    ListTargetsResponse, StartBundleRequest, StartBundleResponse,
};
use profiler_coordinator::ProfilingService;
use tracing::info;

use crate::error::ApiError;

pub async fn list_targets(
    State(service): State<Arc<ProfilingService>>,
) -> Result<Json<ListTargetsResponse>, ApiError> {
    Ok(Json(service.list_targets().await?))
}

pub async fn start_bundle(
    State(service): State<Arc<ProfilingService>>,
    Json(request): Json<StartBundleRequest>,
) -> Result<Json<StartBundleResponse>, ApiError> {
    let response = service.start_bundle(request).await?;
    info!("bundle {} 已通过 API 启动", response.bundle_id);
    Ok(Json(response))
}

pub async fn list_bundles(
    State(service): State<Arc<ProfilingService>>,
) -> Result<Json<ListBundlesResponse>, ApiError> {
    Ok(Json(service.list_bundles().await?))
}

pub async fn get_bundle(
    State(service): State<Arc<ProfilingService>>,
    Path(bundle_id): Path<i64>,
) -> Result<Json<GetBundleResponse>, ApiError> {
    Ok(Json(service.get_bundle(bundle_id).await?))
}

pub async fn get_bundle_data(
    State(service): State<Arc<ProfilingService>>,
    Path(bundle_id): Path<i64>,
) -> Result<Json<GetBundleDataResponse>, ApiError> {
    Ok(Json(service.get_bundle_data(bundle_id).await?))
}

pub async fn get_profile_data(
    State(service): State<Arc<ProfilingService>>,
    Path(profile_id): Path<i64>,
) -> Result<Json<GetProfileDataResponse>, ApiError> {
    Ok(Json(service.get_profile_data(profile_id).await?))
}

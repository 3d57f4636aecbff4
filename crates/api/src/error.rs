use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use profiler_errors::ProfilerError;
use serde_json::json;

/// API错误类型
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Profiler(#[from] ProfilerError),

    #[error("请求参数错误: {0}")]
    BadRequest(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            ApiError::Profiler(e) if e.is_not_found() => (StatusCode::NOT_FOUND, self.to_string()),
            ApiError::Profiler(e) if e.is_bad_request() => {
                (StatusCode::BAD_REQUEST, self.to_string())
            }
            ApiError::Profiler(_) => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, self.to_string()),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

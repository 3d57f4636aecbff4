//! HTTP API 层
//!
//! 只做路由和编解码，业务语义全部在 `ProfilingService`。

pub mod error;
pub mod handlers;
pub mod routes;

pub use error::ApiError;
pub use routes::create_router;

//! # profiler-config
//!
//! 应用配置模型与加载逻辑。
//! 支持 TOML 配置文件 + `PROFILER_` 前缀环境变量覆盖，加载后统一校验。

pub mod models;

pub use models::*;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProfilerError {
    #[error("数据库错误: {0}")]
    Database(#[from] sqlx::Error),
    #[error("存储操作错误: {0}")]
    Storage(String),
    #[error("profiling bundle 未找到: {id}")]
    BundleNotFound { id: i64 },
    #[error("profile 未找到: {id}")]
    ProfileNotFound { id: i64 },
    // 以下三条是对外 API 的固定文案，不要改动
    #[error("targets are not valid")]
    InvalidTargets,
    #[error("the profile is in error state")]
    ProfileInErrorState,
    #[error("the profile is in skipped state")]
    ProfileInSkippedState,
    #[error("数据验证失败: {0}")]
    Validation(String),
    // 记录在 Profile 行内而不经由 API 抛出，文案原样保留
    #[error("{0}")]
    Fetch(String),
    #[error("拓扑查询错误: {0}")]
    Topology(String),
    #[error("签名错误: {0}")]
    Signature(String),
    #[error("配置错误: {0}")]
    Configuration(String),
    #[error("序列化错误: {0}")]
    Serialization(String),
    #[error("内部错误: {0}")]
    Internal(String),
}

pub type ProfilerResult<T> = Result<T, ProfilerError>;

impl ProfilerError {
    pub fn storage_error<S: Into<String>>(msg: S) -> Self {
        Self::Storage(msg.into())
    }
    pub fn bundle_not_found(id: i64) -> Self {
        Self::BundleNotFound { id }
    }
    pub fn profile_not_found(id: i64) -> Self {
        Self::ProfileNotFound { id }
    }
    pub fn validation_error<S: Into<String>>(msg: S) -> Self {
        Self::Validation(msg.into())
    }
    pub fn config_error<S: Into<String>>(msg: S) -> Self {
        Self::Configuration(msg.into())
    }
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::Internal(msg.into())
    }

    /// 是否为“资源未找到”类错误，API 层据此映射 404
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ProfilerError::BundleNotFound { .. } | ProfilerError::ProfileNotFound { .. }
        )
    }

    /// 是否为请求方错误，API 层据此映射 400
    pub fn is_bad_request(&self) -> bool {
        matches!(
            self,
            ProfilerError::InvalidTargets
                | ProfilerError::Validation(_)
                | ProfilerError::ProfileInErrorState
                | ProfilerError::ProfileInSkippedState
        )
    }
}

impl From<serde_json::Error> for ProfilerError {
    fn from(err: serde_json::Error) -> Self {
        ProfilerError::Serialization(err.to_string())
    }
}

impl From<anyhow::Error> for ProfilerError {
    fn from(err: anyhow::Error) -> Self {
        ProfilerError::Internal(err.to_string())
    }
}

use anyhow::{Context, Result};
use config::{Config as ConfigBuilder, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub storage: StorageConfig,
    pub collector: CollectorConfig,
    pub cluster: ClusterConfig,
    pub api: ApiConfig,
    pub observability: ObservabilityConfig,
}

/// 存储配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// SQLite 数据库文件路径，`:memory:` 表示纯内存库
    pub db_path: String,
    pub max_connections: u32,
    pub connection_timeout_seconds: u64,
}

/// 抓取配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectorConfig {
    /// 单次 profiling 允许的最大采样时长
    pub max_profiling_duration_secs: u32,
    /// HTTP 连接超时
    pub connect_timeout_seconds: u64,
    /// 请求总超时在采样时长之上附加的余量
    pub request_timeout_margin_seconds: u64,
}

/// 集群组件端点（静态拓扑）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentEndpoint {
    pub ip: String,
    pub port: u16,
    #[serde(default)]
    pub status_port: u16,
}

/// 集群配置
///
/// 静态拓扑来源。接入真正的拓扑发现子系统时这里只剩 tls_enabled。
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ClusterConfig {
    /// 为 true 时 profiling 端点走 https
    pub tls_enabled: bool,
    #[serde(default)]
    pub pd: Vec<ComponentEndpoint>,
    #[serde(default)]
    pub tidb: Vec<ComponentEndpoint>,
    #[serde(default)]
    pub tikv: Vec<ComponentEndpoint>,
    #[serde(default)]
    pub tiflash: Vec<ComponentEndpoint>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub enabled: bool,
    pub bind_address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage: StorageConfig {
                db_path: "data/profiler.sqlite".to_string(),
                max_connections: 5,
                connection_timeout_seconds: 30,
            },
            collector: CollectorConfig {
                max_profiling_duration_secs: 300,
                connect_timeout_seconds: 10,
                request_timeout_margin_seconds: 60,
            },
            cluster: ClusterConfig::default(),
            api: ApiConfig {
                enabled: true,
                bind_address: "0.0.0.0:8428".to_string(),
            },
            observability: ObservabilityConfig {
                log_level: "info".to_string(),
            },
        }
    }
}

impl AppConfig {
    /// 加载配置：默认值 <- 配置文件 <- 环境变量，随后校验
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut builder = ConfigBuilder::builder();

        if let Some(path) = config_path {
            if Path::new(path).exists() {
                builder = builder.add_source(File::new(path, FileFormat::Toml));
            } else {
                return Err(anyhow::anyhow!("配置文件不存在: {}", path));
            }
        }

        builder = builder.add_source(
            Environment::with_prefix("PROFILER")
                .separator("__")
                .try_parsing(true),
        );

        let loaded: PartialAppConfig = builder
            .build()
            .context("构建配置失败")?
            .try_deserialize()
            .context("解析配置失败")?;

        let config = loaded.merge_into_default();
        config.validate()?;
        Ok(config)
    }

    /// 校验配置合法性
    pub fn validate(&self) -> Result<()> {
        if self.collector.max_profiling_duration_secs == 0 {
            return Err(anyhow::anyhow!(
                "collector.max_profiling_duration_secs 必须为正数"
            ));
        }
        if self.storage.max_connections == 0 {
            return Err(anyhow::anyhow!("storage.max_connections 必须为正数"));
        }
        if self.storage.db_path.is_empty() {
            return Err(anyhow::anyhow!("storage.db_path 不能为空"));
        }
        if self.api.enabled && self.api.bind_address.parse::<std::net::SocketAddr>().is_err() {
            return Err(anyhow::anyhow!(
                "api.bind_address 不是合法的监听地址: {}",
                self.api.bind_address
            ));
        }
        for endpoint in self
            .cluster
            .pd
            .iter()
            .chain(&self.cluster.tidb)
            .chain(&self.cluster.tikv)
            .chain(&self.cluster.tiflash)
        {
            if endpoint.ip.is_empty() {
                return Err(anyhow::anyhow!("cluster 组件端点缺少 ip"));
            }
        }
        Ok(())
    }
}

/// 配置文件里允许任意 section 缺省，这里承接部分反序列化再并入默认值
#[derive(Debug, Default, Deserialize)]
struct PartialAppConfig {
    storage: Option<StorageConfig>,
    collector: Option<CollectorConfig>,
    cluster: Option<ClusterConfig>,
    api: Option<ApiConfig>,
    observability: Option<ObservabilityConfig>,
}

impl PartialAppConfig {
    fn merge_into_default(self) -> AppConfig {
        let default = AppConfig::default();
        AppConfig {
            storage: self.storage.unwrap_or(default.storage),
            collector: self.collector.unwrap_or(default.collector),
            cluster: self.cluster.unwrap_or(default.cluster),
            api: self.api.unwrap_or(default.api),
            observability: self.observability.unwrap_or(default.observability),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.collector.max_profiling_duration_secs, 300);
        assert!(config.cluster.pd.is_empty());
    }

    #[test]
    fn test_load_missing_file_fails() {
        let result = AppConfig::load(Some("/nonexistent/profiler.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_from_toml_file() {
        let mut file = tempfile::NamedTempFile::with_suffix(".toml").unwrap();
        write!(
            file,
            r#"
[storage]
db_path = ":memory:"
max_connections = 2
connection_timeout_seconds = 10

[cluster]
tls_enabled = false

[[cluster.tidb]]
ip = "tidb-1.internal"
port = 4000
status_port = 10080
"#
        )
        .unwrap();

        let config = AppConfig::load(Some(file.path().to_str().unwrap())).unwrap();
        assert_eq!(config.storage.db_path, ":memory:");
        assert_eq!(config.storage.max_connections, 2);
        assert_eq!(config.cluster.tidb.len(), 1);
        assert_eq!(config.cluster.tidb[0].status_port, 10080);
        // 未覆盖的 section 保持默认值
        assert_eq!(config.collector.max_profiling_duration_secs, 300);
    }

    #[test]
    fn test_validate_rejects_zero_duration_cap() {
        let mut config = AppConfig::default();
        config.collector.max_profiling_duration_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_bind_address() {
        let mut config = AppConfig::default();
        config.api.bind_address = "not-an-address".to_string();
        assert!(config.validate().is_err());
    }
}

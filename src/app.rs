use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use profiler_api::create_router;
use profiler_collector::{HttpClientBundle, ProfileTaskExecutor};
use profiler_config::AppConfig;
use profiler_coordinator::{BundleCoordinator, ProfilingService};
use profiler_domain::repositories::ProfileRepository;
use profiler_infrastructure::{
    DatabaseManager, HmacDescriptorSigner, SqliteBundleRepository, SqliteProfileRepository,
    StaticTopologyProvider,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing::{info, warn};

/// 主应用程序
///
/// 负责装配：存储 -> 仓储 -> 客户端/签名器/拓扑 -> 协调器 -> 服务 -> API。
pub struct Application {
    config: AppConfig,
    service: Arc<ProfilingService>,
    database: DatabaseManager,
}

impl Application {
    /// 创建新的应用实例
    pub async fn new(config: AppConfig) -> Result<Self> {
        info!("初始化应用程序");

        let database = DatabaseManager::new(&config.storage)
            .await
            .context("初始化数据库失败")?;

        let bundles = Arc::new(SqliteBundleRepository::new(database.pool()));
        let profiles: Arc<dyn ProfileRepository> =
            Arc::new(SqliteProfileRepository::new(database.pool()));

        // 孤儿恢复：上一次进程遗留的 Running 行永远不会再被任何任务推进，
        // 启动时统一标记为 Error，让所属 bundle 得以到达终态
        let orphaned = profiles
            .fail_all_running("profiling is interrupted")
            .await?;
        if orphaned > 0 {
            warn!("启动清理：{} 个遗留的 running profile 已标记为 error", orphaned);
        }

        // 只为配置里声明过的组件类型构建客户端，未声明的类型走 Skipped
        let clients = HttpClientBundle::from_config(&config.collector, &config.cluster)?;
        let signer = Arc::new(HmacDescriptorSigner::new()?);
        let topology = Arc::new(StaticTopologyProvider::new(&config.cluster));

        let executor = Arc::new(ProfileTaskExecutor::new(
            Arc::clone(&profiles),
            clients,
            Duration::from_secs(config.collector.request_timeout_margin_seconds),
        ));
        let coordinator = Arc::new(BundleCoordinator::new(
            bundles.clone(),
            Arc::clone(&profiles),
            executor,
            signer.clone(),
            config.collector.max_profiling_duration_secs,
        ));
        let service = Arc::new(ProfilingService::new(
            bundles,
            profiles,
            topology,
            signer,
            coordinator,
        ));

        Ok(Self {
            config,
            service,
            database,
        })
    }

    /// 运行应用程序直到收到关闭信号
    pub async fn run(&self, mut shutdown_rx: broadcast::Receiver<()>) -> Result<()> {
        if self.config.api.enabled {
            let router = create_router(self.service.clone());
            let listener = TcpListener::bind(&self.config.api.bind_address)
                .await
                .with_context(|| format!("监听失败: {}", self.config.api.bind_address))?;
            info!("API 服务监听 {}", self.config.api.bind_address);

            axum::serve(listener, router)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.recv().await;
                })
                .await
                .context("API 服务异常退出")?;
        } else {
            let _ = shutdown_rx.recv().await;
        }

        // 先取消并排空在途抓取任务，再关闭存储
        self.service.shutdown().await;
        self.database.close().await;
        info!("应用组件已全部停止");
        Ok(())
    }
}

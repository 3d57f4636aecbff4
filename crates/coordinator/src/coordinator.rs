use std::sync::Arc;

use profiler_collector::ProfileTaskExecutor;
use profiler_domain::entities::{Bundle, Profile};
use profiler_domain::ports::DescriptorSigner;
use profiler_domain::repositories::{BundleRepository, ProfileRepository};
use profiler_errors::{ProfilerError, ProfilerResult};
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::view::{StartBundleRequest, StartBundleResponse};

/// Bundle 协调器
///
/// 持有进程级的抓取任务集合：所有 Bundle 的所有任务共享同一个等待组，
/// 生命周期关停时先广播取消、再排空全部任务。
pub struct BundleCoordinator {
    bundles: Arc<dyn BundleRepository>,
    profiles: Arc<dyn ProfileRepository>,
    executor: Arc<ProfileTaskExecutor>,
    signer: Arc<dyn DescriptorSigner>,
    /// 单次 profiling 允许的最大采样时长
    max_duration_secs: u32,
    /// 关闭信号发送器，每个抓取任务持有一个订阅
    shutdown_tx: broadcast::Sender<()>,
    /// 在途任务句柄
    in_flight: Mutex<Vec<JoinHandle<()>>>,
}

impl BundleCoordinator {
    pub fn new(
        bundles: Arc<dyn BundleRepository>,
        profiles: Arc<dyn ProfileRepository>,
        executor: Arc<ProfileTaskExecutor>,
        signer: Arc<dyn DescriptorSigner>,
        max_duration_secs: u32,
    ) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            bundles,
            profiles,
            executor,
            signer,
            max_duration_secs,
            shutdown_tx,
            in_flight: Mutex::new(Vec::new()),
        }
    }

    /// 启动一个 Bundle：校验 -> 准入 -> 落库 -> 派发任务。
    /// 行全部持久化后立即返回，不等待任何抓取完成
    pub async fn start_bundle(
        &self,
        request: StartBundleRequest,
    ) -> ProfilerResult<StartBundleResponse> {
        self.validate(&request)?;

        // 准入：任一签名不合法则整个请求失败，不产生任何行
        for target in &request.targets {
            if self.signer.verify(target).is_err() {
                return Err(ProfilerError::InvalidTargets);
            }
        }

        let descriptors: Vec<_> = request
            .targets
            .iter()
            .map(|t| t.descriptor.clone())
            .collect();

        let bundle = self
            .bundles
            .create(&Bundle::new(
                request.duration_secs,
                request.kinds,
                &descriptors,
            ))
            .await?;

        // 确定性顺序：target 优先、kind 次之
        let mut rows = Vec::with_capacity(descriptors.len() * bundle.profile_kinds.len());
        for target in &descriptors {
            for kind in &bundle.profile_kinds {
                rows.push(Profile::new(bundle.id, target.clone(), *kind));
            }
        }
        let created = self.profiles.create_batch(&rows).await?;

        // 行全部可见之后才启动任务
        let mut in_flight = self.in_flight.lock().await;
        for profile in created {
            let executor = Arc::clone(&self.executor);
            let duration_secs = bundle.duration_secs;
            let shutdown_rx = self.shutdown_tx.subscribe();
            let profile_id = profile.id;
            let handle = tokio::spawn(async move {
                executor.execute(profile, duration_secs, shutdown_rx).await;
                debug!("profile 任务 {} 结束", profile_id);
            });
            in_flight.push(handle);
        }
        drop(in_flight);

        info!(
            "bundle {} 已启动: {} 个 profile 任务",
            bundle.id,
            descriptors.len() * bundle.profile_kinds.len()
        );
        Ok(StartBundleResponse {
            bundle_id: bundle.id,
        })
    }

    fn validate(&self, request: &StartBundleRequest) -> ProfilerResult<()> {
        if request.duration_secs == 0 {
            return Err(ProfilerError::validation_error("durationSecs 必须为正数"));
        }
        if request.duration_secs > self.max_duration_secs {
            return Err(ProfilerError::validation_error(format!(
                "durationSecs 超出上限 {}",
                self.max_duration_secs
            )));
        }
        if request.kinds.is_empty() {
            return Err(ProfilerError::validation_error("kinds 不能为空"));
        }
        if request.targets.is_empty() {
            return Err(ProfilerError::validation_error("targets 不能为空"));
        }
        Ok(())
    }

    /// 排空全部在途任务。任务句柄只会在这里被消费
    pub async fn wait_all(&self) {
        loop {
            let handles: Vec<JoinHandle<()>> = {
                let mut in_flight = self.in_flight.lock().await;
                std::mem::take(&mut *in_flight)
            };
            if handles.is_empty() {
                return;
            }
            for handle in handles {
                if let Err(e) = handle.await {
                    warn!("profile 任务异常退出: {}", e);
                }
            }
        }
    }

    /// 优雅关停：广播取消信号并等待全部任务到达终态
    pub async fn shutdown(&self) {
        info!("协调器开始关停，取消在途抓取");
        // 没有订阅者时发送会失败，忽略即可
        let _ = self.shutdown_tx.send(());
        self.wait_all().await;
        info!("协调器关停完成");
    }
}

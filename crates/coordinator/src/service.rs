use std::sync::Arc;

use profiler_domain::entities::{ProfileState, SignedComponentDescriptor};
use profiler_domain::ports::{DescriptorSigner, TopologyProvider};
use profiler_domain::repositories::{BundleRepository, ProfileRepository};
use profiler_errors::{ProfilerError, ProfilerResult};

use crate::aggregator::bundle_state;
use crate::coordinator::BundleCoordinator;
use crate::view::{
    BundleView, GetBundleDataResponse, GetBundleResponse, GetProfileDataResponse,
    ListBundlesResponse, ListTargetsResponse, ProfileView, ProfileWithData, StartBundleRequest,
    StartBundleResponse,
};

/// 对外服务：六个与传输层无关的操作。
/// HTTP 层只做编解码，所有语义都在这里
pub struct ProfilingService {
    bundles: Arc<dyn BundleRepository>,
    profiles: Arc<dyn ProfileRepository>,
    topology: Arc<dyn TopologyProvider>,
    signer: Arc<dyn DescriptorSigner>,
    coordinator: Arc<BundleCoordinator>,
}

impl ProfilingService {
    pub fn new(
        bundles: Arc<dyn BundleRepository>,
        profiles: Arc<dyn ProfileRepository>,
        topology: Arc<dyn TopologyProvider>,
        signer: Arc<dyn DescriptorSigner>,
        coordinator: Arc<BundleCoordinator>,
    ) -> Self {
        Self {
            bundles,
            profiles,
            topology,
            signer,
            coordinator,
        }
    }

    /// 列出可 profiling 的目标，逐个签名。
    /// 固定按 PD、TiDB、TiKV、TiFlash 的顺序拼接
    pub async fn list_targets(&self) -> ProfilerResult<ListTargetsResponse> {
        let mut descriptors = Vec::new();
        descriptors.extend(self.topology.get_pd().await?);
        descriptors.extend(self.topology.get_tidb().await?);
        descriptors.extend(self.topology.get_tikv().await?);
        descriptors.extend(self.topology.get_tiflash().await?);

        let targets = descriptors
            .iter()
            .map(|d| self.signer.sign(d))
            .collect::<ProfilerResult<Vec<SignedComponentDescriptor>>>()?;

        Ok(ListTargetsResponse { targets })
    }

    pub async fn start_bundle(
        &self,
        request: StartBundleRequest,
    ) -> ProfilerResult<StartBundleResponse> {
        self.coordinator.start_bundle(request).await
    }

    /// Bundle 列表，新的在前，只含摘要不含 profile
    pub async fn list_bundles(&self) -> ProfilerResult<ListBundlesResponse> {
        let bundles = self.bundles.list_newest_first().await?;
        let mut views = Vec::with_capacity(bundles.len());
        for bundle in &bundles {
            let profiles = self.profiles.get_by_bundle(bundle.id).await?;
            views.push(BundleView::from_bundle(bundle, bundle_state(&profiles)));
        }
        Ok(ListBundlesResponse { bundles: views })
    }

    /// Bundle 详情及全部子 profile，永远不携带数据字节
    pub async fn get_bundle(&self, bundle_id: i64) -> ProfilerResult<GetBundleResponse> {
        let bundle = self
            .bundles
            .get_by_id(bundle_id)
            .await?
            .ok_or(ProfilerError::BundleNotFound { id: bundle_id })?;

        let profiles = self.profiles.get_by_bundle(bundle_id).await?;
        Ok(GetBundleResponse {
            bundle: BundleView::from_bundle(&bundle, bundle_state(&profiles)),
            profiles: profiles.iter().map(ProfileView::from).collect(),
        })
    }

    /// 仅返回 Succeeded 的 profile 及其数据。
    /// Bundle 不存在时返回空列表而不是错误
    pub async fn get_bundle_data(&self, bundle_id: i64) -> ProfilerResult<GetBundleDataResponse> {
        let profiles = self.profiles.get_by_bundle(bundle_id).await?;
        Ok(GetBundleDataResponse {
            profiles: profiles
                .iter()
                .filter(|p| p.state == ProfileState::Succeeded)
                .map(ProfileWithData::from)
                .collect(),
        })
    }

    /// 单个 profile 及其数据；Error/Skipped 终态返回对应的状态错误
    pub async fn get_profile_data(&self, profile_id: i64) -> ProfilerResult<GetProfileDataResponse> {
        let profile = self
            .profiles
            .get_by_id(profile_id)
            .await?
            .ok_or(ProfilerError::ProfileNotFound { id: profile_id })?;

        match profile.state {
            ProfileState::Error => Err(ProfilerError::ProfileInErrorState),
            ProfileState::Skipped => Err(ProfilerError::ProfileInSkippedState),
            _ => Ok(GetProfileDataResponse {
                profile: ProfileWithData::from(&profile),
            }),
        }
    }

    /// 生命周期关停入口，见 [`BundleCoordinator::shutdown`]
    pub async fn shutdown(&self) {
        self.coordinator.shutdown().await;
    }

    /// 排空在途任务，测试与关停共用
    pub async fn wait_all(&self) {
        self.coordinator.wait_all().await;
    }
}

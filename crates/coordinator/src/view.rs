//! 对外视图对象
//!
//! API 出入参与领域实体解耦：GetBundle 永远不携带 profile 数据字节，
//! 数据字节只经由 GetBundleData / GetProfileData 返回。

use chrono::{DateTime, Utc};
use profiler_domain::entities::{
    Bundle, BundleState, ComponentDescriptor, Profile, ProfileKind, ProfileState,
    SignedComponentDescriptor, TargetsCount,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListTargetsResponse {
    pub targets: Vec<SignedComponentDescriptor>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartBundleRequest {
    pub duration_secs: u32,
    pub kinds: Vec<ProfileKind>,
    pub targets: Vec<SignedComponentDescriptor>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartBundleResponse {
    pub bundle_id: i64,
}

/// Bundle 摘要，state 为读取时推导的聚合状态
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundleView {
    pub bundle_id: i64,
    pub state: BundleState,
    pub duration_secs: u32,
    pub kinds: Vec<ProfileKind>,
    pub targets_count: TargetsCount,
    pub created_at: DateTime<Utc>,
}

impl BundleView {
    pub fn from_bundle(bundle: &Bundle, state: BundleState) -> Self {
        Self {
            bundle_id: bundle.id,
            state,
            duration_secs: bundle.duration_secs,
            kinds: bundle.profile_kinds.clone(),
            targets_count: bundle.targets_count.clone(),
            created_at: bundle.created_at,
        }
    }
}

/// Profile 视图，不携带数据字节
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileView {
    pub profile_id: i64,
    pub bundle_id: i64,
    pub target: ComponentDescriptor,
    pub kind: ProfileKind,
    pub state: ProfileState,
    pub progress: f64,
    pub error: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl From<&Profile> for ProfileView {
    fn from(profile: &Profile) -> Self {
        Self {
            profile_id: profile.id,
            bundle_id: profile.bundle_id,
            target: profile.target.clone(),
            kind: profile.kind,
            state: profile.state,
            progress: profile.progress,
            error: profile.error.clone().unwrap_or_default(),
            started_at: profile.started_at,
            finished_at: profile.finished_at,
        }
    }
}

/// 携带数据字节的 Profile 视图
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileWithData {
    #[serde(flatten)]
    pub profile: ProfileView,
    pub data: Vec<u8>,
}

impl From<&Profile> for ProfileWithData {
    fn from(profile: &Profile) -> Self {
        Self {
            profile: ProfileView::from(profile),
            data: profile.data.clone().unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListBundlesResponse {
    pub bundles: Vec<BundleView>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetBundleResponse {
    pub bundle: BundleView,
    pub profiles: Vec<ProfileView>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetBundleDataResponse {
    pub profiles: Vec<ProfileWithData>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetProfileDataResponse {
    pub profile: ProfileWithData,
}

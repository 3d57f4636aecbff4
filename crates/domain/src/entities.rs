//! Domain Entities
//!
//! 核心领域实体定义，包含组件描述符、profiling bundle、profile 等业务核心概念。
//! 这些实体是系统的核心业务模型，不依赖于外部技术实现。

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// 集群组件相关实体
// ============================================================================

/// 集群组件类型
///
/// 对应集群中可被 profiling 的四类组件，线上序列化为小写字符串。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    #[serde(rename = "pd")]
    Pd,
    #[serde(rename = "tidb")]
    Tidb,
    #[serde(rename = "tikv")]
    Tikv,
    #[serde(rename = "tiflash")]
    Tiflash,
}

impl ComponentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentKind::Pd => "pd",
            ComponentKind::Tidb => "tidb",
            ComponentKind::Tikv => "tikv",
            ComponentKind::Tiflash => "tiflash",
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 组件描述符
///
/// 标识一个可被 profiling 的组件端点。纯值对象，按值嵌入 Profile。
///
/// # 字段说明
///
/// - `ip`: 组件的主机地址
/// - `port`: 组件服务端口（PD 的 profiling 端点走此端口）
/// - `status_port`: 组件状态端口（TiDB/TiKV/TiFlash 的 profiling 端点走此端口）
/// - `kind`: 组件类型
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ComponentDescriptor {
    pub ip: String,
    pub port: u16,
    pub status_port: u16,
    pub kind: ComponentKind,
}

/// 带签名的组件描述符
///
/// 签名由服务端持有的 HMAC-SHA256 密钥对描述符全部字段计算得出。
/// 服务端只会对签名验证通过的描述符发起请求。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SignedComponentDescriptor {
    #[serde(flatten)]
    pub descriptor: ComponentDescriptor,
    pub signature: String,
}

/// 各组件类型的目标数量统计
pub type TargetsCount = HashMap<ComponentKind, u32>;

// ============================================================================
// Profile 相关实体
// ============================================================================

/// Profile 类型
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ProfileKind {
    #[serde(rename = "cpu")]
    Cpu,
    #[serde(rename = "heap")]
    Heap,
    #[serde(rename = "mutex")]
    Mutex,
    #[serde(rename = "goroutine")]
    Goroutine,
}

impl ProfileKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileKind::Cpu => "cpu",
            ProfileKind::Heap => "heap",
            ProfileKind::Mutex => "mutex",
            ProfileKind::Goroutine => "goroutine",
        }
    }
}

impl fmt::Display for ProfileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Profile 状态
///
/// # 变体说明
///
/// - `Running`: 抓取进行中
/// - `Succeeded`: 抓取成功，data 字段非空
/// - `Error`: 发起了抓取但失败，error 字段记录原因
/// - `Skipped`: 主动放弃抓取（组件不支持该类型，或对应客户端未配置）。
///   聚合时按成功处理
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ProfileState {
    #[serde(rename = "running")]
    Running,
    #[serde(rename = "succeeded")]
    Succeeded,
    #[serde(rename = "error")]
    Error,
    #[serde(rename = "skipped")]
    Skipped,
}

impl ProfileState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileState::Running => "running",
            ProfileState::Succeeded => "succeeded",
            ProfileState::Error => "error",
            ProfileState::Skipped => "skipped",
        }
    }

    /// 是否为终态
    pub fn is_finished(&self) -> bool {
        !matches!(self, ProfileState::Running)
    }
}

impl fmt::Display for ProfileState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bundle 聚合状态
///
/// 不落库，每次读取时由子 Profile 的实时状态推导。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum BundleState {
    #[serde(rename = "running")]
    Running,
    #[serde(rename = "all_succeeded")]
    AllSucceeded,
    #[serde(rename = "partial_succeeded")]
    PartialSucceeded,
    #[serde(rename = "all_failed")]
    AllFailed,
}

impl BundleState {
    pub fn as_str(&self) -> &'static str {
        match self {
            BundleState::Running => "running",
            BundleState::AllSucceeded => "all_succeeded",
            BundleState::PartialSucceeded => "partial_succeeded",
            BundleState::AllFailed => "all_failed",
        }
    }
}

impl fmt::Display for BundleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Profiling Bundle
///
/// 一次用户请求产生的抓取分组，对每个 (target, kind) 组合包含一个 Profile。
/// Bundle 行创建后不再更新，聚合状态完全由子 Profile 推导。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bundle {
    pub id: i64,
    /// 定时类 profile（如 CPU）的采样时长
    pub duration_secs: u32,
    /// 去重后的 profile 类型，保持请求顺序
    pub profile_kinds: Vec<ProfileKind>,
    /// 请求原始携带的 profile 类型
    pub requested_kinds: Vec<ProfileKind>,
    /// 按组件类型统计的目标数量
    pub targets_count: TargetsCount,
    pub created_at: DateTime<Utc>,
}

impl Bundle {
    /// 由请求参数创建新 Bundle，id 由存储层分配
    pub fn new(
        duration_secs: u32,
        requested_kinds: Vec<ProfileKind>,
        targets: &[ComponentDescriptor],
    ) -> Self {
        let mut profile_kinds = Vec::with_capacity(requested_kinds.len());
        for kind in &requested_kinds {
            if !profile_kinds.contains(kind) {
                profile_kinds.push(*kind);
            }
        }

        let mut targets_count = TargetsCount::new();
        for target in targets {
            *targets_count.entry(target.kind).or_insert(0) += 1;
        }

        Self {
            id: 0, // 将由数据库生成
            duration_secs,
            profile_kinds,
            requested_kinds,
            targets_count,
            created_at: Utc::now(),
        }
    }
}

/// Profile
///
/// 一次 (target, kind) 抓取及其结果字节。行只会被更新两次：
/// 创建时（Running, progress=0）和到达终态时（terminal + data/error + progress=1）。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: i64,
    pub bundle_id: i64,
    pub target: ComponentDescriptor,
    pub kind: ProfileKind,
    pub state: ProfileState,
    /// 完成度估计，位于 [0.0, 1.0]；Running 期间严格小于 1.0，终态恒为 1.0
    pub progress: f64,
    /// 仅 state=Error 时非空
    pub error: Option<String>,
    /// 仅 state=Succeeded 时非空
    pub data: Option<Vec<u8>>,
    pub started_at: DateTime<Utc>,
    /// 离开 Running 状态的时刻
    pub finished_at: Option<DateTime<Utc>>,
}

impl Profile {
    /// 创建新的 Profile，id 由存储层分配
    pub fn new(bundle_id: i64, target: ComponentDescriptor, kind: ProfileKind) -> Self {
        Self {
            id: 0, // 将由数据库生成
            bundle_id,
            target,
            kind,
            state: ProfileState::Running,
            progress: 0.0,
            error: None,
            data: None,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, ProfileState::Running)
    }

    pub fn is_finished(&self) -> bool {
        self.state.is_finished()
    }

    /// Skipped 在聚合里与 Succeeded 同组
    pub fn counts_as_success(&self) -> bool {
        matches!(self.state, ProfileState::Succeeded | ProfileState::Skipped)
    }
}

use async_trait::async_trait;

use crate::entities::{Bundle, Profile, ProfileState};
use profiler_errors::ProfilerResult;

/// Bundle 仓储接口
///
/// Bundle 行创建后不再更新，因此接口上没有 update。
#[async_trait]
pub trait BundleRepository: Send + Sync {
    /// 创建 Bundle，返回带存储层分配 id 的新实体
    async fn create(&self, bundle: &Bundle) -> ProfilerResult<Bundle>;

    /// 根据 ID 获取 Bundle
    async fn get_by_id(&self, id: i64) -> ProfilerResult<Option<Bundle>>;

    /// 获取全部 Bundle，新的在前
    async fn list_newest_first(&self) -> ProfilerResult<Vec<Bundle>>;
}

/// Profile 仓储接口
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// 批量创建 Profile，按入参顺序分配递增 id，返回带 id 的新实体。
    /// 与所属 Bundle 的创建处于同一次请求中，必须在任何抓取任务启动前完成
    async fn create_batch(&self, profiles: &[Profile]) -> ProfilerResult<Vec<Profile>>;

    /// 根据 ID 获取 Profile
    async fn get_by_id(&self, id: i64) -> ProfilerResult<Option<Profile>>;

    /// 获取某个 Bundle 的全部 Profile，按 id 升序
    async fn get_by_bundle(&self, bundle_id: i64) -> ProfilerResult<Vec<Profile>>;

    /// 更新进度估计。仅当行仍处于 Running 状态时生效，
    /// 终态写入永远不会被进度心跳覆盖
    async fn update_progress(&self, id: i64, progress: f64) -> ProfilerResult<()>;

    /// 写入终态：state、error/data、progress=1、finished_at。
    /// 对同一行的唯一一次终态写入
    async fn finish(
        &self,
        id: i64,
        state: ProfileState,
        error: Option<String>,
        data: Option<Vec<u8>>,
    ) -> ProfilerResult<()>;

    /// 把所有仍处于 Running 状态的行标记为 Error。
    /// 用于进程启动时清理上一次运行遗留的孤儿任务，返回受影响行数
    async fn fail_all_running(&self, error: &str) -> ProfilerResult<u64>;
}

//! 对外协作接口
//!
//! 拓扑发现与描述符签名属于外部子系统，这里只定义核心消费的窄接口。

use async_trait::async_trait;

use crate::entities::{ComponentDescriptor, SignedComponentDescriptor};
use profiler_errors::ProfilerResult;

/// 拓扑提供者
///
/// 返回的描述符已携带正确的组件类型，端口字段含义见 [`ComponentDescriptor`]。
#[async_trait]
pub trait TopologyProvider: Send + Sync {
    async fn get_pd(&self) -> ProfilerResult<Vec<ComponentDescriptor>>;
    async fn get_tidb(&self) -> ProfilerResult<Vec<ComponentDescriptor>>;
    async fn get_tikv(&self) -> ProfilerResult<Vec<ComponentDescriptor>>;
    async fn get_tiflash(&self) -> ProfilerResult<Vec<ComponentDescriptor>>;
}

/// 描述符签名器
///
/// Sign 绑定描述符全部字段；Verify 失败即拒绝整个请求。
/// 密钥在进程启动后只读。
pub trait DescriptorSigner: Send + Sync {
    fn sign(&self, descriptor: &ComponentDescriptor) -> ProfilerResult<SignedComponentDescriptor>;
    fn verify(&self, signed: &SignedComponentDescriptor) -> ProfilerResult<()>;
}

use async_trait::async_trait;
use profiler_config::{ClusterConfig, ComponentEndpoint};
use profiler_domain::entities::{ComponentDescriptor, ComponentKind};
use profiler_domain::ports::TopologyProvider;
use profiler_errors::ProfilerResult;

/// 配置驱动的静态拓扑提供者
///
/// 真正的拓扑发现属于外部子系统；嵌入式部署下由配置文件声明集群成员。
pub struct StaticTopologyProvider {
    pd: Vec<ComponentDescriptor>,
    tidb: Vec<ComponentDescriptor>,
    tikv: Vec<ComponentDescriptor>,
    tiflash: Vec<ComponentDescriptor>,
}

impl StaticTopologyProvider {
    pub fn new(cluster: &ClusterConfig) -> Self {
        Self {
            pd: to_descriptors(&cluster.pd, ComponentKind::Pd),
            tidb: to_descriptors(&cluster.tidb, ComponentKind::Tidb),
            tikv: to_descriptors(&cluster.tikv, ComponentKind::Tikv),
            tiflash: to_descriptors(&cluster.tiflash, ComponentKind::Tiflash),
        }
    }
}

fn to_descriptors(endpoints: &[ComponentEndpoint], kind: ComponentKind) -> Vec<ComponentDescriptor> {
    endpoints
        .iter()
        .map(|e| ComponentDescriptor {
            ip: e.ip.clone(),
            port: e.port,
            status_port: e.status_port,
            kind,
        })
        .collect()
}

#[async_trait]
impl TopologyProvider for StaticTopologyProvider {
    async fn get_pd(&self) -> ProfilerResult<Vec<ComponentDescriptor>> {
        Ok(self.pd.clone())
    }

    async fn get_tidb(&self) -> ProfilerResult<Vec<ComponentDescriptor>> {
        Ok(self.tidb.clone())
    }

    async fn get_tikv(&self) -> ProfilerResult<Vec<ComponentDescriptor>> {
        Ok(self.tikv.clone())
    }

    async fn get_tiflash(&self) -> ProfilerResult<Vec<ComponentDescriptor>> {
        Ok(self.tiflash.clone())
    }
}

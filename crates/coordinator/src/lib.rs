//! Bundle 协调与读侧聚合
//!
//! 写路径：StartBundle 校验并落库后为每个 (target, kind) 派发一个抓取任务；
//! 读路径：每次查询时由子 Profile 的实时状态推导 Bundle 聚合状态。

pub mod aggregator;
pub mod coordinator;
pub mod service;
pub mod view;

pub use aggregator::bundle_state;
pub use coordinator::BundleCoordinator;
pub use service::ProfilingService;

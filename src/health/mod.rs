//! 健康检测模块
//!
//! 提供实例探测、实例组聚合和整体检测编排功能

pub mod checker;
pub mod group;
pub mod orchestrator;
pub mod result;

// 重新导出主要类型
pub use checker::{resolve_target, EffectiveTarget, HttpProber, Prober};
pub use group::{is_group_failing, summarize_group, GroupAggregator};
pub use orchestrator::CheckOrchestrator;
pub use result::CheckResult;

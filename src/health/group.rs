//! 实例组聚合器
//!
//! 并发探测组内所有成员，等待全部完成后按组策略得出一个组级结果。

use crate::config::{Config, GroupPolicy, InstanceGroup};
use crate::health::checker::Prober;
use crate::health::result::CheckResult;
use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, warn};

/// 判断组是否失败
///
/// * `Any` - 任一成员失败即失败
/// * `All` - 全部成员失败才失败；空组永远不会失败
pub fn is_group_failing(policy: GroupPolicy, failed: usize, total: usize) -> bool {
    match policy {
        GroupPolicy::Any => failed > 0,
        GroupPolicy::All => total > 0 && failed == total,
    }
}

/// 根据成员结果得出组结果，失败描述只包含失败成员的描述
pub fn summarize_group(group: &InstanceGroup, members: &[CheckResult]) -> CheckResult {
    let failures: Vec<&str> = members
        .iter()
        .filter(|r| r.is_failed())
        .map(|r| r.failure_message().unwrap_or("unknown error"))
        .collect();

    if !is_group_failing(group.policy, failures.len(), members.len()) {
        return CheckResult::ok();
    }

    CheckResult::failed(format!(
        "Check group {} failed:\n\t{}",
        group.name,
        failures.join("\n\t")
    ))
}

/// 实例组聚合器
#[derive(Clone)]
pub struct GroupAggregator {
    /// 实例探测器
    prober: Arc<dyn Prober>,
}

impl GroupAggregator {
    /// 创建新的组聚合器
    pub fn new(prober: Arc<dyn Prober>) -> Self {
        Self { prober }
    }

    /// 检测整个实例组
    ///
    /// # 参数
    /// * `group` - 实例组配置
    /// * `config` - 全局配置
    ///
    /// # 返回
    /// * `CheckResult` - 组级结果
    pub async fn check_group(&self, group: &InstanceGroup, config: &Config) -> CheckResult {
        if group.instances.is_empty() {
            debug!(group = %group.name, "实例组没有成员，直接视为通过");
            return CheckResult::ok();
        }

        let probes = group
            .instances
            .iter()
            .map(|instance| self.prober.probe(instance, config));
        let members = join_all(probes).await;

        let failed = members.iter().filter(|r| r.is_failed()).count();
        let result = summarize_group(group, &members);

        if result.is_failed() {
            warn!(
                group = %group.name,
                policy = %group.policy,
                failed,
                total = members.len(),
                "实例组检测失败"
            );
        } else {
            debug!(
                group = %group.name,
                policy = %group.policy,
                failed,
                total = members.len(),
                "实例组检测通过"
            );
        }

        result
    }
}

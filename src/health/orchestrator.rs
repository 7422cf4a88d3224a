//! 检测编排器
//!
//! 为每个顶层实例和每个实例组各启动一个独立任务，通过一个多生产者单消费者
//! 通道收集结果，收满预期数量后返回全部失败描述。

use crate::config::Config;
use crate::health::checker::Prober;
use crate::health::group::GroupAggregator;
use crate::health::result::CheckResult;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, Instrument};

/// 检测编排器
#[derive(Clone)]
pub struct CheckOrchestrator {
    /// 实例探测器
    prober: Arc<dyn Prober>,
}

impl CheckOrchestrator {
    /// 创建新的编排器
    pub fn new(prober: Arc<dyn Prober>) -> Self {
        Self { prober }
    }

    /// 执行一次完整检测
    ///
    /// # 参数
    /// * `config` - 只读配置，由所有并发任务共享
    ///
    /// # 返回
    /// * `Vec<String>` - 失败描述列表，顺序为结果到达顺序；为空表示全部通过
    pub async fn run(&self, config: Arc<Config>) -> Vec<String> {
        let expected = config.expected_results();
        let (tx, mut rx) = mpsc::unbounded_channel::<CheckResult>();

        debug!(
            instances = config.instances.len(),
            groups = config.groups.len(),
            expected,
            "启动检测任务"
        );

        for index in 0..config.instances.len() {
            let prober = Arc::clone(&self.prober);
            let task_config = Arc::clone(&config);

            spawn_check(
                tx.clone(),
                format!("Check instance {}", config.instances[index].address),
                async move {
                    prober
                        .probe(&task_config.instances[index], &task_config)
                        .await
                },
            );
        }

        for index in 0..config.groups.len() {
            let aggregator = GroupAggregator::new(Arc::clone(&self.prober));
            let task_config = Arc::clone(&config);

            spawn_check(
                tx.clone(),
                format!("Check group {}", config.groups[index].name),
                async move {
                    aggregator
                        .check_group(&task_config.groups[index], &task_config)
                        .await
                },
            );
        }

        // 只保留任务持有的发送端
        drop(tx);

        let mut messages = Vec::with_capacity(expected);
        let mut received = 0;

        while received < expected {
            match rx.recv().await {
                Some(result) => {
                    received += 1;
                    if let Some(message) = result.into_failure_message() {
                        messages.push(message);
                    }
                }
                None => {
                    error!(received, expected, "检测任务异常退出，结果不完整");
                    break;
                }
            }
        }

        debug!(received, failures = messages.len(), "检测结果收集完成");

        messages
    }
}

/// 在独立任务中执行一项检测，并保证结果一定送入通道
///
/// 检测任务异常退出（panic 或被取消）时，以失败结果补上该项，
/// 失败描述以 `subject` 开头。
fn spawn_check<F>(tx: mpsc::UnboundedSender<CheckResult>, subject: String, check: F)
where
    F: Future<Output = CheckResult> + Send + 'static,
{
    let task = tokio::spawn(check.in_current_span());

    tokio::spawn(
        async move {
            let result = match task.await {
                Ok(result) => result,
                Err(e) => {
                    error!(subject = %subject, "检测任务异常退出: {}", e);
                    CheckResult::failed(format!(
                        "{} failed (error: check task aborted: {})",
                        subject, e
                    ))
                }
            };
            let _ = tx.send(result);
        }
        .in_current_span(),
    );
}

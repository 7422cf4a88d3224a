//! 应用程序核心逻辑
//!
//! 一次运行的完整流程：加载配置 → 并发检测 → 有失败时发送一封汇总邮件。
//! 这里只返回错误，进程退出码由 main 决定。

use crate::config::{Config, ConfigLoader, FileConfigLoader};
use crate::error::{NotificationError, Result};
use crate::health::{CheckOrchestrator, HttpProber, Prober};
use crate::logging::LoggingSystem;
use crate::notification::{
    compose_report_body, resolve_recipients, NoOpSender, NotificationSender, SesSender,
    REPORT_SUBJECT,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

/// 运行选项
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// 配置文件路径
    pub config_path: PathBuf,
    /// 演练模式：只输出报告，不发送
    pub dry_run: bool,
    /// 是否启用环境变量替换
    pub env_substitution: bool,
}

impl From<&crate::cli::Args> for RunOptions {
    fn from(args: &crate::cli::Args) -> Self {
        Self {
            config_path: args.config_file.clone(),
            dry_run: args.dry_run,
            env_substitution: !args.no_env,
        }
    }
}

/// 失败报告的处理方式
pub enum Delivery {
    /// 通过发送器发送
    Send(Arc<dyn NotificationSender>),
    /// 根据配置中的 aws 块创建 SES 发送器
    Ses,
    /// 输出到标准输出
    DryRun,
}

/// 一次运行的结果
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// 本次检测ID
    pub run_id: Uuid,
    /// 产生的结果数（顶层实例数 + 组数）
    pub checked: usize,
    /// 失败描述
    pub failures: Vec<String>,
    /// 是否已发送通知
    pub notified: bool,
}

impl RunOutcome {
    /// 是否全部通过
    pub fn all_passed(&self) -> bool {
        self.failures.is_empty()
    }
}

/// 从命令行选项执行一次完整检测
pub async fn run(options: &RunOptions, logging: &LoggingSystem) -> Result<RunOutcome> {
    let loader = FileConfigLoader::new(options.env_substitution);
    let config = loader.load_from_file(&options.config_path).await?;

    let prober = Arc::new(HttpProber::from_config(&config)?);
    let delivery = if options.dry_run {
        Delivery::DryRun
    } else {
        Delivery::Ses
    };

    let outcome = check_and_report(Arc::new(config), prober, delivery, Some(logging)).await?;
    Ok(outcome)
}

/// 执行检测并在有失败时发送报告
///
/// # 参数
/// * `config` - 已加载的配置
/// * `prober` - 实例探测器
/// * `delivery` - 报告处理方式
/// * `logging` - 用于记录汇总日志的日志系统
///
/// # 返回
/// * `Result<RunOutcome>` - 运行结果；收件人缺失或发送失败时返回错误
pub async fn check_and_report(
    config: Arc<Config>,
    prober: Arc<dyn Prober>,
    delivery: Delivery,
    logging: Option<&LoggingSystem>,
) -> Result<RunOutcome> {
    let run_id = Uuid::new_v4();
    let span = info_span!("check_run", run_id = %run_id);
    let checked = config.expected_results();

    info!(
        parent: &span,
        instances = config.instances.len(),
        groups = config.groups.len(),
        group_members = config.group_member_count(),
        timeout_secs = config.timeout,
        "开始健康检测"
    );

    let start_time = Instant::now();
    let orchestrator = CheckOrchestrator::new(prober);
    let failures = orchestrator
        .run(Arc::clone(&config))
        .instrument(span.clone())
        .await;
    let duration_ms = start_time.elapsed().as_millis() as u64;

    if let Some(logging) = logging {
        let _entered = span.enter();
        logging.check_summary_log(&run_id.to_string(), checked, failures.len(), duration_ms);
    }

    let mut outcome = RunOutcome {
        run_id,
        checked,
        failures,
        notified: false,
    };

    if outcome.all_passed() {
        info!(parent: &span, "所有检测通过");
        return Ok(outcome);
    }

    let body = compose_report_body(&outcome.failures);

    if matches!(delivery, Delivery::DryRun) {
        print_report(&config, &body);
        return Ok(outcome);
    }

    // 收件人检查先于发送通道配置检查
    let recipients = resolve_recipients(&config)?;
    let sender: Arc<dyn NotificationSender> = match delivery {
        Delivery::Send(sender) => sender,
        Delivery::Ses => {
            let aws = config.aws.as_ref().ok_or_else(|| {
                NotificationError::ConfigError("缺少 aws 配置块，无法发送失败报告".to_string())
            })?;
            Arc::new(SesSender::new(aws)?)
        }
        Delivery::DryRun => Arc::new(NoOpSender),
    };

    deliver(sender.as_ref(), &recipients, &body, logging)
        .instrument(span)
        .await?;
    outcome.notified = true;

    Ok(outcome)
}

async fn deliver(
    sender: &dyn NotificationSender,
    recipients: &[String],
    body: &str,
    logging: Option<&LoggingSystem>,
) -> Result<()> {
    let result = sender.send(recipients, REPORT_SUBJECT, body).await;

    if let Some(logging) = logging {
        let error = result.as_ref().err().map(|e| format!("{e:#}"));
        logging.notification_log(recipients, result.is_ok(), error.as_deref());
    }

    result.map_err(|e| NotificationError::SendError(format!("{e:#}")).into())
}

/// 演练模式下把报告写到标准输出
fn print_report(config: &Config, body: &str) {
    let recipients = resolve_recipients(config)
        .map(|r| r.join(", "))
        .unwrap_or_else(|e| format!("<{e}>"));

    println!("To: {recipients}");
    println!("Subject: {REPORT_SUBJECT}");
    println!();
    println!("{body}");
}

//! 日志系统模块
//!
//! 提供结构化日志配置和管理功能。日志统一输出到标准错误，
//! 标准输出只留给演练模式下的报告内容。

use log::LevelFilter;
use serde_json::json;
use std::sync::{Mutex, MutexGuard, OnceLock};
use tracing_subscriber::filter::{Directive, LevelFilter as TracingLevelFilter};
use tracing_subscriber::{fmt, prelude::*, registry, EnvFilter, Layer};

/// 全局日志初始化状态
#[derive(Debug, Default)]
struct GlobalLoggingState {
    /// 是否已初始化
    initialized: bool,
}

/// 全局日志状态管理器
static GLOBAL_LOGGING_STATE: OnceLock<Mutex<GlobalLoggingState>> = OnceLock::new();

fn global_state() -> MutexGuard<'static, GlobalLoggingState> {
    GLOBAL_LOGGING_STATE
        .get_or_init(|| Mutex::new(GlobalLoggingState::default()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// 日志配置结构
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// 日志级别
    pub level: LevelFilter,
    /// 是否使用JSON格式
    pub json_format: bool,
    /// 是否输出ANSI颜色
    pub ansi: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LevelFilter::Info,
            json_format: false,
            ansi: true,
        }
    }
}

/// 日志系统管理器
pub struct LoggingSystem {
    /// 配置
    config: LogConfig,
}

impl LoggingSystem {
    /// 初始化日志系统
    ///
    /// 重复调用不会报错，后续调用直接返回新的 `LoggingSystem` 实例。
    ///
    /// # 参数
    /// * `config` - 日志配置
    ///
    /// # 返回
    /// * `Result<LoggingSystem, anyhow::Error>` - 初始化结果
    pub fn setup_logging(config: LogConfig) -> anyhow::Result<Self> {
        {
            let state = global_state();
            if state.initialized {
                return Ok(Self { config });
            }
        }

        Self::init_log_tracer()?;
        Self::init_tracing_subscriber(&config)?;

        global_state().initialized = true;

        Ok(Self { config })
    }

    /// 初始化 LogTracer（log crate 到 tracing 的桥接）
    fn init_log_tracer() -> anyhow::Result<()> {
        use tracing_log::LogTracer;

        static LOG_TRACER_INIT: OnceLock<Result<(), String>> = OnceLock::new();

        let result = LOG_TRACER_INIT.get_or_init(|| LogTracer::init().map_err(|e| e.to_string()));

        result
            .as_ref()
            .map_err(|e| anyhow::anyhow!("LogTracer初始化失败: {}", e))?;
        Ok(())
    }

    /// 初始化 tracing subscriber
    fn init_tracing_subscriber(config: &LogConfig) -> anyhow::Result<()> {
        // RUST_LOG 中的模块级指令与命令行级别叠加
        let env_filter =
            EnvFilter::from_default_env().add_directive(Self::convert_level_to_directive(config.level));

        // 创建格式化层
        let fmt_layer = if config.json_format {
            fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_timer(fmt::time::ChronoUtc::rfc_3339())
                .with_current_span(true)
                .boxed()
        } else {
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_timer(fmt::time::ChronoUtc::rfc_3339())
                .with_ansi(config.ansi)
                .with_target(false)
                .boxed()
        };

        let result = registry().with(env_filter).with(fmt_layer).try_init();

        // 如果初始化失败，检查是否是因为已经初始化过了
        match result {
            Ok(()) => {
                tracing::debug!("日志配置: {:?}", config);
                Ok(())
            }
            Err(e) => {
                let error_msg = e.to_string();
                if error_msg.contains(
                    "attempted to set a logger after the logging system was already initialized",
                ) || error_msg.contains("a global default trace dispatcher has already been set")
                {
                    tracing::debug!("日志系统已经初始化过了");
                    Ok(())
                } else {
                    Err(anyhow::anyhow!(
                        "tracing subscriber初始化失败: {}",
                        error_msg
                    ))
                }
            }
        }
    }

    /// 将 log::LevelFilter 转换为 tracing 的指令
    fn convert_level_to_directive(level: LevelFilter) -> Directive {
        let level = match level {
            LevelFilter::Off => TracingLevelFilter::OFF,
            LevelFilter::Error => TracingLevelFilter::ERROR,
            LevelFilter::Warn => TracingLevelFilter::WARN,
            LevelFilter::Info => TracingLevelFilter::INFO,
            LevelFilter::Debug => TracingLevelFilter::DEBUG,
            LevelFilter::Trace => TracingLevelFilter::TRACE,
        };
        Directive::from(level)
    }

    /// 重置日志系统状态（主要用于测试）
    #[cfg(test)]
    pub fn reset_for_testing() {
        if GLOBAL_LOGGING_STATE.get().is_some() {
            global_state().initialized = false;
        }
    }

    /// 记录一次检测的汇总日志
    ///
    /// # 参数
    /// * `run_id` - 本次检测ID
    /// * `checked` - 产生的结果数（顶层实例数 + 组数）
    /// * `failures` - 失败结果数
    /// * `duration_ms` - 耗时
    pub fn check_summary_log(&self, run_id: &str, checked: usize, failures: usize, duration_ms: u64) {
        let summary_entry = json!({
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "type": "check_summary",
            "run_id": run_id,
            "checked": checked,
            "failures": failures,
            "duration_ms": duration_ms,
        });

        if self.config.json_format {
            tracing::info!("{summary_entry}");
        } else {
            tracing::info!(
                "SUMMARY: {} - {} checked, {} failed ({}ms)",
                run_id,
                checked,
                failures,
                duration_ms
            );
        }
    }

    /// 记录通知日志
    pub fn notification_log(&self, recipients: &[String], success: bool, error: Option<&str>) {
        let notification_entry = json!({
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "type": "notification",
            "recipients": recipients,
            "success": success,
            "error": error.unwrap_or(""),
        });

        if self.config.json_format {
            tracing::info!("{notification_entry}");
        } else if success {
            tracing::info!("NOTIFICATION: to {} - SUCCESS", recipients.join(", "));
        } else {
            tracing::error!(
                "NOTIFICATION: to {} - FAILED {}",
                recipients.join(", "),
                error.unwrap_or("")
            );
        }
    }
}

// ===================== 日志系统测试模块 =====================

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    /// 创建测试用的日志配置
    fn create_test_config() -> LogConfig {
        LogConfig {
            level: LevelFilter::Info,
            json_format: false,
            ansi: false,
        }
    }

    #[test]
    #[serial]
    fn test_logging_system_single_initialization() {
        LoggingSystem::reset_for_testing();

        let config = create_test_config();

        // 第一次初始化应该成功
        let result1 = LoggingSystem::setup_logging(config.clone());
        assert!(result1.is_ok());
        assert!(global_state().initialized);

        // 第二次初始化不会重复安装 subscriber
        let result2 = LoggingSystem::setup_logging(config);
        assert!(result2.is_ok());
    }

    #[test]
    #[serial]
    fn test_json_format_setup_after_reset() {
        LoggingSystem::reset_for_testing();

        let mut config = create_test_config();
        config.level = LevelFilter::Debug;
        config.json_format = true;

        // 全局 subscriber 已被其他测试安装时同样视为成功
        assert!(LoggingSystem::setup_logging(config).is_ok());
    }

    #[test]
    fn test_level_directive_conversion() {
        let warn = LoggingSystem::convert_level_to_directive(LevelFilter::Warn).to_string();
        assert!(warn.eq_ignore_ascii_case("warn"));

        let off = LoggingSystem::convert_level_to_directive(LevelFilter::Off).to_string();
        assert!(off.eq_ignore_ascii_case("off"));
    }

    #[test]
    #[serial]
    fn test_summary_and_notification_logs() {
        let system = LoggingSystem::setup_logging(create_test_config()).unwrap();
        system.check_summary_log("run-1", 3, 1, 42);
        system.notification_log(&["ops@example.com".to_string()], false, Some("403"));
    }
}

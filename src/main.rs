//! Health Checker 主程序入口
//!
//! 对配置文件中的实例和实例组执行一次健康检测，失败时发送汇总邮件。
//! 退出码：0 表示检测完成（包括有失败但已通知），1 表示参数、配置或通知错误。

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::Parser;
use health_checker::app::{self, RunOptions};
use health_checker::cli::Args;
use health_checker::logging::{LogConfig, LoggingSystem};
use std::io::IsTerminal;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    // 解析命令行参数
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                e.print().context("输出帮助信息失败")?;
                return Ok(());
            }
            _ => {
                // clap 的错误输出到标准错误，并带有用法提示
                let _ = e.print();
                std::process::exit(1);
            }
        },
    };

    // 初始化日志系统
    let log_config = LogConfig {
        level: args.log_level.clone().into(),
        json_format: args.json_logs,
        ansi: std::io::stderr().is_terminal(),
    };

    let logging_system = LoggingSystem::setup_logging(log_config).context("初始化日志系统失败")?;

    info!("Health Checker v{} 启动", health_checker::VERSION);

    let options = RunOptions::from(&args);
    match app::run(&options, &logging_system).await {
        Ok(outcome) => {
            info!(
                run_id = %outcome.run_id,
                failures = outcome.failures.len(),
                notified = outcome.notified,
                "检测完成"
            );
            Ok(())
        }
        Err(e) => {
            error!("检测执行失败: {}", e);
            std::process::exit(1);
        }
    }
}

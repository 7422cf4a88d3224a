//! 命令行参数定义
//!
//! 使用clap定义应用程序的命令行接口：`health-checker <config_file>`

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Health Checker - 集群实例健康检测工具
#[derive(Parser, Debug, Clone)]
#[command(
    name = "health-checker",
    version = crate::VERSION,
    about = crate::APP_DESCRIPTION,
    long_about = None
)]
pub struct Args {
    /// 配置文件路径（JSON / YAML / TOML）
    #[arg(value_name = "CONFIG_FILE", help = "配置文件路径")]
    pub config_file: PathBuf,

    /// 日志级别
    #[arg(
        short,
        long,
        value_enum,
        default_value = "info",
        help = "日志级别",
        env = "HEALTH_CHECKER_LOG_LEVEL"
    )]
    pub log_level: LogLevel,

    /// 以JSON格式输出日志
    #[arg(long, help = "以JSON格式输出日志", env = "HEALTH_CHECKER_JSON_LOGS")]
    pub json_logs: bool,

    /// 只检测不发送邮件，报告输出到标准输出
    #[arg(long, help = "只检测不发送邮件，报告输出到标准输出")]
    pub dry_run: bool,

    /// 禁用配置文件中的环境变量替换
    #[arg(long, help = "禁用配置文件中的 ${VAR} 环境变量替换")]
    pub no_env: bool,
}

/// 日志级别枚举
#[derive(ValueEnum, Clone, Debug, PartialEq)]
pub enum LogLevel {
    /// 调试级别
    Debug,
    /// 信息级别
    Info,
    /// 警告级别
    Warn,
    /// 错误级别
    Error,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Error => log::LevelFilter::Error,
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

//! Health Checker - 集群实例健康检测工具
//!
//! 根据声明式配置对服务器实例和实例组执行一次HTTP健康检测，支持：
//! - 实例组 ALL / ANY 两种失败判定策略
//! - 并发探测与结果汇总
//! - 失败时通过 AWS SES 发送一封汇总邮件
//! - JSON / YAML / TOML 配置文件
//! - 结构化日志记录

pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod health;
pub mod logging;
pub mod notification;

// 重新导出主要类型
pub use config::{AwsConfig, Config, GroupPolicy, Instance, InstanceGroup};
pub use error::HealthCheckerError;
pub use health::{CheckOrchestrator, CheckResult, GroupAggregator, HttpProber, Prober};

/// 应用程序版本信息
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// 应用程序名称
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");

/// 应用程序描述
pub const APP_DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

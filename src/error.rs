//! 错误处理模块
//!
//! 定义应用程序的统一错误类型。单个实例的网络错误不在此列，
//! 它们在探测层被转换为失败的检测结果。

use thiserror::Error;

/// Health Checker 应用程序的主要错误类型
#[derive(Error, Debug)]
pub enum HealthCheckerError {
    /// 配置相关错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),

    /// 通知相关错误
    #[error("通知错误: {0}")]
    Notification(#[from] NotificationError),

    /// HTTP客户端初始化错误
    #[error("HTTP客户端初始化失败: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// 其他错误
    #[error("其他错误: {0}")]
    Other(#[from] anyhow::Error),
}

/// 配置错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    /// 配置文件不存在
    #[error("配置文件不存在: {path}")]
    FileNotFound { path: String },

    /// 配置文件读取失败
    #[error("读取配置文件 {path} 失败: {reason}")]
    ReadError { path: String, reason: String },

    /// 无法识别的配置格式
    #[error("不支持的配置文件格式: {path}")]
    UnsupportedFormat { path: String },

    /// 配置文件解析错误
    #[error("配置文件解析失败: {0}")]
    ParseError(String),

    /// 配置验证错误
    #[error("配置验证失败: {0}")]
    ValidationError(String),

    /// 环境变量替换错误
    #[error("环境变量替换失败: {var}")]
    EnvVarError { var: String },
}

/// 通知错误类型
#[derive(Error, Debug)]
pub enum NotificationError {
    /// 检测到失败但没有可用的收件人
    #[error("未配置收件人 (receivers 与 receiver 均为空)")]
    NoRecipient,

    /// 通知通道配置错误
    #[error("通知配置错误: {0}")]
    ConfigError(String),

    /// 发送失败
    #[error("通知发送失败: {0}")]
    SendError(String),
}

/// 结果类型别名
pub type Result<T> = std::result::Result<T, HealthCheckerError>;

//! 通知模块
//!
//! 提供失败报告的收件人解析和 AWS SES 邮件发送功能

pub mod sender;
pub mod ses;

// 重新导出主要类型
pub use sender::{compose_report_body, resolve_recipients, NoOpSender, NotificationSender, REPORT_SUBJECT};
pub use ses::{SesSender, SigV4Signer};

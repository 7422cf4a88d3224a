//! 通知发送器模块
//!
//! 定义通知发送的trait、收件人解析和报告内容格式

use crate::config::Config;
use crate::error::NotificationError;
use anyhow::Result;
use async_trait::async_trait;

/// 失败报告的邮件主题
pub const REPORT_SUBJECT: &str = "Check instance(s) failed";

/// 通知发送器trait
#[async_trait]
pub trait NotificationSender: Send + Sync {
    /// 发送一条通知
    ///
    /// # 参数
    /// * `recipients` - 收件人列表（非空）
    /// * `subject` - 主题
    /// * `body` - 纯文本正文
    ///
    /// # 返回
    /// * `Result<()>` - 发送结果
    async fn send(&self, recipients: &[String], subject: &str, body: &str) -> Result<()>;
}

/// 空的通知发送器实现（用于演练模式或禁用通知）
pub struct NoOpSender;

#[async_trait]
impl NotificationSender for NoOpSender {
    async fn send(&self, _recipients: &[String], _subject: &str, _body: &str) -> Result<()> {
        // 不执行任何操作
        Ok(())
    }
}

/// 将失败描述拼接为报告正文，描述之间以空行分隔
pub fn compose_report_body(messages: &[String]) -> String {
    messages.join("\n\n")
}

/// 解析收件人
///
/// `receivers` 中的非空项优先（保持顺序并去重），为空时使用 `receiver`。
///
/// # 返回
/// * `Result<Vec<String>, NotificationError>` - 非空收件人列表，或 `NoRecipient`
pub fn resolve_recipients(config: &Config) -> std::result::Result<Vec<String>, NotificationError> {
    let mut recipients: Vec<String> = Vec::new();

    for receiver in &config.receivers {
        let receiver = receiver.trim();
        if !receiver.is_empty() && !recipients.iter().any(|r| r == receiver) {
            recipients.push(receiver.to_string());
        }
    }

    if recipients.is_empty() {
        if let Some(receiver) = config.receiver.as_deref().map(str::trim) {
            if !receiver.is_empty() {
                recipients.push(receiver.to_string());
            }
        }
    }

    if recipients.is_empty() {
        return Err(NotificationError::NoRecipient);
    }

    Ok(recipients)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_receivers_take_precedence() {
        let config = Config {
            receivers: vec![
                "ops@example.com".to_string(),
                "dev@example.com".to_string(),
                "ops@example.com".to_string(),
            ],
            receiver: Some("single@example.com".to_string()),
            ..Default::default()
        };

        assert_eq!(
            resolve_recipients(&config).unwrap(),
            vec!["ops@example.com".to_string(), "dev@example.com".to_string()]
        );
    }

    #[test]
    fn test_single_receiver_fallback() {
        let config = Config {
            receiver: Some(" single@example.com ".to_string()),
            ..Default::default()
        };

        assert_eq!(
            resolve_recipients(&config).unwrap(),
            vec!["single@example.com".to_string()]
        );
    }

    #[test]
    fn test_no_recipient() {
        let config = Config {
            receivers: vec!["  ".to_string()],
            receiver: Some(String::new()),
            ..Default::default()
        };

        assert!(matches!(
            resolve_recipients(&config),
            Err(NotificationError::NoRecipient)
        ));
    }

    #[test]
    fn test_compose_report_body() {
        let messages = vec![
            "Check instance a failed (error: x)".to_string(),
            "Check group g failed:\n\tCheck instance b failed (error: y)".to_string(),
        ];

        assert_eq!(
            compose_report_body(&messages),
            "Check instance a failed (error: x)\n\nCheck group g failed:\n\tCheck instance b failed (error: y)"
        );
    }

    #[tokio::test]
    async fn test_noop_sender() {
        let sender = NoOpSender;
        let result = sender
            .send(&["ops@example.com".to_string()], REPORT_SUBJECT, "body")
            .await;
        assert!(result.is_ok());
    }
}

//! AWS SES 邮件发送器模块
//!
//! 通过 SES v2 `SendEmail` 接口发送纯文本邮件，请求使用 AWS Signature V4 签名

use crate::config::AwsConfig;
use crate::error::NotificationError;
use crate::notification::sender::NotificationSender;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use reqwest::{Client, Url};
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use std::time::Duration;
use tracing::{debug, error, info};

type HmacSha256 = Hmac<Sha256>;

/// SendEmail 接口路径，相对于端点拼接
const SEND_EMAIL_PATH: &str = "v2/email/outbound-emails";

/// 签名服务名
const SES_SERVICE: &str = "ses";

const SIGNING_ALGORITHM: &str = "AWS4-HMAC-SHA256";

/// AWS Signature V4 签名器
#[derive(Clone)]
pub struct SigV4Signer {
    access_key: String,
    secret_key: String,
    region: String,
    service: String,
}

/// 签名后需要附加到请求上的头部
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedHeaders {
    /// x-amz-date
    pub amz_date: String,
    /// authorization
    pub authorization: String,
}

impl SigV4Signer {
    /// 创建签名器
    pub fn new(access_key: &str, secret_key: &str, region: &str, service: &str) -> Self {
        Self {
            access_key: access_key.to_string(),
            secret_key: secret_key.to_string(),
            region: region.to_string(),
            service: service.to_string(),
        }
    }

    /// 对 JSON POST 请求签名，签名头部为 content-type、host、x-amz-date
    pub fn sign_json_post(
        &self,
        host: &str,
        path: &str,
        payload: &[u8],
        now: DateTime<Utc>,
    ) -> Result<SignedHeaders> {
        let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
        let headers = [
            ("content-type", "application/json"),
            ("host", host),
            ("x-amz-date", amz_date.as_str()),
        ];
        let payload_hash = hex::encode(Sha256::digest(payload));

        let (signed_headers, signature) =
            self.signature("POST", path, "", &headers, &payload_hash, &amz_date)?;

        let authorization = format!(
            "{} Credential={}/{}, SignedHeaders={}, Signature={}",
            SIGNING_ALGORITHM,
            self.access_key,
            self.credential_scope(&amz_date[..8]),
            signed_headers,
            signature
        );

        Ok(SignedHeaders {
            amz_date,
            authorization,
        })
    }

    /// 计算签名
    ///
    /// `headers` 的名称必须为小写且已按名称排序。
    ///
    /// # 返回
    /// * `Result<(String, String)>` - (SignedHeaders 字段, 十六进制签名)
    pub fn signature(
        &self,
        method: &str,
        path: &str,
        query: &str,
        headers: &[(&str, &str)],
        payload_hash: &str,
        amz_date: &str,
    ) -> Result<(String, String)> {
        let canonical_headers: String = headers
            .iter()
            .map(|(name, value)| format!("{}:{}\n", name, value.trim()))
            .collect();
        let signed_headers = headers
            .iter()
            .map(|(name, _)| *name)
            .collect::<Vec<_>>()
            .join(";");

        let canonical_request = format!(
            "{}\n{}\n{}\n{}\n{}\n{}",
            method, path, query, canonical_headers, signed_headers, payload_hash
        );

        let date = &amz_date[..8];
        let string_to_sign = format!(
            "{}\n{}\n{}\n{}",
            SIGNING_ALGORITHM,
            amz_date,
            self.credential_scope(date),
            hex::encode(Sha256::digest(canonical_request.as_bytes()))
        );

        let signing_key = self.signing_key(date)?;
        let signature = hex::encode(hmac_sha256(&signing_key, string_to_sign.as_bytes())?);

        Ok((signed_headers, signature))
    }

    fn credential_scope(&self, date: &str) -> String {
        format!("{}/{}/{}/aws4_request", date, self.region, self.service)
    }

    fn signing_key(&self, date: &str) -> Result<Vec<u8>> {
        let k_date = hmac_sha256(
            format!("AWS4{}", self.secret_key).as_bytes(),
            date.as_bytes(),
        )?;
        let k_region = hmac_sha256(&k_date, self.region.as_bytes())?;
        let k_service = hmac_sha256(&k_region, self.service.as_bytes())?;
        hmac_sha256(&k_service, b"aws4_request")
    }
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Result<Vec<u8>> {
    let mut mac = <HmacSha256 as Mac>::new_from_slice(key)
        .map_err(|e| anyhow::anyhow!("HMAC密钥无效: {}", e))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

/// AWS SES 邮件发送器
pub struct SesSender {
    /// HTTP客户端
    client: Client,
    /// 请求签名器
    signer: SigV4Signer,
    /// SendEmail 完整地址
    endpoint: Url,
    /// 参与签名的 host 头
    host: String,
    /// 发件人
    sender: String,
}

impl SesSender {
    /// 创建新的 SES 发送器
    ///
    /// # 参数
    /// * `aws` - AWS 凭证、区域和发件人配置
    ///
    /// # 返回
    /// * `Result<Self, NotificationError>` - 发送器实例
    pub fn new(aws: &AwsConfig) -> std::result::Result<Self, NotificationError> {
        for (field, value) in [
            ("aws.clientId", &aws.client_id),
            ("aws.clientSecret", &aws.client_secret),
            ("aws.region", &aws.region),
            ("aws.sender", &aws.sender),
        ] {
            if value.trim().is_empty() {
                return Err(NotificationError::ConfigError(format!("{field} 不能为空")));
            }
        }

        let base = aws
            .endpoint
            .clone()
            .unwrap_or_else(|| format!("https://email.{}.amazonaws.com", aws.region));
        // 端点可以带路径前缀（例如经由网关转发），拼接时保留前缀
        let prefix = if base.ends_with('/') {
            base.clone()
        } else {
            format!("{base}/")
        };
        let endpoint = Url::parse(&prefix)
            .and_then(|url| url.join(SEND_EMAIL_PATH))
            .map_err(|e| NotificationError::ConfigError(format!("无效的SES端点 {base}: {e}")))?;

        let host = match (endpoint.host_str(), endpoint.port()) {
            (Some(host), Some(port)) => format!("{host}:{port}"),
            (Some(host), None) => host.to_string(),
            (None, _) => {
                return Err(NotificationError::ConfigError(format!(
                    "SES端点缺少主机名: {base}"
                )))
            }
        };

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(format!("{}/{}", crate::APP_NAME, crate::VERSION))
            .build()
            .map_err(|e| NotificationError::ConfigError(format!("创建HTTP客户端失败: {e}")))?;

        Ok(Self {
            client,
            signer: SigV4Signer::new(&aws.client_id, &aws.client_secret, &aws.region, SES_SERVICE),
            endpoint,
            host,
            sender: aws.sender.clone(),
        })
    }

    /// SendEmail 请求地址
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// 构建 SendEmail 请求体
    fn build_message_body(&self, recipients: &[String], subject: &str, body: &str) -> Value {
        json!({
            "FromEmailAddress": self.sender,
            "Destination": {
                "ToAddresses": recipients,
                "CcAddresses": []
            },
            "Content": {
                "Simple": {
                    "Subject": { "Data": subject, "Charset": "UTF-8" },
                    "Body": {
                        "Text": { "Data": body, "Charset": "UTF-8" }
                    }
                }
            }
        })
    }
}

#[async_trait]
impl NotificationSender for SesSender {
    async fn send(&self, recipients: &[String], subject: &str, body: &str) -> Result<()> {
        if recipients.is_empty() {
            return Err(NotificationError::NoRecipient.into());
        }

        let payload = serde_json::to_vec(&self.build_message_body(recipients, subject, body))
            .context("序列化SES请求失败")?;
        let signed = self
            .signer
            .sign_json_post(&self.host, self.endpoint.path(), &payload, Utc::now())
            .context("SES请求签名失败")?;

        debug!(endpoint = %self.endpoint, recipients = ?recipients, "发送SES邮件");

        let response = self
            .client
            .post(self.endpoint.clone())
            .header("content-type", "application/json")
            .header("x-amz-date", &signed.amz_date)
            .header("authorization", &signed.authorization)
            .body(payload)
            .send()
            .await
            .with_context(|| format!("调用SES接口失败: {}", self.endpoint))?;

        let status = response.status();
        if status.is_success() {
            let message_id = response
                .json::<Value>()
                .await
                .ok()
                .and_then(|v| v.get("MessageId").and_then(Value::as_str).map(str::to_string))
                .unwrap_or_default();
            info!(message_id = %message_id, recipients = ?recipients, "邮件发送成功");
            Ok(())
        } else {
            let text = response.text().await.unwrap_or_default();
            error!("SES邮件发送失败: {} - {}", status, text);
            Err(NotificationError::SendError(format!("SES返回 {}: {}", status, text)).into())
        }
    }
}

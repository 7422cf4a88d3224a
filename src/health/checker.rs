//! HTTP实例探测器实现
//!
//! 对单个实例发起一次 GET 请求。只有传输层错误（DNS、连接被拒、超时等）
//! 算作失败，响应状态码和响应体不做检查。

use crate::config::{Config, Instance};
use crate::error::Result;
use crate::health::result::CheckResult;
use async_trait::async_trait;
use reqwest::Client;
use std::error::Error as StdError;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// 未配置任何协议时使用的协议
pub const DEFAULT_SCHEME: &str = "http";

/// 实例探测器trait，定义探测接口
#[async_trait]
pub trait Prober: Send + Sync {
    /// 探测单个实例
    ///
    /// # 参数
    /// * `instance` - 实例配置
    /// * `config` - 全局配置（提供默认 uri / scheme）
    ///
    /// # 返回
    /// * `CheckResult` - 探测结果，传输错误已转换为失败结果
    async fn probe(&self, instance: &Instance, config: &Config) -> CheckResult;
}

/// 实例最终的请求目标
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveTarget {
    /// 实际使用的协议
    pub scheme: String,
    /// 完整URL
    pub url: String,
}

/// 计算实例的请求目标，实例自身的 path / scheme 优先于全局默认值
///
/// 地址中已经带有 `scheme://` 前缀时原样使用，不再拼接协议。
pub fn resolve_target(instance: &Instance, config: &Config) -> EffectiveTarget {
    let path = non_empty(instance.path.as_deref()).unwrap_or(config.uri.as_str());

    if let Some((scheme, _)) = instance.address.split_once("://") {
        return EffectiveTarget {
            scheme: scheme.to_string(),
            url: format!("{}{}", instance.address, path),
        };
    }

    let scheme = non_empty(instance.scheme.as_deref())
        .or_else(|| non_empty(Some(config.scheme.as_str())))
        .unwrap_or(DEFAULT_SCHEME)
        .to_ascii_lowercase();

    let url = format!("{}://{}{}", scheme, instance.address, path);
    EffectiveTarget { scheme, url }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// HTTP探测器实现
///
/// 内部的 `reqwest::Client` 在一次检测中被所有并发探测共享。
#[derive(Debug, Clone)]
pub struct HttpProber {
    /// HTTP客户端
    client: Client,
    /// 请求超时时间
    timeout: Duration,
}

impl HttpProber {
    /// 创建新的HTTP探测器
    ///
    /// # 参数
    /// * `timeout` - 客户端级别的请求超时时间
    ///
    /// # 返回
    /// * `Result<Self>` - 探测器实例
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(format!("{}/{}", crate::APP_NAME, crate::VERSION))
            .build()?;

        Ok(Self { client, timeout })
    }

    /// 按配置中的超时时间创建探测器
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config.timeout_duration())
    }

    /// 请求超时时间
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[async_trait]
impl Prober for HttpProber {
    async fn probe(&self, instance: &Instance, config: &Config) -> CheckResult {
        let target = resolve_target(instance, config);
        let start_time = Instant::now();

        match self.client.get(&target.url).send().await {
            Ok(response) => {
                debug!(
                    instance = %instance.address,
                    url = %target.url,
                    status = response.status().as_u16(),
                    elapsed_ms = start_time.elapsed().as_millis() as u64,
                    "实例检测通过"
                );
                CheckResult::ok()
            }
            Err(e) => {
                let description = describe_error(&e);
                warn!(
                    instance = %instance.address,
                    url = %target.url,
                    elapsed_ms = start_time.elapsed().as_millis() as u64,
                    "实例检测失败: {}",
                    description
                );
                CheckResult::failed(format!(
                    "Check instance {} failed (error: {})",
                    instance.address, description
                ))
            }
        }
    }
}

/// 将传输错误格式化为可读描述：错误类别加上最底层的原因
fn describe_error(error: &reqwest::Error) -> String {
    let category = if error.is_timeout() {
        "request timed out"
    } else if error.is_connect() {
        "connection failed"
    } else if error.is_builder() {
        "invalid request"
    } else if error.is_redirect() {
        "redirect loop"
    } else {
        "request failed"
    };

    let mut root = error.source();
    while let Some(next) = root.and_then(|e| e.source()) {
        root = Some(next);
    }

    match root {
        Some(cause) => format!("{}: {}", category, cause),
        None => format!("{}: {}", category, error),
    }
}

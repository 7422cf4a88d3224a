//! 配置数据结构定义
//!
//! 定义实例、实例组和全局配置结构体以及验证逻辑。
//! 所有结构在程序启动时构造一次，之后只读。

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::time::Duration;

/// 主配置结构，包含全局默认值、实例和实例组
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// 顶层实例列表
    #[serde(default, alias = "Instances")]
    pub instances: Vec<Instance>,
    /// 实例组列表
    #[serde(default, alias = "Groups")]
    pub groups: Vec<InstanceGroup>,
    /// 默认检测路径
    #[serde(default, alias = "URI")]
    pub uri: String,
    /// 默认协议
    #[serde(default = "default_scheme", alias = "Scheme")]
    pub scheme: String,
    /// 请求超时时间（秒）
    #[serde(default = "default_timeout", alias = "Timeout")]
    pub timeout: u64,
    /// 收件人列表
    #[serde(
        default,
        alias = "Receivers",
        deserialize_with = "deserialize_receivers",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub receivers: Vec<String>,
    /// 单个收件人（receivers 为空时使用）
    #[serde(default, alias = "Receiver", skip_serializing_if = "Option::is_none")]
    pub receiver: Option<String>,
    /// AWS SES 配置
    #[serde(default, alias = "AWS", skip_serializing_if = "Option::is_none")]
    pub aws: Option<AwsConfig>,
}

/// 单个服务器实例
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Instance {
    /// 实例地址 host[:port]
    #[serde(alias = "addr", alias = "Addr", alias = "Address")]
    pub address: String,
    /// 覆盖全局 uri 的检测路径
    #[serde(
        default,
        alias = "uri",
        alias = "URI",
        alias = "Path",
        skip_serializing_if = "Option::is_none"
    )]
    pub path: Option<String>,
    /// 覆盖全局 scheme 的协议
    #[serde(default, alias = "Scheme", skip_serializing_if = "Option::is_none")]
    pub scheme: Option<String>,
}

/// 实例组
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InstanceGroup {
    /// 组名
    #[serde(alias = "Name")]
    pub name: String,
    /// 组失败判定策略
    #[serde(rename = "type", alias = "Type", default)]
    pub policy: GroupPolicy,
    /// 组成员
    #[serde(default, alias = "Instances")]
    pub instances: Vec<Instance>,
}

/// 实例组失败判定策略
///
/// 配置中的 `type` 字段不区分大小写；缺省或无法识别的值一律视为 `All`。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum GroupPolicy {
    /// 所有成员都失败时组才失败
    #[default]
    All,
    /// 任一成员失败组即失败
    Any,
}

impl GroupPolicy {
    /// 从配置字符串解析策略
    pub fn from_name(name: &str) -> Self {
        if name.trim().eq_ignore_ascii_case("any") {
            GroupPolicy::Any
        } else {
            GroupPolicy::All
        }
    }

    /// 策略名称
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupPolicy::All => "all",
            GroupPolicy::Any => "any",
        }
    }
}

impl fmt::Display for GroupPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for GroupPolicy {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for GroupPolicy {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let name = Option::<String>::deserialize(deserializer)?;
        Ok(name.as_deref().map(GroupPolicy::from_name).unwrap_or_default())
    }
}

/// AWS SES 客户端配置
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AwsConfig {
    /// Access key ID
    #[serde(alias = "clientID", alias = "ClientID")]
    pub client_id: String,
    /// Secret access key
    #[serde(alias = "ClientSecret")]
    pub client_secret: String,
    /// 区域，例如 us-east-1
    #[serde(alias = "Region")]
    pub region: String,
    /// 发件人地址
    #[serde(alias = "Sender")]
    pub sender: String,
    /// 自定义 SES 端点
    #[serde(default, alias = "Endpoint", skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

impl fmt::Debug for AwsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AwsConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"***")
            .field("region", &self.region)
            .field("sender", &self.sender)
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

impl Config {
    /// 单次探测的超时时间
    pub fn timeout_duration(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    /// 一次检测会产生的结果数量：每个顶层实例一个，每个组一个
    pub fn expected_results(&self) -> usize {
        self.instances.len() + self.groups.len()
    }

    /// 所有组内成员数量之和
    pub fn group_member_count(&self) -> usize {
        self.groups.iter().map(|g| g.instances.len()).sum()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            instances: Vec::new(),
            groups: Vec::new(),
            uri: String::new(),
            scheme: default_scheme(),
            timeout: default_timeout(),
            receivers: Vec::new(),
            receiver: None,
            aws: None,
        }
    }
}

impl Instance {
    /// 只指定地址的实例
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            path: None,
            scheme: None,
        }
    }

    /// 设置检测路径
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// 设置协议
    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = Some(scheme.into());
        self
    }
}

// 默认值函数
fn default_scheme() -> String {
    "http".to_string()
}
fn default_timeout() -> u64 {
    10
}

/// receivers 允许出现 null 和空字符串，解析时直接丢弃
fn deserialize_receivers<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Vec<Option<String>>>::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .flatten()
        .filter(|r| !r.trim().is_empty())
        .collect())
}

const VALID_SCHEMES: [&str; 2] = ["http", "https"];

/// 配置验证函数
///
/// # 参数
/// * `config` - 要验证的配置
///
/// # 返回
/// * `Result<(), String>` - 验证结果，错误时返回错误信息
pub fn validate_config(config: &Config) -> Result<(), String> {
    if config.timeout == 0 {
        return Err("请求超时时间不能为0".to_string());
    }

    if !is_valid_scheme(&config.scheme) {
        return Err(format!(
            "无效的默认协议: {}，支持的协议: {:?}",
            config.scheme, VALID_SCHEMES
        ));
    }

    for instance in &config.instances {
        validate_instance(instance, None)?;
    }

    for group in &config.groups {
        if group.name.trim().is_empty() {
            return Err("实例组名称不能为空".to_string());
        }

        for instance in &group.instances {
            validate_instance(instance, Some(&group.name))?;
        }
    }

    if let Some(ref aws) = config.aws {
        if aws.region.trim().is_empty() {
            return Err("aws.region 不能为空".to_string());
        }
    }

    Ok(())
}

/// 空协议表示使用默认值，其余协议不区分大小写
fn is_valid_scheme(scheme: &str) -> bool {
    scheme.is_empty()
        || VALID_SCHEMES
            .iter()
            .any(|valid| valid.eq_ignore_ascii_case(scheme))
}

fn validate_instance(instance: &Instance, group: Option<&str>) -> Result<(), String> {
    let owner = group
        .map(|name| format!("实例组 {name} 中"))
        .unwrap_or_default();

    if instance.address.trim().is_empty() {
        return Err(format!("{owner}存在地址为空的实例"));
    }

    if let Some(ref scheme) = instance.scheme {
        if !is_valid_scheme(scheme) {
            return Err(format!(
                "{owner}实例 {} 的协议 {} 无效",
                instance.address, scheme
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_config() -> Config {
        Config {
            instances: vec![Instance::new("10.0.0.1:8080")],
            groups: vec![InstanceGroup {
                name: "db-pool".to_string(),
                policy: GroupPolicy::All,
                instances: vec![
                    Instance::new("10.0.1.1:5432"),
                    Instance::new("10.0.1.2:5432").with_path("/status"),
                ],
            }],
            uri: "/health".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_default_values() {
        let config: Config = serde_json::from_str("{}").unwrap();

        assert!(config.instances.is_empty());
        assert!(config.groups.is_empty());
        assert_eq!(config.uri, "");
        assert_eq!(config.scheme, "http");
        assert_eq!(config.timeout, 10);
        assert!(config.receivers.is_empty());
        assert!(config.aws.is_none());
    }

    #[test]
    fn test_group_policy_parsing() {
        assert_eq!(GroupPolicy::from_name("any"), GroupPolicy::Any);
        assert_eq!(GroupPolicy::from_name("ANY"), GroupPolicy::Any);
        assert_eq!(GroupPolicy::from_name("all"), GroupPolicy::All);
        assert_eq!(GroupPolicy::from_name("majority"), GroupPolicy::All);
        assert_eq!(GroupPolicy::from_name(""), GroupPolicy::All);
    }

    #[test]
    fn test_group_type_missing_or_unknown_defaults_to_all() {
        let json = r#"{
            "groups": [
                {"name": "a", "instances": []},
                {"name": "b", "type": "quorum", "instances": []},
                {"name": "c", "type": null, "instances": []},
                {"name": "d", "type": "Any", "instances": []}
            ]
        }"#;

        let config: Config = serde_json::from_str(json).unwrap();
        let policies: Vec<_> = config.groups.iter().map(|g| g.policy).collect();
        assert_eq!(
            policies,
            vec![
                GroupPolicy::All,
                GroupPolicy::All,
                GroupPolicy::All,
                GroupPolicy::Any
            ]
        );
    }

    #[test]
    fn test_historical_field_aliases() {
        let json = r#"{
            "instances": [{"addr": "10.0.0.1:80", "uri": "/ping"}],
            "aws": {"clientID": "AKID", "clientSecret": "s", "region": "us-east-1", "sender": "a@b.c"}
        }"#;

        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.instances[0].address, "10.0.0.1:80");
        assert_eq!(config.instances[0].path.as_deref(), Some("/ping"));
        assert_eq!(config.aws.unwrap().client_id, "AKID");
    }

    #[test]
    fn test_legacy_pascal_case_document() {
        let json = r#"{
            "Instances": [{"Addr": "http://10.0.0.1:80", "URI": "/ping"}],
            "Groups": [
                {"Name": "db-pool", "Type": "ANY", "Instances": [{"Addr": "10.0.1.1:5432"}]}
            ],
            "URI": "/health",
            "Timeout": 5,
            "Receivers": null,
            "Receiver": "ops@example.com",
            "AWS": {
                "ClientID": "AKID",
                "ClientSecret": "s",
                "Region": "us-east-1",
                "Sender": "checker@example.com"
            }
        }"#;

        let config: Config = serde_json::from_str(json).unwrap();

        assert_eq!(config.instances.len(), 1);
        assert_eq!(config.instances[0].address, "http://10.0.0.1:80");
        assert_eq!(config.instances[0].path.as_deref(), Some("/ping"));
        assert_eq!(config.groups[0].name, "db-pool");
        assert_eq!(config.groups[0].policy, GroupPolicy::Any);
        assert_eq!(config.groups[0].instances[0].address, "10.0.1.1:5432");
        assert_eq!(config.uri, "/health");
        assert_eq!(config.timeout, 5);
        assert!(config.receivers.is_empty());
        assert_eq!(config.receiver.as_deref(), Some("ops@example.com"));

        let aws = config.aws.as_ref().unwrap();
        assert_eq!(aws.client_id, "AKID");
        assert_eq!(aws.client_secret, "s");
        assert_eq!(aws.region, "us-east-1");
        assert_eq!(aws.sender, "checker@example.com");

        assert!(validate_config(&config).is_ok());
        assert_eq!(config.expected_results(), 2);
    }

    #[test]
    fn test_receivers_skip_null_and_empty() {
        let json = r#"{"receivers": ["ops@example.com", null, "", "  "], "receiver": "x@example.com"}"#;

        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.receivers, vec!["ops@example.com".to_string()]);
        assert_eq!(config.receiver.as_deref(), Some("x@example.com"));
    }

    #[test]
    fn test_expected_results_counts_groups_once() {
        let config = create_test_config();
        assert_eq!(config.expected_results(), 2);
        assert_eq!(config.group_member_count(), 2);
    }

    #[test]
    fn test_config_validation() {
        let config = create_test_config();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_empty_config_is_valid() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_config_validation_zero_timeout() {
        let mut config = create_test_config();
        config.timeout = 0;

        let result = validate_config(&config);
        assert!(result.unwrap_err().contains("超时"));
    }

    #[test]
    fn test_config_validation_empty_address() {
        let mut config = create_test_config();
        config.groups[0].instances.push(Instance::new(" "));

        let result = validate_config(&config);
        assert!(result.unwrap_err().contains("db-pool"));
    }

    #[test]
    fn test_config_validation_invalid_scheme() {
        let mut config = create_test_config();
        config.instances[0].scheme = Some("ftp".to_string());

        let result = validate_config(&config);
        assert!(result.unwrap_err().contains("ftp"));
    }

    #[test]
    fn test_config_validation_scheme_case_and_empty() {
        let mut config = create_test_config();
        config.scheme = String::new();
        config.instances[0].scheme = Some("HTTPS".to_string());
        assert!(validate_config(&config).is_ok());

        config.scheme = "Http".to_string();
        assert!(validate_config(&config).is_ok());

        config.scheme = "gopher".to_string();
        assert!(validate_config(&config).unwrap_err().contains("gopher"));
    }

    #[test]
    fn test_config_validation_empty_group_name() {
        let mut config = create_test_config();
        config.groups[0].name = String::new();

        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_aws_debug_hides_secret() {
        let aws = AwsConfig {
            client_id: "AKID".to_string(),
            client_secret: "super-secret".to_string(),
            region: "us-east-1".to_string(),
            sender: "checker@example.com".to_string(),
            endpoint: None,
        };

        let debug = format!("{aws:?}");
        assert!(debug.contains("AKID"));
        assert!(!debug.contains("super-secret"));
    }

    #[test]
    fn test_config_serialization_roundtrip() {
        let config = create_test_config();

        let serialized = serde_json::to_string(&config).expect("序列化失败");
        assert!(serialized.contains("\"type\":\"all\""));

        let deserialized: Config = serde_json::from_str(&serialized).expect("反序列化失败");
        assert_eq!(config, deserialized);
    }
}

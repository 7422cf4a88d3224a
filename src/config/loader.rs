//! 配置加载器实现
//!
//! 提供 JSON / YAML / TOML 配置文件解析、格式识别、环境变量替换和错误处理功能

use crate::config::types::{validate_config, Config};
use crate::error::{ConfigError, Result};
use async_trait::async_trait;
use regex::Regex;
use std::path::Path;

/// 配置文件格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// JSON
    Json,
    /// YAML
    Yaml,
    /// TOML
    Toml,
}

impl ConfigFormat {
    /// 根据文件扩展名识别格式
    ///
    /// # 返回
    /// * `Option<Self>` - 无扩展名或扩展名未知时返回 None
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "json" => Some(ConfigFormat::Json),
            "yaml" | "yml" => Some(ConfigFormat::Yaml),
            "toml" => Some(ConfigFormat::Toml),
            _ => None,
        }
    }

    /// 根据内容猜测格式：以 `{` 开头视为 JSON，否则按 YAML 处理
    pub fn sniff(content: &str) -> Self {
        if content.trim_start().starts_with('{') {
            ConfigFormat::Json
        } else {
            ConfigFormat::Yaml
        }
    }
}

impl std::fmt::Display for ConfigFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigFormat::Json => write!(f, "JSON"),
            ConfigFormat::Yaml => write!(f, "YAML"),
            ConfigFormat::Toml => write!(f, "TOML"),
        }
    }
}

/// 配置加载器trait，定义配置加载接口
#[async_trait]
pub trait ConfigLoader: Send + Sync {
    /// 从文件加载配置
    ///
    /// # 参数
    /// * `path` - 配置文件路径
    ///
    /// # 返回
    /// * `Result<Config>` - 加载的配置或错误
    async fn load_from_file<P: AsRef<Path> + Send>(&self, path: P) -> Result<Config>;

    /// 从字符串加载配置
    ///
    /// # 参数
    /// * `content` - 配置文件内容
    /// * `format` - 内容格式
    ///
    /// # 返回
    /// * `Result<Config>` - 加载的配置或错误
    fn load_from_str(&self, content: &str, format: ConfigFormat) -> Result<Config>;

    /// 验证配置
    fn validate(&self, config: &Config) -> Result<()>;
}

/// 文件配置加载器实现
#[derive(Debug, Clone)]
pub struct FileConfigLoader {
    /// 是否启用环境变量替换
    enable_env_substitution: bool,
}

impl FileConfigLoader {
    /// 创建新的配置加载器
    ///
    /// # 参数
    /// * `enable_env_substitution` - 是否启用 `${VAR}` 环境变量替换
    pub fn new(enable_env_substitution: bool) -> Self {
        Self {
            enable_env_substitution,
        }
    }

    /// 替换字符串中的环境变量
    fn substitute_env_vars(&self, content: &str) -> std::result::Result<String, ConfigError> {
        if !self.enable_env_substitution {
            return Ok(content.to_string());
        }

        // 匹配 ${VAR_NAME} 格式的环境变量
        let env_var_regex = Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}")
            .map_err(|e| ConfigError::ParseError(format!("正则表达式错误: {}", e)))?;

        let mut result = content.to_string();

        for captures in env_var_regex.captures_iter(content) {
            let full_match = &captures[0];
            let var_name = &captures[1];

            match std::env::var(var_name) {
                Ok(value) => {
                    result = result.replace(full_match, &value);
                }
                Err(_) => {
                    return Err(ConfigError::EnvVarError {
                        var: var_name.to_string(),
                    });
                }
            }
        }

        Ok(result)
    }

    /// 按格式解析内容
    fn parse(&self, content: &str, format: ConfigFormat) -> std::result::Result<Config, ConfigError> {
        let processed_content = self.substitute_env_vars(content)?;

        let config = match format {
            ConfigFormat::Json => serde_json::from_str(&processed_content)
                .map_err(|e| ConfigError::ParseError(format!("JSON解析失败: {}", e)))?,
            ConfigFormat::Yaml => serde_yaml::from_str(&processed_content)
                .map_err(|e| ConfigError::ParseError(format!("YAML解析失败: {}", e)))?,
            ConfigFormat::Toml => toml::from_str(&processed_content)
                .map_err(|e| ConfigError::ParseError(format!("TOML解析失败: {}", e)))?,
        };

        Ok(config)
    }
}

impl Default for FileConfigLoader {
    fn default() -> Self {
        Self::new(true)
    }
}

#[async_trait]
impl ConfigLoader for FileConfigLoader {
    async fn load_from_file<P: AsRef<Path> + Send>(&self, path: P) -> Result<Config> {
        let path = path.as_ref();
        let display_path = path.to_string_lossy().to_string();

        if !path.exists() {
            return Err(ConfigError::FileNotFound { path: display_path }.into());
        }

        let content =
            tokio::fs::read_to_string(path)
                .await
                .map_err(|e| ConfigError::ReadError {
                    path: display_path.clone(),
                    reason: e.to_string(),
                })?;

        let format = match ConfigFormat::from_path(path) {
            Some(format) => format,
            None if path.extension().is_none() => ConfigFormat::sniff(&content),
            None => return Err(ConfigError::UnsupportedFormat { path: display_path }.into()),
        };

        let config = self.parse(&content, format).map_err(|e| match e {
            ConfigError::ParseError(reason) => {
                ConfigError::ParseError(format!("{display_path}: {reason}"))
            }
            other => other,
        })?;

        self.validate(&config)?;

        log::info!("成功加载{}配置文件: {}", format, path.display());
        log::debug!("配置内容: {:?}", config);

        Ok(config)
    }

    fn load_from_str(&self, content: &str, format: ConfigFormat) -> Result<Config> {
        let config = self.parse(content, format)?;

        self.validate(&config)?;

        log::debug!("成功解析{}配置字符串", format);

        Ok(config)
    }

    fn validate(&self, config: &Config) -> Result<()> {
        validate_config(config).map_err(|e| ConfigError::ValidationError(e).into())
    }
}

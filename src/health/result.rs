//! 检测结果数据结构
//!
//! 每个实例、每个实例组各产生一个 `CheckResult`，仅在失败时携带可读的失败描述。

use serde::{Deserialize, Serialize};

/// 单次检测结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    /// 是否通过
    pub status: bool,
    /// 失败描述（仅失败时存在）
    pub message: Option<String>,
}

impl CheckResult {
    /// 创建成功结果
    pub fn ok() -> Self {
        Self {
            status: true,
            message: None,
        }
    }

    /// 创建失败结果
    ///
    /// # 参数
    /// * `message` - 能说明是哪个实例/组失败以及失败原因的描述
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            status: false,
            message: Some(message.into()),
        }
    }

    /// 判断是否失败
    pub fn is_failed(&self) -> bool {
        !self.status
    }

    /// 失败描述的引用；成功结果返回 None
    pub fn failure_message(&self) -> Option<&str> {
        if self.status {
            None
        } else {
            self.message.as_deref()
        }
    }

    /// 取出失败描述
    pub fn into_failure_message(self) -> Option<String> {
        if self.status {
            None
        } else {
            self.message
        }
    }
}

//! 作用域定义
//!
//! 作用域是一个不透明的标记身份（例如用户声明的作用域注解），
//! 决定哪些图可以持有某个有状态绑定

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// 作用域标记
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Scope(String);

impl Scope {
    /// 创建作用域标记
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// 获取作用域名称
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.0)
    }
}

impl From<&str> for Scope {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// 作用域集合（有序，保证确定性输出）
pub type ScopeSet = BTreeSet<Scope>;

//! 元数据定义
//!
//! 提供类型键、声明标识和声明位置信息

use serde::{Deserialize, Serialize};
use std::fmt;

/// 类型键
///
/// 绑定槽位的身份标识：声明类型加可选限定符。两个类型键相等即视为同一槽位。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TypeKey {
    /// 完全限定的类型名称（含泛型参数）
    #[serde(rename = "type")]
    pub type_name: String,
    /// 限定符（例如 `Named("api")`）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qualifier: Option<String>,
}

impl TypeKey {
    /// 创建无限定符的类型键
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            qualifier: None,
        }
    }

    /// 创建带限定符的类型键
    pub fn qualified(type_name: impl Into<String>, qualifier: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            qualifier: Some(qualifier.into()),
        }
    }

    /// 设置限定符
    pub fn with_qualifier(mut self, qualifier: impl Into<String>) -> Self {
        self.qualifier = Some(qualifier.into());
        self
    }

    /// `Set<T>` 集合键，沿用元素的限定符
    pub fn set_of(element: &TypeKey) -> Self {
        Self {
            type_name: format!("Set<{}>", element.type_name),
            qualifier: element.qualifier.clone(),
        }
    }

    /// `Map<K, V>` 集合键，沿用值类型的限定符
    pub fn map_of(key_type: &str, value: &TypeKey) -> Self {
        Self {
            type_name: format!("Map<{}, {}>", key_type, value.type_name),
            qualifier: value.qualifier.clone(),
        }
    }

    /// 获取简短的类型名称（不包含包路径）
    pub fn short_name(&self) -> &str {
        let base = self
            .type_name
            .split('<')
            .next()
            .unwrap_or(&self.type_name);
        base.rsplit('.').next().unwrap_or(base)
    }

    /// 渲染为 `@Qualifier Type` 形式
    pub fn render(&self) -> String {
        match &self.qualifier {
            Some(qualifier) => format!("@{} {}", qualifier, self.type_name),
            None => self.type_name.clone(),
        }
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.qualifier {
            Some(qualifier) => write!(f, "@{} {}", qualifier, self.type_name),
            None => f.write_str(&self.type_name),
        }
    }
}

/// 判断类型名称是否为通配类型
pub fn is_wildcard_type(type_name: &str) -> bool {
    let trimmed = type_name.trim();
    trimmed == "*"
        || trimmed == "?"
        || trimmed.starts_with("? ")
        || trimmed.starts_with("out ")
        || trimmed.starts_with("in ")
}

/// 声明标识
///
/// 完全限定的声明名称，按字典序比较，是所有确定性排序的最终依据。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeclarationId(String);

impl DeclarationId {
    /// 创建新的声明标识
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// 获取声明名称
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 转换为文件名安全的形式
    pub fn file_stem(&self) -> String {
        self.0
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '-' })
            .collect()
    }
}

impl fmt::Display for DeclarationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DeclarationId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// 源码位置
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SourceLocation {
    /// 文件路径
    pub file: String,
    /// 行号（从 1 开始）
    pub line: u32,
    /// 列号（从 1 开始）
    #[serde(default)]
    pub column: u32,
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

/// 声明来源
///
/// 绑定与错误都携带声明来源，供集成层输出面向用户的诊断。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Origin {
    /// 声明标识
    pub declaration: DeclarationId,
    /// 源码位置
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<SourceLocation>,
    /// 是否为解析核心自行合成的声明
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub synthetic: bool,
}

impl Origin {
    /// 创建新的声明来源
    pub fn new(declaration: impl Into<String>) -> Self {
        Self {
            declaration: DeclarationId::new(declaration),
            location: None,
            synthetic: false,
        }
    }

    /// 合成声明来源
    pub fn synthetic(declaration: impl Into<String>) -> Self {
        Self {
            declaration: DeclarationId::new(declaration),
            location: None,
            synthetic: true,
        }
    }

    /// 设置源码位置
    pub fn at(mut self, file: impl Into<String>, line: u32, column: u32) -> Self {
        self.location = Some(SourceLocation {
            file: file.into(),
            line,
            column,
        });
        self
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some(location) => write!(f, "{} ({})", self.declaration, location),
            None => write!(f, "{}", self.declaration),
        }
    }
}

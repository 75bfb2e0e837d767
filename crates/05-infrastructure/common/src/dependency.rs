//! 依赖请求定义
//!
//! 依赖边只引用类型键，并携带访问方式（直接值、Provider、Lazy）与默认值信息

use crate::TypeKey;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 依赖的访问包装
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum WrappedType {
    /// 直接值
    #[default]
    Canonical,
    /// `Provider<T>`
    Provider,
    /// `Lazy<T>`
    Lazy,
    /// `Provider<Lazy<T>>`
    ProviderOfLazy,
}

impl WrappedType {
    /// 是否为延迟访问
    pub fn is_deferrable(self) -> bool {
        !matches!(self, Self::Canonical)
    }

    /// 包装类型名称
    pub fn wrapper_name(self) -> Option<&'static str> {
        match self {
            Self::Canonical => None,
            Self::Provider => Some("Provider"),
            Self::Lazy => Some("Lazy"),
            Self::ProviderOfLazy => Some("Provider<Lazy>"),
        }
    }
}

/// 依赖请求
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Dependency {
    /// 被请求的类型键
    pub key: TypeKey,
    /// 访问包装
    #[serde(default)]
    pub wrapper: WrappedType,
    /// 参数是否带有默认值
    #[serde(default)]
    pub has_default: bool,
}

impl Dependency {
    /// 创建直接依赖
    pub fn new(key: TypeKey) -> Self {
        Self {
            key,
            wrapper: WrappedType::Canonical,
            has_default: false,
        }
    }

    /// 通过 `Provider<T>` 请求
    pub fn provider(key: TypeKey) -> Self {
        Self::new(key).wrapped(WrappedType::Provider)
    }

    /// 通过 `Lazy<T>` 请求
    pub fn lazy(key: TypeKey) -> Self {
        Self::new(key).wrapped(WrappedType::Lazy)
    }

    /// 设置访问包装
    pub fn wrapped(mut self, wrapper: WrappedType) -> Self {
        self.wrapper = wrapper;
        self
    }

    /// 标记参数带有默认值
    pub fn with_default(mut self) -> Self {
        self.has_default = true;
        self
    }

    /// 是否为延迟访问
    pub fn is_deferrable(&self) -> bool {
        self.wrapper.is_deferrable()
    }
}

impl From<TypeKey> for Dependency {
    fn from(key: TypeKey) -> Self {
        Self::new(key)
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.wrapper {
            WrappedType::Canonical => write!(f, "{}", self.key)?,
            WrappedType::Provider => write!(f, "Provider<{}>", self.key)?,
            WrappedType::Lazy => write!(f, "Lazy<{}>", self.key)?,
            WrappedType::ProviderOfLazy => write!(f, "Provider<Lazy<{}>>", self.key)?,
        }
        if self.has_default {
            f.write_str(" = ...")?;
        }
        Ok(())
    }
}

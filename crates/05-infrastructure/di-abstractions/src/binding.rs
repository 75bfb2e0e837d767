//! 绑定定义
//!
//! 绑定是封闭的带标签变体，所有遍历与校验都对其做穷尽匹配。
//! 依赖边只引用类型键，不直接引用绑定。

use crate::multibinding::{CollectionKind, MultibindingSource};
use infrastructure_common::{DeclarationId, Dependency, Origin, Scope, TypeKey};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 辅助注入参数（调用时提供，不由图解析）
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssistedParameter {
    /// 参数名称
    pub name: String,
    /// 参数类型
    pub key: TypeKey,
}

/// 绑定
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Binding {
    /// 由可注入构造函数创建
    Injected {
        /// 绑定的类型键
        key: TypeKey,
        /// 声明来源
        origin: Origin,
        /// 作用域，为空时每次请求都新建
        #[serde(default)]
        scope: Option<Scope>,
        /// 构造函数参数与成员注入依赖
        #[serde(default)]
        dependencies: Vec<Dependency>,
    },
    /// 由工厂函数创建
    Provided {
        /// 绑定的类型键
        key: TypeKey,
        /// 工厂函数的声明来源
        origin: Origin,
        /// 作用域
        #[serde(default)]
        scope: Option<Scope>,
        /// 工厂函数参数
        #[serde(default)]
        dependencies: Vec<Dependency>,
    },
    /// 从一个类型键重定向到另一个类型键
    Alias {
        /// 别名类型键
        key: TypeKey,
        /// 声明来源
        origin: Origin,
        /// 重定向的目标
        target: Dependency,
    },
    /// Set / Map 聚合
    Multibinding {
        /// 集合类型键
        key: TypeKey,
        /// `@Multibinds` 声明来源，没有声明时为合成来源
        origin: Origin,
        /// 集合形状
        collection: CollectionKind,
        /// 是否允许没有元素
        allow_empty: bool,
        /// 按声明标识排序的元素
        sources: Vec<MultibindingSource>,
        /// 每个元素绑定一条依赖
        dependencies: Vec<Dependency>,
    },
    /// 图构造参数提供的实例
    BoundInstance {
        /// 实例类型键
        key: TypeKey,
        /// 构造参数的声明来源
        origin: Origin,
    },
    /// 被包含图公开的访问器，或祖先图已解析的绑定
    GraphAccessor {
        /// 访问的类型键
        key: TypeKey,
        /// 声明来源
        origin: Origin,
        /// 提供该类型键的图
        graph: DeclarationId,
        /// 被包含图的访问器名称，祖先图绑定为空
        #[serde(default)]
        accessor: Option<String>,
        /// 是否来自祖先图
        #[serde(default)]
        from_parent: bool,
    },
    /// 对已有实例执行成员注入
    MembersInjector {
        /// `MembersInjector<T>` 类型键
        key: TypeKey,
        /// 声明来源
        origin: Origin,
        /// 被注入的类
        target: TypeKey,
        /// 成员依赖
        #[serde(default)]
        dependencies: Vec<Dependency>,
    },
    /// 辅助注入工厂
    Assisted {
        /// 工厂类型键
        key: TypeKey,
        /// 工厂的声明来源
        origin: Origin,
        /// 工厂创建的类
        target: TypeKey,
        /// 调用时提供的参数
        #[serde(default)]
        assisted: Vec<AssistedParameter>,
        /// 由图提供的参数
        #[serde(default)]
        dependencies: Vec<Dependency>,
    },
    /// 带默认值且无法解析的依赖
    Absent {
        /// 缺失的类型键
        key: TypeKey,
        /// 合成来源
        origin: Origin,
    },
}

/// 绑定类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BindingKind {
    /// 构造函数注入
    Injected,
    /// 工厂函数
    Provided,
    /// 别名
    Alias,
    /// 多重绑定聚合
    Multibinding,
    /// 构造参数实例
    BoundInstance,
    /// 图访问器
    GraphAccessor,
    /// 成员注入器
    MembersInjector,
    /// 辅助注入工厂
    Assisted,
    /// 默认值
    Absent,
}

impl BindingKind {
    /// 类别名称
    pub fn name(self) -> &'static str {
        match self {
            Self::Injected => "Injected",
            Self::Provided => "Provided",
            Self::Alias => "Alias",
            Self::Multibinding => "Multibinding",
            Self::BoundInstance => "BoundInstance",
            Self::GraphAccessor => "GraphAccessor",
            Self::MembersInjector => "MembersInjector",
            Self::Assisted => "Assisted",
            Self::Absent => "Absent",
        }
    }
}

impl fmt::Display for BindingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Binding {
    /// 创建构造函数注入绑定
    pub fn injected(key: TypeKey, origin: Origin, dependencies: Vec<Dependency>) -> Self {
        Self::Injected {
            key,
            origin,
            scope: None,
            dependencies,
        }
    }

    /// 创建工厂函数绑定
    pub fn provided(key: TypeKey, origin: Origin, dependencies: Vec<Dependency>) -> Self {
        Self::Provided {
            key,
            origin,
            scope: None,
            dependencies,
        }
    }

    /// 创建别名绑定
    pub fn alias(key: TypeKey, origin: Origin, target: TypeKey) -> Self {
        Self::Alias {
            key,
            origin,
            target: Dependency::new(target),
        }
    }

    /// 创建实例绑定
    pub fn bound_instance(key: TypeKey, origin: Origin) -> Self {
        Self::BoundInstance { key, origin }
    }

    /// 设置作用域（仅对构造函数注入与工厂函数绑定有效）
    pub fn scoped(mut self, value: Scope) -> Self {
        match &mut self {
            Self::Injected { scope, .. } | Self::Provided { scope, .. } => *scope = Some(value),
            _ => {}
        }
        self
    }

    /// 类型键
    pub fn key(&self) -> &TypeKey {
        match self {
            Self::Injected { key, .. }
            | Self::Provided { key, .. }
            | Self::Alias { key, .. }
            | Self::Multibinding { key, .. }
            | Self::BoundInstance { key, .. }
            | Self::GraphAccessor { key, .. }
            | Self::MembersInjector { key, .. }
            | Self::Assisted { key, .. }
            | Self::Absent { key, .. } => key,
        }
    }

    /// 声明来源
    pub fn origin(&self) -> &Origin {
        match self {
            Self::Injected { origin, .. }
            | Self::Provided { origin, .. }
            | Self::Alias { origin, .. }
            | Self::Multibinding { origin, .. }
            | Self::BoundInstance { origin, .. }
            | Self::GraphAccessor { origin, .. }
            | Self::MembersInjector { origin, .. }
            | Self::Assisted { origin, .. }
            | Self::Absent { origin, .. } => origin,
        }
    }

    /// 作用域
    pub fn scope(&self) -> Option<&Scope> {
        match self {
            Self::Injected { scope, .. } | Self::Provided { scope, .. } => scope.as_ref(),
            Self::Alias { .. }
            | Self::Multibinding { .. }
            | Self::BoundInstance { .. }
            | Self::GraphAccessor { .. }
            | Self::MembersInjector { .. }
            | Self::Assisted { .. }
            | Self::Absent { .. } => None,
        }
    }

    /// 是否为有作用域的绑定
    pub fn is_scoped(&self) -> bool {
        self.scope().is_some()
    }

    /// 图内需要解析的依赖
    pub fn dependencies(&self) -> &[Dependency] {
        match self {
            Self::Injected { dependencies, .. }
            | Self::Provided { dependencies, .. }
            | Self::Multibinding { dependencies, .. }
            | Self::MembersInjector { dependencies, .. }
            | Self::Assisted { dependencies, .. } => dependencies,
            Self::Alias { target, .. } => std::slice::from_ref(target),
            Self::BoundInstance { .. } | Self::GraphAccessor { .. } | Self::Absent { .. } => &[],
        }
    }

    /// 绑定类别
    pub fn kind(&self) -> BindingKind {
        match self {
            Self::Injected { .. } => BindingKind::Injected,
            Self::Provided { .. } => BindingKind::Provided,
            Self::Alias { .. } => BindingKind::Alias,
            Self::Multibinding { .. } => BindingKind::Multibinding,
            Self::BoundInstance { .. } => BindingKind::BoundInstance,
            Self::GraphAccessor { .. } => BindingKind::GraphAccessor,
            Self::MembersInjector { .. } => BindingKind::MembersInjector,
            Self::Assisted { .. } => BindingKind::Assisted,
            Self::Absent { .. } => BindingKind::Absent,
        }
    }

    /// 别名目标
    pub fn alias_target(&self) -> Option<&TypeKey> {
        match self {
            Self::Alias { target, .. } => Some(&target.key),
            _ => None,
        }
    }

    /// 是否为别名
    pub fn is_alias(&self) -> bool {
        matches!(self, Self::Alias { .. })
    }

    /// 供生成代码使用的名称提示
    pub fn name_hint(&self) -> String {
        match self {
            Self::Multibinding { collection, .. } => match collection {
                CollectionKind::Set { element } => {
                    format!("setOf{}", element.short_name())
                }
                CollectionKind::Map { value, .. } => format!("mapOf{}", value.short_name()),
            },
            Self::MembersInjector { target, .. } => {
                format!("{}MembersInjector", lower_first(target.short_name()))
            }
            Self::Assisted { target, .. } => format!("{}Factory", lower_first(target.short_name())),
            _ => lower_first(self.key().short_name()),
        }
    }
}

fn lower_first(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

impl fmt::Display for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind(), self.key())?;
        if let Some(scope) = self.scope() {
            write!(f, " {}", scope)?;
        }
        if let Some(target) = self.alias_target() {
            write!(f, " -> {}", target)?;
        }
        Ok(())
    }
}

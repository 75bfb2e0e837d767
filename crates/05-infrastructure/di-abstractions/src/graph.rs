//! 图声明
//!
//! 描述一个依赖图（或其托管的扩展图）的公共表面与图内声明

use crate::binding::Binding;
use crate::declaration::members_injector_key;
use crate::multibinding::{MultibindingElement, MultibindsDeclaration};
use infrastructure_common::{DeclarationId, Dependency, Origin, Scope, TypeKey};
use serde::{Deserialize, Serialize};

/// 入口点
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum EntryPoint {
    /// 访问器属性或函数
    Accessor {
        /// 访问器名称
        name: String,
        /// 访问器返回的依赖
        dependency: Dependency,
    },
    /// 成员注入函数
    Injector {
        /// 函数名称
        name: String,
        /// 被注入的类
        target: TypeKey,
    },
}

impl EntryPoint {
    /// 创建访问器入口
    pub fn accessor(name: impl Into<String>, dependency: impl Into<Dependency>) -> Self {
        Self::Accessor {
            name: name.into(),
            dependency: dependency.into(),
        }
    }

    /// 创建成员注入入口
    pub fn injector(name: impl Into<String>, target: TypeKey) -> Self {
        Self::Injector {
            name: name.into(),
            target,
        }
    }

    /// 入口名称
    pub fn name(&self) -> &str {
        match self {
            Self::Accessor { name, .. } | Self::Injector { name, .. } => name,
        }
    }

    /// 入口请求的依赖
    pub fn dependency(&self) -> Dependency {
        match self {
            Self::Accessor { dependency, .. } => dependency.clone(),
            Self::Injector { target, .. } => Dependency::new(members_injector_key(target)),
        }
    }
}

/// 被包含图公开的访问器
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExposedAccessor {
    /// 访问器名称
    pub name: String,
    /// 访问器类型
    pub key: TypeKey,
}

/// 被包含的图
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncludedGraph {
    /// 声明来源（包含关系所在位置）
    pub origin: Origin,
    /// 被包含图的类型键
    pub key: TypeKey,
    /// 被包含图公开的访问器
    #[serde(default)]
    pub accessors: Vec<ExposedAccessor>,
}

/// 图构造参数提供的实例
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundInstanceDeclaration {
    /// 声明来源
    pub origin: Origin,
    /// 类型键
    pub key: TypeKey,
}

/// 图声明
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphDeclaration {
    /// 声明来源
    pub origin: Origin,
    /// 图自身的类型键
    pub key: TypeKey,
    /// 图可满足的作用域
    #[serde(default)]
    pub scopes: Vec<Scope>,
    /// 聚合贡献时使用的作用域，为空时使用 `scopes`
    #[serde(default)]
    pub aggregation_scopes: Vec<Scope>,
    /// 排除的贡献声明
    #[serde(default)]
    pub excludes: Vec<DeclarationId>,
    /// 入口点
    #[serde(default)]
    pub entry_points: Vec<EntryPoint>,
    /// 图构造参数
    #[serde(default)]
    pub bound_instances: Vec<BoundInstanceDeclaration>,
    /// 被包含的图
    #[serde(default)]
    pub includes: Vec<IncludedGraph>,
    /// 图内声明的绑定
    #[serde(default)]
    pub bindings: Vec<Binding>,
    /// `@Multibinds` 声明
    #[serde(default)]
    pub multibinds: Vec<MultibindsDeclaration>,
    /// 图内声明的多重绑定元素
    #[serde(default)]
    pub elements: Vec<MultibindingElement>,
    /// 托管的扩展图
    #[serde(default)]
    pub extensions: Vec<GraphDeclaration>,
}

impl GraphDeclaration {
    /// 创建空的图声明，声明来源即图类型
    pub fn new(key: TypeKey) -> Self {
        Self {
            origin: Origin::new(key.type_name.clone()),
            key,
            scopes: Vec::new(),
            aggregation_scopes: Vec::new(),
            excludes: Vec::new(),
            entry_points: Vec::new(),
            bound_instances: Vec::new(),
            includes: Vec::new(),
            bindings: Vec::new(),
            multibinds: Vec::new(),
            elements: Vec::new(),
            extensions: Vec::new(),
        }
    }

    /// 图标识
    pub fn id(&self) -> &DeclarationId {
        &self.origin.declaration
    }

    /// 添加作用域
    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scopes.push(scope);
        self
    }

    /// 添加入口点
    pub fn with_entry_point(mut self, entry_point: EntryPoint) -> Self {
        self.entry_points.push(entry_point);
        self
    }

    /// 添加绑定
    pub fn with_binding(mut self, binding: Binding) -> Self {
        self.bindings.push(binding);
        self
    }

    /// 添加排除的贡献声明
    pub fn with_exclude(mut self, declaration: impl Into<String>) -> Self {
        self.excludes.push(DeclarationId::new(declaration));
        self
    }

    /// 添加扩展图
    pub fn with_extension(mut self, extension: GraphDeclaration) -> Self {
        self.extensions.push(extension);
        self
    }

    /// 实际用于聚合贡献的作用域
    pub fn effective_aggregation_scopes(&self) -> &[Scope] {
        if self.aggregation_scopes.is_empty() {
            &self.scopes
        } else {
            &self.aggregation_scopes
        }
    }

    /// 是否排除了某个贡献声明
    pub fn excludes(&self, declaration: &DeclarationId) -> bool {
        self.excludes.contains(declaration)
    }
}

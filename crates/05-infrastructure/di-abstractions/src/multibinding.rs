//! 多重绑定声明

use infrastructure_common::{is_wildcard_type, Dependency, Origin, Scope, TypeKey};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 集合形态
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CollectionKind {
    /// `Set<T>`
    Set {
        /// 元素类型
        element: TypeKey,
    },
    /// `Map<K, V>`
    Map {
        /// Map 键类型名称
        key_type: String,
        /// 值类型
        value: TypeKey,
    },
}

impl CollectionKind {
    /// 集合的类型键
    pub fn key(&self) -> TypeKey {
        match self {
            Self::Set { element } => TypeKey::set_of(element),
            Self::Map { key_type, value } => TypeKey::map_of(key_type, value),
        }
    }

    /// 元素（或 Map 值）类型
    pub fn element(&self) -> &TypeKey {
        match self {
            Self::Set { element } => element,
            Self::Map { value, .. } => value,
        }
    }

    /// 是否为 Map
    pub fn is_map(&self) -> bool {
        matches!(self, Self::Map { .. })
    }

    /// 报告中使用的集合类型名称
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Set { .. } => "SET",
            Self::Map { .. } => "MAP",
        }
    }

    /// 检查集合形态，返回问题描述
    pub fn shape_problem(&self) -> Option<String> {
        match self {
            Self::Set { element } if is_wildcard_type(&element.type_name) => {
                Some(format!("Set 的元素类型不能是通配类型: {}", element.type_name))
            }
            Self::Map { key_type, .. } if is_wildcard_type(key_type) => {
                Some(format!("Map 的键类型不能是通配类型: {}", key_type))
            }
            Self::Map { value, .. } if is_wildcard_type(&value.type_name) => {
                Some(format!("Map 的值类型不能是通配类型: {}", value.type_name))
            }
            _ => None,
        }
    }
}

/// Map 键
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MapKey {
    /// 键类型
    #[serde(rename = "type")]
    pub type_name: String,
    /// 键值的规范化文本
    pub value: String,
}

impl MapKey {
    /// 创建 Map 键
    pub fn new(type_name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            value: value.into(),
        }
    }
}

impl fmt::Display for MapKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

/// 元素贡献方式
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ElementKind {
    /// 贡献单个元素
    IntoSet,
    /// 贡献一组元素
    ElementsIntoSet,
    /// 以指定键贡献一个 Map 条目
    IntoMap {
        /// 条目的 Map 键
        map_key: MapKey,
    },
}

/// 元素的提供方式
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ElementSource {
    /// 由工厂函数提供
    Provided {
        /// 工厂函数参数
        #[serde(default)]
        dependencies: Vec<Dependency>,
        /// 元素的作用域
        #[serde(default)]
        scope: Option<Scope>,
    },
    /// 重定向到另一个类型键
    Binds {
        /// 重定向的目标
        target: TypeKey,
    },
}

/// 单个多重绑定元素声明
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MultibindingElement {
    /// 声明来源
    pub origin: Origin,
    /// 目标集合
    pub collection: CollectionKind,
    /// 贡献方式
    pub kind: ElementKind,
    /// 提供方式
    pub source: ElementSource,
}

impl MultibindingElement {
    /// 以 `@IntoSet` 方式声明工厂函数元素
    pub fn into_set(origin: Origin, element: TypeKey, dependencies: Vec<Dependency>) -> Self {
        Self {
            origin,
            collection: CollectionKind::Set { element },
            kind: ElementKind::IntoSet,
            source: ElementSource::Provided {
                dependencies,
                scope: None,
            },
        }
    }

    /// 以 `@IntoMap` 方式声明工厂函数元素
    pub fn into_map(
        origin: Origin,
        map_key: MapKey,
        value: TypeKey,
        dependencies: Vec<Dependency>,
    ) -> Self {
        Self {
            origin,
            collection: CollectionKind::Map {
                key_type: map_key.type_name.clone(),
                value,
            },
            kind: ElementKind::IntoMap { map_key },
            source: ElementSource::Provided {
                dependencies,
                scope: None,
            },
        }
    }

    /// 改为重定向到已有类型键
    pub fn binds(mut self, target: TypeKey) -> Self {
        self.source = ElementSource::Binds { target };
        self
    }

    /// Map 键
    pub fn map_key(&self) -> Option<&MapKey> {
        match &self.kind {
            ElementKind::IntoMap { map_key } => Some(map_key),
            ElementKind::IntoSet | ElementKind::ElementsIntoSet => None,
        }
    }

    /// 元素绑定在图中使用的类型键
    ///
    /// 限定符编码了集合与声明来源，保证每个元素占用独立槽位
    pub fn element_key(&self) -> TypeKey {
        let collection = self.collection.key();
        let type_name = match self.kind {
            ElementKind::ElementsIntoSet => TypeKey::set_of(self.collection.element()).type_name,
            ElementKind::IntoSet | ElementKind::IntoMap { .. } => {
                self.collection.element().type_name.clone()
            }
        };
        let mut qualifier = format!(
            "MultibindingElement({}#{}",
            collection.render(),
            self.origin.declaration
        );
        if let Some(map_key) = self.map_key() {
            qualifier.push('#');
            qualifier.push_str(&map_key.value);
        }
        qualifier.push(')');
        TypeKey::qualified(type_name, qualifier)
    }
}

/// `@Multibinds` 声明
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MultibindsDeclaration {
    /// 声明来源
    pub origin: Origin,
    /// 集合
    pub collection: CollectionKind,
    /// 是否允许为空
    #[serde(default)]
    pub allow_empty: bool,
}

/// 聚合绑定中的单个来源
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MultibindingSource {
    /// 声明来源
    pub origin: Origin,
    /// 元素绑定的类型键
    pub element_key: TypeKey,
    /// Map 键
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map_key: Option<MapKey>,
}

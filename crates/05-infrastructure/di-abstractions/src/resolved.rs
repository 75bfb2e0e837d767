//! 已解析的绑定图
//!
//! 校验成功后不可变，交给代码生成器消费

use crate::binding::Binding;
use crate::graph::EntryPoint;
use infrastructure_common::{DeclarationId, Scope, TypeKey, WrappedType};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// 依赖边
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GraphEdge {
    /// 请求方
    pub from: TypeKey,
    /// 被请求的类型键
    pub to: TypeKey,
    /// 访问包装
    pub wrapper: WrappedType,
    /// 参数是否带默认值
    pub has_default: bool,
}

impl GraphEdge {
    /// 是否为延迟访问边
    pub fn is_deferred(&self) -> bool {
        self.wrapper.is_deferrable()
    }
}

/// 延迟访问边（生成代码需以延迟形式实现）
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DeferredEdge {
    /// 请求方
    pub from: TypeKey,
    /// 被延迟访问的类型键
    pub to: TypeKey,
}

/// 允许的循环
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermittedCycle {
    /// 循环成员（按解析顺序）
    pub members: Vec<TypeKey>,
    /// 打破循环的延迟访问边
    pub deferred_edges: Vec<DeferredEdge>,
}

/// 属性类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PropertyKind {
    /// 需要存储字段
    Field,
    /// 在使用处内联创建
    Inline,
}

/// 属性计划
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PropertyPlan {
    /// 每个绑定的属性类别
    pub properties: BTreeMap<TypeKey, PropertyKind>,
    /// 每个绑定被引用的次数（别名引用计入其终点）
    pub ref_counts: BTreeMap<TypeKey, usize>,
}

impl PropertyPlan {
    /// 需要字段的绑定
    pub fn fields(&self) -> impl Iterator<Item = &TypeKey> {
        self.properties
            .iter()
            .filter(|(_, kind)| **kind == PropertyKind::Field)
            .map(|(key, _)| key)
    }

    /// 查询属性类别
    pub fn kind_of(&self, key: &TypeKey) -> Option<PropertyKind> {
        self.properties.get(key).copied()
    }
}

/// 绑定图
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingGraph {
    /// 图标识
    pub id: DeclarationId,
    /// 图类型键
    pub key: TypeKey,
    /// 图可满足的作用域
    pub scopes: Vec<Scope>,
    /// 聚合作用域
    pub aggregation_scopes: Vec<Scope>,
    /// 入口点
    pub entry_points: Vec<EntryPoint>,
    /// 类型键到绑定的映射
    pub bindings: BTreeMap<TypeKey, Binding>,
    /// 依赖边（有序）
    pub edges: Vec<GraphEdge>,
    /// 经过别名解析的类型键及其别名链（含终点）
    pub alias_chains: BTreeMap<TypeKey, Vec<TypeKey>>,
    /// 允许的循环
    pub permitted_cycles: Vec<PermittedCycle>,
    /// 有作用域绑定的初始化顺序
    pub scoped_order: Vec<TypeKey>,
    /// 属性计划
    pub properties: PropertyPlan,
    /// 入口点不可达的已声明绑定
    pub unused: Vec<TypeKey>,
    /// 解析顺序（广度优先）
    pub resolution_order: Vec<TypeKey>,
    /// 托管的扩展图
    pub extensions: Vec<DeclarationId>,
    /// 要求祖先图保留的类型键（作用域属于祖先图但祖先图尚未解析）
    pub ancestor_requests: BTreeMap<DeclarationId, BTreeSet<TypeKey>>,
}

impl BindingGraph {
    /// 查找绑定
    pub fn binding(&self, key: &TypeKey) -> Option<&Binding> {
        self.bindings.get(key)
    }

    /// 是否包含类型键
    pub fn contains(&self, key: &TypeKey) -> bool {
        self.bindings.contains_key(key)
    }

    /// 沿别名链找到终点
    pub fn terminal_of<'a>(&'a self, key: &'a TypeKey) -> &'a TypeKey {
        self.alias_chains
            .get(key)
            .and_then(|chain| chain.last())
            .unwrap_or(key)
    }

    /// 某个绑定发出的边
    pub fn edges_from<'a>(&'a self, key: &'a TypeKey) -> impl Iterator<Item = &'a GraphEdge> + 'a {
        self.edges.iter().filter(move |edge| &edge.from == key)
    }

    /// 所有延迟访问边
    pub fn deferred_edges(&self) -> BTreeSet<DeferredEdge> {
        self.permitted_cycles
            .iter()
            .flat_map(|cycle| cycle.deferred_edges.iter().cloned())
            .collect()
    }

    /// 入口点请求的类型键
    pub fn root_keys(&self) -> Vec<TypeKey> {
        self.entry_points
            .iter()
            .map(|entry| entry.dependency().key)
            .collect()
    }
}

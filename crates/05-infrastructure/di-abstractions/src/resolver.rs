//! 图解析器抽象接口
//!
//! 提供把图声明展开为已校验绑定图的能力

use crate::binding::Binding;
use crate::contribution::ContributionProvider;
use crate::graph::GraphDeclaration;
use crate::multibinding::MultibindingSource;
use crate::resolved::BindingGraph;
use infrastructure_common::{DeclarationId, DiagnosticReport, Scope, TypeKey};
use std::collections::{BTreeMap, BTreeSet};

/// 图解析器 trait
pub trait GraphResolver {
    /// 解析一个图声明
    ///
    /// `ancestors` 按由近及远排列，仅在解析扩展图时非空
    fn resolve(
        &mut self,
        declaration: &GraphDeclaration,
        contributions: &dyn ContributionProvider,
        ancestors: &[AncestorGraph],
    ) -> Result<BindingGraph, DiagnosticReport>;
}

/// 祖先图上下文
///
/// 扩展图在自身显式绑定之后查询祖先图已解析的绑定。
/// 作用域属于祖先图的绑定始终由祖先图持有。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AncestorGraph {
    /// 图标识
    pub id: DeclarationId,
    /// 图类型键
    pub key: TypeKey,
    /// 图可满足的作用域
    pub scopes: Vec<Scope>,
    /// 可供扩展图使用的类型键
    pub keys: BTreeSet<TypeKey>,
    /// 已聚合的多重绑定元素，扩展图在此基础上追加自己的元素
    pub multibindings: BTreeMap<TypeKey, Vec<MultibindingSource>>,
}

impl AncestorGraph {
    /// 从已解析的图创建上下文
    pub fn from_graph(graph: &BindingGraph) -> Self {
        let keys = graph
            .bindings
            .values()
            .filter(|binding| !matches!(binding, Binding::Absent { .. }))
            .map(|binding| binding.key().clone())
            .collect();
        let multibindings = graph
            .bindings
            .values()
            .filter_map(|binding| match binding {
                Binding::Multibinding { key, sources, .. } => Some((key.clone(), sources.clone())),
                _ => None,
            })
            .collect();
        Self {
            id: graph.id.clone(),
            key: graph.key.clone(),
            scopes: graph.scopes.clone(),
            keys,
            multibindings,
        }
    }

    /// 是否提供某个类型键
    pub fn provides(&self, key: &TypeKey) -> bool {
        self.keys.contains(key)
    }

    /// 是否可满足某个作用域
    pub fn contains_scope(&self, scope: &Scope) -> bool {
        self.scopes.contains(scope)
    }
}

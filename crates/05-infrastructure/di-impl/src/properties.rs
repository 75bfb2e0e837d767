//! 绑定属性收集
//!
//! 决定代码生成器需要为哪些绑定生成存储字段

use di_abstractions::{Binding, GraphEdge, PropertyKind, PropertyPlan};
use infrastructure_common::TypeKey;
use std::collections::BTreeMap;

/// 属性收集器
pub struct PropertyCollector<'g> {
    bindings: &'g BTreeMap<TypeKey, Binding>,
    alias_chains: &'g BTreeMap<TypeKey, Vec<TypeKey>>,
}

impl<'g> PropertyCollector<'g> {
    /// 创建收集器
    pub fn new(
        bindings: &'g BTreeMap<TypeKey, Binding>,
        alias_chains: &'g BTreeMap<TypeKey, Vec<TypeKey>>,
    ) -> Self {
        Self {
            bindings,
            alias_chains,
        }
    }

    /// 别名引用计入其终点
    fn terminal<'k>(&'k self, key: &'k TypeKey) -> &'k TypeKey {
        if let Some(terminal) = self.alias_chains.get(key).and_then(|chain| chain.last()) {
            return terminal;
        }
        let mut current = key;
        for _ in 0..self.bindings.len() {
            match self.bindings.get(current).and_then(Binding::alias_target) {
                Some(target) => current = target,
                None => break,
            }
        }
        current
    }

    /// 收集属性计划
    pub fn collect(&self, edges: &[GraphEdge], roots: &[TypeKey]) -> PropertyPlan {
        let mut ref_counts: BTreeMap<TypeKey, usize> = BTreeMap::new();
        for edge in edges {
            if self
                .bindings
                .get(&edge.from)
                .is_some_and(Binding::is_alias)
            {
                continue;
            }
            *ref_counts.entry(self.terminal(&edge.to).clone()).or_default() += 1;
        }
        for root in roots {
            *ref_counts.entry(self.terminal(root).clone()).or_default() += 1;
        }

        let properties = self
            .bindings
            .iter()
            .map(|(key, binding)| {
                let count = ref_counts.get(key).copied().unwrap_or_default();
                (key.clone(), Self::kind_for(binding, count))
            })
            .collect();

        PropertyPlan {
            properties,
            ref_counts,
        }
    }

    fn kind_for(binding: &Binding, ref_count: usize) -> PropertyKind {
        match binding {
            Binding::Multibinding { .. } | Binding::Alias { .. } | Binding::Absent { .. } => {
                PropertyKind::Inline
            }
            Binding::GraphAccessor { .. } | Binding::Assisted { .. } => PropertyKind::Field,
            Binding::Injected { .. }
            | Binding::Provided { .. }
            | Binding::BoundInstance { .. }
            | Binding::MembersInjector { .. } => {
                if binding.is_scoped() || ref_count >= 2 {
                    PropertyKind::Field
                } else {
                    PropertyKind::Inline
                }
            }
        }
    }
}

//! 绑定图统计

use di_abstractions::{BindingGraph, BindingKind};
use infrastructure_common::TypeKey;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 图统计信息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphStatistics {
    pub total_bindings: usize,
    pub scoped_bindings: usize,
    pub unscoped_bindings: usize,
    pub bindings_by_kind: BTreeMap<String, usize>,
    pub alias_count: usize,
    pub multibinding_count: usize,
    pub average_dependencies: f64,
    pub max_dependencies: usize,
    /// 没有被任何绑定依赖的类型键
    pub roots: Vec<String>,
    /// 没有依赖的类型键
    pub leaves: Vec<String>,
}

/// 扇入或扇出计数
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DegreeEntry {
    pub key: String,
    pub count: usize,
}

/// 图分析器
pub struct GraphAnalyzer<'g> {
    graph: &'g BindingGraph,
}

impl<'g> GraphAnalyzer<'g> {
    pub fn new(graph: &'g BindingGraph) -> Self {
        Self { graph }
    }

    /// 计算统计信息
    pub fn statistics(&self) -> GraphStatistics {
        let bindings = &self.graph.bindings;
        let total = bindings.len();
        let scoped = bindings.values().filter(|b| b.is_scoped()).count();

        let mut by_kind: BTreeMap<String, usize> = BTreeMap::new();
        for binding in bindings.values() {
            *by_kind.entry(binding.kind().name().to_string()).or_default() += 1;
        }
        let count_of = |kind: BindingKind| by_kind.get(kind.name()).copied().unwrap_or_default();
        let alias_count = count_of(BindingKind::Alias);
        let multibinding_count = count_of(BindingKind::Multibinding);

        let fan_out = self.fan_out();
        let total_dependencies: usize = fan_out.values().sum();
        let average_dependencies = if total == 0 {
            0.0
        } else {
            total_dependencies as f64 / total as f64
        };
        let max_dependencies = fan_out.values().copied().max().unwrap_or_default();

        let fan_in = self.fan_in();
        let roots = bindings
            .keys()
            .filter(|key| !fan_in.contains_key(*key))
            .map(TypeKey::render)
            .collect();
        let leaves = bindings
            .keys()
            .filter(|key| fan_out.get(*key).copied().unwrap_or_default() == 0)
            .map(TypeKey::render)
            .collect();

        GraphStatistics {
            total_bindings: total,
            scoped_bindings: scoped,
            unscoped_bindings: total - scoped,
            bindings_by_kind: by_kind,
            alias_count,
            multibinding_count,
            average_dependencies,
            max_dependencies,
            roots,
            leaves,
        }
    }

    /// 被依赖次数最多的前 `limit` 个绑定
    pub fn top_fan_in(&self, limit: usize) -> Vec<DegreeEntry> {
        top(self.fan_in(), limit)
    }

    /// 依赖数最多的前 `limit` 个绑定
    pub fn top_fan_out(&self, limit: usize) -> Vec<DegreeEntry> {
        top(self.fan_out(), limit)
    }

    fn fan_in(&self) -> BTreeMap<&'g TypeKey, usize> {
        let mut counts = BTreeMap::new();
        for edge in &self.graph.edges {
            if self.graph.bindings.contains_key(&edge.to) {
                *counts.entry(&edge.to).or_default() += 1;
            }
        }
        counts
    }

    fn fan_out(&self) -> BTreeMap<&'g TypeKey, usize> {
        self.graph
            .bindings
            .iter()
            .map(|(key, binding)| (key, binding.dependencies().len()))
            .collect()
    }
}

fn top(counts: BTreeMap<&TypeKey, usize>, limit: usize) -> Vec<DegreeEntry> {
    let mut entries: Vec<(&TypeKey, usize)> =
        counts.into_iter().filter(|(_, count)| *count > 0).collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    entries
        .into_iter()
        .take(limit)
        .map(|(key, count)| DegreeEntry {
            key: key.render(),
            count,
        })
        .collect()
}

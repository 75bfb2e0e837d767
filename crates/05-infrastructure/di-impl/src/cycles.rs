//! 循环依赖分析
//!
//! 基于 Tarjan 强连通分量。一个强连通分量在移除其中的延迟访问边后
//! 若无环则是允许的循环，否则报告致命循环。

use di_abstractions::{Binding, DeferredEdge, GraphEdge, PermittedCycle};
use infrastructure_common::{GraphError, TypeKey};
use petgraph::algo::{is_cyclic_directed, tarjan_scc};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use tracing::debug;

/// 循环分析结果
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CycleAnalysis {
    /// 允许的循环
    pub permitted: Vec<PermittedCycle>,
    /// 致命循环错误
    pub errors: Vec<GraphError>,
}

impl CycleAnalysis {
    /// 所有打破循环的延迟访问边
    pub fn deferred_edges(&self) -> BTreeSet<DeferredEdge> {
        self.permitted
            .iter()
            .flat_map(|cycle| cycle.deferred_edges.iter().cloned())
            .collect()
    }
}

/// 循环分析器
///
/// 节点按解析顺序编号，报告路径从最先解析到的成员开始
pub struct CycleAnalyzer<'g> {
    bindings: &'g BTreeMap<TypeKey, Binding>,
    graph: DiGraph<TypeKey, bool>,
    rank: HashMap<NodeIndex, usize>,
}

impl<'g> CycleAnalyzer<'g> {
    /// 创建分析器
    pub fn new(
        bindings: &'g BTreeMap<TypeKey, Binding>,
        edges: &[GraphEdge],
        order: &[TypeKey],
    ) -> Self {
        let mut graph = DiGraph::new();
        let mut nodes: HashMap<&TypeKey, NodeIndex> = HashMap::new();
        let mut rank = HashMap::new();

        for (position, key) in order.iter().enumerate() {
            if bindings.contains_key(key) && !nodes.contains_key(key) {
                let node = graph.add_node(key.clone());
                nodes.insert(key, node);
                rank.insert(node, position);
            }
        }
        for key in bindings.keys() {
            if !nodes.contains_key(key) {
                let node = graph.add_node(key.clone());
                rank.insert(node, order.len() + node.index());
                nodes.insert(key, node);
            }
        }
        for edge in edges {
            if let (Some(&from), Some(&to)) = (nodes.get(&edge.from), nodes.get(&edge.to)) {
                graph.add_edge(from, to, edge.is_deferred());
            }
        }

        Self {
            bindings,
            graph,
            rank,
        }
    }

    /// 执行分析
    pub fn analyze(&self) -> CycleAnalysis {
        let mut analysis = CycleAnalysis::default();

        for component in tarjan_scc(&self.graph) {
            let members: HashSet<NodeIndex> = component.iter().copied().collect();
            if component.len() == 1 && !self.has_self_loop(component[0]) {
                continue;
            }

            if self.eager_subgraph_is_cyclic(&members) {
                analysis.errors.extend(self.fatal_cycles(&members));
            } else {
                analysis.permitted.push(self.permitted_cycle(&component, &members));
            }
        }

        analysis
            .permitted
            .sort_by_key(|cycle| cycle.members.first().cloned());
        debug!(
            "循环分析完成: 允许 {} 个，致命 {} 个",
            analysis.permitted.len(),
            analysis.errors.len()
        );
        analysis
    }

    fn rank_of(&self, node: NodeIndex) -> usize {
        self.rank.get(&node).copied().unwrap_or(usize::MAX)
    }

    fn has_self_loop(&self, node: NodeIndex) -> bool {
        self.graph.edges_connecting(node, node).next().is_some()
    }

    fn eager_edges<'a>(
        &'a self,
        node: NodeIndex,
        members: &'a HashSet<NodeIndex>,
    ) -> impl Iterator<Item = NodeIndex> + 'a {
        self.graph
            .edges(node)
            .filter(move |edge| !*edge.weight() && members.contains(&edge.target()))
            .map(|edge| edge.target())
    }

    fn eager_subgraph_is_cyclic(&self, members: &HashSet<NodeIndex>) -> bool {
        let mut eager: DiGraph<NodeIndex, ()> = DiGraph::new();
        let mut local = HashMap::new();
        for &node in members {
            local.insert(node, eager.add_node(node));
        }
        for &node in members {
            for target in self.eager_edges(node, members) {
                eager.add_edge(local[&node], local[&target], ());
            }
        }
        is_cyclic_directed(&eager)
    }

    fn permitted_cycle(&self, component: &[NodeIndex], members: &HashSet<NodeIndex>) -> PermittedCycle {
        let mut ordered = component.to_vec();
        ordered.sort_by_key(|node| self.rank_of(*node));

        let deferred_edges: BTreeSet<DeferredEdge> = component
            .iter()
            .flat_map(|&node| {
                self.graph
                    .edges(node)
                    .filter(|edge| *edge.weight() && members.contains(&edge.target()))
                    .map(|edge| DeferredEdge {
                        from: self.graph[edge.source()].clone(),
                        to: self.graph[edge.target()].clone(),
                    })
            })
            .collect();

        PermittedCycle {
            members: ordered.iter().map(|node| self.graph[*node].clone()).collect(),
            deferred_edges: deferred_edges.into_iter().collect(),
        }
    }

    /// 在只含直接边的子图中找出每个环，路径从最先解析到的成员开始并回到自身
    fn fatal_cycles(&self, members: &HashSet<NodeIndex>) -> Vec<GraphError> {
        let mut eager: DiGraph<NodeIndex, ()> = DiGraph::new();
        let mut local = HashMap::new();
        let mut sorted: Vec<NodeIndex> = members.iter().copied().collect();
        sorted.sort_by_key(|node| self.rank_of(*node));
        for &node in &sorted {
            local.insert(node, eager.add_node(node));
        }
        for &node in &sorted {
            for target in self.eager_edges(node, members) {
                eager.add_edge(local[&node], local[&target], ());
            }
        }

        let mut loops: Vec<Vec<NodeIndex>> = tarjan_scc(&eager)
            .into_iter()
            .filter(|scc| scc.len() > 1 || eager.edges_connecting(scc[0], scc[0]).next().is_some())
            .map(|scc| scc.into_iter().map(|local_node| eager[local_node]).collect())
            .collect();
        for scc in &mut loops {
            scc.sort_by_key(|node| self.rank_of(*node));
        }
        loops.sort_by_key(|scc| scc.first().map(|node| self.rank_of(*node)));

        loops
            .into_iter()
            .filter_map(|scc| {
                let start = *scc.first()?;
                let scope: HashSet<NodeIndex> = scc.into_iter().collect();
                let path = self.shortest_loop(start, &scope)?;
                let cycle: Vec<TypeKey> = path.iter().map(|node| self.graph[*node].clone()).collect();
                let origin = self
                    .bindings
                    .get(&self.graph[start])
                    .map(|binding| binding.origin().clone());
                Some(GraphError::FatalCycle { cycle, origin })
            })
            .collect()
    }

    /// 沿直接边从 `start` 出发回到自身的最短路径
    fn shortest_loop(&self, start: NodeIndex, scope: &HashSet<NodeIndex>) -> Option<Vec<NodeIndex>> {
        let mut previous: HashMap<NodeIndex, NodeIndex> = HashMap::new();
        let mut queue = VecDeque::new();
        let mut visited = HashSet::new();

        let mut first_hops: Vec<NodeIndex> = self.eager_edges(start, scope).collect();
        first_hops.sort_by_key(|node| self.rank_of(*node));
        first_hops.dedup();
        if first_hops.contains(&start) {
            return Some(vec![start, start]);
        }
        for hop in first_hops {
            if visited.insert(hop) {
                queue.push_back(hop);
            }
        }

        while let Some(node) = queue.pop_front() {
            let mut next: Vec<NodeIndex> = self.eager_edges(node, scope).collect();
            next.sort_by_key(|n| self.rank_of(*n));
            for target in next {
                if target == start {
                    let mut path = vec![node];
                    let mut current = node;
                    while let Some(&before) = previous.get(&current) {
                        path.push(before);
                        current = before;
                    }
                    path.push(start);
                    path.reverse();
                    path.push(start);
                    return Some(path);
                }
                if visited.insert(target) {
                    previous.insert(target, node);
                    queue.push_back(target);
                }
            }
        }
        None
    }
}

//! 绑定图构建
//!
//! 从入口点出发广度优先展开，每个类型键依次查询：
//! 显式绑定 → 多重绑定聚合 → 祖先图 → 隐式绑定 → 默认值。
//! 作用域属于祖先图的绑定改为访问祖先图，祖先图尚未解析时记录在
//! [`BindingGraph::ancestor_requests`] 中，由编译过程驱动祖先图重新构建。
//! 展开完成后依次执行循环分析、作用域校验、初始化排序与属性收集。

use crate::aggregator::ContributionAggregator;
use crate::catalog::{BindingCatalog, DeclarationIndex};
use crate::cycles::CycleAnalyzer;
use crate::multibinding::MultibindingAggregator;
use crate::properties::PropertyCollector;
use crate::validator::{scoped_initialization_order, ScopeValidator};
use di_abstractions::{
    AncestorGraph, Binding, BindingGraph, BindingRegistry, ContributionProvider, EntryPoint,
    GraphDeclaration, GraphEdge, GraphResolver, MultibindingSource, PermittedCycle,
};
use infrastructure_common::{
    DeclarationId, Dependency, DiagnosticReport, DiagnosticSeverity, Diagnostics, GraphError, Origin,
    ResolverOptions, Scope, TypeKey,
};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use tracing::{debug, info, warn};

/// 绑定图构建器
///
/// 声明索引在整个编译过程中共享；每次构建持有独立的绑定目录视图
#[derive(Debug, Clone)]
pub struct GraphBuilder<'a> {
    index: &'a DeclarationIndex,
    options: ResolverOptions,
    retained: BTreeSet<TypeKey>,
}

impl<'a> GraphBuilder<'a> {
    /// 创建构建器
    pub fn new(index: &'a DeclarationIndex, options: ResolverOptions) -> Self {
        Self {
            index,
            options,
            retained: BTreeSet::new(),
        }
    }

    /// 额外保留的类型键
    ///
    /// 扩展图要求本图持有的绑定与入口点一样参与展开，且不会被裁剪
    pub fn retaining(mut self, keys: impl IntoIterator<Item = TypeKey>) -> Self {
        self.retained.extend(keys);
        self
    }

    /// 解析器选项
    pub fn options(&self) -> &ResolverOptions {
        &self.options
    }

    /// 构建并校验一个图
    pub fn build(
        &self,
        declaration: &GraphDeclaration,
        contributions: &dyn ContributionProvider,
        ancestors: &[AncestorGraph],
    ) -> Result<BindingGraph, DiagnosticReport> {
        info!("开始构建绑定图: {}", declaration.id());
        let mut diagnostics = Diagnostics::new(self.options.max_errors_count);

        let aggregated = ContributionAggregator::new(contributions).aggregate(
            declaration.effective_aggregation_scopes(),
            &declaration.excludes,
            &mut diagnostics,
        );

        let mut catalog = BindingCatalog::new(self.index);
        let mut declared: BTreeSet<TypeKey> = BTreeSet::new();
        let mut seed: Vec<Binding> = Vec::new();

        seed.push(Binding::bound_instance(
            declaration.key.clone(),
            Origin::synthetic(declaration.id().as_str()),
        ));
        for instance in &declaration.bound_instances {
            seed.push(Binding::bound_instance(
                instance.key.clone(),
                instance.origin.clone(),
            ));
        }
        for included in &declaration.includes {
            let graph = DeclarationId::new(included.key.type_name.clone());
            seed.push(Binding::bound_instance(
                included.key.clone(),
                included.origin.clone(),
            ));
            for accessor in &included.accessors {
                seed.push(Binding::GraphAccessor {
                    key: accessor.key.clone(),
                    origin: included.origin.clone(),
                    graph: graph.clone(),
                    accessor: Some(accessor.name.clone()),
                    from_parent: false,
                });
            }
        }
        for binding in declaration.bindings.iter().chain(aggregated.bindings.iter()) {
            declared.insert(binding.key().clone());
            seed.push(binding.clone());
        }

        let multibindings = MultibindingAggregator::new(
            declaration
                .multibinds
                .iter()
                .chain(aggregated.multibinds.iter())
                .cloned(),
            declaration
                .elements
                .iter()
                .chain(aggregated.elements.iter())
                .cloned(),
        );
        seed.extend(multibindings.element_bindings());

        for binding in seed {
            if let Err(error) = catalog.register(binding) {
                diagnostics.report(error);
            }
        }

        let mut expansion = Expansion {
            catalog,
            multibindings,
            ancestors,
            scopes: &declaration.scopes,
            diagnostics,
            bindings: BTreeMap::new(),
            order: Vec::new(),
            parents: HashMap::new(),
            edges: BTreeSet::new(),
            alias_chains: BTreeMap::new(),
            queue: VecDeque::new(),
            queued: HashSet::new(),
            defaults_only: HashMap::new(),
            ancestor_requests: BTreeMap::new(),
        };

        let mut entry_points = declaration.entry_points.clone();
        entry_points.sort();
        let entry_roots: Vec<Dependency> = entry_points.iter().map(EntryPoint::dependency).collect();
        for root in &entry_roots {
            expansion.enqueue(&root.key, None, root.has_default);
        }
        for key in &self.retained {
            debug!("图 {} 为扩展图保留 {}", declaration.id(), key);
            expansion.enqueue(key, None, false);
        }
        if self.options.validates_all_declarations() {
            for key in expansion.catalog.registered_keys() {
                expansion.enqueue(&key, None, false);
            }
            for key in expansion.multibindings.collection_keys() {
                expansion.enqueue(&key, None, false);
            }
        }
        expansion.run();

        let Expansion {
            diagnostics: mut expansion_diagnostics,
            bindings,
            order,
            edges,
            alias_chains,
            ancestor_requests,
            ..
        } = expansion;
        let edges: Vec<GraphEdge> = edges.into_iter().collect();
        let diagnostics = &mut expansion_diagnostics;

        let mut permitted_cycles: Vec<PermittedCycle> = Vec::new();
        let mut scoped_order = Vec::new();
        if !diagnostics.limit_reached() {
            let analysis = CycleAnalyzer::new(&bindings, &edges, &order).analyze();
            let fatal = !analysis.errors.is_empty();
            for error in analysis.errors.iter().cloned() {
                diagnostics.report(error);
            }

            let validator = ScopeValidator::new(declaration.id(), &declaration.scopes, ancestors);
            for error in validator.validate(&bindings, &order) {
                diagnostics.report(error);
            }

            if !fatal {
                scoped_order =
                    scoped_initialization_order(&bindings, &edges, &analysis.deferred_edges());
            }
            permitted_cycles = analysis.permitted;
        } else {
            warn!("图 {} 已达到最大错误数，跳过后续校验", declaration.id());
        }

        let root_keys: Vec<TypeKey> = entry_roots
            .iter()
            .map(|root| root.key.clone())
            .chain(self.retained.iter().cloned())
            .collect();
        let reachable = reachable_from(&root_keys, &edges);
        let unused: Vec<TypeKey> = declared
            .iter()
            .filter(|key| !reachable.contains(*key))
            .cloned()
            .collect();
        let origins = declared_origins(declaration, &aggregated.bindings);
        self.report_unused(&unused, &bindings, &origins, diagnostics);

        let shrink = self.options.shrink_unused_bindings;
        let keep = |key: &TypeKey| !shrink || reachable.contains(key);
        let bindings: BTreeMap<TypeKey, Binding> = bindings
            .into_iter()
            .filter(|(key, _)| keep(key))
            .collect();
        let edges: Vec<GraphEdge> = edges.into_iter().filter(|edge| keep(&edge.from)).collect();
        let alias_chains: BTreeMap<TypeKey, Vec<TypeKey>> = alias_chains
            .into_iter()
            .filter(|(key, _)| keep(key))
            .collect();
        let order: Vec<TypeKey> = order.into_iter().filter(|key| keep(key)).collect();
        let scoped_order: Vec<TypeKey> = scoped_order.into_iter().filter(|key| keep(key)).collect();
        let permitted_cycles: Vec<PermittedCycle> = permitted_cycles
            .into_iter()
            .filter(|cycle| cycle.members.iter().all(|key| keep(key)))
            .collect();
        let ancestor_requests: BTreeMap<DeclarationId, BTreeSet<TypeKey>> = ancestor_requests
            .into_iter()
            .map(|(graph, keys)| {
                let keys: BTreeSet<TypeKey> = keys.into_iter().filter(|key| keep(key)).collect();
                (graph, keys)
            })
            .filter(|(_, keys)| !keys.is_empty())
            .collect();
        if shrink {
            debug!("裁剪未使用绑定后保留 {} 个绑定", bindings.len());
        }

        let properties = PropertyCollector::new(&bindings, &alias_chains).collect(&edges, &root_keys);

        let graph = BindingGraph {
            id: declaration.id().clone(),
            key: declaration.key.clone(),
            scopes: declaration.scopes.clone(),
            aggregation_scopes: declaration.effective_aggregation_scopes().to_vec(),
            entry_points,
            bindings,
            edges,
            alias_chains,
            permitted_cycles,
            scoped_order,
            properties,
            unused,
            resolution_order: order,
            extensions: declaration
                .extensions
                .iter()
                .map(|extension| extension.id().clone())
                .collect(),
            ancestor_requests,
        };

        match expansion_diagnostics.into_result(graph) {
            Ok(graph) => {
                info!(
                    "绑定图 {} 构建完成: {} 个绑定, {} 个有作用域",
                    graph.id,
                    graph.bindings.len(),
                    graph.scoped_order.len()
                );
                Ok(graph)
            }
            Err(report) => {
                warn!(
                    "绑定图 {} 构建失败: {} 个错误",
                    declaration.id(),
                    report.total()
                );
                Err(report)
            }
        }
    }

    fn report_unused(
        &self,
        unused: &[TypeKey],
        bindings: &BTreeMap<TypeKey, Binding>,
        origins: &BTreeMap<TypeKey, Origin>,
        diagnostics: &mut Diagnostics,
    ) {
        for key in unused {
            let origin = bindings
                .get(key)
                .map(|binding| binding.origin().clone())
                .or_else(|| origins.get(key).cloned())
                .unwrap_or_else(|| Origin::synthetic(key.render()));
            match self.options.unused_binding_severity {
                DiagnosticSeverity::None => debug!("未使用的绑定: {}", key),
                DiagnosticSeverity::Warn => warn!("未使用的绑定: {} ({})", key, origin),
                DiagnosticSeverity::Error => {
                    diagnostics.report(GraphError::UnusedBinding {
                        key: key.clone(),
                        origin,
                    });
                }
            }
        }
    }
}

impl GraphResolver for GraphBuilder<'_> {
    fn resolve(
        &mut self,
        declaration: &GraphDeclaration,
        contributions: &dyn ContributionProvider,
        ancestors: &[AncestorGraph],
    ) -> Result<BindingGraph, DiagnosticReport> {
        self.build(declaration, contributions, ancestors)
    }
}

fn declared_origins(
    declaration: &GraphDeclaration,
    contributed: &[Binding],
) -> BTreeMap<TypeKey, Origin> {
    declaration
        .bindings
        .iter()
        .chain(contributed.iter())
        .map(|binding| (binding.key().clone(), binding.origin().clone()))
        .collect()
}

fn reachable_from(roots: &[TypeKey], edges: &[GraphEdge]) -> HashSet<TypeKey> {
    let mut adjacency: HashMap<&TypeKey, Vec<&TypeKey>> = HashMap::new();
    for edge in edges {
        adjacency.entry(&edge.from).or_default().push(&edge.to);
    }
    let mut reachable: HashSet<TypeKey> = HashSet::new();
    let mut stack: Vec<&TypeKey> = roots.iter().collect();
    while let Some(key) = stack.pop() {
        if reachable.insert(key.clone()) {
            if let Some(targets) = adjacency.get(key) {
                stack.extend(targets.iter().copied());
            }
        }
    }
    reachable
}

fn ancestor_accessor(ancestor: &AncestorGraph, key: &TypeKey) -> Binding {
    Binding::GraphAccessor {
        key: key.clone(),
        origin: Origin::synthetic(format!("{}#{}", ancestor.id, key.render())),
        graph: ancestor.id.clone(),
        accessor: None,
        from_parent: true,
    }
}

/// 查找结果
enum Resolution {
    Found(Binding),
    Missing,
    Failed,
}

/// 一次构建的展开状态
struct Expansion<'a, 'c> {
    catalog: BindingCatalog<'a>,
    multibindings: MultibindingAggregator,
    ancestors: &'c [AncestorGraph],
    scopes: &'c [Scope],
    diagnostics: Diagnostics,
    bindings: BTreeMap<TypeKey, Binding>,
    order: Vec<TypeKey>,
    parents: HashMap<TypeKey, TypeKey>,
    edges: BTreeSet<GraphEdge>,
    alias_chains: BTreeMap<TypeKey, Vec<TypeKey>>,
    queue: VecDeque<TypeKey>,
    queued: HashSet<TypeKey>,
    defaults_only: HashMap<TypeKey, bool>,
    ancestor_requests: BTreeMap<DeclarationId, BTreeSet<TypeKey>>,
}

impl Expansion<'_, '_> {
    fn enqueue(&mut self, key: &TypeKey, parent: Option<&TypeKey>, has_default: bool) {
        if let Some(Binding::Absent { .. }) = self.bindings.get(key) {
            if !has_default {
                if let Some(parent) = parent {
                    self.report_unresolved(key, Some(parent));
                }
            }
            return;
        }
        if self.queued.contains(key) {
            if let Some(flag) = self.defaults_only.get_mut(key) {
                if *flag && !has_default {
                    *flag = false;
                    // 请求链归属于第一个必需请求方
                    match parent {
                        Some(parent) => self.parents.insert(key.clone(), parent.clone()),
                        None => self.parents.remove(key),
                    };
                }
            }
            return;
        }
        self.queued.insert(key.clone());
        if let Some(parent) = parent {
            self.parents.insert(key.clone(), parent.clone());
        }
        self.defaults_only.insert(key.clone(), has_default);
        self.queue.push_back(key.clone());
    }

    fn run(&mut self) {
        while let Some(key) = self.queue.pop_front() {
            if self.diagnostics.limit_reached() {
                warn!("已达到最大错误数，停止展开");
                break;
            }
            match self.resolve(&key) {
                Resolution::Found(binding) => self.accept(binding),
                Resolution::Missing => {
                    if self.defaults_only.get(&key).copied().unwrap_or(false) {
                        debug!("{} 无法解析，使用参数默认值", key);
                        self.accept(Binding::Absent {
                            key: key.clone(),
                            origin: Origin::synthetic(format!("default:{}", key.render())),
                        });
                    } else {
                        let parent = self.parents.get(&key).cloned();
                        self.report_unresolved(&key, parent.as_ref());
                    }
                }
                Resolution::Failed => {}
            }
        }
    }

    fn accept(&mut self, binding: Binding) {
        let key = binding.key().clone();
        for dependency in binding.dependencies() {
            self.edges.insert(GraphEdge {
                from: key.clone(),
                to: dependency.key.clone(),
                wrapper: dependency.wrapper,
                has_default: dependency.has_default,
            });
        }
        let dependencies = binding.dependencies().to_vec();
        self.order.push(key.clone());
        self.bindings.insert(key.clone(), binding);
        for dependency in dependencies {
            self.enqueue(&dependency.key, Some(&key), dependency.has_default);
        }
    }

    fn resolve(&mut self, key: &TypeKey) -> Resolution {
        if let Some(binding) = self.catalog.explicit(key).cloned() {
            if binding.is_alias() {
                match self.catalog.resolve_alias(key) {
                    Ok(chain) => {
                        self.alias_chains.insert(key.clone(), chain.keys);
                    }
                    Err(error) => {
                        self.diagnostics.report(error);
                        return Resolution::Failed;
                    }
                }
            }
            if let Some(accessor) = self.promote_to_ancestor(key, &binding, true) {
                return Resolution::Found(accessor);
            }
            return Resolution::Found(binding);
        }

        if self.multibindings.is_collection(key) {
            let inherited = self.inherited_sources(key);
            return match self
                .multibindings
                .resolve(key, &inherited, &mut self.diagnostics)
            {
                Some(binding) => Resolution::Found(binding),
                None => Resolution::Missing,
            };
        }

        let ancestors = self.ancestors;
        if let Some(ancestor) = ancestors.iter().find(|ancestor| ancestor.provides(key)) {
            return Resolution::Found(ancestor_accessor(ancestor, key));
        }

        match self.catalog.implicit(key) {
            Some(binding) => match self.promote_to_ancestor(key, &binding, false) {
                Some(accessor) => Resolution::Found(accessor),
                None => Resolution::Found(binding),
            },
            None => Resolution::Missing,
        }
    }

    /// 作用域属于祖先图的绑定交给祖先图持有
    ///
    /// 显式绑定只在祖先图已解析该类型键时转交；隐式绑定总是转交，
    /// 祖先图尚未解析时记录保留请求
    fn promote_to_ancestor(&mut self, key: &TypeKey, binding: &Binding, explicit: bool) -> Option<Binding> {
        let scope = binding.scope()?;
        if self.scopes.contains(scope) {
            return None;
        }
        let ancestors = self.ancestors;
        let ancestor = ancestors
            .iter()
            .find(|ancestor| ancestor.contains_scope(scope))?;
        if !ancestor.provides(key) {
            if explicit {
                return None;
            }
            debug!("{} 的作用域 {} 属于祖先图 {}，请求其保留该绑定", key, scope, ancestor.id);
            self.ancestor_requests
                .entry(ancestor.id.clone())
                .or_default()
                .insert(key.clone());
        }
        Some(ancestor_accessor(ancestor, key))
    }

    /// 最近的祖先图中已聚合的元素
    fn inherited_sources(&self, key: &TypeKey) -> Vec<MultibindingSource> {
        self.ancestors
            .iter()
            .find_map(|ancestor| ancestor.multibindings.get(key))
            .cloned()
            .unwrap_or_default()
    }

    /// 从入口点到缺失类型键的请求链
    fn chain_to(&self, key: &TypeKey, parent: Option<&TypeKey>) -> Vec<TypeKey> {
        let mut chain = vec![key.clone()];
        let mut current = parent.cloned();
        let mut seen: HashSet<TypeKey> = HashSet::new();
        while let Some(next) = current {
            if !seen.insert(next.clone()) {
                break;
            }
            current = self.parents.get(&next).cloned();
            chain.push(next);
        }
        chain.reverse();
        chain
    }

    fn report_unresolved(&mut self, key: &TypeKey, parent: Option<&TypeKey>) {
        let chain = self.chain_to(key, parent);
        let requested_by = parent
            .and_then(|parent| self.bindings.get(parent))
            .map(|binding| binding.origin().clone());
        let hint = self.catalog.missing_hint(key);
        self.diagnostics.report(GraphError::UnresolvedDependency {
            key: key.clone(),
            chain,
            requested_by,
            hint,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::StaticContributionProvider;
    use di_abstractions::{
        members_injector_key, ExposedAccessor, IncludedGraph, InjectableClass, MultibindingElement,
    };
    use infrastructure_common::GraphErrorKind;

    fn key(name: &str) -> TypeKey {
        TypeKey::new(name)
    }

    fn build(
        index: &DeclarationIndex,
        declaration: &GraphDeclaration,
        options: ResolverOptions,
    ) -> Result<BindingGraph, DiagnosticReport> {
        GraphBuilder::new(index, options).build(
            declaration,
            &StaticContributionProvider::default(),
            &[],
        )
    }

    #[test]
    fn test_implicit_class_is_expanded_from_entry_point() {
        let index = DeclarationIndex::from_declarations(
            vec![
                InjectableClass::new(key("Service"), vec![key("Clock").into()]),
                InjectableClass::new(key("Clock"), vec![]).with_scope(Scope::new("AppScope")),
            ],
            vec![],
        );
        let declaration = GraphDeclaration::new(key("AppGraph"))
            .with_scope(Scope::new("AppScope"))
            .with_entry_point(EntryPoint::accessor("service", key("Service")));

        let graph = build(&index, &declaration, ResolverOptions::default()).expect("图应当构建成功");
        assert!(graph.contains(&key("Service")));
        assert!(graph.contains(&key("Clock")));
        assert_eq!(graph.scoped_order, vec![key("Clock")]);
        assert_eq!(graph.resolution_order.first(), Some(&key("Service")));
    }

    #[test]
    fn test_default_parameter_becomes_absent() {
        let index = DeclarationIndex::from_declarations(
            vec![InjectableClass::new(
                key("Service"),
                vec![Dependency::new(key("Tuning")).with_default()],
            )],
            vec![],
        );
        let declaration = GraphDeclaration::new(key("AppGraph"))
            .with_entry_point(EntryPoint::accessor("service", key("Service")));

        let graph = build(&index, &declaration, ResolverOptions::default()).expect("图应当构建成功");
        assert!(matches!(
            graph.binding(&key("Tuning")),
            Some(Binding::Absent { .. })
        ));
    }

    #[test]
    fn test_default_does_not_cover_required_request() {
        let index = DeclarationIndex::from_declarations(
            vec![
                InjectableClass::new(
                    key("Service"),
                    vec![Dependency::new(key("Tuning")).with_default()],
                ),
                InjectableClass::new(key("Worker"), vec![key("Tuning").into()]),
            ],
            vec![],
        );
        let declaration = GraphDeclaration::new(key("AppGraph"))
            .with_entry_point(EntryPoint::accessor("a", key("Service")))
            .with_entry_point(EntryPoint::accessor("b", key("Worker")));

        let report = build(&index, &declaration, ResolverOptions::default()).unwrap_err();
        assert!(report.find(GraphErrorKind::UnresolvedDependency).is_some());
    }

    #[test]
    fn test_unused_bindings_are_shrunk_and_reported() {
        let index = DeclarationIndex::new();
        let declaration = GraphDeclaration::new(key("AppGraph"))
            .with_entry_point(EntryPoint::accessor("used", key("Used")))
            .with_binding(Binding::provided(key("Used"), Origin::new("m.used"), vec![]))
            .with_binding(Binding::provided(key("Spare"), Origin::new("m.spare"), vec![]));

        let graph = build(&index, &declaration, ResolverOptions::default()).expect("图应当构建成功");
        assert_eq!(graph.unused, vec![key("Spare")]);
        assert!(!graph.contains(&key("Spare")));

        let strict = ResolverOptions::default()
            .with_unused_binding_severity(DiagnosticSeverity::Error);
        let report = build(&index, &declaration, strict).unwrap_err();
        assert!(report.find(GraphErrorKind::UnusedBinding).is_some());
    }

    #[test]
    fn test_full_validation_reports_unreachable_errors() {
        let index = DeclarationIndex::new();
        let declaration = GraphDeclaration::new(key("AppGraph"))
            .with_binding(Binding::provided(
                key("Orphan"),
                Origin::new("m.orphan"),
                vec![key("Missing").into()],
            ));

        assert!(build(&index, &declaration, ResolverOptions::default()).is_ok());
        let full = ResolverOptions::default().with_full_graph_validation(true);
        let report = build(&index, &declaration, full).unwrap_err();
        assert!(report.find(GraphErrorKind::UnresolvedDependency).is_some());
    }

    #[test]
    fn test_error_limit_caps_report() {
        let index = DeclarationIndex::new();
        let mut declaration = GraphDeclaration::new(key("AppGraph"));
        for position in 0..5 {
            let name = format!("Missing{position}");
            declaration = declaration.with_entry_point(EntryPoint::accessor(name.clone(), key(&name)));
        }
        let options = ResolverOptions::default().with_max_errors_count(2);
        let report = build(&index, &declaration, options).unwrap_err();
        assert_eq!(report.errors.len(), 2);
    }

    #[test]
    fn test_unresolved_chain_names_required_requester() {
        let index = DeclarationIndex::from_declarations(
            vec![
                InjectableClass::new(
                    key("Service"),
                    vec![Dependency::new(key("Tuning")).with_default()],
                ),
                InjectableClass::new(key("Worker"), vec![key("Tuning").into()]),
            ],
            vec![],
        );
        let declaration = GraphDeclaration::new(key("AppGraph"))
            .with_entry_point(EntryPoint::accessor("a", key("Service")))
            .with_entry_point(EntryPoint::accessor("b", key("Worker")));

        let report = build(&index, &declaration, ResolverOptions::default()).unwrap_err();
        match report.find(GraphErrorKind::UnresolvedDependency) {
            Some(GraphError::UnresolvedDependency {
                chain,
                requested_by,
                ..
            }) => {
                assert_eq!(chain, &vec![key("Worker"), key("Tuning")]);
                assert_eq!(
                    requested_by.as_ref().map(|origin| origin.declaration.as_str()),
                    Some("Worker")
                );
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    fn network_include() -> IncludedGraph {
        IncludedGraph {
            origin: Origin::new("AppGraph.network"),
            key: key("NetworkGraph"),
            accessors: vec![ExposedAccessor {
                name: "httpClient".to_string(),
                key: key("HttpClient"),
            }],
        }
    }

    #[test]
    fn test_included_graph_accessor_resolves() {
        let index = DeclarationIndex::new();
        let mut declaration = GraphDeclaration::new(key("AppGraph"))
            .with_entry_point(EntryPoint::accessor("client", key("HttpClient")));
        declaration.includes.push(network_include());

        let graph = build(&index, &declaration, ResolverOptions::default()).expect("图应当构建成功");
        match graph.binding(&key("HttpClient")) {
            Some(Binding::GraphAccessor {
                graph,
                accessor,
                from_parent,
                ..
            }) => {
                assert_eq!(graph.as_str(), "NetworkGraph");
                assert_eq!(accessor.as_deref(), Some("httpClient"));
                assert!(!*from_parent);
            }
            other => panic!("unexpected binding: {other:?}"),
        }
    }

    #[test]
    fn test_unexposed_key_of_included_graph_is_unresolved() {
        // NetworkGraph 内部提供 DnsResolver，但没有公开访问器
        let index = DeclarationIndex::new();
        let mut declaration = GraphDeclaration::new(key("AppGraph"))
            .with_entry_point(EntryPoint::accessor("dns", key("DnsResolver")));
        declaration.includes.push(network_include());

        let report = build(&index, &declaration, ResolverOptions::default()).unwrap_err();
        match report.find(GraphErrorKind::UnresolvedDependency) {
            Some(GraphError::UnresolvedDependency { key: missing, .. }) => {
                assert_eq!(missing, &key("DnsResolver"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_injector_entry_point_resolves_members_injector() {
        let index = DeclarationIndex::from_declarations(
            vec![
                InjectableClass::new(key("MainActivity"), vec![])
                    .with_members(vec![key("Logger").into()]),
                InjectableClass::new(key("Logger"), vec![]),
            ],
            vec![],
        );
        let declaration = GraphDeclaration::new(key("AppGraph"))
            .with_entry_point(EntryPoint::injector("inject", key("MainActivity")));

        let graph = build(&index, &declaration, ResolverOptions::default()).expect("图应当构建成功");
        match graph.binding(&members_injector_key(&key("MainActivity"))) {
            Some(Binding::MembersInjector {
                target,
                dependencies,
                ..
            }) => {
                assert_eq!(target, &key("MainActivity"));
                assert_eq!(dependencies.len(), 1);
            }
            other => panic!("unexpected binding: {other:?}"),
        }
        assert!(graph.contains(&key("Logger")));
        assert!(!graph.contains(&key("MainActivity")));

        let unknown = GraphDeclaration::new(key("AppGraph"))
            .with_entry_point(EntryPoint::injector("inject", key("Unknown")));
        let report = build(&index, &unknown, ResolverOptions::default()).unwrap_err();
        assert!(report.find(GraphErrorKind::UnresolvedDependency).is_some());
    }

    fn scoped_index() -> DeclarationIndex {
        DeclarationIndex::from_declarations(
            vec![
                InjectableClass::new(key("Svc"), vec![]),
                InjectableClass::new(key("Db"), vec![]).with_scope(Scope::new("AppScope")),
            ],
            vec![],
        )
    }

    fn app_graph() -> GraphDeclaration {
        GraphDeclaration::new(key("App"))
            .with_scope(Scope::new("AppScope"))
            .with_entry_point(EntryPoint::accessor("svc", key("Svc")))
    }

    fn child_graph() -> GraphDeclaration {
        GraphDeclaration::new(key("Child"))
            .with_scope(Scope::new("UserScope"))
            .with_entry_point(EntryPoint::accessor("db", key("Db")))
    }

    #[test]
    fn test_ancestor_scoped_class_is_held_by_ancestor() {
        let index = scoped_index();
        let provider = StaticContributionProvider::default();
        let parent = build(&index, &app_graph(), ResolverOptions::default()).expect("父图应当构建成功");
        assert!(!parent.contains(&key("Db")));

        let ancestors = vec![AncestorGraph::from_graph(&parent)];
        let child = GraphBuilder::new(&index, ResolverOptions::default())
            .build(&child_graph(), &provider, &ancestors)
            .expect("扩展图应当构建成功");
        match child.binding(&key("Db")) {
            Some(Binding::GraphAccessor {
                graph, from_parent, ..
            }) => {
                assert_eq!(graph.as_str(), "App");
                assert!(*from_parent);
            }
            other => panic!("Db 应当由父图持有: {other:?}"),
        }
        assert!(child.scoped_order.is_empty());
        assert_eq!(
            child.ancestor_requests.get(&DeclarationId::new("App")),
            Some(&BTreeSet::from([key("Db")]))
        );

        let retained = GraphBuilder::new(&index, ResolverOptions::default())
            .retaining([key("Db")])
            .build(&app_graph(), &provider, &[])
            .expect("父图应当构建成功");
        assert!(retained.contains(&key("Db")));
        assert_eq!(retained.scoped_order, vec![key("Db")]);

        let ancestors = vec![AncestorGraph::from_graph(&retained)];
        let child = GraphBuilder::new(&index, ResolverOptions::default())
            .build(&child_graph(), &provider, &ancestors)
            .expect("扩展图应当构建成功");
        assert!(child.ancestor_requests.is_empty());
        assert!(matches!(
            child.binding(&key("Db")),
            Some(Binding::GraphAccessor { from_parent: true, .. })
        ));
    }

    #[test]
    fn test_extension_collection_keeps_own_elements() {
        let index = DeclarationIndex::new();
        let provider = StaticContributionProvider::default();
        let plugins = key("Set<Plugin>");

        let mut parent_declaration = GraphDeclaration::new(key("App"))
            .with_scope(Scope::new("AppScope"))
            .with_entry_point(EntryPoint::accessor("plugins", plugins.clone()));
        parent_declaration.elements.push(MultibindingElement::into_set(
            Origin::new("app.A"),
            key("Plugin"),
            vec![],
        ));
        let parent = build(&index, &parent_declaration, ResolverOptions::default())
            .expect("父图应当构建成功");

        let mut child_declaration = GraphDeclaration::new(key("Child"))
            .with_scope(Scope::new("UserScope"))
            .with_entry_point(EntryPoint::accessor("plugins", plugins.clone()));
        child_declaration.elements.push(MultibindingElement::into_set(
            Origin::new("child.B"),
            key("Plugin"),
            vec![],
        ));
        let ancestors = vec![AncestorGraph::from_graph(&parent)];
        let child = GraphBuilder::new(&index, ResolverOptions::default())
            .build(&child_declaration, &provider, &ancestors)
            .expect("扩展图应当构建成功");

        match child.binding(&plugins) {
            Some(Binding::Multibinding {
                sources,
                dependencies,
                ..
            }) => {
                let sites: Vec<&str> = sources
                    .iter()
                    .map(|source| source.origin.declaration.as_str())
                    .collect();
                assert_eq!(sites, vec!["app.A", "child.B"]);
                assert!(matches!(
                    child.binding(&dependencies[0].key),
                    Some(Binding::GraphAccessor { from_parent: true, .. })
                ));
                assert!(matches!(
                    child.binding(&dependencies[1].key),
                    Some(Binding::Provided { .. })
                ));
            }
            other => panic!("unexpected binding: {other:?}"),
        }
    }
}

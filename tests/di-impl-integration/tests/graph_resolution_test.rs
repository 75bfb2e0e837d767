//! 绑定图解析集中集成测试

use di_abstractions::{
    Binding, BindingGraph, ContributionKind, ContributionRecord, EntryPoint, GraphDeclaration,
    InjectableClass, MultibindingElement,
};
use di_impl::{
    DeclarationIndex, GraphBuilder, GraphMetadataReport, MultibindingAggregator,
    StaticContributionProvider,
};
use infrastructure_common::{
    DiagnosticReport, Diagnostics, Dependency, GraphError, GraphErrorKind, Origin,
    ResolverOptions, Scope, TypeKey,
};

fn key(name: &str) -> TypeKey {
    TypeKey::new(name)
}

fn app_scope() -> Scope {
    Scope::new("AppScope")
}

fn build(
    index: &DeclarationIndex,
    declaration: &GraphDeclaration,
    contributions: &StaticContributionProvider,
) -> Result<BindingGraph, DiagnosticReport> {
    GraphBuilder::new(index, ResolverOptions::default()).build(declaration, contributions, &[])
}

fn app_graph() -> GraphDeclaration {
    GraphDeclaration::new(key("App")).with_scope(app_scope())
}

/// 同一组事实按不同顺序注册，两次构建结果完全一致
#[test]
fn test_build_is_deterministic_regardless_of_registration_order() {
    let classes = vec![
        InjectableClass::new(key("Api"), vec![key("Pool").into(), key("Cache").into()])
            .with_scope(app_scope()),
        InjectableClass::new(key("Cache"), vec![key("Clock").into()]).with_scope(app_scope()),
        InjectableClass::new(key("Pool"), vec![key("Clock").into()]).with_scope(app_scope()),
        InjectableClass::new(key("Clock"), vec![]).with_scope(app_scope()),
    ];
    let elements = vec![
        MultibindingElement::into_set(Origin::new("Plugins.b"), key("Plugin"), vec![]),
        MultibindingElement::into_set(Origin::new("Plugins.a"), key("Plugin"), vec![]),
        MultibindingElement::into_set(Origin::new("Plugins.c"), key("Plugin"), vec![]),
    ];
    let records = vec![
        ContributionRecord::binding(app_scope(), key("SqlStore"), key("Store")),
        ContributionRecord::new(
            Origin::new("LoggingPlugin"),
            app_scope(),
            ContributionKind::ContributesIntoSet,
            key("LoggingPlugin"),
        )
        .with_supertypes(vec![key("Plugin")]),
    ];

    let declaration = |reverse: bool| {
        let mut declaration = app_graph()
            .with_entry_point(EntryPoint::accessor("api", key("Api")))
            .with_entry_point(EntryPoint::accessor("store", key("Store")))
            .with_entry_point(EntryPoint::accessor("plugins", TypeKey::set_of(&key("Plugin"))));
        declaration.elements = elements.clone();
        if reverse {
            declaration.elements.reverse();
            declaration.entry_points.reverse();
        }
        declaration
    };

    let forward_index = DeclarationIndex::from_declarations(
        classes
            .iter()
            .cloned()
            .chain([InjectableClass::new(key("SqlStore"), vec![]), InjectableClass::new(key("LoggingPlugin"), vec![])]),
        vec![],
    );
    let reverse_index = DeclarationIndex::from_declarations(
        classes
            .iter()
            .rev()
            .cloned()
            .chain([InjectableClass::new(key("LoggingPlugin"), vec![]), InjectableClass::new(key("SqlStore"), vec![])]),
        vec![],
    );
    let forward_records = StaticContributionProvider::new(records.clone());
    let reverse_records = StaticContributionProvider::new(records.into_iter().rev().collect());

    let first = build(&forward_index, &declaration(false), &forward_records).unwrap();
    let second = build(&reverse_index, &declaration(true), &reverse_records).unwrap();

    assert_eq!(first, second);
    assert_eq!(
        first.scoped_order,
        vec![key("Clock"), key("Cache"), key("Pool"), key("Api")]
    );

    let first_json = GraphMetadataReport::from_graph(&first).to_json_pretty().unwrap();
    let second_json = GraphMetadataReport::from_graph(&second).to_json_pretty().unwrap();
    assert_eq!(first_json, second_json);
}

/// 经过别名链解析与直接绑定终点得到相同的依赖遍历
#[test]
fn test_alias_chain_is_transparent() {
    let index = DeclarationIndex::new();
    let terminal = |name: &str| {
        Binding::provided(key(name), Origin::new("m.sql"), vec![key("Pool").into()])
    };
    let pool = Binding::provided(key("Pool"), Origin::new("m.pool"), vec![]);

    let aliased = app_graph()
        .with_entry_point(EntryPoint::accessor("repo", key("Repo")))
        .with_binding(Binding::alias(key("Repo"), Origin::new("m.repo"), key("BaseRepo")))
        .with_binding(Binding::alias(key("BaseRepo"), Origin::new("m.base"), key("SqlRepo")))
        .with_binding(terminal("SqlRepo"))
        .with_binding(pool.clone());
    let direct = app_graph()
        .with_entry_point(EntryPoint::accessor("repo", key("Repo")))
        .with_binding(terminal("Repo"))
        .with_binding(pool);

    let provider = StaticContributionProvider::default();
    let aliased = build(&index, &aliased, &provider).unwrap();
    let direct = build(&index, &direct, &provider).unwrap();

    assert_eq!(
        aliased.alias_chains.get(&key("Repo")),
        Some(&vec![key("Repo"), key("BaseRepo"), key("SqlRepo")])
    );
    let aliased_terminal = aliased.binding(aliased.terminal_of(&key("Repo"))).unwrap();
    let direct_terminal = direct.binding(direct.terminal_of(&key("Repo"))).unwrap();
    assert_eq!(aliased_terminal.dependencies(), direct_terminal.dependencies());
    assert_eq!(aliased_terminal.kind(), direct_terminal.kind());
    assert!(aliased.contains(&key("Pool")) && direct.contains(&key("Pool")));
}

/// A→B→A 当且仅当至少一条边为延迟访问时被接受
#[test]
fn test_cycle_permission_law() {
    let index = DeclarationIndex::new();
    let provider = StaticContributionProvider::default();
    let cycle = |deferred: bool| {
        let back = if deferred {
            Dependency::provider(key("A"))
        } else {
            Dependency::new(key("A"))
        };
        app_graph()
            .with_entry_point(EntryPoint::accessor("a", key("A")))
            .with_binding(Binding::provided(key("A"), Origin::new("m.a"), vec![key("B").into()]))
            .with_binding(Binding::provided(key("B"), Origin::new("m.b"), vec![back]))
    };

    let accepted = build(&index, &cycle(true), &provider).unwrap();
    assert_eq!(accepted.permitted_cycles.len(), 1);
    assert_eq!(accepted.deferred_edges().len(), 1);

    let report = build(&index, &cycle(false), &provider).unwrap_err();
    match report.find(GraphErrorKind::FatalCycle) {
        Some(GraphError::FatalCycle { cycle, .. }) => {
            assert_eq!(cycle.first(), cycle.last());
            assert!(cycle.contains(&key("A")) && cycle.contains(&key("B")));
        }
        other => panic!("应当报告致命循环: {other:?}"),
    }
}

/// 对同一组贡献重复聚合得到相同的元素顺序
#[test]
fn test_multibinding_aggregation_is_idempotent() {
    let elements = vec![
        MultibindingElement::into_set(Origin::new("Plugins.zeta"), key("Plugin"), vec![]),
        MultibindingElement::into_set(Origin::new("Plugins.alpha"), key("Plugin"), vec![]),
        MultibindingElement::into_set(Origin::new("Plugins.mid"), key("Plugin"), vec![]),
    ];
    let aggregator = MultibindingAggregator::new(vec![], elements.clone());
    let set_key = TypeKey::set_of(&key("Plugin"));

    let (first, first_errors) = aggregator.aggregate(&set_key);
    let (second, second_errors) = aggregator.aggregate(&set_key);
    assert!(first_errors.is_empty() && second_errors.is_empty());
    assert_eq!(first, second);

    let mut rerun = MultibindingAggregator::new(vec![], elements.into_iter().rev());
    let mut diagnostics = Diagnostics::new(20);
    let third = rerun.resolve(&set_key, &[], &mut diagnostics);
    assert_eq!(first, third);

    match first {
        Some(Binding::Multibinding { sources, .. }) => {
            let order: Vec<&str> = sources
                .iter()
                .map(|source| source.origin.declaration.as_str())
                .collect();
            assert_eq!(order, vec!["Plugins.alpha", "Plugins.mid", "Plugins.zeta"]);
        }
        other => panic!("应当得到多重绑定: {other:?}"),
    }
}

fn ranked_scenario(excludes: &[&str]) -> Result<BindingGraph, DiagnosticReport> {
    let index = DeclarationIndex::from_declarations(
        vec![
            InjectableClass::new(key("X"), vec![]),
            InjectableClass::new(key("Y"), vec![]),
        ],
        vec![],
    );
    let provider = StaticContributionProvider::new(vec![
        ContributionRecord::binding(Scope::new("S"), key("X"), key("K")).with_rank(50),
        ContributionRecord::binding(Scope::new("S"), key("Y"), key("K")).with_rank(100),
    ]);
    let mut declaration = GraphDeclaration::new(key("App"))
        .with_scope(Scope::new("S"))
        .with_entry_point(EntryPoint::accessor("k", key("K")));
    for exclude in excludes {
        declaration = declaration.with_exclude(*exclude);
    }
    build(&index, &declaration, &provider)
}

/// 最高优先级胜出；排除后由剩余贡献胜出
#[test]
fn test_exclusion_and_ranking() {
    let graph = ranked_scenario(&[]).unwrap();
    assert_eq!(graph.terminal_of(&key("K")), &key("Y"));
    assert!(!graph.contains(&key("X")));

    let graph = ranked_scenario(&["Y"]).unwrap();
    assert_eq!(graph.terminal_of(&key("K")), &key("X"));
    assert!(!graph.contains(&key("Y")));
}

/// 同为最高优先级的两个贡献恰好报告一个重复贡献错误
#[test]
fn test_duplicate_contribution_is_reported_once() {
    let index = DeclarationIndex::from_declarations(
        vec![
            InjectableClass::new(key("X"), vec![]),
            InjectableClass::new(key("Z"), vec![]),
        ],
        vec![],
    );
    let provider = StaticContributionProvider::new(vec![
        ContributionRecord::binding(Scope::new("S"), key("X"), key("K")).with_rank(100),
        ContributionRecord::binding(Scope::new("S"), key("Z"), key("K")).with_rank(100),
    ]);
    let declaration = GraphDeclaration::new(key("App"))
        .with_scope(Scope::new("S"))
        .with_entry_point(EntryPoint::accessor("k", key("K")));

    let report = build(&index, &declaration, &provider).unwrap_err();
    let duplicates: Vec<&GraphError> = report
        .errors
        .iter()
        .filter(|error| error.kind() == GraphErrorKind::DuplicateContribution)
        .collect();
    assert_eq!(duplicates.len(), 1);
    match duplicates[0] {
        GraphError::DuplicateContribution { key: k, rank, candidates, .. } => {
            assert_eq!(k, &key("K"));
            assert_eq!(*rank, Some(100));
            let sites: Vec<&str> = candidates
                .iter()
                .map(|origin| origin.declaration.as_str())
                .collect();
            assert_eq!(sites, vec!["X", "Z"]);
        }
        other => panic!("意外的错误: {other}"),
    }
}

/// 缺失绑定的请求链从入口点开始
#[test]
fn test_unresolved_dependency_reports_full_chain() {
    let index = DeclarationIndex::from_declarations(
        vec![
            InjectableClass::new(key("App"), vec![key("Foo").into()]),
            InjectableClass::new(key("Foo"), vec![key("Bar").into()]),
        ],
        vec![],
    );
    let declaration = GraphDeclaration::new(key("AppGraph"))
        .with_entry_point(EntryPoint::accessor("app", key("App")));

    let report = build(&index, &declaration, &StaticContributionProvider::default()).unwrap_err();
    assert_eq!(report.total(), 1);
    match report.first() {
        Some(GraphError::UnresolvedDependency { key: missing, chain, requested_by, .. }) => {
            assert_eq!(missing, &key("Bar"));
            assert_eq!(chain, &vec![key("App"), key("Foo"), key("Bar")]);
            assert_eq!(
                requested_by.as_ref().map(|origin| origin.declaration.as_str()),
                Some("Foo")
            );
        }
        other => panic!("应当报告无法解析的依赖: {other:?}"),
    }
    assert!(report.to_string().contains("App -> Foo -> Bar"));
}

/// 经无作用域绑定间接引用的其他作用域绑定被拒绝
#[test]
fn test_scope_leak_is_rejected() {
    let index = DeclarationIndex::from_declarations(
        vec![
            InjectableClass::new(key("Home"), vec![key("Middle").into()]),
            InjectableClass::new(key("Middle"), vec![key("FeatureState").into()]),
            InjectableClass::new(key("FeatureState"), vec![])
                .with_scope(Scope::new("FeatureScope")),
        ],
        vec![],
    );
    let declaration = app_graph().with_entry_point(EntryPoint::accessor("home", key("Home")));

    let report = build(&index, &declaration, &StaticContributionProvider::default()).unwrap_err();
    match report.find(GraphErrorKind::ScopeMismatch) {
        Some(GraphError::ScopeMismatch { key: leaked, scope, allowed, .. }) => {
            assert_eq!(leaked, &key("FeatureState"));
            assert_eq!(scope, &Scope::new("FeatureScope"));
            assert_eq!(allowed, &vec![app_scope()]);
        }
        other => panic!("应当报告作用域不匹配: {other:?}"),
    }
}

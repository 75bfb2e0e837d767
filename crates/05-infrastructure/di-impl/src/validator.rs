//! 作用域与初始化顺序校验

use di_abstractions::{AncestorGraph, Binding, DeferredEdge, GraphEdge};
use infrastructure_common::{DeclarationId, GraphError, Scope, TypeKey};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use tracing::warn;

/// 作用域校验器
pub struct ScopeValidator<'a> {
    graph: &'a DeclarationId,
    allowed: BTreeSet<Scope>,
}

impl<'a> ScopeValidator<'a> {
    /// 创建校验器，可满足的作用域为图自身与所有祖先图的作用域
    pub fn new(graph: &'a DeclarationId, scopes: &[Scope], ancestors: &[AncestorGraph]) -> Self {
        let allowed = scopes
            .iter()
            .chain(ancestors.iter().flat_map(|ancestor| ancestor.scopes.iter()))
            .cloned()
            .collect();
        Self { graph, allowed }
    }

    /// 可满足的作用域
    pub fn allowed(&self) -> &BTreeSet<Scope> {
        &self.allowed
    }

    /// 按解析顺序检查每个有作用域的绑定
    pub fn validate(
        &self,
        bindings: &BTreeMap<TypeKey, Binding>,
        order: &[TypeKey],
    ) -> Vec<GraphError> {
        order
            .iter()
            .filter_map(|key| bindings.get(key))
            .filter_map(|binding| {
                let scope = binding.scope()?;
                if self.allowed.contains(scope) {
                    return None;
                }
                Some(GraphError::ScopeMismatch {
                    key: binding.key().clone(),
                    scope: scope.clone(),
                    graph: self.graph.clone(),
                    allowed: self.allowed.iter().cloned().collect(),
                    origin: binding.origin().clone(),
                })
            })
            .collect()
    }
}

/// 计算有作用域绑定的初始化顺序
///
/// 一个有作用域的绑定依赖经由无作用域绑定可达的所有有作用域绑定；
/// 允许循环中的延迟访问边不参与排序；并列时按声明标识、类型键排序
pub fn scoped_initialization_order(
    bindings: &BTreeMap<TypeKey, Binding>,
    edges: &[GraphEdge],
    ignored: &BTreeSet<DeferredEdge>,
) -> Vec<TypeKey> {
    let mut adjacency: HashMap<&TypeKey, Vec<&TypeKey>> = HashMap::new();
    for edge in edges {
        let deferred = DeferredEdge {
            from: edge.from.clone(),
            to: edge.to.clone(),
        };
        if edge.is_deferred() && ignored.contains(&deferred) {
            continue;
        }
        adjacency.entry(&edge.from).or_default().push(&edge.to);
    }

    let scoped: Vec<&Binding> = bindings.values().filter(|b| b.is_scoped()).collect();
    let mut depends_on: BTreeMap<&TypeKey, BTreeSet<&TypeKey>> = BTreeMap::new();
    let mut dependents: HashMap<&TypeKey, Vec<&TypeKey>> = HashMap::new();

    for binding in &scoped {
        let key = binding.key();
        let mut found = BTreeSet::new();
        let mut visited: HashSet<&TypeKey> = HashSet::new();
        let mut stack: Vec<&TypeKey> = adjacency.get(key).cloned().unwrap_or_default();
        while let Some(next) = stack.pop() {
            if !visited.insert(next) || next == key {
                continue;
            }
            match bindings.get(next) {
                Some(target) if target.is_scoped() => {
                    found.insert(next);
                }
                Some(_) => {
                    if let Some(targets) = adjacency.get(next) {
                        stack.extend(targets.iter().copied());
                    }
                }
                None => {}
            }
        }
        for dependency in &found {
            dependents.entry(*dependency).or_default().push(key);
        }
        depends_on.insert(key, found);
    }

    let tie_key = |key: &TypeKey| -> (DeclarationId, TypeKey) {
        let declaration = bindings
            .get(key)
            .map(|binding| binding.origin().declaration.clone())
            .unwrap_or_else(|| DeclarationId::new(""));
        (declaration, key.clone())
    };

    let mut remaining: HashMap<&TypeKey, usize> = depends_on
        .iter()
        .map(|(key, deps)| (*key, deps.len()))
        .collect();
    let mut ready: BTreeSet<(DeclarationId, TypeKey)> = remaining
        .iter()
        .filter(|(_, count)| **count == 0)
        .map(|(key, _)| tie_key(*key))
        .collect();
    let mut order = Vec::with_capacity(depends_on.len());

    while let Some(next) = ready.pop_first() {
        let (_, key) = next;
        remaining.remove(&key);
        if let Some(waiting) = dependents.get(&key) {
            for dependent in waiting {
                if let Some(count) = remaining.get_mut(dependent) {
                    *count -= 1;
                    if *count == 0 {
                        ready.insert(tie_key(*dependent));
                    }
                }
            }
        }
        order.push(key);
    }

    if !remaining.is_empty() {
        warn!("有作用域的绑定之间存在未打破的依赖环，剩余 {} 个按声明顺序追加", remaining.len());
        let mut rest: Vec<(DeclarationId, TypeKey)> =
            remaining.keys().map(|key| tie_key(*key)).collect();
        rest.sort();
        order.extend(rest.into_iter().map(|(_, key)| key));
    }

    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use infrastructure_common::{Origin, WrappedType};

    fn scoped(name: &str, site: &str, deps: &[&str]) -> Binding {
        Binding::provided(
            TypeKey::new(name),
            Origin::new(site),
            deps.iter().map(|d| TypeKey::new(*d).into()).collect(),
        )
        .scoped(Scope::new("AppScope"))
    }

    fn unscoped(name: &str, deps: &[&str]) -> Binding {
        Binding::provided(
            TypeKey::new(name),
            Origin::new(name),
            deps.iter().map(|d| TypeKey::new(*d).into()).collect(),
        )
    }

    fn graph(bindings: Vec<Binding>) -> (BTreeMap<TypeKey, Binding>, Vec<GraphEdge>) {
        let mut edges = Vec::new();
        for binding in &bindings {
            for dep in binding.dependencies() {
                edges.push(GraphEdge {
                    from: binding.key().clone(),
                    to: dep.key.clone(),
                    wrapper: dep.wrapper,
                    has_default: false,
                });
            }
        }
        let map = bindings.into_iter().map(|b| (b.key().clone(), b)).collect();
        (map, edges)
    }

    #[test]
    fn test_scope_leak_is_reported() {
        let leaking = Binding::provided(TypeKey::new("Session"), Origin::new("m.session"), vec![])
            .scoped(Scope::new("FeatureScope"));
        let (bindings, _) = graph(vec![leaking]);
        let id = DeclarationId::new("AppGraph");
        let validator = ScopeValidator::new(&id, &[Scope::new("AppScope")], &[]);
        let errors = validator.validate(&bindings, &[TypeKey::new("Session")]);
        assert!(matches!(
            &errors[..],
            [GraphError::ScopeMismatch { scope, .. }] if scope == &Scope::new("FeatureScope")
        ));
    }

    #[test]
    fn test_ancestor_scopes_are_inherited() {
        let ancestor = AncestorGraph {
            id: DeclarationId::new("AppGraph"),
            key: TypeKey::new("AppGraph"),
            scopes: vec![Scope::new("AppScope")],
            keys: BTreeSet::new(),
            multibindings: BTreeMap::new(),
        };
        let id = DeclarationId::new("LoggedInGraph");
        let validator = ScopeValidator::new(&id, &[Scope::new("UserScope")], &[ancestor]);
        let (bindings, _) = graph(vec![scoped("Db", "m.db", &[])]);
        assert!(validator.validate(&bindings, &[TypeKey::new("Db")]).is_empty());
    }

    #[test]
    fn test_order_follows_dependencies_through_unscoped() {
        // Api(scoped) -> Client(unscoped) -> Pool(scoped)
        let (bindings, edges) = graph(vec![
            scoped("Api", "a.Api", &["Client"]),
            unscoped("Client", &["Pool"]),
            scoped("Pool", "z.Pool", &[]),
            scoped("Clock", "b.Clock", &[]),
        ]);
        let order = scoped_initialization_order(&bindings, &edges, &BTreeSet::new());
        assert_eq!(
            order,
            vec![TypeKey::new("Clock"), TypeKey::new("Pool"), TypeKey::new("Api")]
        );
    }

    #[test]
    fn test_deferred_cycle_edges_are_ignored() {
        let mut a = scoped("A", "a.A", &["B"]);
        if let Binding::Provided { dependencies, .. } = &mut a {
            dependencies[0] = dependencies[0].clone().wrapped(WrappedType::Provider);
        }
        let (bindings, edges) = graph(vec![a, scoped("B", "b.B", &["A"])]);
        let ignored: BTreeSet<DeferredEdge> = [DeferredEdge {
            from: TypeKey::new("A"),
            to: TypeKey::new("B"),
        }]
        .into_iter()
        .collect();
        let order = scoped_initialization_order(&bindings, &edges, &ignored);
        assert_eq!(order, vec![TypeKey::new("A"), TypeKey::new("B")]);
    }
}

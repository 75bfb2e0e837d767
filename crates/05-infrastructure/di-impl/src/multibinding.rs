//! 多重绑定聚合
//!
//! 按集合类型键收集所有元素，排序去重后合成一个聚合绑定。
//! 扩展图的聚合结果包含祖先图已聚合的元素。

use di_abstractions::{
    Binding, CollectionKind, ElementKind, ElementSource, MultibindingElement,
    MultibindingSource, MultibindsDeclaration,
};
use infrastructure_common::{Dependency, Diagnostics, GraphError, Origin, TypeKey};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::debug;

/// 合并后的 `@Multibinds` 声明
#[derive(Debug, Clone, PartialEq, Eq)]
struct MergedDeclaration {
    origin: Origin,
    collection: CollectionKind,
    allow_empty: bool,
}

/// 多重绑定聚合器
///
/// 每个集合类型键的聚合结果只计算一次
#[derive(Debug, Default)]
pub struct MultibindingAggregator {
    declarations: BTreeMap<TypeKey, MergedDeclaration>,
    elements: BTreeMap<TypeKey, Vec<MultibindingElement>>,
    cache: HashMap<TypeKey, Option<Binding>>,
}

impl MultibindingAggregator {
    /// 创建聚合器
    pub fn new(
        multibinds: impl IntoIterator<Item = MultibindsDeclaration>,
        elements: impl IntoIterator<Item = MultibindingElement>,
    ) -> Self {
        let mut declarations: BTreeMap<TypeKey, MergedDeclaration> = BTreeMap::new();
        for declaration in multibinds {
            let key = declaration.collection.key();
            match declarations.get_mut(&key) {
                Some(merged) => {
                    merged.allow_empty |= declaration.allow_empty;
                    if declaration.origin < merged.origin {
                        merged.origin = declaration.origin;
                    }
                }
                None => {
                    declarations.insert(
                        key,
                        MergedDeclaration {
                            origin: declaration.origin,
                            collection: declaration.collection,
                            allow_empty: declaration.allow_empty,
                        },
                    );
                }
            }
        }

        let mut grouped: BTreeMap<TypeKey, Vec<MultibindingElement>> = BTreeMap::new();
        for element in elements {
            grouped
                .entry(element.collection.key())
                .or_default()
                .push(element);
        }
        for contributors in grouped.values_mut() {
            contributors.sort_by(|a, b| {
                a.origin
                    .declaration
                    .cmp(&b.origin.declaration)
                    .then_with(|| a.map_key().cmp(&b.map_key()))
            });
            contributors.dedup_by(|later, earlier| {
                later.origin.declaration == earlier.origin.declaration
                    && later.map_key() == earlier.map_key()
            });
        }

        Self {
            declarations,
            elements: grouped,
            cache: HashMap::new(),
        }
    }

    /// 是否为已知的集合类型键
    pub fn is_collection(&self, key: &TypeKey) -> bool {
        self.declarations.contains_key(key) || self.elements.contains_key(key)
    }

    /// 所有集合类型键
    pub fn collection_keys(&self) -> Vec<TypeKey> {
        let mut keys: Vec<TypeKey> = self
            .declarations
            .keys()
            .chain(self.elements.keys())
            .cloned()
            .collect();
        keys.sort();
        keys.dedup();
        keys
    }

    /// 集合的元素（已排序去重）
    pub fn contributors(&self, key: &TypeKey) -> &[MultibindingElement] {
        self.elements.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// 物化所有元素绑定，供注册到绑定目录
    pub fn element_bindings(&self) -> Vec<Binding> {
        self.elements
            .values()
            .flatten()
            .map(|element| {
                let key = element.element_key();
                let origin = element.origin.clone();
                match &element.source {
                    ElementSource::Provided {
                        dependencies,
                        scope,
                    } => Binding::Provided {
                        key,
                        origin,
                        scope: scope.clone(),
                        dependencies: dependencies.clone(),
                    },
                    ElementSource::Binds { target } => Binding::Alias {
                        key,
                        origin,
                        target: Dependency::new(target.clone()),
                    },
                }
            })
            .collect()
    }

    /// 解析集合类型键，错误只在首次解析时报告
    ///
    /// `inherited` 为祖先图已聚合的元素
    pub fn resolve(
        &mut self,
        key: &TypeKey,
        inherited: &[MultibindingSource],
        diagnostics: &mut Diagnostics,
    ) -> Option<Binding> {
        if let Some(cached) = self.cache.get(key) {
            return cached.clone();
        }
        let (binding, errors) = self.aggregate_with(key, inherited);
        for error in errors {
            diagnostics.report(error);
        }
        self.cache.insert(key.clone(), binding.clone());
        binding
    }

    /// 计算聚合结果
    pub fn aggregate(&self, key: &TypeKey) -> (Option<Binding>, Vec<GraphError>) {
        self.aggregate_with(key, &[])
    }

    /// 在祖先图元素的基础上计算聚合结果
    pub fn aggregate_with(
        &self,
        key: &TypeKey,
        inherited: &[MultibindingSource],
    ) -> (Option<Binding>, Vec<GraphError>) {
        let declaration = self.declarations.get(key);
        let contributors = self.contributors(key);
        let own_keys: BTreeSet<TypeKey> = contributors
            .iter()
            .map(MultibindingElement::element_key)
            .collect();
        let inherited: Vec<&MultibindingSource> = inherited
            .iter()
            .filter(|source| !own_keys.contains(&source.element_key))
            .collect();
        let collection = match (declaration, contributors.first()) {
            (Some(declaration), _) => declaration.collection.clone(),
            (None, Some(first)) => first.collection.clone(),
            (None, None) => return (None, Vec::new()),
        };
        let origin = declaration
            .map(|d| d.origin.clone())
            .unwrap_or_else(|| Origin::synthetic(key.render()));
        let allow_empty = declaration.is_some_and(|d| d.allow_empty);
        let mut errors = Vec::new();

        if let Some(problem) = collection.shape_problem() {
            errors.push(GraphError::multibinding(key.clone(), problem, Some(origin.clone())));
        }

        if contributors.is_empty() && inherited.is_empty() && !allow_empty {
            errors.push(GraphError::multibinding(
                key.clone(),
                "声明为非空，但没有任何贡献",
                Some(origin.clone()),
            ));
        }

        let mut seen_map_keys: BTreeMap<&str, &Origin> = BTreeMap::new();
        for source in &inherited {
            if let Some(map_key) = &source.map_key {
                seen_map_keys.insert(map_key.value.as_str(), &source.origin);
            }
        }
        for element in contributors {
            match (&collection, &element.kind) {
                (CollectionKind::Map { key_type, .. }, ElementKind::IntoMap { map_key }) => {
                    if &map_key.type_name != key_type {
                        errors.push(GraphError::multibinding(
                            key.clone(),
                            format!("Map 键类型 {} 与集合键类型 {} 不一致", map_key.type_name, key_type),
                            Some(element.origin.clone()),
                        ));
                    }
                    match seen_map_keys.get(map_key.value.as_str()) {
                        Some(first) => errors.push(GraphError::DuplicateMapKey {
                            key: key.clone(),
                            map_key: map_key.value.clone(),
                            first: (*first).clone(),
                            second: element.origin.clone(),
                        }),
                        None => {
                            seen_map_keys.insert(&map_key.value, &element.origin);
                        }
                    }
                }
                (CollectionKind::Map { .. }, _) => errors.push(GraphError::multibinding(
                    key.clone(),
                    "Map 多重绑定的元素必须带有 Map 键",
                    Some(element.origin.clone()),
                )),
                (CollectionKind::Set { .. }, ElementKind::IntoMap { .. }) => {
                    errors.push(GraphError::multibinding(
                        key.clone(),
                        "Set 多重绑定的元素不能带有 Map 键",
                        Some(element.origin.clone()),
                    ))
                }
                (CollectionKind::Set { .. }, _) => {}
            }
        }

        let mut sources: Vec<MultibindingSource> = contributors
            .iter()
            .map(|element| MultibindingSource {
                origin: element.origin.clone(),
                element_key: element.element_key(),
                map_key: element.map_key().cloned(),
            })
            .chain(inherited.iter().map(|source| (*source).clone()))
            .collect();
        sources.sort_by(|a, b| {
            a.origin
                .declaration
                .cmp(&b.origin.declaration)
                .then_with(|| a.map_key.cmp(&b.map_key))
                .then_with(|| a.element_key.cmp(&b.element_key))
        });
        let dependencies = sources
            .iter()
            .map(|source| Dependency::new(source.element_key.clone()))
            .collect();
        debug!(
            "聚合多重绑定 {}: {} 个元素（继承 {} 个）",
            key,
            sources.len(),
            inherited.len()
        );

        let binding = Binding::Multibinding {
            key: key.clone(),
            origin,
            collection,
            allow_empty,
            sources,
            dependencies,
        };
        (Some(binding), errors)
    }
}

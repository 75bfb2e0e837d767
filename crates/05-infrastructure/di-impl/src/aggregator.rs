//! 贡献聚合
//!
//! 对每个 (作用域, 类型键) 分组依次应用：排除、替换、优先级排序。
//! 所有排序与裁决只依赖声明标识，不依赖发现顺序。

use di_abstractions::{
    Binding, CollectionKind, ContributionKind, ContributionProvider, ContributionRecord,
    ElementKind, ElementSource, MultibindingElement, MultibindsDeclaration,
};
use infrastructure_common::{DeclarationId, Diagnostics, GraphError, Scope, TypeKey};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

/// 聚合结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregatedContributions {
    /// 生效的绑定（容器中的绑定与胜出的超类型别名）
    pub bindings: Vec<Binding>,
    /// 容器中的 `@Multibinds` 声明
    pub multibinds: Vec<MultibindsDeclaration>,
    /// 多重绑定元素
    pub elements: Vec<MultibindingElement>,
    /// 生效的容器声明
    pub containers: Vec<DeclarationId>,
    /// 被排除的声明
    pub excluded: Vec<DeclarationId>,
    /// 被替换的声明
    pub replaced: Vec<DeclarationId>,
}

/// 内存中的贡献提供者
#[derive(Debug, Clone, Default)]
pub struct StaticContributionProvider {
    records: Vec<ContributionRecord>,
}

impl StaticContributionProvider {
    /// 创建提供者
    pub fn new(records: Vec<ContributionRecord>) -> Self {
        Self { records }
    }

    /// 添加贡献记录
    pub fn add(&mut self, record: ContributionRecord) {
        self.records.push(record);
    }

    /// 记录数量
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl ContributionProvider for StaticContributionProvider {
    fn contributions(&self, scope: &Scope) -> Vec<ContributionRecord> {
        self.records
            .iter()
            .filter(|record| &record.scope == scope)
            .cloned()
            .collect()
    }

    fn name(&self) -> &str {
        "StaticContributionProvider"
    }
}

/// 检查贡献记录的绑定类型
pub fn validate_record(record: &ContributionRecord) -> Result<(), GraphError> {
    if record.kind == ContributionKind::ContributesTo {
        return Ok(());
    }
    let contributed = &record.contributed_type;
    match &record.bound_type {
        Some(bound) => {
            if bound.type_name == contributed.type_name {
                return Err(GraphError::invalid_contribution(
                    record.origin.clone(),
                    format!("显式绑定类型 {} 不能与贡献类型相同", bound.type_name),
                ));
            }
            if !record
                .supertypes
                .iter()
                .any(|supertype| supertype.type_name == bound.type_name)
            {
                return Err(GraphError::invalid_contribution(
                    record.origin.clone(),
                    format!("{} 没有实现绑定类型 {}", contributed.type_name, bound.type_name),
                ));
            }
        }
        None if record.supertypes.len() != 1 => {
            return Err(GraphError::invalid_contribution(
                record.origin.clone(),
                format!(
                    "{} 有 {} 个超类型，需要显式指定绑定类型",
                    contributed.type_name,
                    record.supertypes.len()
                ),
            ));
        }
        None => {}
    }
    if record.kind == ContributionKind::ContributesIntoMap && record.map_key.is_none() {
        return Err(GraphError::invalid_contribution(
            record.origin.clone(),
            "ContributesIntoMap 需要指定 Map 键",
        ));
    }
    Ok(())
}

/// 贡献聚合器
pub struct ContributionAggregator<'a> {
    provider: &'a dyn ContributionProvider,
}

impl<'a> ContributionAggregator<'a> {
    /// 创建聚合器
    pub fn new(provider: &'a dyn ContributionProvider) -> Self {
        Self { provider }
    }

    /// 聚合作用域内的贡献
    pub fn aggregate(
        &self,
        scopes: &[Scope],
        excludes: &[DeclarationId],
        diagnostics: &mut Diagnostics,
    ) -> AggregatedContributions {
        let scopes: BTreeSet<&Scope> = scopes.iter().collect();
        let mut records: Vec<ContributionRecord> = scopes
            .iter()
            .flat_map(|scope| self.provider.contributions(scope))
            .collect();
        records.sort_by(|a, b| {
            a.declaration()
                .cmp(b.declaration())
                .then_with(|| a.kind.cmp(&b.kind))
                .then_with(|| a.scope.cmp(&b.scope))
                .then_with(|| a.contributed_type.cmp(&b.contributed_type))
        });
        records.dedup();
        info!(
            "从 {} 聚合 {} 个作用域的贡献: {} 条",
            self.provider.name(),
            scopes.len(),
            records.len()
        );

        let mut result = AggregatedContributions::default();
        let excludes: BTreeSet<&DeclarationId> = excludes.iter().collect();

        let mut valid = Vec::with_capacity(records.len());
        for record in records {
            match validate_record(&record) {
                Ok(()) => valid.push(record),
                Err(error) => {
                    diagnostics.report(error);
                }
            }
        }

        let (excluded, survivors): (Vec<_>, Vec<_>) = valid
            .into_iter()
            .partition(|record| excludes.contains(record.declaration()));
        for record in &excluded {
            debug!("排除贡献: {}", record.declaration());
        }
        result.excluded = excluded.iter().map(|r| r.declaration().clone()).collect();

        let replaced: BTreeSet<DeclarationId> = survivors
            .iter()
            .flat_map(|record| record.replaces.iter().cloned())
            .collect();
        let (replaced_records, survivors): (Vec<_>, Vec<_>) = survivors
            .into_iter()
            .partition(|record| replaced.contains(record.declaration()));
        for record in &replaced_records {
            debug!("贡献被替换: {}", record.declaration());
        }
        result.replaced = replaced_records
            .iter()
            .map(|r| r.declaration().clone())
            .collect();

        let mut ranked: BTreeMap<(Scope, TypeKey), Vec<ContributionRecord>> = BTreeMap::new();
        for record in survivors {
            match record.kind {
                ContributionKind::ContributesTo => {
                    result.containers.push(record.declaration().clone());
                    result.bindings.extend(record.bindings);
                    result.multibinds.extend(record.multibinds);
                    result.elements.extend(record.elements);
                }
                ContributionKind::ContributesBinding => {
                    if let Some(bound_key) = record.bound_key() {
                        ranked
                            .entry((record.scope.clone(), bound_key))
                            .or_default()
                            .push(record);
                    }
                }
                ContributionKind::ContributesIntoSet => {
                    if let Some(bound_key) = record.bound_key() {
                        result.elements.push(MultibindingElement {
                            origin: record.origin.clone(),
                            collection: CollectionKind::Set { element: bound_key },
                            kind: ElementKind::IntoSet,
                            source: ElementSource::Binds {
                                target: record.contributed_type.clone(),
                            },
                        });
                    }
                }
                ContributionKind::ContributesIntoMap => {
                    if let (Some(bound_key), Some(map_key)) =
                        (record.bound_key(), record.map_key.clone())
                    {
                        result.elements.push(MultibindingElement {
                            origin: record.origin.clone(),
                            collection: CollectionKind::Map {
                                key_type: map_key.type_name.clone(),
                                value: bound_key,
                            },
                            kind: ElementKind::IntoMap { map_key },
                            source: ElementSource::Binds {
                                target: record.contributed_type.clone(),
                            },
                        });
                    }
                }
            }
        }

        for ((scope, key), candidates) in ranked {
            if let Some(winner) = Self::select(&scope, &key, &candidates, diagnostics) {
                debug!("{} 在作用域 {} 中绑定到 {}", key, scope, winner.contributed_type);
                result.bindings.push(Binding::alias(
                    key,
                    winner.origin.clone(),
                    winner.contributed_type.clone(),
                ));
            }
        }

        result
    }

    /// 在同一类型键的候选中选出最高优先级
    fn select<'r>(
        scope: &Scope,
        key: &TypeKey,
        candidates: &'r [ContributionRecord],
        diagnostics: &mut Diagnostics,
    ) -> Option<&'r ContributionRecord> {
        let top = candidates.iter().map(|record| record.rank).max()?;
        let tied: Vec<&ContributionRecord> = candidates
            .iter()
            .filter(|record| record.rank == top)
            .collect();
        if tied.len() > 1 {
            diagnostics.report(GraphError::DuplicateContribution {
                scope: scope.clone(),
                key: key.clone(),
                rank: top,
                candidates: tied.iter().map(|record| record.origin.clone()).collect(),
            });
            return None;
        }
        tied.first().copied()
    }
}

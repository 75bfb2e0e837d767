//! 贡献记录与贡献提供者接口
//!
//! 跨编译单元的贡献如何被发现不属于解析核心，核心只通过
//! [`ContributionProvider`] 拿到已合并的扁平记录列表。

use crate::binding::Binding;
use crate::multibinding::{MapKey, MultibindingElement, MultibindsDeclaration};
use infrastructure_common::{DeclarationId, Origin, Scope, TypeKey};
use serde::{Deserialize, Serialize};

/// 贡献类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ContributionKind {
    /// 向作用域贡献一个绑定容器
    ContributesTo,
    /// 把类型绑定为其超类型
    ContributesBinding,
    /// 作为 Set 元素贡献
    ContributesIntoSet,
    /// 作为 Map 条目贡献
    ContributesIntoMap,
}

/// 贡献记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributionRecord {
    /// 声明来源
    pub origin: Origin,
    /// 目标作用域
    pub scope: Scope,
    /// 贡献类别
    pub kind: ContributionKind,
    /// 贡献的类型
    pub contributed_type: TypeKey,
    /// 显式绑定类型
    #[serde(default)]
    pub bound_type: Option<TypeKey>,
    /// 绑定到超类型时使用的限定符
    #[serde(default)]
    pub qualifier: Option<String>,
    /// 贡献类型的直接超类型
    #[serde(default)]
    pub supertypes: Vec<TypeKey>,
    /// 优先级，未指定时最低
    #[serde(default)]
    pub rank: Option<i32>,
    /// 被替换的声明
    #[serde(default)]
    pub replaces: Vec<DeclarationId>,
    /// Map 键
    #[serde(default)]
    pub map_key: Option<MapKey>,
    /// 容器中的绑定
    #[serde(default)]
    pub bindings: Vec<Binding>,
    /// 容器中的 `@Multibinds` 声明
    #[serde(default)]
    pub multibinds: Vec<MultibindsDeclaration>,
    /// 容器中的多重绑定元素
    #[serde(default)]
    pub elements: Vec<MultibindingElement>,
}

impl ContributionRecord {
    /// 创建贡献记录
    pub fn new(
        origin: Origin,
        scope: Scope,
        kind: ContributionKind,
        contributed_type: TypeKey,
    ) -> Self {
        Self {
            origin,
            scope,
            kind,
            contributed_type,
            bound_type: None,
            qualifier: None,
            supertypes: Vec::new(),
            rank: None,
            replaces: Vec::new(),
            map_key: None,
            bindings: Vec::new(),
            multibinds: Vec::new(),
            elements: Vec::new(),
        }
    }

    /// 创建 `ContributesBinding` 记录，声明来源即贡献类型
    pub fn binding(scope: Scope, contributed_type: TypeKey, supertype: TypeKey) -> Self {
        let origin = Origin::new(contributed_type.type_name.clone());
        Self::new(origin, scope, ContributionKind::ContributesBinding, contributed_type)
            .with_supertypes(vec![supertype])
    }

    /// 创建 `ContributesTo` 容器记录
    pub fn container(origin: Origin, scope: Scope, bindings: Vec<Binding>) -> Self {
        let contributed_type = TypeKey::new(origin.declaration.as_str());
        let mut record = Self::new(origin, scope, ContributionKind::ContributesTo, contributed_type);
        record.bindings = bindings;
        record
    }

    /// 声明标识
    pub fn declaration(&self) -> &DeclarationId {
        &self.origin.declaration
    }

    /// 设置优先级
    pub fn with_rank(mut self, rank: i32) -> Self {
        self.rank = Some(rank);
        self
    }

    /// 设置显式绑定类型
    pub fn with_bound_type(mut self, bound_type: TypeKey) -> Self {
        self.bound_type = Some(bound_type);
        self
    }

    /// 设置超类型
    pub fn with_supertypes(mut self, supertypes: Vec<TypeKey>) -> Self {
        self.supertypes = supertypes;
        self
    }

    /// 设置被替换的声明
    pub fn with_replaces(mut self, replaces: Vec<DeclarationId>) -> Self {
        self.replaces = replaces;
        self
    }

    /// 设置 Map 键
    pub fn with_map_key(mut self, map_key: MapKey) -> Self {
        self.map_key = Some(map_key);
        self
    }

    /// 设置限定符
    pub fn with_qualifier(mut self, qualifier: impl Into<String>) -> Self {
        self.qualifier = Some(qualifier.into());
        self
    }

    /// 绑定到的超类型（不含限定符）
    ///
    /// 未显式指定时要求恰好一个超类型
    pub fn effective_bound_type(&self) -> Option<&TypeKey> {
        match &self.bound_type {
            Some(bound) => Some(bound),
            None if self.supertypes.len() == 1 => self.supertypes.first(),
            None => None,
        }
    }

    /// 绑定到的类型键（含限定符）
    pub fn bound_key(&self) -> Option<TypeKey> {
        let bound = self.effective_bound_type()?;
        let mut key = TypeKey::new(bound.type_name.clone());
        key.qualifier = self.qualifier.clone().or_else(|| bound.qualifier.clone());
        Some(key)
    }
}

/// 贡献提供者 trait
///
/// 返回对某个作用域可见的全部贡献记录，顺序无关
pub trait ContributionProvider: Send + Sync {
    /// 获取指定作用域的贡献记录
    fn contributions(&self, scope: &Scope) -> Vec<ContributionRecord>;

    /// 获取提供者名称
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_implicit_bound_type_requires_single_supertype() {
        let scope = Scope::new("AppScope");
        let record = ContributionRecord::binding(
            scope.clone(),
            TypeKey::new("RealClock"),
            TypeKey::new("Clock"),
        );
        assert_eq!(record.bound_key(), Some(TypeKey::new("Clock")));

        let ambiguous = record
            .clone()
            .with_supertypes(vec![TypeKey::new("Clock"), TypeKey::new("Closeable")]);
        assert_eq!(ambiguous.bound_key(), None);

        let explicit = ambiguous.with_bound_type(TypeKey::new("Closeable"));
        assert_eq!(explicit.bound_key(), Some(TypeKey::new("Closeable")));
    }

    #[test]
    fn test_qualifier_applies_to_bound_key() {
        let record = ContributionRecord::binding(
            Scope::new("AppScope"),
            TypeKey::new("ApiClient"),
            TypeKey::new("HttpClient"),
        )
        .with_qualifier("Named(\"api\")");
        assert_eq!(
            record.bound_key(),
            Some(TypeKey::qualified("HttpClient", "Named(\"api\")"))
        );
    }
}

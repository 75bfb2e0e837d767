//! 图元数据报告
//!
//! 每个通过校验的图输出一份带版本号的 JSON 报告，供外部诊断工具读取。
//! 报告中所有列表均按确定顺序排列，相同输入产生逐字节相同的输出。

use di_abstractions::{Binding, BindingGraph, EntryPoint, PropertyKind};
use infrastructure_common::{DeclarationId, Dependency, Origin};
use serde::{Deserialize, Serialize};

/// 报告格式版本
pub const REPORT_SCHEMA_VERSION: u32 = 1;

/// 报告输出子目录
pub const REPORT_DIRECTORY: &str = "graph-metadata";

/// 单个图的元数据报告
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphMetadataReport {
    pub schema_version: u32,
    pub graph: String,
    pub key: String,
    pub scopes: Vec<String>,
    pub aggregation_scopes: Vec<String>,
    pub roots: RootsReport,
    pub extensions: Vec<String>,
    pub bindings: Vec<BindingReport>,
    pub scoped_order: Vec<String>,
    pub deferred_edges: Vec<DeferredEdgeReport>,
    pub unused: Vec<String>,
}

/// 图的入口
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RootsReport {
    pub accessors: Vec<AccessorReport>,
    pub injectors: Vec<InjectorReport>,
}

/// 访问器入口
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessorReport {
    pub name: String,
    pub key: String,
    pub is_deferrable: bool,
}

/// 注入函数入口
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InjectorReport {
    pub name: String,
    pub key: String,
}

/// 单个绑定
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BindingReport {
    pub key: String,
    pub binding_kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    pub is_scoped: bool,
    pub name_hint: String,
    pub dependencies: Vec<DependencyReport>,
    pub is_synthetic: bool,
    pub origin: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multibinding: Option<MultibindingReport>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias_target: Option<String>,
    pub property: String,
}

/// 依赖边
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyReport {
    pub key: String,
    pub has_default: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wrapper_type: Option<String>,
    pub is_deferrable: bool,
}

/// 多重绑定信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultibindingReport {
    #[serde(rename = "type")]
    pub collection_type: String,
    pub allow_empty: bool,
    pub sources: Vec<String>,
}

/// 允许循环中的延迟边
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeferredEdgeReport {
    pub from: String,
    pub to: String,
}

impl GraphMetadataReport {
    /// 从已校验的绑定图生成报告
    pub fn from_graph(graph: &BindingGraph) -> Self {
        let mut roots = RootsReport::default();
        for entry_point in &graph.entry_points {
            match entry_point {
                EntryPoint::Accessor { name, dependency } => roots.accessors.push(AccessorReport {
                    name: name.clone(),
                    key: dependency.key.render(),
                    is_deferrable: dependency.is_deferrable(),
                }),
                EntryPoint::Injector { name, target } => roots.injectors.push(InjectorReport {
                    name: name.clone(),
                    key: target.render(),
                }),
            }
        }
        roots.accessors.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.key.cmp(&b.key)));
        roots.injectors.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.key.cmp(&b.key)));

        let mut bindings: Vec<BindingReport> = graph
            .bindings
            .values()
            .map(|binding| binding_report(graph, binding))
            .collect();
        bindings.sort_by(|a, b| a.key.cmp(&b.key));

        let mut extensions: Vec<String> = graph
            .extensions
            .iter()
            .map(|id| id.as_str().to_string())
            .collect();
        extensions.sort();

        Self {
            schema_version: REPORT_SCHEMA_VERSION,
            graph: graph.id.as_str().to_string(),
            key: graph.key.render(),
            scopes: graph.scopes.iter().map(ToString::to_string).collect(),
            aggregation_scopes: graph
                .aggregation_scopes
                .iter()
                .map(ToString::to_string)
                .collect(),
            roots,
            extensions,
            bindings,
            scoped_order: graph.scoped_order.iter().map(|key| key.render()).collect(),
            deferred_edges: graph
                .deferred_edges()
                .into_iter()
                .map(|edge| DeferredEdgeReport {
                    from: edge.from.render(),
                    to: edge.to.render(),
                })
                .collect(),
            unused: graph.unused.iter().map(|key| key.render()).collect(),
        }
    }

    /// 报告文件名
    pub fn file_name(&self) -> String {
        format!(
            "graph-{}.json",
            DeclarationId::new(self.graph.clone()).file_stem()
        )
    }

    /// 格式化为 JSON
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

fn binding_report(graph: &BindingGraph, binding: &Binding) -> BindingReport {
    let origin: &Origin = binding.origin();
    let multibinding = match binding {
        Binding::Multibinding {
            collection,
            allow_empty,
            sources,
            ..
        } => Some(MultibindingReport {
            collection_type: collection.type_name().to_string(),
            allow_empty: *allow_empty,
            sources: sources.iter().map(|source| source.element_key.render()).collect(),
        }),
        _ => None,
    };
    let property = match graph.properties.kind_of(binding.key()) {
        Some(PropertyKind::Field) => "FIELD",
        Some(PropertyKind::Inline) | None => "INLINE",
    };

    BindingReport {
        key: binding.key().render(),
        binding_kind: binding.kind().name().to_string(),
        scope: binding.scope().map(ToString::to_string),
        is_scoped: binding.is_scoped(),
        name_hint: binding.name_hint(),
        dependencies: binding.dependencies().iter().map(dependency_report).collect(),
        is_synthetic: origin.synthetic,
        origin: origin.to_string(),
        multibinding,
        alias_target: binding.alias_target().map(|target| target.render()),
        property: property.to_string(),
    }
}

fn dependency_report(dependency: &Dependency) -> DependencyReport {
    DependencyReport {
        key: dependency.key.render(),
        has_default: dependency.has_default,
        wrapper_type: dependency.wrapper.wrapper_name().map(str::to_string),
        is_deferrable: dependency.is_deferrable(),
    }
}

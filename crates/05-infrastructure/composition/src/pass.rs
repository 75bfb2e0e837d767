//! 编译过程驱动
//!
//! 依次解析每个根图，再在父图解析成功后递归解析其扩展图。
//! 扩展图要求父图保留的绑定会让父图带着这些类型键重新构建，
//! 直到不再产生新的保留请求。
//! 声明索引与贡献提供者在整个过程中共享，每个图独立构建。

use crate::facts::FactSet;
use di_abstractions::{AncestorGraph, BindingGraph, ContributionProvider, GraphDeclaration};
use di_impl::{
    DeclarationIndex, GraphAnalyzer, GraphBuilder, GraphMetadataReport, GraphStatistics,
    REPORT_DIRECTORY,
};
use infrastructure_common::{
    DeclarationId, DiagnosticReport, ResolverError, ResolverOptions, ResolverResult, TypeKey,
};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// 一次编译过程的结果
#[derive(Debug, Default)]
pub struct PassOutcome {
    /// 成功解析的图，父图在前
    pub graphs: Vec<BindingGraph>,
    /// 解析失败的图
    pub failures: Vec<(DeclarationId, DiagnosticReport)>,
    /// 因父图失败而跳过的扩展图
    pub skipped: Vec<DeclarationId>,
}

impl PassOutcome {
    /// 是否全部成功
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// 查找已解析的图
    pub fn graph(&self, id: &str) -> Option<&BindingGraph> {
        self.graphs.iter().find(|graph| graph.id.as_str() == id)
    }

    /// 转换为结果，存在失败时返回第一个失败
    pub fn into_result(self) -> ResolverResult<Vec<BindingGraph>> {
        match self.failures.into_iter().next() {
            Some((graph, report)) => Err(ResolverError::GraphResolutionFailed { graph, report }),
            None => Ok(self.graphs),
        }
    }
}

/// 绑定图解析器
#[derive(Debug, Clone)]
pub struct Resolver {
    options: ResolverOptions,
}

impl Resolver {
    /// 使用给定选项创建解析器
    pub fn new(options: ResolverOptions) -> Self {
        Self { options }
    }

    /// 解析器选项
    pub fn options(&self) -> &ResolverOptions {
        &self.options
    }

    /// 解析事实集中的所有图
    pub fn resolve_all(&self, facts: &FactSet) -> PassOutcome {
        info!("开始编译过程: {} 个图声明", facts.graph_count());
        let index = facts.index();
        let provider = facts.contribution_provider();
        let mut outcome = PassOutcome::default();

        let mut roots: Vec<&GraphDeclaration> = facts.graphs.iter().collect();
        roots.sort_by(|a, b| a.id().cmp(b.id()));
        for declaration in roots {
            let unmet = self.resolve_tree(&index, &provider, declaration, &[], &mut outcome);
            for (graph, keys) in unmet {
                warn!("保留请求没有对应的祖先图 {}: {} 个类型键", graph, keys.len());
            }
        }

        info!(
            "编译过程完成: {} 个成功, {} 个失败, {} 个跳过",
            outcome.graphs.len(),
            outcome.failures.len(),
            outcome.skipped.len()
        );
        outcome
    }

    /// 解析并在配置了输出目录时写出报告
    pub fn run(&self, facts: &FactSet) -> ResolverResult<Vec<BindingGraph>> {
        let outcome = self.resolve_all(facts);
        for (graph, report) in &outcome.failures {
            error!("图 {} 解析失败:\n{}", graph, report);
        }
        let graphs = outcome.into_result()?;
        if let Some(destination) = &self.options.reports_destination {
            write_reports(&graphs, destination)?;
        }
        Ok(graphs)
    }

    /// 解析一个图及其扩展图，返回子树对更上层祖先图的保留请求
    fn resolve_tree(
        &self,
        index: &DeclarationIndex,
        provider: &dyn ContributionProvider,
        declaration: &GraphDeclaration,
        ancestors: &[AncestorGraph],
        outcome: &mut PassOutcome,
    ) -> BTreeMap<DeclarationId, BTreeSet<TypeKey>> {
        let mut retained: BTreeSet<TypeKey> = BTreeSet::new();
        loop {
            let builder =
                GraphBuilder::new(index, self.options.clone()).retaining(retained.iter().cloned());
            let graph = match builder.build(declaration, provider, ancestors) {
                Ok(graph) => graph,
                Err(report) => {
                    outcome.failures.push((declaration.id().clone(), report));
                    skip_extensions(declaration, &mut outcome.skipped);
                    return BTreeMap::new();
                }
            };

            let mut nested = Vec::with_capacity(ancestors.len() + 1);
            nested.push(AncestorGraph::from_graph(&graph));
            nested.extend(ancestors.iter().cloned());

            let mut subtree = PassOutcome::default();
            let mut requests = graph.ancestor_requests.clone();
            let mut extensions: Vec<&GraphDeclaration> = declaration.extensions.iter().collect();
            extensions.sort_by(|a, b| a.id().cmp(b.id()));
            for extension in extensions {
                debug!("解析扩展图 {} (父图 {})", extension.id(), declaration.id());
                for (target, keys) in self.resolve_tree(index, provider, extension, &nested, &mut subtree) {
                    requests.entry(target).or_default().extend(keys);
                }
            }

            let wanted: BTreeSet<TypeKey> = requests
                .remove(declaration.id())
                .unwrap_or_default()
                .into_iter()
                .filter(|key| !graph.contains(key) && !retained.contains(key))
                .collect();
            if wanted.is_empty() {
                outcome.graphs.push(graph);
                outcome.graphs.extend(subtree.graphs);
                outcome.failures.extend(subtree.failures);
                outcome.skipped.extend(subtree.skipped);
                return requests;
            }

            info!(
                "扩展图要求图 {} 保留 {} 个绑定，重新构建",
                declaration.id(),
                wanted.len()
            );
            retained.extend(wanted);
        }
    }
}

fn skip_extensions(declaration: &GraphDeclaration, skipped: &mut Vec<DeclarationId>) {
    for extension in &declaration.extensions {
        warn!("父图 {} 解析失败，跳过扩展图 {}", declaration.id(), extension.id());
        skipped.push(extension.id().clone());
        skip_extensions(extension, skipped);
    }
}

/// 写出所有图的元数据报告，返回写出的文件路径
pub fn write_reports(graphs: &[BindingGraph], destination: &Path) -> ResolverResult<Vec<PathBuf>> {
    let directory = destination.join(REPORT_DIRECTORY);
    std::fs::create_dir_all(&directory).map_err(|source| ResolverError::ReportWriteFailed {
        path: directory.display().to_string(),
        source,
    })?;

    let mut written = Vec::with_capacity(graphs.len());
    for graph in graphs {
        let report = GraphMetadataReport::from_graph(graph);
        let path = directory.join(report.file_name());
        let content = report
            .to_json_pretty()
            .map_err(|source| ResolverError::ReportSerializationFailed {
                path: path.display().to_string(),
                source,
            })?;
        std::fs::write(&path, content).map_err(|source| ResolverError::ReportWriteFailed {
            path: path.display().to_string(),
            source,
        })?;
        debug!("写出图元数据报告: {}", path.display());
        written.push(path);
    }
    info!("写出 {} 份图元数据报告到 {}", written.len(), directory.display());
    Ok(written)
}

/// 汇总所有图的统计信息
pub fn summarize(graphs: &[BindingGraph]) -> Vec<(DeclarationId, GraphStatistics)> {
    graphs
        .iter()
        .map(|graph| (graph.id.clone(), GraphAnalyzer::new(graph).statistics()))
        .collect()
}

//! 声明事实集
//!
//! 前端扫描源码后产出的规范化声明，按 JSON 或 TOML 文档交给解析过程

use di_abstractions::{AssistedFactoryDeclaration, ContributionRecord, GraphDeclaration, InjectableClass};
use di_impl::{DeclarationIndex, StaticContributionProvider};
use infrastructure_common::{ResolverError, ResolverResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

/// 事实集文档格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FactFormat {
    Json,
    Toml,
}

impl FactFormat {
    /// 按扩展名判断格式，未知扩展名按 JSON 处理
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Self::Toml,
            _ => Self::Json,
        }
    }
}

/// 一次编译的全部声明事实
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FactSet {
    /// 可注入类
    pub classes: Vec<InjectableClass>,
    /// 辅助注入工厂
    pub assisted_factories: Vec<AssistedFactoryDeclaration>,
    /// 跨编译单元的贡献
    pub contributions: Vec<ContributionRecord>,
    /// 根图声明（扩展图嵌套在父图中）
    pub graphs: Vec<GraphDeclaration>,
}

impl FactSet {
    /// 从文件加载
    pub fn load(path: impl AsRef<Path>) -> ResolverResult<Self> {
        let path = path.as_ref();
        info!("加载声明事实: {}", path.display());
        let content = std::fs::read_to_string(path).map_err(|e| ResolverError::FactsLoadFailed {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let facts = Self::parse(&content, FactFormat::from_path(path)).map_err(|message| {
            ResolverError::FactsLoadFailed {
                path: path.display().to_string(),
                message,
            }
        })?;
        debug!(
            "声明事实: {} 个类, {} 个贡献, {} 个根图",
            facts.classes.len(),
            facts.contributions.len(),
            facts.graphs.len()
        );
        Ok(facts)
    }

    /// 解析文档内容
    pub fn parse(content: &str, format: FactFormat) -> Result<Self, String> {
        match format {
            FactFormat::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
            FactFormat::Toml => toml::from_str(content).map_err(|e| e.to_string()),
        }
    }

    /// 构建声明索引
    pub fn index(&self) -> DeclarationIndex {
        DeclarationIndex::from_declarations(
            self.classes.iter().cloned(),
            self.assisted_factories.iter().cloned(),
        )
    }

    /// 构建贡献提供者
    pub fn contribution_provider(&self) -> StaticContributionProvider {
        StaticContributionProvider::new(self.contributions.clone())
    }

    /// 图声明总数（含扩展图）
    pub fn graph_count(&self) -> usize {
        fn count(declaration: &GraphDeclaration) -> usize {
            1 + declaration.extensions.iter().map(count).sum::<usize>()
        }
        self.graphs.iter().map(count).sum()
    }
}

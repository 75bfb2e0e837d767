//! # 绑定图解析实现
//!
//! 依赖注入编译器的绑定图解析核心：
//!
//! - [`catalog`]：显式绑定注册与隐式绑定合成
//! - [`aggregator`]：按作用域聚合贡献、排除与排名
//! - [`multibinding`]：多重绑定集合的聚合与校验
//! - [`builder`]：从入口点展开并校验绑定图
//! - [`cycles`]：依赖环分析
//! - [`validator`]：作用域校验与初始化顺序
//! - [`properties`]：代码生成所需的存储属性
//! - [`report`]：图元数据报告
//! - [`analysis`]：图统计

pub mod aggregator;
pub mod analysis;
pub mod builder;
pub mod catalog;
pub mod cycles;
pub mod multibinding;
pub mod properties;
pub mod report;
pub mod validator;

pub use aggregator::{
    validate_record, AggregatedContributions, ContributionAggregator, StaticContributionProvider,
};
pub use analysis::{DegreeEntry, GraphAnalyzer, GraphStatistics};
pub use builder::GraphBuilder;
pub use catalog::{AliasChain, BindingCatalog, DeclarationIndex, ImplicitBindingCache};
pub use cycles::{CycleAnalysis, CycleAnalyzer};
pub use multibinding::MultibindingAggregator;
pub use properties::PropertyCollector;
pub use report::{GraphMetadataReport, REPORT_DIRECTORY, REPORT_SCHEMA_VERSION};
pub use validator::{scoped_initialization_order, ScopeValidator};

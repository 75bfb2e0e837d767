//! # 解析组合层
//!
//! 把解析核心组装成一次完整的编译过程：
//!
//! - **解析器构建器**: 叠加配置文件与环境变量得到解析器选项，并初始化日志
//! - **声明事实集**: 从 JSON 或 TOML 文档加载声明索引、贡献与图声明
//! - **编译过程驱动**: 解析根图与扩展图，写出图元数据报告
//!
//! ## 基本使用
//!
//! ```rust,no_run
//! use infrastructure_composition::{FactSet, LoggingConfig, ResolverBuilder};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let resolver = ResolverBuilder::new()
//!         .add_config_file("resolver.toml")?
//!         .add_config_env_vars("RESOLVER")
//!         .with_logging(LoggingConfig::development())
//!         .build()?;
//!
//!     let facts = FactSet::load("build/facts.json")?;
//!     let graphs = resolver.run(&facts)?;
//!     println!("解析了 {} 个图", graphs.len());
//!     Ok(())
//! }
//! ```

pub mod builder;
pub mod facts;
pub mod pass;

#[cfg(test)]
mod tests;

// 重新导出主要类型
pub use builder::{initialize_logging, LoggingConfig, ResolverBuilder, DEFAULT_ENV_PREFIX};
pub use facts::{FactFormat, FactSet};
pub use pass::{summarize, write_reports, PassOutcome, Resolver};

// 重新导出错误类型
pub use infrastructure_common::ResolverError;

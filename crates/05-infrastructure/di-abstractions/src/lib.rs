//! # Dependency Injection Abstractions
//!
//! 绑定图解析的抽象层，定义绑定数据模型与各组件之间的接口。
//!
//! ## 核心接口
//!
//! - [`Binding`] - 绑定（封闭的带标签变体）
//! - [`ContributionRecord`] / [`ContributionProvider`] - 跨编译单元的贡献
//! - [`GraphDeclaration`] - 图声明
//! - [`BindingRegistry`] - 绑定目录接口
//! - [`GraphResolver`] - 图解析器接口
//! - [`BindingGraph`] - 已校验的绑定图

#![deny(missing_docs)]

pub mod binding;
pub mod contribution;
pub mod declaration;
pub mod graph;
pub mod multibinding;
pub mod registry;
pub mod resolved;
pub mod resolver;

pub use binding::*;
pub use contribution::*;
pub use declaration::*;
pub use graph::*;
pub use multibinding::*;
pub use registry::*;
pub use resolved::*;
pub use resolver::*;

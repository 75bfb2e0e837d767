//! # Infrastructure Common
//!
//! 依赖注入解析核心的公共基础类型。
//!
//! ## 核心组件
//!
//! - [`TypeKey`] - 绑定槽位的身份标识（类型 + 限定符）
//! - [`Origin`] / [`DeclarationId`] - 声明来源与确定性排序依据
//! - [`Dependency`] - 带访问包装的依赖请求
//! - [`Scope`] - 作用域标记
//! - [`ResolverOptions`] - 解析器行为开关
//! - [`GraphError`] / [`Diagnostics`] - 错误分类与诊断累积
//!
//! ## 设计原则
//!
//! - 所有输出顺序只依赖声明标识，不依赖发现顺序
//! - 错误携带声明来源
//! - 解析核心不做 I/O

pub mod configuration;
pub mod dependency;
pub mod diagnostics;
pub mod errors;
pub mod lifecycle;
pub mod metadata;

pub use configuration::*;
pub use dependency::*;
pub use diagnostics::*;
pub use errors::*;
pub use lifecycle::*;
pub use metadata::*;

//! 错误类型定义

use crate::{DeclarationId, Origin, Scope, TypeKey};
use thiserror::Error;

fn render_keys(keys: &[TypeKey], separator: &str) -> String {
    keys.iter()
        .map(TypeKey::render)
        .collect::<Vec<_>>()
        .join(separator)
}

fn render_origins(origins: &[Origin]) -> String {
    origins
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn render_scopes(scopes: &[Scope]) -> String {
    scopes
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn render_rank(rank: &Option<i32>) -> String {
    rank.map_or_else(|| "未指定".to_string(), |rank| rank.to_string())
}

fn render_hint(hint: &Option<String>) -> String {
    hint.as_ref()
        .map(|hint| format!("\n提示: {}", hint))
        .unwrap_or_default()
}

/// 绑定图错误类型
///
/// 除特别说明外，均为编译期致命错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    #[error("重复绑定: {key} 同时由 {first} 和 {second} 声明")]
    DuplicateBinding {
        key: TypeKey,
        first: Origin,
        second: Origin,
    },

    #[error("重复贡献: 作用域 {scope} 中的 {key} 存在 {} 个同为最高优先级({})的贡献: {}", .candidates.len(), render_rank(.rank), render_origins(.candidates))]
    DuplicateContribution {
        scope: Scope,
        key: TypeKey,
        rank: Option<i32>,
        candidates: Vec<Origin>,
    },

    #[error("无法解析依赖: {key}\n请求链: {}{}", render_keys(.chain, " -> "), render_hint(.hint))]
    UnresolvedDependency {
        key: TypeKey,
        chain: Vec<TypeKey>,
        requested_by: Option<Origin>,
        hint: Option<String>,
    },

    #[error("多重绑定错误: {key}: {message}")]
    Multibinding {
        key: TypeKey,
        message: String,
        origin: Option<Origin>,
    },

    #[error("Map 多重绑定 {key} 中存在重复的键 {map_key}: {first} 与 {second}")]
    DuplicateMapKey {
        key: TypeKey,
        map_key: String,
        first: Origin,
        second: Origin,
    },

    #[error("检测到致命循环依赖（循环中没有 Provider/Lazy 延迟访问）: {}", render_keys(.cycle, " --> "))]
    FatalCycle {
        cycle: Vec<TypeKey>,
        origin: Option<Origin>,
    },

    #[error("作用域不匹配: {key} 的作用域 {scope} 不在图 {graph} 可满足的作用域 [{}] 中", render_scopes(.allowed))]
    ScopeMismatch {
        key: TypeKey,
        scope: Scope,
        graph: DeclarationId,
        allowed: Vec<Scope>,
        origin: Origin,
    },

    #[error("无效贡献: {origin}: {message}")]
    InvalidContribution { origin: Origin, message: String },

    #[error("未使用的绑定: {key} ({origin})")]
    UnusedBinding { key: TypeKey, origin: Origin },
}

/// 绑定图错误类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GraphErrorKind {
    DuplicateBinding,
    DuplicateContribution,
    UnresolvedDependency,
    Multibinding,
    DuplicateMapKey,
    FatalCycle,
    ScopeMismatch,
    InvalidContribution,
    UnusedBinding,
}

impl GraphError {
    /// 获取错误类别
    pub fn kind(&self) -> GraphErrorKind {
        match self {
            Self::DuplicateBinding { .. } => GraphErrorKind::DuplicateBinding,
            Self::DuplicateContribution { .. } => GraphErrorKind::DuplicateContribution,
            Self::UnresolvedDependency { .. } => GraphErrorKind::UnresolvedDependency,
            Self::Multibinding { .. } => GraphErrorKind::Multibinding,
            Self::DuplicateMapKey { .. } => GraphErrorKind::DuplicateMapKey,
            Self::FatalCycle { .. } => GraphErrorKind::FatalCycle,
            Self::ScopeMismatch { .. } => GraphErrorKind::ScopeMismatch,
            Self::InvalidContribution { .. } => GraphErrorKind::InvalidContribution,
            Self::UnusedBinding { .. } => GraphErrorKind::UnusedBinding,
        }
    }

    /// 获取主要声明来源
    pub fn origin(&self) -> Option<&Origin> {
        match self {
            Self::DuplicateBinding { second, .. } => Some(second),
            Self::DuplicateContribution { candidates, .. } => candidates.first(),
            Self::UnresolvedDependency { requested_by, .. } => requested_by.as_ref(),
            Self::Multibinding { origin, .. } => origin.as_ref(),
            Self::DuplicateMapKey { second, .. } => Some(second),
            Self::FatalCycle { origin, .. } => origin.as_ref(),
            Self::ScopeMismatch { origin, .. } => Some(origin),
            Self::InvalidContribution { origin, .. } => Some(origin),
            Self::UnusedBinding { origin, .. } => Some(origin),
        }
    }

    /// 创建多重绑定错误
    pub fn multibinding(key: TypeKey, message: impl Into<String>, origin: Option<Origin>) -> Self {
        Self::Multibinding {
            key,
            message: message.into(),
            origin,
        }
    }

    /// 创建无效贡献错误
    pub fn invalid_contribution(origin: Origin, message: impl Into<String>) -> Self {
        Self::InvalidContribution {
            origin,
            message: message.into(),
        }
    }
}

/// 配置错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置文件不存在: {path}")]
    FileNotFound { path: String },

    #[error("配置解析失败: {source}")]
    ParseError {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("配置验证失败: {source}")]
    ValidationError {
        #[from]
        source: ValidationError,
    },
}

/// 验证错误类型
#[derive(Error, Debug, Clone)]
pub enum ValidationError {
    #[error("字段值无效: {field_name}, 值: {value}, 原因: {reason}")]
    InvalidFieldValue {
        field_name: String,
        value: String,
        reason: String,
    },

    #[error("字段值超出范围: {field_name}, 值: {value}, 范围: {range}")]
    ValueOutOfRange {
        field_name: String,
        value: String,
        range: String,
    },
}

impl ValidationError {
    /// 创建字段值无效错误
    pub fn invalid_field_value(
        field_name: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidFieldValue {
            field_name: field_name.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// 创建值超出范围错误
    pub fn value_out_of_range(
        field_name: impl Into<String>,
        value: impl Into<String>,
        range: impl Into<String>,
    ) -> Self {
        Self::ValueOutOfRange {
            field_name: field_name.into(),
            value: value.into(),
            range: range.into(),
        }
    }
}

/// 解析器错误类型
#[derive(Error, Debug)]
pub enum ResolverError {
    #[error("配置错误: {source}")]
    ConfigError {
        #[from]
        source: ConfigError,
    },

    #[error("验证错误: {source}")]
    ValidationError {
        #[from]
        source: ValidationError,
    },

    #[error("声明事实加载失败: {path}, 原因: {message}")]
    FactsLoadFailed { path: String, message: String },

    #[error("报告写入失败: {path}, 原因: {source}")]
    ReportWriteFailed {
        path: String,
        source: std::io::Error,
    },

    #[error("报告序列化失败: {path}, 原因: {source}")]
    ReportSerializationFailed {
        path: String,
        source: serde_json::Error,
    },

    #[error("图 {graph} 解析失败:\n{report}")]
    GraphResolutionFailed {
        graph: DeclarationId,
        report: crate::DiagnosticReport,
    },
}

/// 结果类型别名
pub type ConfigResult<T> = Result<T, ConfigError>;
pub type ValidationResult<T> = Result<T, ValidationError>;
pub type ResolverResult<T> = Result<T, ResolverError>;

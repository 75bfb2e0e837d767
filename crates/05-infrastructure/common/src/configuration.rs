//! 解析器配置定义
//!
//! 解析核心只接受一组枚举化的行为开关，不接受自由格式的选项

use crate::errors::ValidationError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// 默认最大错误数
pub const DEFAULT_MAX_ERRORS_COUNT: usize = 20;

/// 诊断严重级别
///
/// 解析核心本身没有"警告"的概念，边界情况（例如未使用的绑定）的处理方式由此透传
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DiagnosticSeverity {
    /// 不报告
    #[default]
    None,
    /// 记录日志
    Warn,
    /// 作为错误报告
    Error,
}

/// 解析器选项
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverOptions {
    /// 是否在校验后裁剪不可达的绑定
    pub shrink_unused_bindings: bool,
    /// 是否校验所有已声明的绑定（包括入口不可达的绑定）
    pub full_graph_validation: bool,
    /// 单次构建最多报告的错误数，超出部分仅计数
    pub max_errors_count: usize,
    /// 未使用绑定的报告级别
    pub unused_binding_severity: DiagnosticSeverity,
    /// 图元数据报告的输出目录
    pub reports_destination: Option<PathBuf>,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            shrink_unused_bindings: true,
            full_graph_validation: false,
            max_errors_count: DEFAULT_MAX_ERRORS_COUNT,
            unused_binding_severity: DiagnosticSeverity::None,
            reports_destination: None,
        }
    }
}

impl ResolverOptions {
    /// 是否需要把所有已声明绑定作为额外根节点展开
    pub fn validates_all_declarations(&self) -> bool {
        self.full_graph_validation || !self.shrink_unused_bindings
    }

    /// 设置最大错误数
    pub fn with_max_errors_count(mut self, count: usize) -> Self {
        self.max_errors_count = count;
        self
    }

    /// 设置未使用绑定的报告级别
    pub fn with_unused_binding_severity(mut self, severity: DiagnosticSeverity) -> Self {
        self.unused_binding_severity = severity;
        self
    }

    /// 设置是否裁剪未使用绑定
    pub fn with_shrink_unused_bindings(mut self, enabled: bool) -> Self {
        self.shrink_unused_bindings = enabled;
        self
    }

    /// 设置是否启用完整图校验
    pub fn with_full_graph_validation(mut self, enabled: bool) -> Self {
        self.full_graph_validation = enabled;
        self
    }
}

/// 配置验证器 trait
pub trait ConfigValidator<T>: Send + Sync {
    /// 验证配置
    fn validate(&self, config: &T) -> Result<(), ValidationError>;

    /// 获取验证器名称
    fn name(&self) -> &'static str;
}

/// 解析器选项验证器
#[derive(Debug, Default)]
pub struct ResolverOptionsValidator;

impl ConfigValidator<ResolverOptions> for ResolverOptionsValidator {
    fn validate(&self, config: &ResolverOptions) -> Result<(), ValidationError> {
        if config.max_errors_count == 0 {
            return Err(ValidationError::value_out_of_range(
                "max_errors_count",
                "0",
                "> 0",
            ));
        }
        if let Some(path) = &config.reports_destination {
            if path.as_os_str().is_empty() {
                return Err(ValidationError::invalid_field_value(
                    "reports_destination",
                    "",
                    "路径不能为空",
                ));
            }
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "ResolverOptionsValidator"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = ResolverOptions::default();
        assert!(options.shrink_unused_bindings);
        assert!(!options.full_graph_validation);
        assert_eq!(options.max_errors_count, 20);
        assert!(!options.validates_all_declarations());
        assert!(ResolverOptionsValidator.validate(&options).is_ok());
    }

    #[test]
    fn test_zero_max_errors_rejected() {
        let options = ResolverOptions::default().with_max_errors_count(0);
        let result = ResolverOptionsValidator.validate(&options);
        assert!(matches!(result, Err(ValidationError::ValueOutOfRange { .. })));
    }

    #[test]
    fn test_severity_deserialization() {
        let options: ResolverOptions =
            serde_json::from_str(r#"{"unused_binding_severity": "WARN"}"#).unwrap();
        assert_eq!(options.unused_binding_severity, DiagnosticSeverity::Warn);
        assert!(options.shrink_unused_bindings);
    }
}

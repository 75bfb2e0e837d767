//! 诊断收集
//!
//! 一次构建中的所有图错误都先累积到 [`Diagnostics`]，达到上限后只计数不保存，
//! 构建结束时统一转换为 [`DiagnosticReport`]。

use crate::{GraphError, GraphErrorKind, DEFAULT_MAX_ERRORS_COUNT};
use std::fmt;

/// 诊断收集器
#[derive(Debug, Clone)]
pub struct Diagnostics {
    errors: Vec<GraphError>,
    max_errors: usize,
    suppressed: usize,
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ERRORS_COUNT)
    }
}

impl Diagnostics {
    /// 创建诊断收集器，`max_errors` 为 0 时按 1 处理
    pub fn new(max_errors: usize) -> Self {
        Self {
            errors: Vec::new(),
            max_errors: max_errors.max(1),
            suppressed: 0,
        }
    }

    /// 报告一个错误
    ///
    /// 返回该错误是否被保存；完全相同的错误只保存一次
    pub fn report(&mut self, error: GraphError) -> bool {
        if self.errors.contains(&error) {
            return false;
        }
        if self.errors.len() >= self.max_errors {
            self.suppressed += 1;
            tracing::debug!("已达到最大错误数 {}，忽略错误: {}", self.max_errors, error);
            return false;
        }
        tracing::debug!("记录图错误: {}", error);
        self.errors.push(error);
        true
    }

    /// 合并另一个收集器的结果
    pub fn absorb(&mut self, other: Diagnostics) {
        self.suppressed += other.suppressed;
        for error in other.errors {
            self.report(error);
        }
    }

    /// 是否没有任何错误
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty() && self.suppressed == 0
    }

    /// 是否已达到错误上限
    pub fn limit_reached(&self) -> bool {
        self.errors.len() >= self.max_errors
    }

    /// 错误总数（包括被忽略的）
    pub fn total(&self) -> usize {
        self.errors.len() + self.suppressed
    }

    /// 已保存的错误
    pub fn errors(&self) -> &[GraphError] {
        &self.errors
    }

    /// 是否存在某类错误
    pub fn has_kind(&self, kind: GraphErrorKind) -> bool {
        self.errors.iter().any(|error| error.kind() == kind)
    }

    /// 转换为报告
    pub fn into_report(self) -> DiagnosticReport {
        DiagnosticReport {
            errors: self.errors,
            suppressed: self.suppressed,
        }
    }

    /// 没有错误时返回 `value`，否则返回报告
    pub fn into_result<T>(self, value: T) -> Result<T, DiagnosticReport> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self.into_report())
        }
    }
}

/// 诊断报告
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DiagnosticReport {
    /// 保存的错误（按报告顺序）
    pub errors: Vec<GraphError>,
    /// 超出上限被忽略的错误数
    pub suppressed: usize,
}

impl DiagnosticReport {
    /// 由单个错误创建报告
    pub fn single(error: GraphError) -> Self {
        Self {
            errors: vec![error],
            suppressed: 0,
        }
    }

    /// 第一个错误
    pub fn first(&self) -> Option<&GraphError> {
        self.errors.first()
    }

    /// 查找某类错误
    pub fn find(&self, kind: GraphErrorKind) -> Option<&GraphError> {
        self.errors.iter().find(|error| error.kind() == kind)
    }

    /// 错误总数（包括被忽略的）
    pub fn total(&self) -> usize {
        self.errors.len() + self.suppressed
    }
}

impl fmt::Display for DiagnosticReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, error) in self.errors.iter().enumerate() {
            if index > 0 {
                writeln!(f)?;
            }
            write!(f, "错误[{}]: {}", index + 1, error)?;
            if let Some(origin) = error.origin() {
                write!(f, "\n  位于 {}", origin)?;
            }
        }
        if self.suppressed > 0 {
            write!(f, "\n另有 {} 个错误未显示", self.suppressed)?;
        }
        Ok(())
    }
}

impl std::error::Error for DiagnosticReport {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Origin, TypeKey};

    fn unused(name: &str) -> GraphError {
        GraphError::UnusedBinding {
            key: TypeKey::new(name),
            origin: Origin::new(name),
        }
    }

    #[test]
    fn test_errors_beyond_limit_are_counted() {
        let mut diagnostics = Diagnostics::new(2);
        assert!(diagnostics.report(unused("A")));
        assert!(diagnostics.report(unused("B")));
        assert!(diagnostics.limit_reached());
        assert!(!diagnostics.report(unused("C")));

        let report = diagnostics.into_report();
        assert_eq!(report.errors.len(), 2);
        assert_eq!(report.suppressed, 1);
        assert_eq!(report.total(), 3);
        assert!(report.to_string().contains("另有 1 个错误未显示"));
    }

    #[test]
    fn test_identical_errors_recorded_once() {
        let mut diagnostics = Diagnostics::default();
        diagnostics.report(unused("A"));
        diagnostics.report(unused("A"));
        assert_eq!(diagnostics.total(), 1);
    }

    #[test]
    fn test_into_result() {
        let diagnostics = Diagnostics::default();
        assert_eq!(diagnostics.into_result(7), Ok(7));

        let mut diagnostics = Diagnostics::default();
        diagnostics.report(unused("A"));
        let report = diagnostics.into_result(()).unwrap_err();
        assert!(report.find(GraphErrorKind::UnusedBinding).is_some());
    }
}

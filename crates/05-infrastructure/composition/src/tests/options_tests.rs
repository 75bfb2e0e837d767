//! 解析器选项叠加测试

use crate::builder::{ResolverBuilder, DEFAULT_ENV_PREFIX};
use infrastructure_common::{DiagnosticSeverity, ResolverError, ResolverOptions};
use std::collections::HashMap;
use std::io::Write;
use tempfile::{Builder, NamedTempFile};

fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

fn toml_file(content: &str) -> NamedTempFile {
    let mut file = Builder::new().suffix(".toml").tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_defaults_without_sources() {
    let options = ResolverBuilder::new().load_options().unwrap();
    assert_eq!(options, ResolverOptions::default());
}

#[test]
fn test_file_then_environment_layering() {
    let file = toml_file(
        "max_errors_count = 5\nunused_binding_severity = \"WARN\"\nshrink_unused_bindings = false\n",
    );

    let options = ResolverBuilder::new()
        .add_config_file(file.path())
        .unwrap()
        .add_config_env_vars(DEFAULT_ENV_PREFIX)
        .with_env_source(env(&[("RESOLVER_MAX_ERRORS_COUNT", "7")]))
        .load_options()
        .unwrap();

    assert_eq!(options.max_errors_count, 7);
    assert_eq!(options.unused_binding_severity, DiagnosticSeverity::Warn);
    assert!(!options.shrink_unused_bindings);
    assert!(options.validates_all_declarations());
}

#[test]
fn test_json_config_file() {
    let mut file = Builder::new().suffix(".json").tempfile().unwrap();
    file.write_all(br#"{ "full_graph_validation": true, "reports_destination": "out/reports" }"#)
        .unwrap();

    let options = ResolverBuilder::new()
        .add_config_file(file.path())
        .unwrap()
        .load_options()
        .unwrap();
    assert!(options.full_graph_validation);
    assert_eq!(
        options.reports_destination.as_deref(),
        Some(std::path::Path::new("out/reports"))
    );
}

#[test]
fn test_zero_max_errors_fails_validation() {
    let builder = ResolverBuilder::new()
        .add_config_env_vars(DEFAULT_ENV_PREFIX)
        .with_env_source(env(&[("RESOLVER_MAX_ERRORS_COUNT", "0")]));

    assert!(matches!(
        builder.load_options(),
        Err(ResolverError::ValidationError { .. })
    ));

    let unchecked = builder.enable_validation(false).load_options().unwrap();
    assert_eq!(unchecked.max_errors_count, 0);
}

#[test]
fn test_missing_config_file_is_rejected() {
    let result = ResolverBuilder::new().add_config_file("/definitely/missing/resolver.toml");
    assert!(matches!(result, Err(ResolverError::ConfigError { .. })));
}

//! 声明事实集加载测试

use super::{app_facts, APP_FACTS_JSON};
use crate::facts::{FactFormat, FactSet};
use infrastructure_common::{ResolverError, TypeKey};
use std::io::Write;

#[test]
fn test_json_facts_are_loaded_from_file() {
    let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
    file.write_all(APP_FACTS_JSON.as_bytes()).unwrap();

    let facts = FactSet::load(file.path()).unwrap();
    assert_eq!(facts, app_facts());
    assert_eq!(facts.classes.len(), 2);
    assert_eq!(facts.graph_count(), 2);
    assert!(facts.index().class(&TypeKey::new("com.example.Feed")).is_some());
}

#[test]
fn test_toml_facts_are_loaded_from_file() {
    let content = r#"
[[classes]]
origin = { declaration = "Clock" }
key = { type = "Clock" }
constructors = [{ injectable = true }]

[[graphs]]
origin = { declaration = "TimeGraph" }
key = { type = "TimeGraph" }
entry_points = [{ type = "Accessor", name = "clock", dependency = { key = { type = "Clock" } } }]
"#;
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();

    let facts = FactSet::load(file.path()).unwrap();
    assert_eq!(facts.classes[0].key, TypeKey::new("Clock"));
    assert_eq!(facts.graphs[0].entry_points.len(), 1);
    assert!(facts.contribution_provider().is_empty());
}

#[test]
fn test_malformed_facts_report_path() {
    let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
    file.write_all(b"{ \"classes\": 42 }").unwrap();

    let error = FactSet::load(file.path()).unwrap_err();
    match error {
        ResolverError::FactsLoadFailed { path, .. } => {
            assert_eq!(path, file.path().display().to_string());
        }
        other => panic!("意外的错误类型: {other}"),
    }
}

#[test]
fn test_format_is_detected_from_extension() {
    assert_eq!(FactFormat::from_path("facts.TOML".as_ref()), FactFormat::Toml);
    assert_eq!(FactFormat::from_path("facts.json".as_ref()), FactFormat::Json);
    assert_eq!(FactFormat::from_path("facts".as_ref()), FactFormat::Json);
}

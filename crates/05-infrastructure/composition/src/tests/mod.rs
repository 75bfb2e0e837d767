//! 组合层测试

mod facts_tests;
mod options_tests;

use crate::facts::{FactFormat, FactSet};

/// 包含一个根图和一个扩展图的事实集
pub(crate) const APP_FACTS_JSON: &str = r#"{
  "classes": [
    {
      "origin": { "declaration": "com.example.HttpClient" },
      "key": { "type": "com.example.HttpClient" },
      "scope": "AppScope",
      "constructors": [{ "injectable": true, "parameters": [] }]
    },
    {
      "origin": { "declaration": "com.example.Feed" },
      "key": { "type": "com.example.Feed" },
      "constructors": [
        {
          "injectable": true,
          "parameters": [
            { "name": "client", "dependency": { "key": { "type": "com.example.HttpClient" } } }
          ]
        }
      ]
    }
  ],
  "graphs": [
    {
      "origin": { "declaration": "com.example.AppGraph" },
      "key": { "type": "com.example.AppGraph" },
      "scopes": ["AppScope"],
      "entry_points": [
        { "type": "Accessor", "name": "client", "dependency": { "key": { "type": "com.example.HttpClient" } } }
      ],
      "extensions": [
        {
          "origin": { "declaration": "com.example.FeedGraph" },
          "key": { "type": "com.example.FeedGraph" },
          "scopes": ["FeedScope"],
          "entry_points": [
            { "type": "Accessor", "name": "feed", "dependency": { "key": { "type": "com.example.Feed" } } }
          ]
        }
      ]
    }
  ]
}"#;

pub(crate) fn app_facts() -> FactSet {
    FactSet::parse(APP_FACTS_JSON, FactFormat::Json).expect("示例事实集应当可以解析")
}

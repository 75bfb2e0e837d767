//! 声明索引中的类型事实
//!
//! 这些事实还不是绑定，只有在被请求时才由绑定目录按需合成。

use infrastructure_common::{Dependency, Origin, Scope, TypeKey};
use serde::{Deserialize, Serialize};

/// 构造函数参数
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Parameter {
    /// 参数名称
    pub name: String,
    /// 依赖请求
    pub dependency: Dependency,
    /// 是否为辅助注入参数
    #[serde(default)]
    pub assisted: bool,
}

impl Parameter {
    /// 创建普通参数
    pub fn new(name: impl Into<String>, dependency: impl Into<Dependency>) -> Self {
        Self {
            name: name.into(),
            dependency: dependency.into(),
            assisted: false,
        }
    }

    /// 创建辅助注入参数
    pub fn assisted(name: impl Into<String>, key: TypeKey) -> Self {
        Self {
            name: name.into(),
            dependency: Dependency::new(key),
            assisted: true,
        }
    }
}

/// 构造函数声明
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConstructorDeclaration {
    /// 是否标记为可注入
    #[serde(default)]
    pub injectable: bool,
    /// 参数
    #[serde(default)]
    pub parameters: Vec<Parameter>,
}

impl ConstructorDeclaration {
    /// 创建可注入构造函数
    pub fn injectable(parameters: Vec<Parameter>) -> Self {
        Self {
            injectable: true,
            parameters,
        }
    }

    /// 是否包含辅助注入参数
    pub fn has_assisted_parameters(&self) -> bool {
        self.parameters.iter().any(|parameter| parameter.assisted)
    }
}

/// 可注入类
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InjectableClass {
    /// 声明来源
    pub origin: Origin,
    /// 类的类型键
    pub key: TypeKey,
    /// 作用域
    #[serde(default)]
    pub scope: Option<Scope>,
    /// 构造函数
    #[serde(default)]
    pub constructors: Vec<ConstructorDeclaration>,
    /// 成员注入依赖（字段与 setter）
    #[serde(default)]
    pub members: Vec<Dependency>,
}

impl InjectableClass {
    /// 创建只有一个可注入构造函数的类
    pub fn new(key: TypeKey, dependencies: Vec<Dependency>) -> Self {
        let parameters = dependencies
            .into_iter()
            .enumerate()
            .map(|(index, dependency)| Parameter::new(format!("p{}", index), dependency))
            .collect();
        Self {
            origin: Origin::new(key.type_name.clone()),
            key,
            scope: None,
            constructors: vec![ConstructorDeclaration::injectable(parameters)],
            members: Vec::new(),
        }
    }

    /// 设置作用域
    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = Some(scope);
        self
    }

    /// 设置成员注入依赖
    pub fn with_members(mut self, members: Vec<Dependency>) -> Self {
        self.members = members;
        self
    }

    /// 设置构造函数
    pub fn with_constructors(mut self, constructors: Vec<ConstructorDeclaration>) -> Self {
        self.constructors = constructors;
        self
    }

    /// 唯一的可注入构造函数
    pub fn injectable_constructor(&self) -> Option<&ConstructorDeclaration> {
        let mut injectable = self.constructors.iter().filter(|c| c.injectable);
        match (injectable.next(), injectable.next()) {
            (Some(constructor), None) => Some(constructor),
            _ => None,
        }
    }

    /// 可注入构造函数的数量
    pub fn injectable_constructor_count(&self) -> usize {
        self.constructors.iter().filter(|c| c.injectable).count()
    }
}

/// 辅助注入工厂声明
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssistedFactoryDeclaration {
    /// 声明来源
    pub origin: Origin,
    /// 工厂类型
    pub key: TypeKey,
    /// 工厂创建的目标类型
    pub target: TypeKey,
}

/// 成员注入器类型键
pub fn members_injector_key(target: &TypeKey) -> TypeKey {
    TypeKey {
        type_name: format!("MembersInjector<{}>", target.type_name),
        qualifier: target.qualifier.clone(),
    }
}

/// 从成员注入器类型键中取出目标类型
pub fn members_injector_target(key: &TypeKey) -> Option<TypeKey> {
    let inner = key
        .type_name
        .strip_prefix("MembersInjector<")?
        .strip_suffix('>')?;
    Some(TypeKey {
        type_name: inner.to_string(),
        qualifier: key.qualifier.clone(),
    })
}

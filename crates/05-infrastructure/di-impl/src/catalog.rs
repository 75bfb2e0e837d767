//! 绑定目录实现
//!
//! 显式绑定在注册阶段写入，隐式绑定在首次查找时按需合成并记忆。

use di_abstractions::{
    members_injector_target, AssistedFactoryDeclaration, AssistedParameter, Binding,
    BindingRegistry, InjectableClass,
};
use infrastructure_common::{Dependency, GraphError, TypeKey, WrappedType};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::debug;

/// 声明索引
///
/// 整个编译过程共享，填充完成后只读
#[derive(Debug, Clone, Default)]
pub struct DeclarationIndex {
    classes: BTreeMap<TypeKey, InjectableClass>,
    assisted_factories: BTreeMap<TypeKey, AssistedFactoryDeclaration>,
}

impl DeclarationIndex {
    /// 创建空索引
    pub fn new() -> Self {
        Self::default()
    }

    /// 由类与工厂声明创建索引
    pub fn from_declarations(
        classes: impl IntoIterator<Item = InjectableClass>,
        assisted_factories: impl IntoIterator<Item = AssistedFactoryDeclaration>,
    ) -> Self {
        let mut index = Self::new();
        for class in classes {
            index.add_class(class);
        }
        for factory in assisted_factories {
            index.add_assisted_factory(factory);
        }
        index
    }

    /// 添加可注入类
    pub fn add_class(&mut self, class: InjectableClass) {
        self.classes.insert(class.key.clone(), class);
    }

    /// 添加辅助注入工厂
    pub fn add_assisted_factory(&mut self, factory: AssistedFactoryDeclaration) {
        self.assisted_factories.insert(factory.key.clone(), factory);
    }

    /// 查找可注入类
    pub fn class(&self, key: &TypeKey) -> Option<&InjectableClass> {
        self.classes.get(key)
    }

    /// 查找辅助注入工厂
    pub fn assisted_factory(&self, key: &TypeKey) -> Option<&AssistedFactoryDeclaration> {
        self.assisted_factories.get(key)
    }

    /// 类的数量
    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    /// 所有类的类型键
    pub fn class_keys(&self) -> impl Iterator<Item = &TypeKey> {
        self.classes.keys()
    }
}

/// 隐式绑定缓存
///
/// 每个类型键只赋值一次；同一类型键的合成不允许重入
#[derive(Debug, Default)]
pub struct ImplicitBindingCache {
    entries: HashMap<TypeKey, Option<Binding>>,
    in_flight: HashSet<TypeKey>,
}

impl ImplicitBindingCache {
    /// 获取或合成
    pub fn get_or_synthesize(
        &mut self,
        key: &TypeKey,
        synthesize: impl FnOnce() -> Option<Binding>,
    ) -> Option<Binding> {
        if let Some(entry) = self.entries.get(key) {
            return entry.clone();
        }
        assert!(
            self.in_flight.insert(key.clone()),
            "隐式绑定 {} 的合成发生重入",
            key
        );
        let binding = synthesize();
        self.in_flight.remove(key);
        let previous = self.entries.insert(key.clone(), binding.clone());
        assert!(previous.is_none(), "隐式绑定 {} 被重复赋值", key);
        binding
    }

    /// 已缓存的条目数
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// 别名链
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasChain {
    /// 从请求的类型键到终点（含两端）
    pub keys: Vec<TypeKey>,
}

impl AliasChain {
    /// 终点
    pub fn terminal(&self) -> &TypeKey {
        // 链至少包含请求的类型键本身
        &self.keys[self.keys.len() - 1]
    }

    /// 是否经过了别名
    pub fn is_redirected(&self) -> bool {
        self.keys.len() > 1
    }
}

/// 绑定目录
///
/// 每次构建持有独立的视图；声明索引以引用方式共享
#[derive(Debug)]
pub struct BindingCatalog<'a> {
    index: &'a DeclarationIndex,
    explicit: BTreeMap<TypeKey, Binding>,
    implicit: ImplicitBindingCache,
    alias_chains: HashMap<TypeKey, AliasChain>,
}

impl<'a> BindingCatalog<'a> {
    /// 创建绑定目录
    pub fn new(index: &'a DeclarationIndex) -> Self {
        Self {
            index,
            explicit: BTreeMap::new(),
            implicit: ImplicitBindingCache::default(),
            alias_chains: HashMap::new(),
        }
    }

    /// 声明索引
    pub fn index(&self) -> &'a DeclarationIndex {
        self.index
    }

    /// 所有显式绑定
    pub fn explicit_bindings(&self) -> impl Iterator<Item = &Binding> {
        self.explicit.values()
    }

    /// 沿显式别名解析到终点，结果缓存
    ///
    /// 别名形成环时返回 [`GraphError::FatalCycle`]
    pub fn resolve_alias(&mut self, key: &TypeKey) -> Result<AliasChain, GraphError> {
        if let Some(chain) = self.alias_chains.get(key) {
            return Ok(chain.clone());
        }

        let mut keys = vec![key.clone()];
        let mut current = key.clone();
        while let Some(target) = self.explicit.get(&current).and_then(Binding::alias_target) {
            if let Some(position) = keys.iter().position(|k| k == target) {
                let mut cycle = keys[position..].to_vec();
                cycle.push(target.clone());
                let origin = self.explicit.get(&keys[position]).map(|b| b.origin().clone());
                return Err(GraphError::FatalCycle { cycle, origin });
            }
            if let Some(cached) = self.alias_chains.get(target) {
                keys.extend(cached.keys.iter().cloned());
                break;
            }
            keys.push(target.clone());
            current = target.clone();
        }

        let chain = AliasChain { keys };
        self.alias_chains.insert(key.clone(), chain.clone());
        Ok(chain)
    }

    fn synthesize(index: &DeclarationIndex, key: &TypeKey) -> Option<Binding> {
        if let Some(target) = members_injector_target(key) {
            let class = index.class(&target)?;
            return Some(Binding::MembersInjector {
                key: key.clone(),
                origin: class.origin.clone(),
                target,
                dependencies: class.members.clone(),
            });
        }

        if key.qualifier.is_some() {
            return None;
        }

        if let Some(factory) = index.assisted_factory(key) {
            let class = index.class(&factory.target)?;
            let constructor = class.injectable_constructor()?;
            let assisted = constructor
                .parameters
                .iter()
                .filter(|parameter| parameter.assisted)
                .map(|parameter| AssistedParameter {
                    name: parameter.name.clone(),
                    key: parameter.dependency.key.clone(),
                })
                .collect();
            let dependencies = constructor
                .parameters
                .iter()
                .filter(|parameter| !parameter.assisted)
                .map(|parameter| deferred(&parameter.dependency))
                .collect();
            return Some(Binding::Assisted {
                key: key.clone(),
                origin: factory.origin.clone(),
                target: factory.target.clone(),
                assisted,
                dependencies,
            });
        }

        let class = index.class(key)?;
        let constructor = class.injectable_constructor()?;
        if constructor.has_assisted_parameters() {
            return None;
        }
        let dependencies = constructor
            .parameters
            .iter()
            .map(|parameter| parameter.dependency.clone())
            .chain(class.members.iter().cloned())
            .collect();
        Some(Binding::Injected {
            key: key.clone(),
            origin: class.origin.clone(),
            scope: class.scope.clone(),
            dependencies,
        })
    }
}

fn deferred(dependency: &Dependency) -> Dependency {
    let wrapper = match dependency.wrapper {
        WrappedType::Canonical | WrappedType::Provider => WrappedType::Provider,
        WrappedType::Lazy | WrappedType::ProviderOfLazy => WrappedType::ProviderOfLazy,
    };
    dependency.clone().wrapped(wrapper)
}

impl BindingRegistry for BindingCatalog<'_> {
    fn register(&mut self, binding: Binding) -> Result<(), GraphError> {
        let key = binding.key().clone();
        match self.explicit.get(&key) {
            None => {
                debug!("注册绑定: {}", binding);
                self.alias_chains.clear();
                self.explicit.insert(key, binding);
                Ok(())
            }
            Some(existing) if existing.origin() == binding.origin() => Ok(()),
            Some(existing)
                if existing.is_alias() && existing.alias_target() == binding.alias_target() =>
            {
                Ok(())
            }
            Some(existing) => Err(GraphError::DuplicateBinding {
                key,
                first: existing.origin().clone(),
                second: binding.origin().clone(),
            }),
        }
    }

    fn explicit(&self, key: &TypeKey) -> Option<&Binding> {
        self.explicit.get(key)
    }

    fn implicit(&mut self, key: &TypeKey) -> Option<Binding> {
        let index = self.index;
        self.implicit
            .get_or_synthesize(key, || Self::synthesize(index, key))
    }

    fn registered_keys(&self) -> Vec<TypeKey> {
        self.explicit.keys().cloned().collect()
    }

    fn missing_hint(&self, key: &TypeKey) -> Option<String> {
        if let Some(class) = self.index.class(key) {
            let count = class.injectable_constructor_count();
            if count == 0 {
                return Some(format!("{} 没有可注入的构造函数", key.type_name));
            }
            if count > 1 {
                return Some(format!(
                    "{} 有 {} 个可注入的构造函数，只能有一个",
                    key.type_name, count
                ));
            }
            if class
                .injectable_constructor()
                .is_some_and(|constructor| constructor.has_assisted_parameters())
            {
                return Some(format!(
                    "{} 包含辅助注入参数，只能通过其辅助注入工厂获取",
                    key.type_name
                ));
            }
        }

        if key.qualifier.is_some() {
            let unqualified = TypeKey::new(key.type_name.clone());
            if self.explicit.contains_key(&unqualified) || self.index.class(&unqualified).is_some() {
                return Some(format!(
                    "存在未限定的绑定 {}，是否缺少限定符？",
                    unqualified
                ));
            }
        }

        let similar: Vec<String> = self
            .explicit
            .keys()
            .filter(|candidate| {
                *candidate != key
                    && (candidate.type_name == key.type_name
                        || candidate.short_name() == key.short_name())
            })
            .map(TypeKey::render)
            .collect();
        if similar.is_empty() {
            None
        } else {
            Some(format!("相似的绑定: {}", similar.join(", ")))
        }
    }
}

//! 绑定目录抽象接口

use crate::binding::Binding;
use infrastructure_common::{GraphError, TypeKey};

/// 绑定注册表 trait
///
/// 一次构建独占一个注册表视图，注册阶段结束后只读
pub trait BindingRegistry {
    /// 注册绑定
    ///
    /// 同一声明来源重复注册是幂等的；同目标的别名重复注册是幂等的；
    /// 其余占用同一类型键的注册都返回 [`GraphError::DuplicateBinding`]
    fn register(&mut self, binding: Binding) -> Result<(), GraphError>;

    /// 查找显式注册的绑定
    fn explicit(&self, key: &TypeKey) -> Option<&Binding>;

    /// 查找隐式绑定（可注入类、辅助注入工厂、成员注入器），按类型键记忆
    fn implicit(&mut self, key: &TypeKey) -> Option<Binding>;

    /// 先查显式绑定，再查隐式绑定
    fn lookup(&mut self, key: &TypeKey) -> Option<Binding> {
        match self.explicit(key) {
            Some(binding) => Some(binding.clone()),
            None => self.implicit(key),
        }
    }

    /// 检查类型键是否已显式注册
    fn is_registered(&self, key: &TypeKey) -> bool {
        self.explicit(key).is_some()
    }

    /// 所有显式注册的类型键（有序）
    fn registered_keys(&self) -> Vec<TypeKey>;

    /// 无法解析时给出的提示
    fn missing_hint(&self, key: &TypeKey) -> Option<String>;
}

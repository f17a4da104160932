//! 条目解析接口
//!
//! 构建函数通过该接口访问正在构建它的上下文

use crate::factory::Item;
use crate::fill::{downcast_item, fill};
use infrastructure_common::{ContextError, ContextResult};
use std::any::Any;
use std::sync::Arc;

/// 条目解析器 trait
pub trait ItemResolver: Send + Sync {
    /// 当前上下文的作用域
    fn scope(&self) -> &str;

    /// 按名称获取条目，必要时构建
    fn safe_get(&self, name: &str) -> ContextResult<Item>;

    /// 与 `safe_get` 相同，但丢弃错误
    fn get(&self, name: &str) -> Option<Item> {
        self.safe_get(name).ok()
    }
}

impl dyn ItemResolver + '_ {
    /// 获取条目并转换为具体类型
    pub fn get_as<T>(&self, name: &str) -> ContextResult<Arc<T>>
    where
        T: Any + Send + Sync,
    {
        downcast_item(name, self.safe_get(name)?)
    }

    /// 获取条目并写入 `target`
    pub fn fill<T>(&self, name: &str, target: &mut T) -> ContextResult<()>
    where
        T: Any + Clone,
    {
        let item = self.safe_get(name)?;
        fill(&item, target).map_err(|e| ContextError::TypeMismatch {
            name: name.to_string(),
            expected: e.expected,
        })
    }
}

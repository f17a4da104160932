//! 条目填充

use crate::factory::Item;
use infrastructure_common::{ContextError, ContextResult};
use std::any::{type_name, Any};
use std::sync::Arc;
use thiserror::Error;

/// 填充错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("条目无法写入类型 {expected}")]
pub struct FillError {
    /// 目标类型名称
    pub expected: &'static str,
}

/// 将 `source` 的值写入 `target`
///
/// `source` 必须能够转换为 `T`，否则返回 [`FillError`] 且 `target` 保持不变。
pub fn fill<T>(source: &Item, target: &mut T) -> Result<(), FillError>
where
    T: Any + Clone,
{
    let value = source.downcast_ref::<T>().ok_or(FillError {
        expected: type_name::<T>(),
    })?;
    *target = value.clone();
    Ok(())
}

/// 将条目转换为具体类型的共享指针
pub fn downcast_item<T>(name: &str, item: Item) -> ContextResult<Arc<T>>
where
    T: Any + Send + Sync,
{
    item.downcast::<T>().map_err(|_| ContextError::TypeMismatch {
        name: name.to_string(),
        expected: type_name::<T>(),
    })
}

//! 别名表

use infrastructure_common::{ContextError, ContextResult};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// 名称到名称的重定向表
///
/// 重定向可以链式进行，解析过程中重复出现的名称视为循环引用。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AliasMap(HashMap<String, String>);

impl AliasMap {
    /// 创建空的别名表
    pub fn new() -> Self {
        Self::default()
    }

    /// 返回一个与当前表无共享存储的副本
    pub fn copy(&self) -> Self {
        self.clone()
    }

    /// 添加别名，返回之前的目标
    pub fn insert(&mut self, alias: impl Into<String>, target: impl Into<String>) -> Option<String> {
        self.0.insert(alias.into(), target.into())
    }

    /// `alias` 是否被重定向
    pub fn contains(&self, alias: &str) -> bool {
        self.0.contains_key(alias)
    }

    /// 别名数量
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// 是否没有任何别名
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// 解析名称，返回最终不再被映射的名称
    ///
    /// 不在表中的名称解析为其自身。
    pub fn get(&self, name: &str) -> ContextResult<String> {
        let mut visited = HashSet::new();
        let mut current = name;

        while let Some(target) = self.0.get(current) {
            if !visited.insert(current) {
                return Err(ContextError::CircularAlias {
                    name: name.to_string(),
                });
            }
            current = target.as_str();
        }

        Ok(current.to_string())
    }
}

impl<A, T> FromIterator<(A, T)> for AliasMap
where
    A: Into<String>,
    T: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (A, T)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(a, t)| (a.into(), t.into())).collect())
    }
}

//! 上下文生命周期

use std::fmt;

/// 上下文标识
///
/// 每个上下文节点在创建时分配一个唯一标识，父子关系通过标识保存。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContextId(uuid::Uuid);

impl ContextId {
    /// 生成新的上下文标识
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for ContextId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ctx-{}", self.0)
    }
}

/// 上下文状态
///
/// `Open -> Closed` 只发生一次，由删除触发，不可逆。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContextState {
    /// 可用
    #[default]
    Open,
    /// 已删除
    Closed,
}

impl ContextState {
    /// 是否已关闭
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }
}

//! Maker 契约
//!
//! Maker 是带名称和作用域的构建/关闭函数对，由上下文按需调用。

use crate::resolver::ItemResolver;
use infrastructure_common::BoxError;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// 上下文中保存的条目
pub type Item = Arc<dyn Any + Send + Sync>;

/// 构建函数类型
pub type BuildFn = Box<dyn Fn(&dyn ItemResolver) -> Result<Item, BoxError> + Send + Sync>;

/// 关闭函数类型
pub type CloseFn = Box<dyn Fn(Item) + Send + Sync>;

/// Maker trait
///
/// 注册后只读。`make` 可以通过 `ctx` 递归获取其他条目，包括上层作用域的条目。
pub trait Maker: Send + Sync {
    /// 唯一名称
    fn name(&self) -> &str;

    /// 所属作用域
    fn scope(&self) -> &str;

    /// 构建条目
    fn make(&self, ctx: &dyn ItemResolver) -> Result<Item, BoxError>;

    /// 释放条目持有的资源，尽力而为
    fn close(&self, _item: Item) {}
}

/// 闭包 Maker
pub struct FnMaker {
    name: String,
    scope: String,
    build: BuildFn,
    close: Option<CloseFn>,
}

impl FnMaker {
    /// 创建 Maker，`build` 在首次获取条目时调用
    pub fn new<F>(name: impl Into<String>, scope: impl Into<String>, build: F) -> Self
    where
        F: Fn(&dyn ItemResolver) -> Result<Item, BoxError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            scope: scope.into(),
            build: Box::new(build),
            close: None,
        }
    }

    /// 设置关闭函数
    pub fn with_close<F>(mut self, close: F) -> Self
    where
        F: Fn(Item) + Send + Sync + 'static,
    {
        self.close = Some(Box::new(close));
        self
    }

    /// 转换为共享的 trait 对象
    pub fn shared(self) -> Arc<dyn Maker> {
        Arc::new(self)
    }
}

impl Maker for FnMaker {
    fn name(&self) -> &str {
        &self.name
    }

    fn scope(&self) -> &str {
        &self.scope
    }

    fn make(&self, ctx: &dyn ItemResolver) -> Result<Item, BoxError> {
        (self.build)(ctx)
    }

    fn close(&self, item: Item) {
        if let Some(close) = &self.close {
            close(item);
        }
    }
}

impl fmt::Debug for FnMaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnMaker")
            .field("name", &self.name)
            .field("scope", &self.scope)
            .field("build", &"<function>")
            .field("close", &self.close.as_ref().map(|_| "<function>"))
            .finish()
    }
}

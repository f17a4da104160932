//! # Dependency Injection Abstractions
//!
//! 作用域上下文容器的抽象层，定义 Maker 契约和条目解析接口。
//!
//! ## 核心接口
//!
//! - [`Maker`] - 带作用域的构建/关闭函数对
//! - [`FnMaker`] - 基于闭包的 Maker 实现
//! - [`ItemResolver`] - 构建函数可见的上下文视图
//! - [`fill()`] - 将条目写入目标变量

pub mod factory;
pub mod fill;
pub mod resolver;

pub use factory::*;
pub use fill::*;
pub use resolver::*;

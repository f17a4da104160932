//! # Infrastructure Common
//!
//! 作用域上下文容器的公共基础设施。
//!
//! ## 核心组件
//!
//! - [`ContextError`] - 上下文操作错误
//! - [`RegistrationError`] - 注册信息校验错误
//! - [`ContextId`] / [`ContextState`] - 上下文标识与状态
//! - [`init_logging`] - 日志系统初始化

pub mod errors;
pub mod lifecycle;
pub mod logging;

pub use errors::*;
pub use lifecycle::*;
pub use logging::*;

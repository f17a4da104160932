//! # 作用域上下文容器实现
//!
//! 提供别名解析、上下文管理器以及按作用域构建、缓存和关闭条目的上下文树。
//!
//! ```
//! use di_abstractions::{FnMaker, Item};
//! use di_impl::{AliasMap, ContextManager};
//! use std::collections::HashMap;
//! use std::sync::Arc;
//!
//! let manager = ContextManager::new(
//!     ["app", "request"],
//!     AliasMap::new(),
//!     HashMap::new(),
//!     vec![FnMaker::new("greeting", "app", |_| Ok(Arc::new("hello") as Item)).shared()],
//! )
//! .unwrap();
//!
//! let app = manager.root_context();
//! let request = app.sub_context("request").unwrap();
//! assert_eq!(*request.get_as::<&str>("greeting").unwrap(), "hello");
//! assert!(app.is_built("greeting"));
//!
//! app.delete();
//! assert!(request.is_closed());
//! ```

pub mod alias;
pub mod configuration;
pub mod context;
pub mod manager;

pub use alias::AliasMap;
pub use configuration::ContextManagerConfig;
pub use context::Context;
pub use manager::ContextManager;

//! 作用域上下文树
//!
//! 每个 [`Context`] 对应一个作用域，按需构建并缓存该作用域的条目，
//! 并拥有更内层作用域的子上下文。节点保存在同一棵树共享的节点表中，
//! 父子关系以 [`ContextId`] 记录。
//!
//! 加锁规则：
//!
//! - 每个节点只有一把锁，只保护自身的管理器引用、父节点、子节点和缓存；
//! - 调用构建函数或关闭函数时不持有任何节点锁；
//! - 不同节点的锁从不嵌套获取。

use crate::manager::ContextManager;
use dashmap::DashMap;
use di_abstractions::{Item, ItemResolver, Maker};
use indexmap::IndexMap;
use infrastructure_common::{ContextError, ContextId, ContextResult, ContextState};
use parking_lot::Mutex;
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, warn};

/// 同一棵上下文树的节点表
#[derive(Default)]
struct Arena {
    nodes: DashMap<ContextId, Arc<Node>>,
}

impl Arena {
    fn node(&self, id: ContextId) -> Option<Arc<Node>> {
        self.nodes.get(&id).map(|entry| Arc::clone(entry.value()))
    }
}

struct Node {
    id: ContextId,
    scope: String,
    state: Mutex<NodeState>,
}

struct NodeState {
    /// `None` 表示上下文已关闭
    manager: Option<Arc<ContextManager>>,
    parent: Option<ContextId>,
    children: Vec<ContextId>,
    /// 按构建顺序保存，关闭时逆序
    items: IndexMap<String, Item>,
}

impl Node {
    fn new(scope: &str, manager: Arc<ContextManager>, parent: Option<ContextId>) -> Self {
        Self {
            id: ContextId::new(),
            scope: scope.to_string(),
            state: Mutex::new(NodeState {
                manager: Some(manager),
                parent,
                children: Vec::new(),
                items: IndexMap::new(),
            }),
        }
    }
}

/// 上下文
///
/// 轻量句柄，克隆后指向同一个节点。
#[derive(Clone)]
pub struct Context {
    node: Arc<Node>,
    arena: Arc<Arena>,
}

impl Context {
    /// 创建一棵新树的根上下文
    pub(crate) fn root(manager: Arc<ContextManager>) -> Self {
        // 作用域列表在管理器构造时已保证非空
        let scope = manager.scopes()[0].clone();
        let node = Arc::new(Node::new(&scope, manager, None));
        let arena = Arc::new(Arena::default());
        arena.nodes.insert(node.id, Arc::clone(&node));

        debug!("创建根上下文: {} ({})", scope, node.id);
        Self { node, arena }
    }

    fn with_node(&self, node: Arc<Node>) -> Self {
        Self {
            node,
            arena: Arc::clone(&self.arena),
        }
    }

    /// 节点标识，同一节点的所有句柄相同
    pub fn id(&self) -> ContextId {
        self.node.id
    }

    /// 上下文的作用域名称
    pub fn scope(&self) -> &str {
        &self.node.scope
    }

    /// 当前状态，删除后为 [`ContextState::Closed`]
    pub fn state(&self) -> ContextState {
        if self.node.state.lock().manager.is_some() {
            ContextState::Open
        } else {
            ContextState::Closed
        }
    }

    /// 是否已删除
    pub fn is_closed(&self) -> bool {
        self.state().is_closed()
    }

    /// 创建该上下文的管理器，已关闭时返回 `None`
    pub fn context_manager(&self) -> Option<Arc<ContextManager>> {
        self.node.state.lock().manager.clone()
    }

    /// 父上下文，根节点或已删除时返回 `None`
    pub fn parent(&self) -> Option<Context> {
        let parent = self.node.state.lock().parent;
        parent
            .and_then(|id| self.arena.node(id))
            .map(|node| self.with_node(node))
    }

    /// 当前子上下文的快照
    pub fn children(&self) -> Vec<Context> {
        let children = self.node.state.lock().children.clone();
        children
            .into_iter()
            .filter_map(|id| self.arena.node(id))
            .map(|node| self.with_node(node))
            .collect()
    }

    /// 外层作用域列表，已关闭时为空
    pub fn parent_scopes(&self) -> Vec<String> {
        self.context_manager()
            .map(|manager| manager.parent_scopes(self.scope()).to_vec())
            .unwrap_or_default()
    }

    /// 内层作用域列表，已关闭时为空
    pub fn sub_scopes(&self) -> Vec<String> {
        self.context_manager()
            .map(|manager| manager.sub_scopes(self.scope()).to_vec())
            .unwrap_or_default()
    }

    /// `scope` 是否为当前作用域的内层作用域
    pub fn has_sub_scope(&self, scope: &str) -> bool {
        self.sub_scopes().iter().any(|s| s == scope)
    }

    /// 沿父节点向上查找作用域为 `scope` 的上下文，不包含自身
    pub fn parent_with_scope(&self, scope: &str) -> Option<Context> {
        let mut parent = self.parent();
        while let Some(ctx) = parent {
            if ctx.scope() == scope {
                return Some(ctx);
            }
            parent = ctx.parent();
        }
        None
    }

    /// 在内层作用域 `scope` 中创建子上下文
    ///
    /// 中间作用域的上下文会被依次创建，返回作用域为 `scope` 的最内层节点。
    pub fn sub_context(&self, scope: &str) -> ContextResult<Context> {
        let manager = self
            .context_manager()
            .ok_or_else(|| ContextError::closed(self.scope()))?;

        let sub_scopes = manager.sub_scopes(self.scope());
        let depth = sub_scopes
            .iter()
            .position(|s| s == scope)
            .ok_or_else(|| ContextError::scope_mismatch(self.scope(), scope))?;

        let mut current = self.clone();
        for intermediate in &sub_scopes[..=depth] {
            current = current.spawn_child(intermediate)?;
        }
        Ok(current)
    }

    fn spawn_child(&self, scope: &str) -> ContextResult<Context> {
        let mut state = self.node.state.lock();
        let manager = state
            .manager
            .clone()
            .ok_or_else(|| ContextError::closed(self.scope()))?;

        let child = Arc::new(Node::new(scope, manager, Some(self.node.id)));
        self.arena.nodes.insert(child.id, Arc::clone(&child));
        state.children.push(child.id);
        drop(state);

        debug!("创建子上下文: {} ({}), 父上下文 {}", scope, child.id, self.node.id);
        Ok(self.with_node(child))
    }

    /// 获取条目
    ///
    /// 预构建实例直接返回；否则在 Maker 所属作用域的上下文中构建或复用。
    pub fn safe_get(&self, name: &str) -> ContextResult<Item> {
        let manager = self
            .context_manager()
            .ok_or_else(|| ContextError::closed(self.scope()))?;

        let resolved = manager.resolve_name(name)?;

        if let Some(instance) = manager.instance(&resolved) {
            return Ok(Arc::clone(instance));
        }

        let maker = manager
            .maker(&resolved)
            .cloned()
            .ok_or_else(|| ContextError::Unresolved {
                name: name.to_string(),
            })?;

        if maker.scope() != self.scope() {
            return self.make_in_parent(&maker);
        }

        self.make_in_this_context(&maker)
    }

    /// 与 [`safe_get`](Self::safe_get) 相同，但丢弃错误
    pub fn get(&self, name: &str) -> Option<Item> {
        self.safe_get(name).ok()
    }

    /// 获取条目并转换为具体类型
    pub fn get_as<T>(&self, name: &str) -> ContextResult<Arc<T>>
    where
        T: Any + Send + Sync,
    {
        self.as_resolver().get_as(name)
    }

    /// 获取条目并写入 `target`
    pub fn fill<T>(&self, name: &str, target: &mut T) -> ContextResult<()>
    where
        T: Any + Clone,
    {
        self.as_resolver().fill(name, target)
    }

    fn as_resolver(&self) -> &dyn ItemResolver {
        self
    }

    /// `name` 对应的条目是否缓存在当前上下文中
    pub fn is_built(&self, name: &str) -> bool {
        let Some(manager) = self.context_manager() else {
            return false;
        };
        let Ok(resolved) = manager.resolve_name(name) else {
            return false;
        };
        self.node.state.lock().items.contains_key(&resolved)
    }

    fn make_in_parent(&self, maker: &Arc<dyn Maker>) -> ContextResult<Item> {
        let parent = self
            .parent_with_scope(maker.scope())
            .ok_or_else(|| ContextError::scope_mismatch(self.scope(), maker.scope()))?;

        parent.make_in_this_context(maker)
    }

    fn make_in_this_context(&self, maker: &Arc<dyn Maker>) -> ContextResult<Item> {
        {
            let state = self.node.state.lock();
            if state.manager.is_none() {
                return Err(ContextError::closed(self.scope()));
            }
            if let Some(item) = state.items.get(maker.name()) {
                return Ok(Arc::clone(item));
            }
        }

        // 首次并发访问时构建函数可能执行多次，缓存保留最后一次写入
        let item = self.make_item(maker.as_ref())?;

        let mut state = self.node.state.lock();
        if state.manager.is_none() {
            drop(state);
            close_item(maker.as_ref(), item);
            return Err(ContextError::closed(self.scope()));
        }
        state
            .items
            .insert(maker.name().to_string(), Arc::clone(&item));

        Ok(item)
    }

    fn make_item(&self, maker: &dyn Maker) -> ContextResult<Item> {
        debug!("构建条目: {} (作用域 {}, 上下文 {})", maker.name(), self.scope(), self.node.id);

        match panic::catch_unwind(AssertUnwindSafe(|| maker.make(self))) {
            Ok(Ok(item)) => Ok(item),
            Ok(Err(source)) => Err(ContextError::BuildFailure {
                name: maker.name().to_string(),
                source,
            }),
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                warn!("构建条目时发生 panic: {}, {}", maker.name(), message);
                Err(ContextError::BuildFailure {
                    name: maker.name().to_string(),
                    source: format!("panic: {message}").into(),
                })
            }
        }
    }

    /// 删除上下文
    ///
    /// 先删除所有子上下文，再从父上下文中移除自身，最后逆序关闭本上下文构建的条目。
    /// 重复调用无效果，关闭函数中的 panic 会被忽略。
    pub fn delete(&self) {
        let (manager, parent, children, items) = {
            let mut state = self.node.state.lock();
            let Some(manager) = state.manager.take() else {
                return;
            };
            (
                manager,
                state.parent,
                state.children.clone(),
                state.items.clone(),
            )
        };

        debug!(
            "删除上下文: {} ({}), {} 个子上下文, {} 个条目",
            self.scope(),
            self.node.id,
            children.len(),
            items.len()
        );

        for child in children.into_iter().filter_map(|id| self.arena.node(id)) {
            self.with_node(child).delete();
        }

        if let Some(parent) = parent.and_then(|id| self.arena.node(id)) {
            parent
                .state
                .lock()
                .children
                .retain(|id| *id != self.node.id);
        }

        for (name, item) in items.into_iter().rev() {
            if let Some(maker) = manager.maker(&name) {
                close_item(maker.as_ref(), item);
            }
        }

        {
            let mut state = self.node.state.lock();
            state.parent = None;
            state.children.clear();
            state.items.clear();
        }
        self.arena.nodes.remove(&self.node.id);
    }
}

impl ItemResolver for Context {
    fn scope(&self) -> &str {
        Context::scope(self)
    }

    fn safe_get(&self, name: &str) -> ContextResult<Item> {
        Context::safe_get(self, name)
    }
}

impl PartialEq for Context {
    fn eq(&self, other: &Self) -> bool {
        self.node.id == other.node.id
    }
}

impl Eq for Context {}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("id", &self.node.id)
            .field("scope", &self.node.scope)
            .field("state", &self.state())
            .finish()
    }
}

fn close_item(maker: &dyn Maker, item: Item) {
    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| maker.close(item))) {
        warn!(
            "关闭条目时发生 panic, 已忽略: {}, {}",
            maker.name(),
            panic_message(payload.as_ref())
        );
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

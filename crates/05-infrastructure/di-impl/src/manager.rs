//! 上下文管理器
//!
//! 保存作用域顺序、别名表、预构建实例和 Maker，是同一棵上下文树共享的注册表。
//! 构造完成后只读。

use crate::alias::AliasMap;
use crate::configuration::ContextManagerConfig;
use crate::context::Context;
use di_abstractions::{Item, Maker};
use infrastructure_common::{ContextResult, InfrastructureResult, RegistrationError};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// 上下文管理器
pub struct ContextManager {
    /// 作用域列表，由外到内，根作用域下标为 0
    scopes: Vec<String>,
    aliases: AliasMap,
    instances: HashMap<String, Item>,
    makers: HashMap<String, Arc<dyn Maker>>,
}

impl ContextManager {
    /// 创建上下文管理器并校验注册信息
    pub fn new<S>(
        scopes: impl IntoIterator<Item = S>,
        aliases: AliasMap,
        instances: HashMap<String, Item>,
        makers: impl IntoIterator<Item = Arc<dyn Maker>>,
    ) -> Result<Arc<Self>, RegistrationError>
    where
        S: Into<String>,
    {
        let scopes: Vec<String> = scopes.into_iter().map(Into::into).collect();
        validate_scopes(&scopes)?;

        let mut registered = HashMap::new();
        for maker in makers {
            if !scopes.iter().any(|s| s == maker.scope()) {
                return Err(RegistrationError::UndeclaredScope {
                    name: maker.name().to_string(),
                    scope: maker.scope().to_string(),
                });
            }
            if instances.contains_key(maker.name()) || registered.contains_key(maker.name()) {
                return Err(RegistrationError::DuplicateName {
                    name: maker.name().to_string(),
                });
            }
            registered.insert(maker.name().to_string(), maker);
        }

        info!(
            "创建上下文管理器: 作用域 {:?}, {} 个实例, {} 个 Maker, {} 个别名",
            scopes,
            instances.len(),
            registered.len(),
            aliases.len()
        );

        Ok(Arc::new(Self {
            scopes,
            aliases,
            instances,
            makers: registered,
        }))
    }

    /// 使用配置中的作用域和别名创建上下文管理器
    pub fn from_config(
        config: &ContextManagerConfig,
        instances: HashMap<String, Item>,
        makers: impl IntoIterator<Item = Arc<dyn Maker>>,
    ) -> Result<Arc<Self>, RegistrationError> {
        Self::new(
            config.scopes.iter().cloned(),
            config.aliases.copy(),
            instances,
            makers,
        )
    }

    /// 从配置文件加载作用域和别名并创建上下文管理器
    pub fn from_config_file(
        path: impl AsRef<Path>,
        instances: HashMap<String, Item>,
        makers: impl IntoIterator<Item = Arc<dyn Maker>>,
    ) -> InfrastructureResult<Arc<Self>> {
        let config = ContextManagerConfig::from_file(path)?;
        Ok(Self::from_config(&config, instances, makers)?)
    }

    /// 创建一棵新上下文树的根节点
    pub fn root_context(self: &Arc<Self>) -> Context {
        Context::root(Arc::clone(self))
    }

    /// 所有作用域，由外到内
    pub fn scopes(&self) -> &[String] {
        &self.scopes
    }

    /// `scope` 之前的作用域，未知作用域返回空
    pub fn parent_scopes(&self, scope: &str) -> &[String] {
        self.scope_index(scope)
            .map_or(&[][..], |i| &self.scopes[..i])
    }

    /// `scope` 之后的作用域，未知作用域返回空
    pub fn sub_scopes(&self, scope: &str) -> &[String] {
        self.scope_index(scope)
            .map_or(&[][..], |i| &self.scopes[i + 1..])
    }

    /// 构造时提供的别名表
    pub fn aliases(&self) -> &AliasMap {
        &self.aliases
    }

    /// 通过别名表解析名称
    pub fn resolve_name(&self, name: &str) -> ContextResult<String> {
        self.aliases.get(name)
    }

    /// 按解析后的名称查找预构建实例
    pub fn instance(&self, name: &str) -> Option<&Item> {
        self.instances.get(name)
    }

    /// 按解析后的名称查找 Maker
    pub fn maker(&self, name: &str) -> Option<&Arc<dyn Maker>> {
        self.makers.get(name)
    }

    fn scope_index(&self, scope: &str) -> Option<usize> {
        self.scopes.iter().position(|s| s == scope)
    }
}

impl fmt::Debug for ContextManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut instances: Vec<_> = self.instances.keys().collect();
        instances.sort();
        let mut makers: Vec<_> = self.makers.keys().collect();
        makers.sort();

        f.debug_struct("ContextManager")
            .field("scopes", &self.scopes)
            .field("aliases", &self.aliases)
            .field("instances", &instances)
            .field("makers", &makers)
            .finish()
    }
}

/// 作用域列表不能为空且不能重复
pub(crate) fn validate_scopes(scopes: &[String]) -> Result<(), RegistrationError> {
    if scopes.is_empty() {
        return Err(RegistrationError::EmptyScopes);
    }

    let mut seen = HashSet::new();
    for scope in scopes {
        if !seen.insert(scope.as_str()) {
            return Err(RegistrationError::DuplicateScope {
                scope: scope.clone(),
            });
        }
    }

    Ok(())
}

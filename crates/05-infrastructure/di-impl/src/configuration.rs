//! 上下文管理器配置
//!
//! 作用域顺序和别名表可以来自配置文件，Maker 和实例仍由代码注册。
//!
//! ```toml
//! scopes = ["app", "request", "subrequest"]
//!
//! [aliases]
//! database = "db"
//!
//! [logging]
//! level = "info"
//! ```

use crate::alias::AliasMap;
use crate::manager::validate_scopes;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File, FileFormat};
use infrastructure_common::{ConfigError, ConfigResult, LoggingConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// 环境变量前缀，例如 `DI_CONTEXT__SCOPES=app,request`
pub const ENV_PREFIX: &str = "DI_CONTEXT";

/// 上下文管理器配置
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextManagerConfig {
    /// 作用域列表，由外到内
    pub scopes: Vec<String>,
    #[serde(default)]
    pub aliases: AliasMap,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ContextManagerConfig {
    /// 从配置文件加载，格式由扩展名决定，环境变量可覆盖文件中的值
    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        debug!("加载上下文配置文件: {}", path.display());

        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.display().to_string(),
            });
        }

        let environment = Environment::with_prefix(ENV_PREFIX)
            .separator("__")
            .list_separator(",")
            .with_list_parse_key("scopes")
            .try_parsing(true);

        Self::build(
            Config::builder()
                .add_source(File::from(path))
                .add_source(environment),
        )
    }

    /// 从 TOML 文本加载
    pub fn from_toml_str(text: &str) -> ConfigResult<Self> {
        Self::build(Config::builder().add_source(File::from_str(text, FileFormat::Toml)))
    }

    /// 校验作用域列表
    pub fn validate(&self) -> ConfigResult<()> {
        validate_scopes(&self.scopes).map_err(|e| ConfigError::ValidationError {
            message: e.to_string(),
        })
    }

    fn build(builder: ConfigBuilder<DefaultState>) -> ConfigResult<Self> {
        let config: Self = builder
            .build()
            .and_then(Config::try_deserialize)
            .map_err(|e| ConfigError::ParseError {
                source: Box::new(e),
            })?;

        config.validate()?;
        debug!("上下文配置加载完成: 作用域 {:?}", config.scopes);
        Ok(config)
    }
}

//! 日志系统初始化

use crate::errors::{InfrastructureError, InfrastructureResult};
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

/// 日志配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 过滤指令，例如 `info` 或 `di_impl=debug`
    pub level: String,
    /// 是否输出 JSON 格式
    pub json_format: bool,
    /// 是否显示 target
    pub show_target: bool,
    /// 是否显示线程 ID
    pub show_thread_ids: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            show_target: true,
            show_thread_ids: false,
        }
    }
}

/// 初始化全局日志订阅者
///
/// 已经初始化过时返回错误，调用方可以选择忽略。
pub fn init_logging(config: &LoggingConfig) -> InfrastructureResult<()> {
    let filter =
        EnvFilter::try_new(&config.level).map_err(|e| InfrastructureError::LoggingInitFailed {
            message: format!("无效的日志级别 {}: {}", config.level, e),
        })?;

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(config.show_target)
        .with_thread_ids(config.show_thread_ids);

    let result = if config.json_format {
        subscriber.json().try_init()
    } else {
        subscriber.try_init()
    };
    result.map_err(|e| InfrastructureError::LoggingInitFailed {
        message: e.to_string(),
    })?;

    tracing::info!("日志系统初始化完成");
    Ok(())
}

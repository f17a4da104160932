//! 错误类型定义

use thiserror::Error;

/// 构建函数返回的错误类型
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// 上下文操作错误类型
#[derive(Error, Debug)]
pub enum ContextError {
    #[error("上下文已被删除: {scope}")]
    ClosedContext { scope: String },

    #[error("别名存在循环引用: {name}")]
    CircularAlias { name: String },

    #[error("未找到实例或 Maker: {name}")]
    Unresolved { name: String },

    #[error("作用域不匹配: 当前 {current}, 请求 {requested}")]
    ScopeMismatch { current: String, requested: String },

    #[error("构建失败: {name}, 原因: {source}")]
    BuildFailure { name: String, source: BoxError },

    #[error("类型不匹配: {name}, 期望类型 {expected}")]
    TypeMismatch { name: String, expected: &'static str },
}

impl ContextError {
    /// 创建上下文已删除错误
    pub fn closed(scope: impl Into<String>) -> Self {
        Self::ClosedContext {
            scope: scope.into(),
        }
    }

    /// 创建作用域不匹配错误
    pub fn scope_mismatch(current: impl Into<String>, requested: impl Into<String>) -> Self {
        Self::ScopeMismatch {
            current: current.into(),
            requested: requested.into(),
        }
    }
}

/// 注册信息校验错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    #[error("至少需要声明一个作用域")]
    EmptyScopes,

    #[error("作用域重复声明: {scope}")]
    DuplicateScope { scope: String },

    #[error("Maker {name} 使用了未声明的作用域 {scope}")]
    UndeclaredScope { name: String, scope: String },

    #[error("名称重复注册: {name}")]
    DuplicateName { name: String },
}

/// 配置错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置文件不存在: {path}")]
    FileNotFound { path: String },

    #[error("配置解析失败: {source}")]
    ParseError { source: BoxError },

    #[error("配置验证失败: {message}")]
    ValidationError { message: String },
}

/// 基础设施错误类型
#[derive(Error, Debug)]
pub enum InfrastructureError {
    #[error("上下文错误: {source}")]
    Context {
        #[from]
        source: ContextError,
    },

    #[error("注册错误: {source}")]
    Registration {
        #[from]
        source: RegistrationError,
    },

    #[error("配置错误: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },

    #[error("日志初始化失败: {message}")]
    LoggingInitFailed { message: String },
}

/// 结果类型别名
pub type ContextResult<T> = Result<T, ContextError>;
pub type ConfigResult<T> = Result<T, ConfigError>;
pub type InfrastructureResult<T> = Result<T, InfrastructureError>;

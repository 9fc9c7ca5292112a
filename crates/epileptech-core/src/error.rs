//! 错误定义模块

use thiserror::Error;

/// 病例系统统一错误类型
#[derive(Error, Debug)]
pub enum EpileptechError {
    #[error("病例编号已存在: {0}")]
    DuplicateId(String),

    #[error("病例未找到: {0}")]
    NotFound(String),

    #[error("验证错误: {0}")]
    Validation(String),

    #[error("无效状态转换: 从 {from} 到 {event}")]
    InvalidStateTransition { from: String, event: String },

    #[error("配置错误: {0}")]
    Config(String),

    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("序列化错误: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// 病例系统统一结果类型
pub type Result<T> = std::result::Result<T, EpileptechError>;

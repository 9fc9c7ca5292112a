//! 日志初始化
//!
//! 日志级别的优先顺序：命令行显式指定 > `RUST_LOG` 环境变量 > 配置文件。
//! 日志统一写入标准错误，标准输出只保留命令结果。

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use crate::config::{LogFormat, LoggingConfig};

/// 解析日志过滤指令
pub fn parse_filter(level: &str) -> Result<EnvFilter> {
    EnvFilter::try_new(level).with_context(|| format!("Invalid log filter: {}", level))
}

/// 选择生效的日志过滤指令
pub fn filter_directive(
    config_level: &str,
    explicit: Option<&str>,
    env_level: Option<String>,
) -> String {
    if let Some(level) = explicit {
        return level.to_string();
    }
    match env_level {
        Some(level) if !level.trim().is_empty() => level,
        _ => config_level.to_string(),
    }
}

/// 初始化全局日志订阅器
///
/// `explicit` 为命令行指定的级别。重复初始化会返回错误。
pub fn init_logging(config: &LoggingConfig, explicit: Option<&str>) -> Result<()> {
    let env_level = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let directive = filter_directive(&config.level, explicit, env_level);
    let filter = parse_filter(&directive)?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    let installed = match config.format {
        LogFormat::Full => builder.try_init(),
        LogFormat::Compact => builder.compact().try_init(),
    };
    installed.map_err(|e| anyhow::anyhow!("Failed to install log subscriber: {}", e))?;

    tracing::debug!("Logging initialized with filter {}", directive);
    Ok(())
}

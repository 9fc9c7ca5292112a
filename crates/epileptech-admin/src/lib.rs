//! # EpilepTech管理模块
//!
//! 提供配置管理、日志初始化以及按配置构建病例存储的运维功能

pub mod config;
pub mod logging;

use anyhow::{Context, Result};
use epileptech_registry::{sample_cases, CaseStore};

pub use config::{ConfigManager, EpileptechConfig};

/// 按配置构建病例存储
pub async fn build_store(config: &EpileptechConfig) -> Result<CaseStore> {
    let store = CaseStore::new();

    if config.registry.seed_sample_data {
        let seed = sample_cases().context("Failed to build sample cases")?;
        store.init(seed).await.context("Failed to seed case store")?;
    } else {
        store.init(Vec::new()).await.context("Failed to initialize case store")?;
    }

    Ok(store)
}

//! 病例存储句柄
//!
//! 以显式句柄的方式向各层提供登记表，替代全局共享状态。
//! 句柄可以克隆，所有克隆共享同一个登记表。

use std::sync::Arc;

use chrono::{DateTime, Utc};
use epileptech_core::{AnalysisResult, CaseId, CaseRecord, Confidence, Result};
use tokio::sync::RwLock;

use crate::query::{QueryEngine, QuerySpec};
use crate::registry::{CaseRegistry, RegistryStats};

/// 病例存储
#[derive(Debug, Clone, Default)]
pub struct CaseStore {
    registry: Arc<RwLock<CaseRegistry>>,
}

impl CaseStore {
    /// 创建空的病例存储
    pub fn new() -> Self {
        Self::default()
    }

    /// 用给定病例初始化存储，替换现有内容
    ///
    /// 种子数据中出现重复编号时返回错误，存储保持原状。
    pub async fn init(&self, seed: Vec<CaseRecord>) -> Result<()> {
        let mut fresh = CaseRegistry::new();
        for record in seed {
            fresh.insert(record)?;
        }

        let mut registry = self.registry.write().await;
        *registry = fresh;
        tracing::info!("Case store initialized with {} cases", registry.len());
        Ok(())
    }

    /// 清空存储
    pub async fn reset(&self) {
        let mut registry = self.registry.write().await;
        registry.clear();
        tracing::info!("Case store reset");
    }

    pub async fn insert(&self, record: CaseRecord) -> Result<()> {
        self.registry.write().await.insert(record)
    }

    pub async fn remove(&self, id: &CaseId) -> Result<CaseRecord> {
        self.registry.write().await.remove(id)
    }

    /// 记录分析完成，返回更新后的病例
    pub async fn complete_analysis(
        &self,
        id: &CaseId,
        result: AnalysisResult,
        confidence: Confidence,
    ) -> Result<CaseRecord> {
        let mut registry = self.registry.write().await;
        registry.complete_analysis(id, result, confidence).cloned()
    }

    pub async fn contains(&self, id: &CaseId) -> bool {
        self.registry.read().await.contains(id)
    }

    pub async fn get(&self, id: &CaseId) -> Option<CaseRecord> {
        self.registry.read().await.get(id).cloned()
    }

    pub async fn snapshot(&self) -> Vec<CaseRecord> {
        self.registry.read().await.snapshot()
    }

    pub async fn stats(&self) -> RegistryStats {
        self.registry.read().await.stats()
    }

    pub async fn len(&self) -> usize {
        self.registry.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.registry.read().await.is_empty()
    }

    /// 对当前快照执行查询
    pub async fn query(&self, spec: &QuerySpec, now: DateTime<Utc>) -> Vec<CaseRecord> {
        let snapshot = self.snapshot().await;
        QueryEngine::evaluate(&snapshot, spec, now)
    }
}

//! 病例登记表
//!
//! 按登记顺序保存全部病例。登记顺序即默认展示顺序，登记表本身不做排序。

use std::collections::{HashMap, HashSet};

use epileptech_core::{
    AnalysisResult, CaseId, CaseRecord, CaseState, CaseStatus, Confidence, EpileptechError,
    Result,
};
use serde::{Deserialize, Serialize};

/// 登记表统计
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegistryStats {
    pub total: usize,
    pub pending: usize,
    pub completed: usize,
    pub by_result: HashMap<AnalysisResult, usize>,
}

/// 病例登记表
#[derive(Debug, Default)]
pub struct CaseRegistry {
    records: Vec<CaseRecord>,
    ids: HashSet<CaseId>,
}

impl CaseRegistry {
    /// 创建空的登记表
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记病例，追加到末尾
    ///
    /// 编号已存在时返回 `DuplicateId`，登记表保持不变。
    pub fn insert(&mut self, record: CaseRecord) -> Result<()> {
        if self.ids.contains(&record.id) {
            tracing::warn!("Rejected duplicate case id {}", record.id);
            return Err(EpileptechError::DuplicateId(record.id.to_string()));
        }

        tracing::info!(
            "Registered case {} ({}) with status {}",
            record.id,
            record.patient.full_name(),
            record.status()
        );
        self.ids.insert(record.id.clone());
        self.records.push(record);
        Ok(())
    }

    /// 删除病例
    pub fn remove(&mut self, id: &CaseId) -> Result<CaseRecord> {
        let position = self
            .position(id)
            .ok_or_else(|| EpileptechError::NotFound(id.to_string()))?;

        let record = self.records.remove(position);
        self.ids.remove(id);

        tracing::info!("Removed case {}", id);
        Ok(record)
    }

    /// 记录分析完成，原位替换病例状态
    pub fn complete_analysis(
        &mut self,
        id: &CaseId,
        result: AnalysisResult,
        confidence: Confidence,
    ) -> Result<&CaseRecord> {
        let position = self
            .position(id)
            .ok_or_else(|| EpileptechError::NotFound(id.to_string()))?;

        let record = &mut self.records[position];
        if record.status() != CaseStatus::Pending {
            return Err(EpileptechError::InvalidStateTransition {
                from: record.status().to_string(),
                event: "analysis_completed".to_string(),
            });
        }

        record.state = CaseState::Completed { result, confidence };
        tracing::info!(
            "Case {} analysis completed: {} ({}%)",
            id,
            result,
            confidence.percent()
        );
        Ok(&self.records[position])
    }

    /// 获取当前登记表的不可变副本
    pub fn snapshot(&self) -> Vec<CaseRecord> {
        self.records.clone()
    }

    /// 获取病例
    pub fn get(&self, id: &CaseId) -> Option<&CaseRecord> {
        self.position(id).map(|position| &self.records[position])
    }

    pub fn contains(&self, id: &CaseId) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// 清空登记表
    pub fn clear(&mut self) {
        let removed = self.records.len();
        self.records.clear();
        self.ids.clear();
        tracing::debug!("Cleared {} cases from registry", removed);
    }

    /// 获取登记表统计
    pub fn stats(&self) -> RegistryStats {
        let mut stats = RegistryStats {
            total: self.records.len(),
            ..Default::default()
        };

        for record in &self.records {
            match record.state {
                CaseState::Pending => stats.pending += 1,
                CaseState::Completed { result, .. } => {
                    stats.completed += 1;
                    *stats.by_result.entry(result).or_insert(0) += 1;
                }
            }
        }

        stats
    }

    fn position(&self, id: &CaseId) -> Option<usize> {
        if !self.ids.contains(id) {
            return None;
        }
        self.records.iter().position(|record| &record.id == id)
    }
}

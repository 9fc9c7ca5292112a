//! 病例录入
//!
//! 校验上传表单，生成待分析病例并登记到存储中。

use std::path::Path;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use epileptech_core::utils::generate_case_id;
use epileptech_core::{CaseId, CaseRecord, EpileptechError, Gender, PatientInfo, Result};
use serde::{Deserialize, Serialize};

use crate::store::CaseStore;

/// 录入策略
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntakePolicy {
    /// 允许的脑电文件扩展名（含点号，不区分大小写）
    pub allowed_extensions: Vec<String>,
    /// 自动生成编号冲突时的最大尝试次数
    pub max_id_attempts: u32,
}

impl Default for IntakePolicy {
    fn default() -> Self {
        Self {
            allowed_extensions: vec![
                ".edf".to_string(),
                ".bdf".to_string(),
                ".zip".to_string(),
                ".gz".to_string(),
            ],
            max_id_attempts: 5,
        }
    }
}

impl IntakePolicy {
    /// 检查文件扩展名是否受支持
    pub fn accepts_file(&self, file_name: &str) -> bool {
        let extension = match Path::new(file_name).extension().and_then(|ext| ext.to_str()) {
            Some(ext) => format!(".{}", ext.to_ascii_lowercase()),
            None => return false,
        };
        self.allowed_extensions
            .iter()
            .any(|allowed| allowed.to_ascii_lowercase() == extension)
    }
}

/// 病例上传表单
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntakeForm {
    /// 指定的病例编号，为空时自动生成
    pub case_id: Option<String>,
    /// 记录日期，为空时取当天
    pub recorded_on: Option<NaiveDate>,
    pub first_name: String,
    pub last_name: String,
    pub age: u32,
    pub gender: Gender,
    pub notes: Option<String>,
    /// 上传的脑电文件名
    pub files: Vec<String>,
}

impl IntakeForm {
    /// 校验表单并生成待分析病例
    pub fn to_case(&self, policy: &IntakePolicy, now: DateTime<Utc>) -> Result<CaseRecord> {
        let id = match &self.case_id {
            Some(id) => CaseId::new(id.trim())?,
            None => CaseId::new(generate_case_id())?,
        };

        let first_name = self.first_name.trim();
        let last_name = self.last_name.trim();
        if first_name.is_empty() || last_name.is_empty() {
            return Err(EpileptechError::Validation("患者姓名不能为空".to_string()));
        }

        if self.files.is_empty() {
            return Err(EpileptechError::Validation("至少需要上传一个脑电文件".to_string()));
        }
        if let Some(rejected) = self.files.iter().find(|file| !policy.accepts_file(file)) {
            return Err(EpileptechError::Validation(format!(
                "不支持的文件格式: {} (支持: {})",
                rejected,
                policy.allowed_extensions.join(", ")
            )));
        }

        let recorded_on = self.recorded_on.unwrap_or_else(|| now.date_naive());
        let midnight = recorded_on
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| EpileptechError::Validation(format!("无效记录日期: {}", recorded_on)))?;

        let notes = self
            .notes
            .as_deref()
            .map(str::trim)
            .filter(|notes| !notes.is_empty())
            .map(str::to_string);

        Ok(CaseRecord::pending(
            id,
            PatientInfo {
                first_name: first_name.to_string(),
                last_name: last_name.to_string(),
                age: self.age,
                gender: self.gender,
            },
            Utc.from_utc_datetime(&midnight),
            notes,
        ))
    }
}

/// 提交表单并登记病例
///
/// 自动生成的编号发生冲突时重新生成，最多尝试 `max_id_attempts` 次；
/// 指定编号冲突时直接返回 `DuplicateId`。
pub async fn submit(
    store: &CaseStore,
    form: &IntakeForm,
    policy: &IntakePolicy,
    now: DateTime<Utc>,
) -> Result<CaseRecord> {
    let attempts = if form.case_id.is_some() {
        1
    } else {
        policy.max_id_attempts.max(1)
    };

    let mut last_error = None;
    for attempt in 1..=attempts {
        let record = form.to_case(policy, now)?;
        match store.insert(record.clone()).await {
            Ok(()) => {
                tracing::info!(
                    "Case {} for {} added to the analysis queue",
                    record.id,
                    record.patient.full_name()
                );
                return Ok(record);
            }
            Err(EpileptechError::DuplicateId(id)) => {
                tracing::debug!("Case id {} already taken (attempt {}/{})", id, attempt, attempts);
                last_error = Some(EpileptechError::DuplicateId(id));
            }
            Err(e) => return Err(e),
        }
    }

    Err(last_error.unwrap_or_else(|| EpileptechError::Validation("病例录入失败".to_string())))
}

//! 核心数据模型定义

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{EpileptechError, Result};
use crate::utils::is_valid_case_id;

/// 病例编号，格式为 `EEG-####`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CaseId(String);

impl CaseId {
    /// 校验并创建病例编号
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if !is_valid_case_id(&id) {
            return Err(EpileptechError::Validation(format!(
                "病例编号格式无效 (应为 EEG-####): {}",
                id
            )));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for CaseId {
    type Err = EpileptechError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for CaseId {
    type Error = EpileptechError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<CaseId> for String {
    fn from(id: CaseId) -> Self {
        id.0
    }
}

/// 性别枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl FromStr for Gender {
    type Err = EpileptechError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            "other" => Ok(Gender::Other),
            _ => Err(EpileptechError::Validation(format!("未知性别: {}", s))),
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gender::Male => write!(f, "Male"),
            Gender::Female => write!(f, "Female"),
            Gender::Other => write!(f, "Other"),
        }
    }
}

/// 患者基本信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientInfo {
    pub first_name: String,
    pub last_name: String,
    pub age: u32,
    pub gender: Gender,
}

impl PatientInfo {
    /// 患者全名 (名 + 空格 + 姓)
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// 分析结果分类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnalysisResult {
    Epileptic,    // 癫痫性
    NonEpileptic, // 非癫痫性
    Psychogenic,  // 心因性
}

impl AnalysisResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisResult::Epileptic => "epileptic",
            AnalysisResult::NonEpileptic => "non-epileptic",
            AnalysisResult::Psychogenic => "psychogenic",
        }
    }

    /// 所有结果分类
    pub fn all() -> [AnalysisResult; 3] {
        [
            AnalysisResult::Epileptic,
            AnalysisResult::NonEpileptic,
            AnalysisResult::Psychogenic,
        ]
    }
}

impl fmt::Display for AnalysisResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnalysisResult {
    type Err = EpileptechError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "epileptic" => Ok(AnalysisResult::Epileptic),
            "non-epileptic" => Ok(AnalysisResult::NonEpileptic),
            "psychogenic" => Ok(AnalysisResult::Psychogenic),
            _ => Err(EpileptechError::Validation(format!("未知分析结果: {}", s))),
        }
    }
}

/// 置信度，取值范围 [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Confidence(f64);

impl Confidence {
    pub fn new(value: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&value) {
            return Err(EpileptechError::Validation(format!(
                "置信度必须在 [0, 1] 范围内: {}",
                value
            )));
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    /// 四舍五入后的百分比
    pub fn percent(&self) -> u32 {
        (self.0 * 100.0).round() as u32
    }
}

impl TryFrom<f64> for Confidence {
    type Error = EpileptechError;

    fn try_from(value: f64) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Confidence> for f64 {
    fn from(confidence: Confidence) -> Self {
        confidence.0
    }
}

/// 病例状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaseStatus {
    Pending,   // 待分析
    Completed, // 已完成
}

impl fmt::Display for CaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaseStatus::Pending => write!(f, "pending"),
            CaseStatus::Completed => write!(f, "completed"),
        }
    }
}

/// 病例分析状态
///
/// 分析结果和置信度只存在于 `Completed` 变体中。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum CaseState {
    Pending,
    Completed {
        result: AnalysisResult,
        confidence: Confidence,
    },
}

impl CaseState {
    pub fn status(&self) -> CaseStatus {
        match self {
            CaseState::Pending => CaseStatus::Pending,
            CaseState::Completed { .. } => CaseStatus::Completed,
        }
    }
}

/// 脑电病例记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCaseRecord")]
pub struct CaseRecord {
    pub id: CaseId,
    pub patient: PatientInfo,
    #[serde(rename = "date")]
    pub recorded_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(flatten)]
    pub state: CaseState,
}

/// 反序列化时的扁平结构，状态与结果字段在转换时校验
#[derive(Debug, Deserialize)]
struct RawCaseRecord {
    id: CaseId,
    patient: PatientInfo,
    #[serde(rename = "date")]
    recorded_at: DateTime<Utc>,
    #[serde(default)]
    notes: Option<String>,
    status: CaseStatus,
    #[serde(default)]
    result: Option<AnalysisResult>,
    #[serde(default)]
    confidence: Option<Confidence>,
}

impl TryFrom<RawCaseRecord> for CaseRecord {
    type Error = EpileptechError;

    fn try_from(raw: RawCaseRecord) -> Result<Self> {
        let state = match (raw.status, raw.result, raw.confidence) {
            (CaseStatus::Pending, None, None) => CaseState::Pending,
            (CaseStatus::Completed, Some(result), Some(confidence)) => {
                CaseState::Completed { result, confidence }
            }
            (CaseStatus::Pending, _, _) => {
                return Err(EpileptechError::Validation(format!(
                    "待分析病例不能包含分析结果或置信度: {}",
                    raw.id
                )))
            }
            (CaseStatus::Completed, _, _) => {
                return Err(EpileptechError::Validation(format!(
                    "已完成病例必须同时包含分析结果和置信度: {}",
                    raw.id
                )))
            }
        };

        Ok(Self {
            id: raw.id,
            patient: raw.patient,
            recorded_at: raw.recorded_at,
            notes: raw.notes,
            state,
        })
    }
}

impl CaseRecord {
    /// 创建待分析病例
    pub fn pending(
        id: CaseId,
        patient: PatientInfo,
        recorded_at: DateTime<Utc>,
        notes: Option<String>,
    ) -> Self {
        Self {
            id,
            patient,
            recorded_at,
            notes,
            state: CaseState::Pending,
        }
    }

    pub fn status(&self) -> CaseStatus {
        self.state.status()
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.state, CaseState::Pending)
    }

    pub fn result(&self) -> Option<AnalysisResult> {
        match self.state {
            CaseState::Completed { result, .. } => Some(result),
            CaseState::Pending => None,
        }
    }

    pub fn confidence(&self) -> Option<Confidence> {
        match self.state {
            CaseState::Completed { confidence, .. } => Some(confidence),
            CaseState::Pending => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_case_id_validation() {
        assert!(CaseId::new("EEG-2845").is_ok());
        assert!(CaseId::new("EEG-284").is_err());
        assert!(CaseId::new("eeg-2845").is_err());
        assert!(CaseId::new("EEG-28450").is_err());
        assert!("EEG-12a4".parse::<CaseId>().is_err());
    }

    #[test]
    fn test_confidence_bounds() {
        assert!(Confidence::new(0.0).is_ok());
        assert!(Confidence::new(1.0).is_ok());
        assert!(Confidence::new(1.01).is_err());
        assert!(Confidence::new(-0.1).is_err());
        assert!(Confidence::new(f64::NAN).is_err());
        assert_eq!(Confidence::new(0.87).unwrap().percent(), 87);
    }

    #[test]
    fn test_result_parsing() {
        assert_eq!(
            "non-epileptic".parse::<AnalysisResult>().unwrap(),
            AnalysisResult::NonEpileptic
        );
        assert!("inconclusive".parse::<AnalysisResult>().is_err());
    }

    #[test]
    fn test_deserialize_completed_record() {
        let json = r#"{
            "id": "EEG-2845",
            "patient": {"firstName": "John", "lastName": "Davis", "age": 45, "gender": "Male"},
            "date": "2025-03-01T10:30:00Z",
            "status": "completed",
            "result": "epileptic",
            "confidence": 0.87
        }"#;

        let record: CaseRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.id.as_str(), "EEG-2845");
        assert_eq!(record.patient.full_name(), "John Davis");
        assert_eq!(record.status(), CaseStatus::Completed);
        assert_eq!(record.result(), Some(AnalysisResult::Epileptic));
        assert_eq!(
            record.recorded_at,
            Utc.with_ymd_and_hms(2025, 3, 1, 10, 30, 0).unwrap()
        );
    }

    #[test]
    fn test_deserialize_rejects_out_of_range_confidence() {
        let json = r#"{
            "id": "EEG-2845",
            "patient": {"firstName": "John", "lastName": "Davis", "age": 45, "gender": "Male"},
            "date": "2025-03-01T10:30:00Z",
            "status": "completed",
            "result": "epileptic",
            "confidence": 1.5
        }"#;

        assert!(serde_json::from_str::<CaseRecord>(json).is_err());
    }

    #[test]
    fn test_deserialize_rejects_pending_with_result() {
        let json = r#"{
            "id": "EEG-3102",
            "patient": {"firstName": "Emma", "lastName": "Wilson", "age": 32, "gender": "Female"},
            "date": "2025-03-02T09:15:00Z",
            "status": "pending",
            "result": "epileptic",
            "confidence": 0.9
        }"#;

        let err = serde_json::from_str::<CaseRecord>(json).unwrap_err();
        assert!(err.to_string().contains("EEG-3102"));
    }

    #[test]
    fn test_deserialize_rejects_completed_without_confidence() {
        let json = r#"{
            "id": "EEG-2845",
            "patient": {"firstName": "John", "lastName": "Davis", "age": 45, "gender": "Male"},
            "date": "2025-03-01T10:30:00Z",
            "status": "completed",
            "result": "epileptic"
        }"#;

        assert!(serde_json::from_str::<CaseRecord>(json).is_err());
    }

    #[test]
    fn test_deserialize_pending_record() {
        let json = r#"{
            "id": "EEG-3015",
            "patient": {"firstName": "David", "lastName": "Kim", "age": 37, "gender": "Male"},
            "date": "2025-03-02T08:30:00Z",
            "status": "pending",
            "notes": "follow-up"
        }"#;

        let record: CaseRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.state, CaseState::Pending);
        assert_eq!(record.notes.as_deref(), Some("follow-up"));
    }

    #[test]
    fn test_pending_record_serializes_without_result() {
        let record = CaseRecord::pending(
            CaseId::new("EEG-3102").unwrap(),
            PatientInfo {
                first_name: "Emma".to_string(),
                last_name: "Wilson".to_string(),
                age: 32,
                gender: Gender::Female,
            },
            Utc.with_ymd_and_hms(2025, 3, 2, 9, 15, 0).unwrap(),
            None,
        );

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["status"], "pending");
        assert!(value.get("result").is_none());
        assert!(value.get("confidence").is_none());
        assert!(value.get("notes").is_none());
    }
}

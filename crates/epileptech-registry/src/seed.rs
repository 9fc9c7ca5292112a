//! 示例病例数据

use chrono::{DateTime, TimeZone, Utc};
use epileptech_core::{
    AnalysisResult, CaseId, CaseRecord, CaseState, Confidence, EpileptechError, Gender,
    PatientInfo, Result,
};

fn at(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> Result<DateTime<Utc>> {
    Utc.with_ymd_and_hms(year, month, day, hour, minute, 0)
        .single()
        .ok_or_else(|| {
            EpileptechError::Validation(format!(
                "无效示例日期: {}-{:02}-{:02} {:02}:{:02}",
                year, month, day, hour, minute
            ))
        })
}

fn patient(first_name: &str, last_name: &str, age: u32, gender: Gender) -> PatientInfo {
    PatientInfo {
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        age,
        gender,
    }
}

fn completed(result: AnalysisResult, confidence: f64) -> Result<CaseState> {
    Ok(CaseState::Completed {
        result,
        confidence: Confidence::new(confidence)?,
    })
}

fn case(
    id: &str,
    patient: PatientInfo,
    recorded_at: DateTime<Utc>,
    state: CaseState,
) -> Result<CaseRecord> {
    Ok(CaseRecord {
        id: CaseId::new(id)?,
        patient,
        recorded_at,
        notes: None,
        state,
    })
}

/// 系统初始的五个示例病例，按登记顺序排列
pub fn sample_cases() -> Result<Vec<CaseRecord>> {
    Ok(vec![
        case(
            "EEG-2845",
            patient("John", "Davis", 45, Gender::Male),
            at(2025, 3, 1, 10, 30)?,
            completed(AnalysisResult::Epileptic, 0.87)?,
        )?,
        case(
            "EEG-3102",
            patient("Emma", "Wilson", 32, Gender::Female),
            at(2025, 3, 2, 9, 15)?,
            CaseState::Pending,
        )?,
        case(
            "EEG-2751",
            patient("Robert", "Brown", 61, Gender::Male),
            at(2025, 2, 28, 14, 45)?,
            completed(AnalysisResult::NonEpileptic, 0.92)?,
        )?,
        case(
            "EEG-2984",
            patient("Maria", "Garcia", 28, Gender::Female),
            at(2025, 2, 27, 11, 20)?,
            completed(AnalysisResult::Psychogenic, 0.56)?,
        )?,
        case(
            "EEG-3015",
            patient("David", "Kim", 37, Gender::Male),
            at(2025, 3, 2, 8, 30)?,
            CaseState::Pending,
        )?,
    ])
}

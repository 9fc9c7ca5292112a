//! 病例查询引擎
//!
//! 在登记表快照上组合应用四类过滤条件（状态标签、关键词、日期范围、结果分类），
//! 所有条件同时满足的病例才会出现在结果中。结果保持快照中的原始顺序。

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use epileptech_core::{AnalysisResult, CaseRecord, CaseStatus, EpileptechError, Result};
use serde::{Deserialize, Serialize};

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// 状态标签
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusTab {
    #[default]
    All,
    Pending,
    Completed,
}

impl FromStr for StatusTab {
    type Err = EpileptechError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "all" => Ok(StatusTab::All),
            "pending" => Ok(StatusTab::Pending),
            "completed" => Ok(StatusTab::Completed),
            _ => Err(EpileptechError::Validation(format!("未知状态标签: {}", s))),
        }
    }
}

impl fmt::Display for StatusTab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusTab::All => write!(f, "all"),
            StatusTab::Pending => write!(f, "pending"),
            StatusTab::Completed => write!(f, "completed"),
        }
    }
}

/// 日期范围
///
/// 按 "距今不超过 N 天" 计算，不是日历边界。未来日期的病例会落入所有范围。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateBucket {
    #[default]
    All,
    Today,
    Week,
    Month,
}

impl DateBucket {
    /// 允许的最大天数差，`All` 不限制
    pub fn max_days(&self) -> Option<i64> {
        match self {
            DateBucket::All => None,
            DateBucket::Today => Some(0),
            DateBucket::Week => Some(7),
            DateBucket::Month => Some(30),
        }
    }
}

impl FromStr for DateBucket {
    type Err = EpileptechError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "all" => Ok(DateBucket::All),
            "today" => Ok(DateBucket::Today),
            "week" => Ok(DateBucket::Week),
            "month" => Ok(DateBucket::Month),
            _ => Err(EpileptechError::Validation(format!("未知日期范围: {}", s))),
        }
    }
}

impl fmt::Display for DateBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateBucket::All => write!(f, "all"),
            DateBucket::Today => write!(f, "today"),
            DateBucket::Week => write!(f, "week"),
            DateBucket::Month => write!(f, "month"),
        }
    }
}

/// 结果分类过滤
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResultFilter {
    #[default]
    All,
    Epileptic,
    NonEpileptic,
    Psychogenic,
}

impl ResultFilter {
    /// 需要精确匹配的分析结果，`All` 返回 `None`
    pub fn required(&self) -> Option<AnalysisResult> {
        match self {
            ResultFilter::All => None,
            ResultFilter::Epileptic => Some(AnalysisResult::Epileptic),
            ResultFilter::NonEpileptic => Some(AnalysisResult::NonEpileptic),
            ResultFilter::Psychogenic => Some(AnalysisResult::Psychogenic),
        }
    }
}

impl From<AnalysisResult> for ResultFilter {
    fn from(result: AnalysisResult) -> Self {
        match result {
            AnalysisResult::Epileptic => ResultFilter::Epileptic,
            AnalysisResult::NonEpileptic => ResultFilter::NonEpileptic,
            AnalysisResult::Psychogenic => ResultFilter::Psychogenic,
        }
    }
}

impl FromStr for ResultFilter {
    type Err = EpileptechError;

    fn from_str(s: &str) -> Result<Self> {
        if s == "all" {
            return Ok(ResultFilter::All);
        }
        s.parse::<AnalysisResult>().map(ResultFilter::from)
    }
}

impl fmt::Display for ResultFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.required() {
            Some(result) => write!(f, "{}", result),
            None => write!(f, "all"),
        }
    }
}

/// 查询条件
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuerySpec {
    pub status_tab: StatusTab,
    pub search_term: String,
    pub date_bucket: DateBucket,
    pub result_filter: ResultFilter,
}

impl QuerySpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_status_tab(mut self, status_tab: StatusTab) -> Self {
        self.status_tab = status_tab;
        self
    }

    pub fn with_search_term(mut self, search_term: impl Into<String>) -> Self {
        self.search_term = search_term.into();
        self
    }

    pub fn with_date_bucket(mut self, date_bucket: DateBucket) -> Self {
        self.date_bucket = date_bucket;
        self
    }

    pub fn with_result_filter(mut self, result_filter: ResultFilter) -> Self {
        self.result_filter = result_filter;
        self
    }
}

/// 查询引擎
///
/// 纯函数：不修改输入，相同的 (快照, 条件, 时间) 总是得到相同的结果。
#[derive(Debug, Default, Clone, Copy)]
pub struct QueryEngine;

impl QueryEngine {
    /// 在快照上执行查询，返回保持原始顺序的子序列
    pub fn evaluate(snapshot: &[CaseRecord], spec: &QuerySpec, now: DateTime<Utc>) -> Vec<CaseRecord> {
        let search = spec.search_term.to_lowercase();

        let matched: Vec<CaseRecord> = snapshot
            .iter()
            .filter(|record| Self::matches_with(record, spec, &search, now))
            .cloned()
            .collect();

        tracing::debug!(
            "Query tab={} search={:?} date={} result={} matched {} of {} cases",
            spec.status_tab,
            spec.search_term,
            spec.date_bucket,
            spec.result_filter,
            matched.len(),
            snapshot.len()
        );
        matched
    }

    /// 判断单个病例是否满足查询条件
    pub fn matches(record: &CaseRecord, spec: &QuerySpec, now: DateTime<Utc>) -> bool {
        Self::matches_with(record, spec, &spec.search_term.to_lowercase(), now)
    }

    fn matches_with(record: &CaseRecord, spec: &QuerySpec, search: &str, now: DateTime<Utc>) -> bool {
        Self::status_matches(record, spec.status_tab)
            && Self::search_matches(record, search)
            && Self::date_matches(record, spec.date_bucket, now)
            && Self::result_matches(record, spec.result_filter)
    }

    fn status_matches(record: &CaseRecord, tab: StatusTab) -> bool {
        match tab {
            StatusTab::All => true,
            StatusTab::Pending => record.status() == CaseStatus::Pending,
            StatusTab::Completed => record.status() == CaseStatus::Completed,
        }
    }

    fn search_matches(record: &CaseRecord, search: &str) -> bool {
        if search.is_empty() {
            return true;
        }
        record.patient.full_name().to_lowercase().contains(search)
            || record.id.as_str().to_lowercase().contains(search)
    }

    fn date_matches(record: &CaseRecord, bucket: DateBucket, now: DateTime<Utc>) -> bool {
        match bucket.max_days() {
            None => true,
            Some(max_days) => days_between(record.recorded_at, now) <= max_days,
        }
    }

    fn result_matches(record: &CaseRecord, filter: ResultFilter) -> bool {
        match filter.required() {
            None => true,
            Some(required) => record.result() == Some(required),
        }
    }
}

/// 向下取整的天数差 `floor((now - at) / 1 天)`，未来日期为负数
pub fn days_between(at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - at).num_milliseconds().div_euclid(MILLIS_PER_DAY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::sample_cases;
    use chrono::TimeZone;
    use epileptech_core::{CaseId, CaseState, Confidence, Gender, PatientInfo};

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    fn case(id: &str, first: &str, last: &str, recorded_at: DateTime<Utc>) -> CaseRecord {
        CaseRecord::pending(
            CaseId::new(id).unwrap(),
            PatientInfo {
                first_name: first.to_string(),
                last_name: last.to_string(),
                age: 40,
                gender: Gender::Other,
            },
            recorded_at,
            None,
        )
    }

    fn ids(records: &[CaseRecord]) -> Vec<&str> {
        records.iter().map(|r| r.id.as_str()).collect()
    }

    fn now() -> DateTime<Utc> {
        at(2025, 3, 2, 12, 0)
    }

    #[test]
    fn test_pending_tab() {
        let mut completed = case("EEG-2845", "John", "Davis", now());
        completed.state = CaseState::Completed {
            result: AnalysisResult::Epileptic,
            confidence: Confidence::new(0.87).unwrap(),
        };
        let snapshot = vec![completed, case("EEG-3102", "Emma", "Wilson", now())];

        let spec = QuerySpec::new().with_status_tab(StatusTab::Pending);
        let result = QueryEngine::evaluate(&snapshot, &spec, now());
        assert_eq!(ids(&result), vec!["EEG-3102"]);

        let spec = QuerySpec::new().with_status_tab(StatusTab::Completed);
        let result = QueryEngine::evaluate(&snapshot, &spec, now());
        assert_eq!(ids(&result), vec!["EEG-2845"]);
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let snapshot = vec![case("EEG-2845", "John", "Davis", now())];

        for term in ["davis", "DAVIS", "Dav", "john d", "eeg-28", "2845"] {
            let spec = QuerySpec::new().with_search_term(term);
            assert_eq!(
                QueryEngine::evaluate(&snapshot, &spec, now()).len(),
                1,
                "term {:?} should match",
                term
            );
        }

        let spec = QuerySpec::new().with_search_term("wilson");
        assert!(QueryEngine::evaluate(&snapshot, &spec, now()).is_empty());
    }

    #[test]
    fn test_specific_result_excludes_pending() {
        let snapshot = sample_cases().unwrap();
        let spec = QuerySpec::new().with_result_filter(ResultFilter::Psychogenic);

        let result = QueryEngine::evaluate(&snapshot, &spec, now());
        assert_eq!(ids(&result), vec!["EEG-2984"]);
        assert!(result.iter().all(|r| !r.is_pending()));
    }

    #[test]
    fn test_today_bucket() {
        let snapshot = vec![
            case("EEG-3015", "David", "Kim", at(2025, 3, 2, 8, 30)),
            case("EEG-2845", "John", "Davis", at(2025, 3, 1, 10, 30)),
        ];
        let spec = QuerySpec::new().with_date_bucket(DateBucket::Today);

        let result = QueryEngine::evaluate(&snapshot, &spec, now());
        assert_eq!(ids(&result), vec!["EEG-3015"]);
    }

    #[test]
    fn test_future_dated_record_passes_every_bucket() {
        // 只检查上限，未来日期的病例会被接受
        let snapshot = vec![case("EEG-4000", "Ada", "Lovelace", at(2025, 3, 3, 9, 0))];

        for bucket in [DateBucket::Today, DateBucket::Week, DateBucket::Month] {
            let spec = QuerySpec::new().with_date_bucket(bucket);
            assert_eq!(QueryEngine::evaluate(&snapshot, &spec, now()).len(), 1);
        }
    }

    #[test]
    fn test_week_and_month_boundaries() {
        let snapshot = vec![
            case("EEG-1007", "Seven", "Days", at(2025, 2, 23, 12, 0)),
            case("EEG-1008", "Eight", "Days", at(2025, 2, 22, 11, 0)),
            case("EEG-1030", "Thirty", "Days", at(2025, 1, 31, 12, 0)),
            case("EEG-1031", "Thirty", "One", at(2025, 1, 30, 11, 0)),
        ];

        let week = QuerySpec::new().with_date_bucket(DateBucket::Week);
        assert_eq!(ids(&QueryEngine::evaluate(&snapshot, &week, now())), vec!["EEG-1007"]);

        let month = QuerySpec::new().with_date_bucket(DateBucket::Month);
        assert_eq!(
            ids(&QueryEngine::evaluate(&snapshot, &month, now())),
            vec!["EEG-1007", "EEG-1008", "EEG-1030"]
        );
    }

    #[test]
    fn test_days_between_floors() {
        assert_eq!(days_between(at(2025, 3, 2, 8, 30), now()), 0);
        assert_eq!(days_between(at(2025, 3, 1, 10, 30), now()), 1);
        assert_eq!(days_between(at(2025, 3, 2, 18, 0), now()), -1);
    }

    #[test]
    fn test_combined_filters_preserve_order() {
        let snapshot = sample_cases().unwrap();
        let spec = QuerySpec::new()
            .with_status_tab(StatusTab::Completed)
            .with_search_term("r")
            .with_date_bucket(DateBucket::Week);

        let result = QueryEngine::evaluate(&snapshot, &spec, now());
        // John Davis 不含 "r"；Robert Brown 和 Maria Garcia 保持登记顺序
        assert_eq!(ids(&result), vec!["EEG-2751", "EEG-2984"]);
    }

    #[test]
    fn test_result_is_ordered_subsequence_and_idempotent() {
        let snapshot = sample_cases().unwrap();
        let specs = [
            QuerySpec::new(),
            QuerySpec::new().with_status_tab(StatusTab::Pending),
            QuerySpec::new().with_search_term("a"),
            QuerySpec::new().with_date_bucket(DateBucket::Today),
            QuerySpec::new().with_result_filter(ResultFilter::NonEpileptic),
        ];

        for spec in &specs {
            let first = QueryEngine::evaluate(&snapshot, spec, now());
            let second = QueryEngine::evaluate(&snapshot, spec, now());
            assert_eq!(first, second);

            let mut cursor = snapshot.iter();
            for record in &first {
                assert!(cursor.any(|r| r == record), "output not a subsequence for {:?}", spec);
            }
        }
        assert_eq!(snapshot, sample_cases().unwrap());
    }

    #[test]
    fn test_parse_query_values() {
        assert_eq!("pending".parse::<StatusTab>().unwrap(), StatusTab::Pending);
        assert_eq!("month".parse::<DateBucket>().unwrap(), DateBucket::Month);
        assert_eq!(
            "non-epileptic".parse::<ResultFilter>().unwrap(),
            ResultFilter::NonEpileptic
        );
        assert!("archived".parse::<StatusTab>().is_err());
        assert!("year".parse::<DateBucket>().is_err());
        assert!("inconclusive".parse::<ResultFilter>().is_err());
        assert_eq!(ResultFilter::NonEpileptic.to_string(), "non-epileptic");
    }
}

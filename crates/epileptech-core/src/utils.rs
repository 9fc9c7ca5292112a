//! 通用工具函数

use std::sync::OnceLock;

use regex::Regex;
use uuid::Uuid;

fn case_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^EEG-[0-9]{4}$").expect("静态正则表达式"))
}

/// 生成病例编号 `EEG-1000` ~ `EEG-9999`
///
/// 编号空间只有 9000 个，调用方需要处理冲突。
pub fn generate_case_id() -> String {
    let n = 1000 + (Uuid::new_v4().as_u128() % 9000) as u32;
    format!("EEG-{}", n)
}

/// 验证病例编号格式
pub fn is_valid_case_id(id: &str) -> bool {
    case_id_pattern().is_match(id)
}

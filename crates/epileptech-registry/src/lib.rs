//! # 脑电病例登记模块
//!
//! 提供病例的登记、查询和生命周期管理，包括：
//! - 病例登记表：按登记顺序保存病例，支持新增、删除和分析完成
//! - 查询引擎：按状态标签、关键词、日期范围和结果分类组合过滤
//! - 病例存储句柄：可共享的登记表访问入口，带显式的初始化和重置
//! - 病例录入：校验上传表单并生成待分析病例

pub mod intake;
pub mod query;
pub mod registry;
pub mod seed;
pub mod store;

// 重新导出主要类型
pub use intake::{submit, IntakeForm, IntakePolicy};
pub use query::{DateBucket, QueryEngine, QuerySpec, ResultFilter, StatusTab};
pub use registry::{CaseRegistry, RegistryStats};
pub use seed::sample_cases;
pub use store::CaseStore;

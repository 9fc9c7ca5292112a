//! 病例登记演示程序
//!
//! 展示病例录入、组合查询、分析完成和删除的完整流程

use chrono::{NaiveDate, Utc};
use epileptech_core::{AnalysisResult, Confidence, Gender};
use epileptech_registry::{
    sample_cases, submit, CaseStore, DateBucket, IntakeForm, IntakePolicy, QuerySpec,
    ResultFilter, StatusTab,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 初始化日志
    tracing_subscriber::fmt::init();

    println!("🧠 脑电病例登记演示\n");

    // 1. 初始化存储
    let store = CaseStore::new();
    store.init(sample_cases()?).await?;
    println!("✅ 载入 {} 个示例病例", store.len().await);

    // 2. 录入新病例
    let form = IntakeForm {
        case_id: None,
        recorded_on: NaiveDate::from_ymd_opt(2025, 3, 2),
        first_name: "Lena".to_string(),
        last_name: "Novak".to_string(),
        age: 19,
        gender: Gender::Female,
        notes: Some("Nocturnal episodes".to_string()),
        files: vec!["night_session.edf".to_string()],
    };
    let record = submit(&store, &form, &IntakePolicy::default(), Utc::now()).await?;
    println!("✅ 病例 {} 已加入分析队列", record.id);

    // 3. 查询待分析病例
    let now = Utc::now();
    let pending = store
        .query(&QuerySpec::new().with_status_tab(StatusTab::Pending), now)
        .await;
    println!("\n📋 待分析病例 ({}):", pending.len());
    for case in &pending {
        println!("   - {} {}", case.id, case.patient.full_name());
    }

    // 4. 记录分析结果
    let updated = store
        .complete_analysis(&record.id, AnalysisResult::Epileptic, Confidence::new(0.81)?)
        .await?;
    println!(
        "\n✅ 病例 {} 分析完成: {}",
        updated.id,
        updated.result().map(|r| r.to_string()).unwrap_or_default()
    );

    // 5. 组合查询
    let spec = QuerySpec::new()
        .with_search_term("novak")
        .with_date_bucket(DateBucket::All)
        .with_result_filter(ResultFilter::Epileptic);
    let matched = store.query(&spec, now).await;
    println!("🔍 搜索 \"novak\" 且结果为癫痫性: {} 个", matched.len());

    // 6. 删除病例
    store.remove(&record.id).await?;

    let stats = store.stats().await;
    println!("\n📊 登记表统计:");
    println!("   总数: {}", stats.total);
    println!("   待分析: {}", stats.pending);
    println!("   已完成: {}", stats.completed);

    Ok(())
}

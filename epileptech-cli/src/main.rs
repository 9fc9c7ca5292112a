//! 脑电病例登记命令行工具
//!
//! 每次运行在进程内构建病例存储（按配置载入示例病例），执行一个命令后输出结果。

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use epileptech_admin::{build_store, logging, ConfigManager};
use epileptech_core::{AnalysisResult, CaseId, CaseRecord, CaseState, Confidence, Gender};
use epileptech_registry::{
    submit, CaseStore, DateBucket, IntakeForm, QuerySpec, RegistryStats, ResultFilter,
    StatusTab,
};
use tracing::{error, info};

/// 命令行参数
#[derive(Parser, Debug)]
#[command(name = "epileptech")]
#[command(about = "EEG 病例登记与查询工具")]
struct Cli {
    /// 配置文件路径
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// 日志级别，覆盖配置文件
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    /// 以 JSON 输出
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 按条件列出病例
    List(QueryArgs),
    /// 登记表统计
    Stats,
    /// 录入新病例
    Intake(IntakeArgs),
    /// 记录病例分析结果
    Complete {
        id: CaseId,
        #[arg(long)]
        result: AnalysisResult,
        #[arg(long)]
        confidence: f64,
    },
    /// 删除病例
    Delete { id: CaseId },
}

#[derive(Args, Debug)]
struct QueryArgs {
    /// 状态标签: all, pending, completed
    #[arg(long, default_value = "all")]
    tab: StatusTab,

    /// 按患者姓名或病例编号搜索
    #[arg(short, long, default_value = "")]
    search: String,

    /// 日期范围: all, today, week, month
    #[arg(long, default_value = "all")]
    date: DateBucket,

    /// 结果分类: all, epileptic, non-epileptic, psychogenic
    #[arg(long, default_value = "all")]
    result: ResultFilter,

    /// 评估时间 (RFC 3339)，默认为当前时间
    #[arg(long)]
    now: Option<DateTime<Utc>>,
}

#[derive(Args, Debug)]
struct IntakeArgs {
    /// 病例编号，为空时自动生成
    #[arg(long)]
    id: Option<String>,
    /// 记录日期 (YYYY-MM-DD)，默认为当天
    #[arg(long)]
    date: Option<NaiveDate>,
    #[arg(long)]
    first_name: String,
    #[arg(long)]
    last_name: String,
    #[arg(long)]
    age: u32,
    #[arg(long)]
    gender: Gender,
    #[arg(long)]
    notes: Option<String>,
    /// 脑电文件名 (.edf, .bdf, .zip, .gz)
    #[arg(long = "file", required = true)]
    files: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let manager = ConfigManager::new(cli.config.as_deref())?;
    let config = manager.get_config().await;

    // 初始化日志
    logging::init_logging(&config.logging, cli.log_level.as_deref())?;
    info!("启动病例登记工具...");

    let store = build_store(&config).await?;
    let policy = config.intake.policy();

    let output = match cli.command {
        Command::List(args) => {
            let spec = QuerySpec::new()
                .with_status_tab(args.tab)
                .with_search_term(args.search)
                .with_date_bucket(args.date)
                .with_result_filter(args.result);
            let now = args.now.unwrap_or_else(Utc::now);
            let records = store.query(&spec, now).await;
            render_records(&records, store.len().await, cli.json)?
        }
        Command::Stats => render_stats(&store.stats().await, cli.json)?,
        Command::Intake(args) => {
            let form = IntakeForm {
                case_id: args.id,
                recorded_on: args.date,
                first_name: args.first_name,
                last_name: args.last_name,
                age: args.age,
                gender: args.gender,
                notes: args.notes,
                files: args.files,
            };
            let record = submit(&store, &form, &policy, Utc::now())
                .await
                .context("病例录入失败")?;
            notice(
                cli.json,
                &format!("病例 {} ({}) 已加入分析队列", record.id, record.patient.full_name()),
            );
            render_all(&store, cli.json).await?
        }
        Command::Complete {
            id,
            result,
            confidence,
        } => {
            let confidence = Confidence::new(confidence)?;
            let record = store.complete_analysis(&id, result, confidence).await?;
            notice(cli.json, &format!("病例 {} 分析完成", record.id));
            render_all(&store, cli.json).await?
        }
        Command::Delete { id } => {
            if let Err(e) = store.remove(&id).await {
                error!("删除病例失败: {}", e);
                return Err(e.into());
            }
            notice(cli.json, &format!("病例 {} 已删除", id));
            render_all(&store, cli.json).await?
        }
    };

    println!("{}", output);
    Ok(())
}

/// 输出操作提示；JSON 模式下写入标准错误，保证标准输出可以直接解析
fn notice(json: bool, message: &str) {
    if json {
        eprintln!("{}", message);
    } else {
        println!("{}", message);
    }
}

async fn render_all(store: &CaseStore, json: bool) -> Result<String> {
    let records = store.snapshot().await;
    render_records(&records, records.len(), json)
}

fn render_records(records: &[CaseRecord], total: usize, json: bool) -> Result<String> {
    if json {
        return Ok(serde_json::to_string_pretty(records)?);
    }

    if records.is_empty() {
        return Ok("没有符合条件的病例".to_string());
    }

    let mut lines: Vec<String> = records.iter().map(format_row).collect();
    lines.push(format!("显示 {} / {} 个病例", records.len(), total));
    Ok(lines.join("\n"))
}

fn render_stats(stats: &RegistryStats, json: bool) -> Result<String> {
    if json {
        return Ok(serde_json::to_string_pretty(stats)?);
    }

    let mut lines = vec![
        format!("总数: {}", stats.total),
        format!("待分析: {}", stats.pending),
        format!("已完成: {}", stats.completed),
    ];
    for result in AnalysisResult::all() {
        lines.push(format!(
            "  {}: {}",
            result,
            stats.by_result.get(&result).copied().unwrap_or(0)
        ));
    }
    Ok(lines.join("\n"))
}

fn format_row(record: &CaseRecord) -> String {
    let outcome = match &record.state {
        CaseState::Pending => "处理中".to_string(),
        CaseState::Completed { result, confidence } => {
            format!("{} ({}%)", result, confidence.percent())
        }
    };

    format!(
        "{}  {:<20} {:>3} y/o {:<6}  {}  {:<9}  {}",
        record.id,
        record.patient.full_name(),
        record.patient.age,
        record.patient.gender.to_string(),
        record.recorded_at.format("%Y-%m-%d %H:%M"),
        record.status().to_string(),
        outcome
    )
}

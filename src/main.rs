// ==========================================
// 纺织品物流控制塔 - 命令行入口
// ==========================================
// 用法:
//   control-tower list
//   control-tower kpi
//   control-tower board [搜索词] [--issues]
//   control-tower ingest <供应商> <面料类型> <文件...>
//   control-tower advance <箱号>
//   control-tower verify <箱号> <单证字段.json>
//   control-tower vessel <船名>
//   control-tower export [目录 | 文件.csv]
//   control-tower config [键 值]
//   control-tower watch <秒数>
// 环境变量: CONTROL_TOWER_DB_PATH / CONTROL_TOWER_LOCALE / CONTROL_TOWER_LOG_JSON / RUST_LOG
// ==========================================

use anyhow::{bail, Context};
use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use textile_control_tower::api::{ApiError, ApiResult, ShipmentDetails};
use textile_control_tower::app::{get_default_db_path, AppState};
use textile_control_tower::domain::DocumentSet;
use textile_control_tower::engine::board::BoardFilter;
use textile_control_tower::importer::UploadedDocument;
use textile_control_tower::{i18n, logging, AdvanceOutcome};

/// API 错误转为面向用户的本地化提示
trait UserContext<T> {
    fn user_context(self) -> anyhow::Result<T>;
}

impl<T> UserContext<T> for ApiResult<T> {
    fn user_context(self) -> anyhow::Result<T> {
        self.map_err(|e| {
            tracing::debug!("命令失败: {:?}", e);
            anyhow::anyhow!(e.user_message())
        })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if std::env::var("CONTROL_TOWER_LOG_JSON").is_ok() {
        logging::init_json();
    } else {
        logging::init();
    }
    i18n::init_from_env();

    tracing::info!("{} v{}", textile_control_tower::APP_NAME, textile_control_tower::VERSION);

    let db_path = get_default_db_path();
    let state = AppState::new(db_path).map_err(anyhow::Error::msg)?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = args.first().map(String::as_str).unwrap_or("list");
    let rest = args.get(1..).unwrap_or(&[]);

    let result = match command {
        "list" => list(&state).await,
        "kpi" => kpi(&state).await,
        "board" => board(&state, rest).await,
        "ingest" => ingest(&state, rest).await,
        "advance" => advance(&state, rest).await,
        "verify" => verify(&state, rest).await,
        "vessel" => vessel(&state, rest).await,
        "export" => export(&state, rest).await,
        "config" => config(&state, rest),
        "watch" => watch(&state, rest).await,
        other => Err(anyhow::anyhow!("未知命令: {}", other)),
    };

    state.shutdown();
    result
}

async fn list(state: &AppState) -> anyhow::Result<()> {
    for c in state.container_api.list().await.user_context()? {
        println!(
            "{}\t{}\t{}\t{}\t{}",
            c.container_number, c.status, c.sencamer_status, c.supplier, c.textile_type
        );
    }
    Ok(())
}

async fn kpi(state: &AppState) -> anyhow::Result<()> {
    let kpis = state.dashboard_api.kpis().await.user_context()?;
    println!("{}", serde_json::to_string_pretty(&kpis)?);
    Ok(())
}

async fn board(state: &AppState, rest: &[String]) -> anyhow::Result<()> {
    let filter = BoardFilter {
        search: rest.iter().find(|a| !a.starts_with("--")).cloned(),
        issues_only: rest.iter().any(|a| a == "--issues"),
    };
    let view = state.dashboard_api.board(filter).await.user_context()?;
    for column in &view.columns {
        let label = state
            .container_api
            .advance_label(column.status)
            .unwrap_or_default();
        println!("== {} ({}) {}", column.status, column.containers.len(), label);
        for c in &column.containers {
            println!("   {}  {}", c.container_number, c.supplier);
        }
    }
    Ok(())
}

async fn ingest(state: &AppState, rest: &[String]) -> anyhow::Result<()> {
    let [supplier, textile, files @ ..] = rest else {
        bail!("用法: ingest <供应商> <面料类型> <文件...>");
    };
    if files.is_empty() {
        bail!("至少需要一个单证文件");
    }

    let mut documents = Vec::with_capacity(files.len());
    for file in files {
        let path = Path::new(file);
        let bytes = std::fs::read(path).with_context(|| format!("读取文件失败: {}", file))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| file.clone());
        documents.push(UploadedDocument::new(name, bytes));
    }

    let outcome = state
        .container_api
        .register_upload(documents, ShipmentDetails::new(supplier.as_str(), textile.as_str()))
        .await
        .user_context()?;
    println!(
        "{}\t{}\t{}",
        outcome.container.container_number,
        outcome.container.status,
        outcome.receipt.folder_path.display()
    );
    Ok(())
}

async fn advance(state: &AppState, rest: &[String]) -> anyhow::Result<()> {
    let number = rest.first().context("用法: advance <箱号>")?;
    match state.container_api.advance_by_number(number).await.user_context()? {
        AdvanceOutcome::Advanced { from, to } => println!("{}: {} -> {}", number, from, to),
        AdvanceOutcome::Unavailable { current } => println!("{}: {} (终态)", number, current),
    }
    Ok(())
}

async fn verify(state: &AppState, rest: &[String]) -> anyhow::Result<()> {
    let [number, docs_path, ..] = rest else {
        bail!("用法: verify <箱号> <单证字段.json>");
    };
    let raw = std::fs::read_to_string(docs_path).with_context(|| format!("读取文件失败: {}", docs_path))?;
    let documents: DocumentSet = serde_json::from_str(&raw).context("单证字段 JSON 格式错误")?;

    let container = state
        .registry
        .find_by_number(number)
        .await
        .map_err(ApiError::from)
        .user_context()?
        .with_context(|| format!("集装箱 {} 不存在", number))?;
    let report = state
        .verification_api
        .verify(&container.id, &documents)
        .await
        .user_context()?;
    println!(
        "{} ({}/100)",
        textile_control_tower::engine::verdict_title(report.overall_status),
        report.score
    );
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

async fn vessel(state: &AppState, rest: &[String]) -> anyhow::Result<()> {
    let name = rest.join(" ");
    let lookup = state.vessel_api.lookup(&name).await.user_context()?;
    println!("{}", serde_json::to_string_pretty(&lookup)?);
    Ok(())
}

async fn export(state: &AppState, rest: &[String]) -> anyhow::Result<()> {
    let target = rest.first().map(PathBuf::from).unwrap_or_else(|| PathBuf::from("."));
    let summary = if target.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("csv")) {
        state.dashboard_api.export_to_file(&target).await.user_context()?
    } else {
        state.dashboard_api.export_to_dir(&target).await.user_context()?
    };
    println!("{} ({} filas)", summary.path.display(), summary.rows);
    Ok(())
}

fn config(state: &AppState, rest: &[String]) -> anyhow::Result<()> {
    if let [key, value, ..] = rest {
        state.config_api.update_config(key, value).user_context()?;
    }
    for item in state.config_api.list_configs().user_context()? {
        println!("{}={}", item.key, item.value.as_deref().unwrap_or("(default)"));
    }
    Ok(())
}

async fn watch(state: &AppState, rest: &[String]) -> anyhow::Result<()> {
    let seconds: u64 = rest.first().map(|s| s.parse()).transpose()?.unwrap_or(30);
    let (mut feed, handle) = state.container_api.subscribe().await.user_context()?;

    let deadline = tokio::time::sleep(Duration::from_secs(seconds));
    tokio::pin!(deadline);
    loop {
        tokio::select! {
            _ = &mut deadline => break,
            snapshot = feed.next() => match snapshot {
                Some(snapshot) => {
                    let kpis = state.dashboard_api.kpis_for(&snapshot, chrono::Utc::now()).await.user_context()?;
                    println!("total={} in_port={} sencamer={} demurrage={}",
                        kpis.total, kpis.in_port, kpis.sencamer_issues, kpis.demurrage_risk);
                }
                None => break,
            },
        }
    }
    handle.unsubscribe();
    Ok(())
}

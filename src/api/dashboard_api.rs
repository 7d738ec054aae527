// ==========================================
// 纺织品物流控制塔 - 驾驶舱 API
// ==========================================
// 职责: KPI 指标、看板视图、SLA 概览、CSV 报表导出
// 说明: 全部基于注册表当前快照计算,不缓存
// ==========================================

use crate::api::config_api::read_config;
use crate::api::error::{ApiError, ApiResult};
use crate::config::ConfigManager;
use crate::domain::container::Container;
use crate::engine::board::{self, BoardColumn, BoardFilter, SlaState};
use crate::engine::kpi::{DashboardKpis, KpiAggregator};
use crate::export;
use crate::registry::ContainerRegistry;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

// ==========================================
// 视图 DTO
// ==========================================

/// 看板视图: 过滤后的列分组 + 过滤后的指标
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardView {
    pub filter: BoardFilter,
    pub kpis: DashboardKpis,
    pub columns: Vec<BoardColumn>,
}

/// SLA 概览条目 (仅含设置了 SLA 截止时间的集装箱)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlaEntry {
    pub container_id: String,
    pub container_number: String,
    pub state: SlaState,
}

/// 导出结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportSummary {
    pub path: PathBuf,
    pub rows: usize,
}

// ==========================================
// DashboardApi
// ==========================================
pub struct DashboardApi {
    registry: Arc<ContainerRegistry>,
    config: Arc<ConfigManager>,
}

impl DashboardApi {
    pub fn new(registry: Arc<ContainerRegistry>, config: Arc<ConfigManager>) -> Self {
        Self { registry, config }
    }

    async fn aggregator(&self) -> ApiResult<KpiAggregator> {
        let timeout = self.registry.settings().store_timeout;
        read_config(&self.config, timeout, "KPI配置", |c| c.kpi_aggregator()).await
    }

    /// 全量 KPI
    pub async fn kpis(&self) -> ApiResult<DashboardKpis> {
        let containers = self.registry.list().await?;
        self.kpis_for(&containers, Utc::now()).await
    }

    /// 对给定集合计算 KPI (供订阅者直接基于快照计算)
    pub async fn kpis_for(&self, containers: &[Container], now: DateTime<Utc>) -> ApiResult<DashboardKpis> {
        Ok(self.aggregator().await?.compute(containers, now))
    }

    /// 看板视图
    ///
    /// # 返回
    /// - 列按工作流顺序排列,空列保留
    pub async fn board(&self, filter: BoardFilter) -> ApiResult<BoardView> {
        let containers = self.registry.list().await?;
        let now = Utc::now();
        let visible = board::apply_filter(&containers, &filter, now);
        let kpis = self.aggregator().await?.compute(&visible, now);
        let columns = board::group_by_status(&visible);
        Ok(BoardView { filter, kpis, columns })
    }

    /// SLA 概览
    pub async fn sla_overview(&self) -> ApiResult<Vec<SlaEntry>> {
        let timeout = self.registry.settings().store_timeout;
        let warning_hours =
            read_config(&self.config, timeout, "SLA配置", |c| c.get_sla_warning_hours()).await?;
        let now = Utc::now();

        let entries = self
            .registry
            .list()
            .await?
            .into_iter()
            .filter_map(|c| {
                board::sla_state(&c, now, warning_hours).map(|state| SlaEntry {
                    container_id: c.id,
                    container_number: c.container_number,
                    state,
                })
            })
            .collect();
        Ok(entries)
    }

    // ==========================================
    // 报表导出
    // ==========================================

    /// 导出为 CSV 字符串 (含 BOM)
    pub async fn export_csv(&self) -> ApiResult<String> {
        let containers = self.registry.list().await?;
        Ok(export::containers_to_csv_string(&containers)?)
    }

    /// 导出到目录,文件名按当天日期生成
    pub async fn export_to_dir(&self, dir: &Path) -> ApiResult<ExportSummary> {
        let file_name = export::export_file_name(Utc::now().date_naive());
        self.export_to_file(&dir.join(file_name)).await
    }

    /// 导出到指定文件
    pub async fn export_to_file(&self, path: &Path) -> ApiResult<ExportSummary> {
        let containers = self.registry.list().await?;
        let rows = containers.len();
        let target = path.to_path_buf();

        tokio::task::spawn_blocking(move || -> ApiResult<()> {
            let file = std::fs::File::create(&target)
                .map_err(|e| ApiError::ExportError(format!("{}: {}", target.display(), e)))?;
            export::write_containers_csv(std::io::BufWriter::new(file), &containers)?;
            Ok(())
        })
        .await
        .map_err(|e| ApiError::InternalError(format!("导出任务失败: {}", e)))??;

        info!("报表已导出: path={}, rows={}", path.display(), rows);
        Ok(ExportSummary {
            path: path.to_path_buf(),
            rows,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::container::NewContainer;
    use crate::domain::types::ContainerStatus;
    use crate::registry::RegistrySettings;
    use crate::repository::ContainerRepository;
    use rusqlite::Connection;
    use std::sync::Mutex;
    use tempfile::TempDir;

    fn setup() -> (Arc<ContainerRegistry>, DashboardApi) {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::configure_sqlite_connection(&conn).unwrap();
        crate::db::init_schema(&conn).unwrap();
        let conn = Arc::new(Mutex::new(conn));
        let config = Arc::new(ConfigManager::from_connection(conn.clone()).unwrap());
        let repo = Arc::new(ContainerRepository::new(conn));
        let registry = Arc::new(ContainerRegistry::new(repo, RegistrySettings::default()));
        let api = DashboardApi::new(registry.clone(), config);
        (registry, api)
    }

    #[tokio::test]
    async fn test_empty_registry_has_zero_kpis() {
        let (_registry, api) = setup();
        assert_eq!(api.kpis().await.unwrap(), DashboardKpis::default());

        let view = api.board(BoardFilter::default()).await.unwrap();
        assert_eq!(view.columns.len(), 4);
        assert!(view.columns.iter().all(|c| c.containers.is_empty()));
    }

    #[tokio::test]
    async fn test_board_search_filters_columns() {
        let (registry, api) = setup();
        registry
            .create(NewContainer::new("HLBU-1234567", "Shanghai Fabrics Co.", "Poliéster"))
            .await
            .unwrap();
        let second = registry
            .create(NewContainer::new("MSCU-4567890", "DenimWorld", "Denim"))
            .await
            .unwrap();
        registry.advance(&second.id).await.unwrap();

        let view = api
            .board(BoardFilter {
                search: Some("denim".to_string()),
                issues_only: false,
            })
            .await
            .unwrap();

        assert_eq!(view.kpis.total, 1);
        assert_eq!(view.kpis.in_port, 1);
        let port = view
            .columns
            .iter()
            .find(|c| c.status == ContainerStatus::Port)
            .unwrap();
        assert_eq!(port.containers[0].container_number, "MSCU-4567890");
    }

    #[tokio::test]
    async fn test_sla_overview_only_lists_containers_with_deadline() {
        let (registry, api) = setup();
        let mut with_sla = NewContainer::new("HLBU-1234567", "A", "B");
        with_sla.sla_deadline = Some(Utc::now() - chrono::Duration::hours(1));
        registry.create(with_sla).await.unwrap();
        registry
            .create(NewContainer::new("MSCU-4567890", "C", "D"))
            .await
            .unwrap();

        let overview = api.sla_overview().await.unwrap();
        assert_eq!(overview.len(), 1);
        assert_eq!(overview[0].state, SlaState::Overdue);
    }

    #[tokio::test]
    async fn test_export_to_dir_writes_dated_file() {
        let (registry, api) = setup();
        registry
            .create(NewContainer::new("HLBU-1234567", "A", "B"))
            .await
            .unwrap();
        let dir = TempDir::new().unwrap();

        let summary = api.export_to_dir(dir.path()).await.unwrap();

        assert_eq!(summary.rows, 1);
        let name = summary.path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("reporte_detallado_"));
        let content = std::fs::read_to_string(&summary.path).unwrap();
        assert!(content.starts_with(export::UTF8_BOM));
        assert!(content.contains("HLBU-1234567"));
    }
}

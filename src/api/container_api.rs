// ==========================================
// 纺织品物流控制塔 - 集装箱 API
// ==========================================
// 职责: 单证上传建箱、工作流推进、字段编辑、活动日志、订阅
// 流程 (上传): 校验 → 箱号候选 → 查重 → 单证落盘 → 注册建箱
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::domain::container::{ActivityEntry, Assignee, Container, ContainerPatch, NewContainer};
use crate::domain::types::{ActivityRole, ContainerSize, ContainerStatus};
use crate::engine::workflow::{AdvanceOutcome, WorkflowEngine};
use crate::importer::{ContainerCandidate, DocumentIngestor, IngestionReceipt, UploadedDocument};
use crate::registry::{ContainerFeed, ContainerRegistry, FeedHandle};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

// ==========================================
// 请求 / 响应
// ==========================================

/// 上传批次附带的货物信息 (由外部单证解析服务提供)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShipmentDetails {
    pub supplier: String,
    pub textile_type: String,
    pub container_size: Option<ContainerSize>,
    pub weight: Option<String>,
    pub vessel: Option<String>,
    pub departure_date: Option<NaiveDate>,
    pub eta: Option<DateTime<Utc>>,
    pub assigned_to: Option<Assignee>,
    pub sla_deadline: Option<DateTime<Utc>>,
}

impl ShipmentDetails {
    pub fn new(supplier: impl Into<String>, textile_type: impl Into<String>) -> Self {
        Self {
            supplier: supplier.into(),
            textile_type: textile_type.into(),
            ..Default::default()
        }
    }

    fn validate(&self) -> ApiResult<()> {
        if self.supplier.trim().is_empty() {
            return Err(ApiError::InvalidInput("供应商不能为空".to_string()));
        }
        Ok(())
    }

    fn into_candidate(self, candidate: &ContainerCandidate) -> NewContainer {
        NewContainer {
            container_number: candidate.container_number.clone(),
            source_name: Some(candidate.source_name.clone()),
            supplier: self.supplier.trim().to_string(),
            textile_type: self.textile_type.trim().to_string(),
            container_size: self.container_size,
            weight: self.weight,
            vessel: self.vessel,
            departure_date: self.departure_date,
            eta: self.eta,
            assigned_to: self.assigned_to,
            sla_deadline: self.sla_deadline,
        }
    }
}

/// 上传建箱结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadOutcome {
    pub receipt: IngestionReceipt,
    pub container: Container,
}

// ==========================================
// ContainerApi
// ==========================================
pub struct ContainerApi {
    registry: Arc<ContainerRegistry>,
    ingestor: Arc<DocumentIngestor>,
    workflow: WorkflowEngine,
}

impl ContainerApi {
    pub fn new(registry: Arc<ContainerRegistry>, ingestor: Arc<DocumentIngestor>) -> Self {
        Self {
            registry,
            ingestor,
            workflow: WorkflowEngine::new(),
        }
    }

    /// 上传单证并建箱
    ///
    /// # 错误
    /// - `InvalidInput`: 批次为空 / 供应商为空
    /// - `DuplicateContainer`: 箱号已存在 (未写入任何文件)
    /// - `IngestionFailure`: 上传目录不可达或无权限 (未建箱)
    /// - `StoreUnavailable`: 存储超时,可重试
    pub async fn register_upload(
        &self,
        documents: Vec<UploadedDocument>,
        details: ShipmentDetails,
    ) -> ApiResult<UploadOutcome> {
        details.validate()?;
        let primary = crate::importer::select_primary(&documents)
            .ok_or_else(|| ApiError::InvalidInput("上传批次为空".to_string()))?;

        let candidate = ContainerCandidate::from_batch(
            &primary.name,
            documents.iter().map(|d| d.name.as_str()),
        );
        if !candidate.extracted {
            warn!("文件名未匹配箱号格式,使用文件名作为箱号: {}", candidate.container_number);
        }

        // 先查重,避免重复批次落盘
        self.registry
            .ensure_absent(&candidate.container_number, Some(&candidate.source_name))
            .await?;

        let ingestor = self.ingestor.clone();
        let today = Utc::now().date_naive();
        let receipt = tokio::task::spawn_blocking(move || ingestor.ingest(&documents, today))
            .await
            .map_err(|e| ApiError::InternalError(format!("单证落盘任务失败: {}", e)))??;

        let container = match self.registry.create(details.into_candidate(&receipt.candidate)).await {
            Ok(container) => container,
            Err(e) => {
                warn!(
                    "单证已落盘但建箱失败: folder={}, error={}",
                    receipt.folder_name, e
                );
                return Err(e.into());
            }
        };

        info!(
            "上传建箱完成: number={}, folder={}",
            container.container_number, receipt.folder_name
        );
        Ok(UploadOutcome { receipt, container })
    }

    // ==========================================
    // 工作流
    // ==========================================

    /// 推进一步 (终态返回 Unavailable,不报错)
    pub async fn advance(&self, container_id: &str) -> ApiResult<AdvanceOutcome> {
        Ok(self.registry.advance(container_id).await?)
    }

    /// 按业务箱号推进
    pub async fn advance_by_number(&self, container_number: &str) -> ApiResult<AdvanceOutcome> {
        let container = self
            .registry
            .find_by_number(container_number.trim())
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("集装箱 {} 不存在", container_number)))?;
        self.advance(&container.id).await
    }

    /// 状态变更 (仅允许合法的单步前进)
    ///
    /// 读取与写入之间状态被其他写入者改变时返回 InvalidInput,不写入
    pub async fn update_status(&self, container_id: &str, status: ContainerStatus) -> ApiResult<()> {
        let current = self.registry.get(container_id).await?;
        if !self.workflow.is_legal_transition(current.status, status) {
            return Err(ApiError::InvalidInput(format!(
                "非法状态转换: {} -> {}",
                current.status, status
            )));
        }
        Ok(self.registry.transition(container_id, current.status, status).await?)
    }

    /// 当前状态的推进按钮文案 (终态为 None)
    pub fn advance_label(&self, status: ContainerStatus) -> Option<String> {
        self.workflow.advance_label(status)
    }

    // ==========================================
    // 编辑 / 日志 / 删除
    // ==========================================

    pub async fn update_fields(&self, container_id: &str, patch: ContainerPatch) -> ApiResult<Container> {
        if patch.is_empty() {
            return Err(ApiError::InvalidInput("没有需要更新的字段".to_string()));
        }
        if matches!(&patch.supplier, Some(s) if s.trim().is_empty()) {
            return Err(ApiError::InvalidInput("供应商不能为空".to_string()));
        }
        Ok(self.registry.update_fields(container_id, patch).await?)
    }

    /// 追加人工备注
    pub async fn add_note(
        &self,
        container_id: &str,
        author: &str,
        role: ActivityRole,
        message: &str,
    ) -> ApiResult<()> {
        let message = message.trim();
        if message.is_empty() {
            return Err(ApiError::InvalidInput("备注内容不能为空".to_string()));
        }
        if author.trim().is_empty() {
            return Err(ApiError::InvalidInput("作者不能为空".to_string()));
        }
        let entry = ActivityEntry::new(author.trim(), role, message);
        Ok(self.registry.append_activity(container_id, entry).await?)
    }

    pub async fn delete(&self, container_id: &str) -> ApiResult<()> {
        Ok(self.registry.delete(container_id).await?)
    }

    // ==========================================
    // 读取 / 订阅
    // ==========================================

    pub async fn list(&self) -> ApiResult<Vec<Container>> {
        Ok(self.registry.list().await?)
    }

    pub async fn get(&self, container_id: &str) -> ApiResult<Container> {
        Ok(self.registry.get(container_id).await?)
    }

    /// 订阅完整快照流 (立即推送一次当前快照)
    pub async fn subscribe(&self) -> ApiResult<(ContainerFeed, FeedHandle)> {
        Ok(self.registry.subscribe().await?)
    }

    pub async fn refresh(&self) -> ApiResult<usize> {
        Ok(self.registry.refresh().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::RegistrySettings;
    use crate::repository::ContainerRepository;
    use rusqlite::Connection;
    use std::sync::Mutex;
    use tempfile::TempDir;

    fn setup_api(upload_root: &std::path::Path) -> ContainerApi {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::configure_sqlite_connection(&conn).unwrap();
        crate::db::init_schema(&conn).unwrap();
        let repo = Arc::new(ContainerRepository::new(Arc::new(Mutex::new(conn))));
        let registry = Arc::new(ContainerRegistry::new(repo, RegistrySettings::default()));
        let ingestor = Arc::new(DocumentIngestor::with_upload_root(upload_root));
        ContainerApi::new(registry, ingestor)
    }

    fn batch(names: &[&str]) -> Vec<UploadedDocument> {
        names
            .iter()
            .map(|n| UploadedDocument::new(*n, b"%PDF".to_vec()))
            .collect()
    }

    #[tokio::test]
    async fn test_register_upload_creates_transit_container() {
        let dir = TempDir::new().unwrap();
        let api = setup_api(dir.path());

        let outcome = api
            .register_upload(
                batch(&["2024-10-28_HLBU-1234567_BL.pdf", "invoice.pdf"]),
                ShipmentDetails::new("Shanghai Fabrics Co.", "Poliéster Industrial"),
            )
            .await
            .unwrap();

        assert_eq!(outcome.container.container_number, "HLBU-1234567");
        assert_eq!(outcome.container.status, ContainerStatus::Transit);
        assert_eq!(outcome.receipt.files_written.len(), 2);
    }

    #[tokio::test]
    async fn test_duplicate_upload_rejected_before_writing() {
        let dir = TempDir::new().unwrap();
        let api = setup_api(dir.path());
        api.register_upload(batch(&["BL_COSU-9876543.pdf"]), ShipmentDetails::new("SilkRoad Fabrics", "Seda"))
            .await
            .unwrap();

        let other_root = TempDir::new().unwrap();
        let api_other_root = ContainerApi::new(
            api.registry.clone(),
            Arc::new(DocumentIngestor::with_upload_root(other_root.path())),
        );
        let err = api_other_root
            .register_upload(batch(&["COSU-9876543 copia.pdf"]), ShipmentDetails::new("Otro", "Seda"))
            .await
            .unwrap_err();

        match err {
            ApiError::DuplicateContainer { existing_supplier, .. } => {
                assert_eq!(existing_supplier, "SilkRoad Fabrics")
            }
            other => panic!("Expected DuplicateContainer, got {:?}", other),
        }
        assert_eq!(api.list().await.unwrap().len(), 1);
        assert_eq!(std::fs::read_dir(other_root.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_upload_validation() {
        let dir = TempDir::new().unwrap();
        let api = setup_api(dir.path());

        let err = api
            .register_upload(Vec::new(), ShipmentDetails::new("A", "B"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidInput(_)));

        let err = api
            .register_upload(batch(&["BL.pdf"]), ShipmentDetails::new("  ", "B"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_unreachable_upload_root_creates_nothing() {
        let dir = TempDir::new().unwrap();
        // 上传根路径是一个普通文件,无法创建子目录
        let blocker = dir.path().join("not_a_dir");
        std::fs::write(&blocker, b"x").unwrap();
        let api = setup_api(&blocker);

        let err = api
            .register_upload(batch(&["BL_HLBU-1234567.pdf"]), ShipmentDetails::new("A", "B"))
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::IngestionFailure(_)));
        assert!(api.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_status_rejects_skips() {
        let dir = TempDir::new().unwrap();
        let api = setup_api(dir.path());
        let outcome = api
            .register_upload(batch(&["BL_HLBU-1234567.pdf"]), ShipmentDetails::new("A", "B"))
            .await
            .unwrap();
        let id = outcome.container.id;

        let err = api.update_status(&id, ContainerStatus::Customs).await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidInput(_)));

        api.update_status(&id, ContainerStatus::Port).await.unwrap();
        assert_eq!(api.get(&id).await.unwrap().status, ContainerStatus::Port);
    }

    #[tokio::test]
    async fn test_advance_by_number_and_notes() {
        let dir = TempDir::new().unwrap();
        let api = setup_api(dir.path());
        api.register_upload(batch(&["BL_MSCU-4567890.pdf"]), ShipmentDetails::new("DenimWorld", "Denim"))
            .await
            .unwrap();

        let outcome = api.advance_by_number("MSCU-4567890").await.unwrap();
        assert_eq!(outcome.resulting_status(), ContainerStatus::Port);
        assert!(matches!(
            api.advance_by_number("XXXX-0000000").await.unwrap_err(),
            ApiError::NotFound(_)
        ));

        let id = api.list().await.unwrap()[0].id.clone();
        assert!(api.add_note(&id, "Ana", ActivityRole::Analyst, "   ").await.is_err());
        api.add_note(&id, "Ana", ActivityRole::Analyst, "Revisar peso").await.unwrap();
        let log = api.get(&id).await.unwrap().activity_log;
        assert_eq!(log.last().unwrap().message, "Revisar peso");
    }

    #[tokio::test]
    async fn test_empty_patch_rejected() {
        let dir = TempDir::new().unwrap();
        let api = setup_api(dir.path());
        let err = api.update_fields("any", ContainerPatch::default()).await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidInput(_)));
    }
}

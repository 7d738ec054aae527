// ==========================================
// 纺织品物流控制塔 - 单证稽核 API
// ==========================================
// 职责: 对集装箱的提单/发票/装箱单做字段比对并评分
// 说明: 报告每次重新计算,不落库
// ==========================================

use crate::api::config_api::read_config;
use crate::api::error::ApiResult;
use crate::config::ConfigManager;
use crate::domain::verification::{DocumentSet, VerificationReport};
use crate::engine::audit::{AuditScorer, VerificationEngine};
use crate::engine::discrepancy::DiscrepancyClassifier;
use crate::registry::ContainerRegistry;
use chrono::Utc;
use std::sync::Arc;
use tracing::info;

pub struct VerificationApi {
    registry: Arc<ContainerRegistry>,
    config: Arc<ConfigManager>,
    classifier: DiscrepancyClassifier,
}

impl VerificationApi {
    pub fn new(registry: Arc<ContainerRegistry>, config: Arc<ConfigManager>) -> Self {
        Self {
            registry,
            config,
            classifier: DiscrepancyClassifier::default(),
        }
    }

    /// 生成稽核报告
    ///
    /// # 参数
    /// - container_id: 集装箱内部ID
    /// - documents: 外部服务提取出的单证字段
    ///
    /// # 返回
    /// - Ok(VerificationReport): 评分使用当前配置的扣分权重
    /// - Err(ApiError::NotFound): 集装箱不存在
    pub async fn verify(&self, container_id: &str, documents: &DocumentSet) -> ApiResult<VerificationReport> {
        let container = self.registry.get(container_id).await?;
        let timeout = self.registry.settings().store_timeout;
        let weights = read_config(&self.config, timeout, "评分配置", |c| c.scoring_weights()).await?;

        let engine = VerificationEngine::new(self.classifier.clone(), AuditScorer::new(weights));
        let report = engine.verify(&container, documents, Utc::now());

        info!(
            "稽核完成: number={}, status={:?}, score={}, findings={}",
            container.container_number,
            report.overall_status,
            report.score,
            report.finding_count()
        );
        Ok(report)
    }
}

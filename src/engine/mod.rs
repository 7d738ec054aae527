// ==========================================
// 纺织品物流控制塔 - 引擎层
// ==========================================
// 职责: 实现业务规则,不拼 SQL
// 红线: Engine 为纯函数/无状态,不访问存储
// ==========================================

pub mod audit;
pub mod board;
pub mod discrepancy;
pub mod kpi;
pub mod workflow;

// 重导出核心引擎
pub use audit::{verdict_title, AuditScorer, ScoringWeights, VerificationEngine};
pub use board::{apply_filter, group_by_status, sla_state, BoardColumn, BoardFilter, SlaState};
pub use discrepancy::{DiscrepancyClassifier, FieldRule, DEFAULT_FIELD_RULES};
pub use kpi::{DashboardKpis, KpiAggregator};
pub use workflow::{AdvanceOutcome, WorkflowEngine};

// ==========================================
// 纺织品物流控制塔 - API 层
// ==========================================
// 职责: 提供业务 API 接口,供 CLI / 外部界面调用
// ==========================================

pub mod config_api;
pub mod container_api;
pub mod dashboard_api;
pub mod error;
pub mod verification_api;
pub mod vessel_api;

// 重导出核心类型
pub use config_api::{ConfigApi, ConfigItem};
pub use container_api::{ContainerApi, ShipmentDetails, UploadOutcome};
pub use dashboard_api::{BoardView, DashboardApi, ExportSummary, SlaEntry};
pub use error::{ApiError, ApiResult};
pub use verification_api::VerificationApi;
pub use vessel_api::VesselApi;

// ==========================================
// 纺织品物流控制塔 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod container;
pub mod types;
pub mod verification;
pub mod vessel;

// 重导出核心类型
pub use container::{ActivityEntry, Assignee, Container, ContainerPatch, NewContainer};
pub use types::{
    ActivityRole, ContainerSize, ContainerStatus, DocumentKind, MatchStatus, OverallStatus,
    SencamerStatus, Severity,
};
pub use verification::{
    Discrepancy, DocumentFields, DocumentSet, TrackedField, VerificationReport,
};
pub use vessel::{GeoPoint, ItineraryStop, LookupSource, VesselLookup, VesselParticulars, VesselPosition};

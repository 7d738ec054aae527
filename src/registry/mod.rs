// ==========================================
// 纺织品物流控制塔 - 集装箱注册表层
// ==========================================
// 职责: 异步创建/更新/推进/订阅,存储一致性由 SQLite 保证
// ==========================================

pub mod container_registry;
pub mod error;
pub mod feed;

pub use container_registry::{
    ContainerRegistry, RegistrySettings, DEFAULT_STORE_TIMEOUT_MS, DEFAULT_TRANSIT_DAYS,
};
pub use error::{RegistryError, RegistryResult};
pub use feed::{ContainerFeed, ContainerSnapshot, FeedHandle, SnapshotHub};

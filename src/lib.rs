// ==========================================
// 纺织品物流控制塔 - 核心库
// ==========================================
// 技术栈: Rust + SQLite + Tokio
// 系统定位: 集装箱工作流跟踪 + 单证稽核 (人工最终确认)
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "es");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 引擎层 - 业务规则 (纯函数)
pub mod engine;

// 数据仓储层 - 数据访问
pub mod repository;

// 注册表层 - 异步写入与快照订阅
pub mod registry;

// 导入层 - 单证上传
pub mod importer;

// 报表导出
pub mod export;

// 船舶定位
pub mod tracking;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// API 层 - 业务接口
pub mod api;

// 应用层 - 组装
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{
    ActivityRole, ContainerSize, ContainerStatus, MatchStatus, OverallStatus, SencamerStatus,
    Severity,
};

// 领域实体
pub use domain::{
    ActivityEntry, Container, ContainerPatch, DocumentSet, NewContainer, VerificationReport,
    VesselLookup,
};

// 引擎
pub use engine::{AdvanceOutcome, DashboardKpis, KpiAggregator, VerificationEngine, WorkflowEngine};

// 注册表
pub use registry::{ContainerFeed, ContainerRegistry, FeedHandle};

// API
pub use api::{ContainerApi, DashboardApi, VerificationApi, VesselApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "纺织品物流控制塔";

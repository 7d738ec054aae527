// ==========================================
// 纺织品物流控制塔 - 应用层
// ==========================================
// 职责: 组装存储、注册表与各 API,供 CLI 使用
// ==========================================

pub mod state;

// 重导出
pub use state::{get_default_db_path, AppState};

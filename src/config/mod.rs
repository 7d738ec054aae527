// ==========================================
// 纺织品物流控制塔 - 配置层
// ==========================================
// 职责: 系统配置管理 (阈值、超时、上传目录、评分扣分)
// 存储: config_kv 表
// ==========================================

pub mod config_manager;

// 重导出核心配置管理器
pub use config_manager::{config_keys, ConfigManager, DEFAULT_UPLOAD_ROOT};

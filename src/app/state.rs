// ==========================================
// 纺织品物流控制塔 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// ==========================================

use std::sync::{Arc, Mutex};

use crate::api::{ConfigApi, ContainerApi, DashboardApi, VerificationApi, VesselApi};
use crate::config::config_manager::ConfigManager;
use crate::db::{init_schema, open_sqlite_connection, read_schema_version};
use crate::importer::DocumentIngestor;
use crate::registry::ContainerRegistry;
use crate::repository::ContainerRepository;
use crate::tracking::{MockVesselTracker, VesselTracker};

/// 应用状态
///
/// 包含所有API实例和共享资源
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 集装箱注册表 (快照订阅入口)
    pub registry: Arc<ContainerRegistry>,

    /// 集装箱API
    pub container_api: Arc<ContainerApi>,

    /// 驾驶舱API
    pub dashboard_api: Arc<DashboardApi>,

    /// 单证稽核API
    pub verification_api: Arc<VerificationApi>,

    /// 船舶定位API
    pub vessel_api: Arc<VesselApi>,

    /// 配置管理API
    pub config_api: Arc<ConfigApi>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径 (":memory:" 可用于临时运行)
    ///
    /// # 返回
    /// - Ok(AppState): 应用状态实例
    /// - Err(String): 初始化错误
    pub fn new(db_path: String) -> Result<Self, String> {
        Self::with_tracker(db_path, Arc::new(MockVesselTracker::new()))
    }

    /// 使用指定船舶定位服务创建
    pub fn with_tracker(db_path: String, tracker: Arc<dyn VesselTracker>) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        let conn = open_sqlite_connection(&db_path).map_err(|e| format!("无法打开数据库: {}", e))?;
        init_schema(&conn).map_err(|e| format!("建表失败: {}", e))?;
        match read_schema_version(&conn) {
            Ok(version) => tracing::debug!("schema_version={:?}", version),
            Err(e) => tracing::warn!("读取 schema_version 失败: {}", e),
        }
        let conn = Arc::new(Mutex::new(conn));

        // ==========================================
        // 配置
        // ==========================================
        let config_manager = Arc::new(
            ConfigManager::from_connection(conn.clone())
                .map_err(|e| format!("无法创建ConfigManager: {}", e))?,
        );
        let settings = config_manager
            .registry_settings()
            .map_err(|e| format!("读取注册表配置失败: {}", e))?;
        let upload_root = config_manager
            .get_upload_root()
            .map_err(|e| format!("读取上传目录配置失败: {}", e))?;

        // ==========================================
        // 存储 / 注册表
        // ==========================================
        let repo = Arc::new(ContainerRepository::new(conn));
        let registry = Arc::new(ContainerRegistry::new(repo, settings));
        let ingestor = Arc::new(DocumentIngestor::with_upload_root(upload_root.clone()));

        // ==========================================
        // API
        // ==========================================
        let container_api = Arc::new(ContainerApi::new(registry.clone(), ingestor));
        let dashboard_api = Arc::new(DashboardApi::new(registry.clone(), config_manager.clone()));
        let verification_api = Arc::new(VerificationApi::new(registry.clone(), config_manager.clone()));
        let vessel_api = Arc::new(VesselApi::new(registry.clone(), tracker));
        let config_api = Arc::new(ConfigApi::new(config_manager));

        tracing::info!(
            "AppState初始化完成: upload_root={}, store_timeout_ms={}",
            upload_root.display(),
            settings.store_timeout.as_millis()
        );

        Ok(Self {
            db_path,
            registry,
            container_api,
            dashboard_api,
            verification_api,
            vessel_api,
            config_api,
        })
    }

    /// 获取数据库路径
    pub fn get_db_path(&self) -> &str {
        &self.db_path
    }

    /// 关闭: 释放注册表与连接 (仍存活的订阅流随后结束)
    pub fn shutdown(self) {
        tracing::info!(
            "AppState关闭: db_path={}, 活跃订阅={}",
            self.db_path,
            self.registry.subscriber_count()
        );
    }
}

// ==========================================
// 默认数据库路径辅助函数
// ==========================================

/// 数据库路径环境变量
pub const DB_PATH_ENV: &str = "CONTROL_TOWER_DB_PATH";

/// 获取默认数据库路径
///
/// # 返回
/// - 环境变量 CONTROL_TOWER_DB_PATH (非空时)
/// - 否则: 用户数据目录/textile-control-tower/control_tower.db
/// - 无法取得用户数据目录时: ./control_tower.db
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var(DB_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./control_tower.db");

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("textile-control-tower");
        match std::fs::create_dir_all(&dir) {
            Ok(()) => path = dir.join("control_tower.db"),
            Err(e) => tracing::warn!("无法创建数据目录,使用当前目录: {}", e),
        }
    }

    path.to_string_lossy().to_string()
}

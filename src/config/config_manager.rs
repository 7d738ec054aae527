// ==========================================
// 纺织品物流控制塔 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (scope_id='global')
// 说明: 缺失或格式错误的配置回退到默认值
// ==========================================

use crate::db::open_sqlite_connection;
use crate::engine::audit::ScoringWeights;
use crate::engine::kpi::{KpiAggregator, DEFAULT_DEMURRAGE_THRESHOLD_DAYS};
use crate::engine::board::DEFAULT_SLA_WARNING_HOURS;
use crate::registry::{RegistrySettings, DEFAULT_STORE_TIMEOUT_MS, DEFAULT_TRANSIT_DAYS};
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::json;
use std::collections::BTreeMap;
use std::error::Error;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// 默认上传目录
pub const DEFAULT_UPLOAD_ROOT: &str = "./uploads";

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    fn get_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// 读取 global scope 的配置值（公开方法，供其他模块复用）
    pub fn get_global_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        self.get_config_value(key)
    }

    /// 读取数值配置; 缺失、无法解析或超出取值范围时返回默认值
    fn get_ranged_or<T: TryFrom<u64>>(&self, key: &str, default: T) -> Result<T, Box<dyn Error>> {
        let Some(raw) = self.get_config_value(key)? else {
            return Ok(default);
        };
        let range = config_keys::numeric_range(key);

        match raw.trim().parse::<u64>() {
            Ok(v) if range.as_ref().map_or(true, |r| r.contains(&v)) => match T::try_from(v) {
                Ok(v) => Ok(v),
                Err(_) => Ok(default),
            },
            Ok(_) => {
                tracing::warn!("配置值超出范围,使用默认值: key={}, value={}", key, raw);
                Ok(default)
            }
            Err(_) => {
                tracing::warn!("配置值格式错误,使用默认值: key={}, value={}", key, raw);
                Ok(default)
            }
        }
    }

    /// 写入 global 配置 (UPSERT)
    pub fn set_config_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let key = key.trim();
        if key.is_empty() {
            return Err("配置键不能为空".into());
        }

        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value, updated_at)
             VALUES ('global', ?1, ?2, datetime('now'))
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;

        tracing::info!("配置已更新: key={}, value={}", key, value);
        Ok(())
    }

    /// 获取所有配置的快照（JSON格式，按键排序）
    pub fn get_config_snapshot(&self) -> Result<String, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let mut stmt = conn.prepare(
            "SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key",
        )?;

        let mut config_map: BTreeMap<String, String> = BTreeMap::new();
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        Ok(serde_json::to_string(&json!(config_map))?)
    }

    /// 从配置快照恢复配置 (覆盖同名键)
    ///
    /// # 返回
    /// - Ok(usize): 恢复的配置项数量
    pub fn restore_config_from_snapshot(&self, snapshot_json: &str) -> Result<usize, Box<dyn Error>> {
        let config_map: BTreeMap<String, String> = serde_json::from_str(snapshot_json)?;

        let mut conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        let tx = conn.transaction()?;

        let mut count = 0;
        for (key, value) in config_map.iter() {
            count += tx.execute(
                "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
                 ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2",
                params![key, value],
            )?;
        }

        tx.commit()?;
        Ok(count)
    }

    // ===== 看板 / KPI =====

    /// 滞港风险阈值 (天)
    pub fn get_demurrage_threshold_days(&self) -> Result<i64, Box<dyn Error>> {
        self.get_ranged_or(config_keys::DEMURRAGE_THRESHOLD_DAYS, DEFAULT_DEMURRAGE_THRESHOLD_DAYS)
    }

    /// SLA 预警窗口 (小时)
    pub fn get_sla_warning_hours(&self) -> Result<i64, Box<dyn Error>> {
        self.get_ranged_or(config_keys::SLA_WARNING_HOURS, DEFAULT_SLA_WARNING_HOURS)
    }

    pub fn kpi_aggregator(&self) -> Result<KpiAggregator, Box<dyn Error>> {
        Ok(KpiAggregator::new(self.get_demurrage_threshold_days()?))
    }

    // ===== 注册表 =====

    /// 创建时默认在途天数
    pub fn get_default_transit_days(&self) -> Result<i64, Box<dyn Error>> {
        self.get_ranged_or(config_keys::DEFAULT_TRANSIT_DAYS, DEFAULT_TRANSIT_DAYS)
    }

    /// 存储调用超时 (毫秒)
    pub fn get_store_timeout_ms(&self) -> Result<u64, Box<dyn Error>> {
        self.get_ranged_or(config_keys::STORE_TIMEOUT_MS, DEFAULT_STORE_TIMEOUT_MS)
    }

    pub fn registry_settings(&self) -> Result<RegistrySettings, Box<dyn Error>> {
        Ok(RegistrySettings {
            store_timeout: Duration::from_millis(self.get_store_timeout_ms()?),
            default_transit_days: self.get_default_transit_days()?,
        })
    }

    // ===== 单证导入 =====

    pub fn get_upload_root(&self) -> Result<PathBuf, Box<dyn Error>> {
        let raw = self
            .get_config_value(config_keys::UPLOAD_ROOT)?
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_UPLOAD_ROOT.to_string());
        Ok(PathBuf::from(raw.trim()))
    }

    // ===== 单证稽核 =====

    /// 评分扣分表; 组合不满足 `ScoringWeights::validate` 时整体回退默认值
    pub fn scoring_weights(&self) -> Result<ScoringWeights, Box<dyn Error>> {
        let defaults = ScoringWeights::default();
        let weights = ScoringWeights {
            low: self.get_ranged_or(config_keys::SCORE_PENALTY_LOW, defaults.low)?,
            high: self.get_ranged_or(config_keys::SCORE_PENALTY_HIGH, defaults.high)?,
            critical: self.get_ranged_or(config_keys::SCORE_PENALTY_CRITICAL, defaults.critical)?,
        };

        match weights.validate() {
            Ok(()) => Ok(weights),
            Err(reason) => {
                tracing::warn!("评分配置无效,使用默认值: {}", reason);
                Ok(defaults)
            }
        }
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    use std::ops::RangeInclusive;

    // 看板
    pub const DEMURRAGE_THRESHOLD_DAYS: &str = "demurrage_threshold_days";
    pub const SLA_WARNING_HOURS: &str = "sla_warning_hours";

    // 注册表
    pub const DEFAULT_TRANSIT_DAYS: &str = "default_transit_days";
    pub const STORE_TIMEOUT_MS: &str = "store_timeout_ms";

    // 单证导入
    pub const UPLOAD_ROOT: &str = "upload_root";

    // 稽核评分 (按严重度扣分)
    pub const SCORE_PENALTY_LOW: &str = "score_penalty_low";
    pub const SCORE_PENALTY_HIGH: &str = "score_penalty_high";
    pub const SCORE_PENALTY_CRITICAL: &str = "score_penalty_critical";

    /// 数值型配置的取值范围 (非数值键返回 None)
    pub fn numeric_range(key: &str) -> Option<RangeInclusive<u64>> {
        match key {
            DEMURRAGE_THRESHOLD_DAYS => Some(0..=365),
            SLA_WARNING_HOURS => Some(1..=8_760),
            DEFAULT_TRANSIT_DAYS => Some(1..=3_650),
            STORE_TIMEOUT_MS => Some(1..=600_000),
            SCORE_PENALTY_LOW | SCORE_PENALTY_HIGH | SCORE_PENALTY_CRITICAL => Some(1..=100),
            _ => None,
        }
    }

    pub fn is_score_penalty(key: &str) -> bool {
        matches!(key, SCORE_PENALTY_LOW | SCORE_PENALTY_HIGH | SCORE_PENALTY_CRITICAL)
    }

    /// 全部已知键
    pub const ALL: [&str; 8] = [
        DEMURRAGE_THRESHOLD_DAYS,
        SLA_WARNING_HOURS,
        DEFAULT_TRANSIT_DAYS,
        STORE_TIMEOUT_MS,
        UPLOAD_ROOT,
        SCORE_PENALTY_LOW,
        SCORE_PENALTY_HIGH,
        SCORE_PENALTY_CRITICAL,
    ];
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_manager() -> ConfigManager {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::init_schema(&conn).unwrap();
        ConfigManager::from_connection(Arc::new(Mutex::new(conn))).unwrap()
    }

    #[test]
    fn test_defaults_when_missing() {
        let manager = setup_manager();
        assert_eq!(manager.get_demurrage_threshold_days().unwrap(), 3);
        assert_eq!(manager.get_default_transit_days().unwrap(), 30);
        assert_eq!(manager.get_sla_warning_hours().unwrap(), 24);
        assert_eq!(manager.get_store_timeout_ms().unwrap(), 5000);
        assert_eq!(manager.get_upload_root().unwrap(), PathBuf::from("./uploads"));
        assert_eq!(manager.scoring_weights().unwrap(), ScoringWeights::default());
    }

    #[test]
    fn test_set_and_read_back() {
        let manager = setup_manager();
        manager.set_config_value(config_keys::DEMURRAGE_THRESHOLD_DAYS, "5").unwrap();
        manager.set_config_value(config_keys::SCORE_PENALTY_HIGH, "35").unwrap();
        manager.set_config_value(config_keys::DEMURRAGE_THRESHOLD_DAYS, "7").unwrap();

        assert_eq!(manager.get_demurrage_threshold_days().unwrap(), 7);
        assert_eq!(manager.kpi_aggregator().unwrap().demurrage_threshold_days(), 7);
        assert_eq!(manager.scoring_weights().unwrap().high, 35);
    }

    #[test]
    fn test_malformed_value_falls_back() {
        let manager = setup_manager();
        manager.set_config_value(config_keys::STORE_TIMEOUT_MS, "soon").unwrap();
        assert_eq!(manager.get_store_timeout_ms().unwrap(), DEFAULT_STORE_TIMEOUT_MS);
        assert_eq!(
            manager.registry_settings().unwrap().store_timeout,
            Duration::from_millis(DEFAULT_STORE_TIMEOUT_MS)
        );
    }

    #[test]
    fn test_out_of_range_values_fall_back() {
        let manager = setup_manager();
        manager.set_config_value(config_keys::DEFAULT_TRANSIT_DAYS, "200000000000").unwrap();
        manager.set_config_value(config_keys::SLA_WARNING_HOURS, "0").unwrap();
        manager.set_config_value(config_keys::STORE_TIMEOUT_MS, "0").unwrap();

        assert_eq!(manager.get_default_transit_days().unwrap(), DEFAULT_TRANSIT_DAYS);
        assert_eq!(manager.get_sla_warning_hours().unwrap(), DEFAULT_SLA_WARNING_HOURS);
        assert_eq!(manager.get_store_timeout_ms().unwrap(), DEFAULT_STORE_TIMEOUT_MS);
    }

    #[test]
    fn test_inconsistent_weights_fall_back_to_defaults() {
        let manager = setup_manager();
        // 绕过 API 校验直接写库 (例如从旧快照恢复)
        manager.set_config_value(config_keys::SCORE_PENALTY_HIGH, "10").unwrap();
        assert_eq!(manager.scoring_weights().unwrap(), ScoringWeights::default());

        manager.set_config_value(config_keys::SCORE_PENALTY_HIGH, "40").unwrap();
        assert_eq!(manager.scoring_weights().unwrap().high, 40);
    }

    #[test]
    fn test_empty_key_rejected() {
        let manager = setup_manager();
        assert!(manager.set_config_value("  ", "1").is_err());
    }

    #[test]
    fn test_snapshot_round_trip() {
        let manager = setup_manager();
        manager.set_config_value(config_keys::UPLOAD_ROOT, "/srv/uploads").unwrap();
        manager.set_config_value(config_keys::SLA_WARNING_HOURS, "12").unwrap();

        let snapshot = manager.get_config_snapshot().unwrap();
        let other = setup_manager();
        assert_eq!(other.restore_config_from_snapshot(&snapshot).unwrap(), 2);
        assert_eq!(other.get_upload_root().unwrap(), PathBuf::from("/srv/uploads"));
        assert_eq!(other.get_sla_warning_hours().unwrap(), 12);
    }
}

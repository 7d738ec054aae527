// ==========================================
// 纺织品物流控制塔 - 配置管理 API
// ==========================================
// 职责: 配置查询、更新、快照管理
// 说明: 只接受已知配置键; 数值型配置写入前校验
// ==========================================

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use crate::api::error::{ApiError, ApiResult};
use crate::config::config_keys;
use crate::config::config_manager::ConfigManager;
use crate::engine::audit::ScoringWeights;

// ==========================================
// ConfigApi - 配置管理 API
// ==========================================

/// 配置管理API
///
/// 职责：
/// 1. 配置查询（全部、单个）
/// 2. 配置更新（带校验）
/// 3. 配置快照导出与恢复
pub struct ConfigApi {
    config_manager: Arc<ConfigManager>,
}

impl ConfigApi {
    /// 创建新的ConfigApi实例
    pub fn new(config_manager: Arc<ConfigManager>) -> Self {
        Self { config_manager }
    }

    /// 查询所有已知配置 (未设置的项 value 为 None,使用默认值)
    pub fn list_configs(&self) -> ApiResult<Vec<ConfigItem>> {
        config_keys::ALL
            .iter()
            .map(|key| self.get_config(key))
            .collect()
    }

    /// 查询单个配置
    ///
    /// # 返回
    /// - Ok(ConfigItem): value 为 None 表示未覆写
    /// - Err(ApiError::InvalidInput): 未知配置键
    pub fn get_config(&self, key: &str) -> ApiResult<ConfigItem> {
        let key = validate_key(key)?;
        let value = self
            .config_manager
            .get_global_config_value(key)
            .map_err(|e| ApiError::DatabaseError(e.to_string()))?;
        Ok(ConfigItem {
            key: key.to_string(),
            value,
        })
    }

    /// 更新配置
    ///
    /// # 参数
    /// - key: 配置键 (必须是已知键)
    /// - value: 配置值 (数值型配置必须是取值范围内的整数; 扣分需随严重度递增)
    pub fn update_config(&self, key: &str, value: &str) -> ApiResult<()> {
        let key = validate_key(key)?;
        let value = value.trim();
        let parsed = validate_value(key, value)?;
        if let Some(penalty) = parsed.filter(|_| config_keys::is_score_penalty(key)) {
            let mut weights = self.current_weights()?;
            set_penalty(&mut weights, key, penalty);
            weights.validate().map_err(ApiError::InvalidInput)?;
        }

        self.config_manager
            .set_config_value(key, value)
            .map_err(|e| ApiError::DatabaseError(e.to_string()))
    }

    /// 导出配置快照 (JSON)
    pub fn get_config_snapshot(&self) -> ApiResult<String> {
        self.config_manager
            .get_config_snapshot()
            .map_err(|e| ApiError::DatabaseError(e.to_string()))
    }

    /// 从快照恢复配置
    ///
    /// 快照中的已知键按 `update_config` 同样的规则校验,任一不通过则整体拒绝
    ///
    /// # 返回
    /// - Ok(usize): 恢复的配置项数量
    pub fn restore_from_snapshot(&self, snapshot_json: &str) -> ApiResult<usize> {
        if snapshot_json.trim().is_empty() {
            return Err(ApiError::InvalidInput("快照内容不能为空".to_string()));
        }
        let entries: BTreeMap<String, String> = serde_json::from_str(snapshot_json)
            .map_err(|e| ApiError::InvalidInput(format!("快照格式错误: {}", e)))?;

        let mut weights = self.current_weights()?;
        for (key, value) in &entries {
            if !config_keys::ALL.contains(&key.as_str()) {
                continue;
            }
            if let Some(parsed) = validate_value(key, value.trim())? {
                if config_keys::is_score_penalty(key) {
                    set_penalty(&mut weights, key, parsed);
                }
            }
        }
        weights.validate().map_err(ApiError::InvalidInput)?;

        self.config_manager
            .restore_config_from_snapshot(snapshot_json)
            .map_err(|e| ApiError::InvalidInput(format!("快照恢复失败: {}", e)))
    }
}

impl ConfigApi {
    fn current_weights(&self) -> ApiResult<ScoringWeights> {
        self.config_manager
            .scoring_weights()
            .map_err(|e| ApiError::DatabaseError(e.to_string()))
    }
}

fn validate_key(key: &str) -> ApiResult<&str> {
    let key = key.trim();
    config_keys::ALL
        .iter()
        .find(|k| **k == key)
        .copied()
        .ok_or_else(|| ApiError::InvalidInput(format!("未知配置键: {}", key)))
}

/// 校验配置值; 数值型配置返回解析结果
fn validate_value(key: &str, value: &str) -> ApiResult<Option<u64>> {
    if key == config_keys::UPLOAD_ROOT {
        if value.is_empty() {
            return Err(ApiError::InvalidInput("上传目录不能为空".to_string()));
        }
        return Ok(None);
    }

    let parsed = value
        .parse::<u64>()
        .map_err(|_| ApiError::InvalidInput(format!("配置 {} 需要非负整数,实际: {}", key, value)))?;
    if let Some(range) = config_keys::numeric_range(key) {
        if !range.contains(&parsed) {
            return Err(ApiError::InvalidInput(format!(
                "配置 {} 超出范围 {}..={},实际: {}",
                key,
                range.start(),
                range.end(),
                parsed
            )));
        }
    }
    Ok(Some(parsed))
}

fn set_penalty(weights: &mut ScoringWeights, key: &str, penalty: u64) {
    // 取值范围已限制在 1..=100
    let penalty = u32::try_from(penalty).unwrap_or(u32::MAX);
    match key {
        config_keys::SCORE_PENALTY_LOW => weights.low = penalty,
        config_keys::SCORE_PENALTY_HIGH => weights.high = penalty,
        config_keys::SCORE_PENALTY_CRITICAL => weights.critical = penalty,
        _ => {}
    }
}

/// 在阻塞线程池读取配置,并施加与存储调用相同的超时
pub(crate) async fn read_config<T, F>(
    config: &Arc<ConfigManager>,
    timeout: Duration,
    what: &str,
    read: F,
) -> ApiResult<T>
where
    T: Send + 'static,
    F: FnOnce(&ConfigManager) -> Result<T, Box<dyn Error>> + Send + 'static,
{
    let config = config.clone();
    let task = tokio::task::spawn_blocking(move || read(&config).map_err(|e| e.to_string()));

    match tokio::time::timeout(timeout, task).await {
        Ok(Ok(Ok(value))) => Ok(value),
        Ok(Ok(Err(e))) => Err(ApiError::InternalError(format!("读取{}失败: {}", what, e))),
        Ok(Err(join_err)) => Err(ApiError::InternalError(format!("读取{}失败: {}", what, join_err))),
        Err(_) => Err(ApiError::StoreUnavailable(format!(
            "读取{}超时: {}ms",
            what,
            timeout.as_millis()
        ))),
    }
}

// ==========================================
// DTO 类型定义
// ==========================================

/// 配置项
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigItem {
    pub key: String,
    pub value: Option<String>,
}

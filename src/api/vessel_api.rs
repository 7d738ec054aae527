// ==========================================
// 纺织品物流控制塔 - 船舶定位 API
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::domain::vessel::VesselLookup;
use crate::registry::ContainerRegistry;
use crate::tracking::VesselTracker;
use std::sync::Arc;

pub struct VesselApi {
    registry: Arc<ContainerRegistry>,
    tracker: Arc<dyn VesselTracker>,
}

impl VesselApi {
    pub fn new(registry: Arc<ContainerRegistry>, tracker: Arc<dyn VesselTracker>) -> Self {
        Self { registry, tracker }
    }

    /// 按船名查询 (未命中返回 Fallback 占位记录)
    pub async fn lookup(&self, vessel_name: &str) -> ApiResult<VesselLookup> {
        Ok(self.tracker.lookup(vessel_name).await?)
    }

    /// 查询集装箱所在船舶
    ///
    /// # 错误
    /// - `NotFound`: 集装箱不存在
    /// - `InvalidInput`: 集装箱未登记船名
    pub async fn lookup_for_container(&self, container_id: &str) -> ApiResult<VesselLookup> {
        let container = self.registry.get(container_id).await?;
        let vessel = container
            .vessel
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| {
                ApiError::InvalidInput(format!("集装箱 {} 未登记船名", container.container_number))
            })?;
        self.lookup(&vessel).await
    }
}

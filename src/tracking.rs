// ==========================================
// 纺织品物流控制塔 - 船舶定位
// ==========================================
// 职责: 按船名查询位置/航速/航向/航程
// 策略: 未命中时返回默认占位记录 (标记 Fallback),不报错
// 说明: 当前仅有模拟数据源; 真实定位服务实现同一 trait 即可接入
// ==========================================

use crate::domain::vessel::{
    GeoPoint, ItineraryStop, LookupSource, VesselLookup, VesselParticulars, VesselPosition,
};
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum TrackingError {
    #[error("船名不能为空")]
    EmptyVesselName,
}

pub type TrackingResult<T> = Result<T, TrackingError>;

/// 船舶定位服务
#[async_trait]
pub trait VesselTracker: Send + Sync {
    /// 查询船舶位置
    ///
    /// # 错误
    /// - `EmptyVesselName`: 船名为空
    async fn lookup(&self, vessel_name: &str) -> TrackingResult<VesselLookup>;
}

// ==========================================
// MockVesselTracker - 模拟数据源
// ==========================================

const MOCK_PROVIDER: &str = "MarineTraffic API (Mock)";
const MOCK_FALLBACK_PROVIDER: &str = "MarineTraffic API (Mock - Fallback)";

#[derive(Debug, Clone)]
pub struct MockVesselTracker {
    vessels: Vec<VesselPosition>,
    latency: Option<Duration>,
}

impl Default for MockVesselTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl MockVesselTracker {
    pub fn new() -> Self {
        Self {
            vessels: mock_vessels(),
            latency: None,
        }
    }

    /// 模拟网络延迟
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn known_vessels(&self) -> Vec<&str> {
        self.vessels.iter().map(|v| v.vessel_name.as_str()).collect()
    }

    /// 船名匹配: 库内船名 (小写) 包含查询词 (小写),取第一个
    fn find(&self, vessel_name: &str) -> Option<&VesselPosition> {
        let needle = vessel_name.to_lowercase();
        self.vessels
            .iter()
            .find(|v| v.vessel_name.to_lowercase().contains(&needle))
    }
}

#[async_trait]
impl VesselTracker for MockVesselTracker {
    async fn lookup(&self, vessel_name: &str) -> TrackingResult<VesselLookup> {
        let vessel_name = vessel_name.trim();
        if vessel_name.is_empty() {
            return Err(TrackingError::EmptyVesselName);
        }

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        match self.find(vessel_name) {
            Some(found) => Ok(VesselLookup {
                source: LookupSource::Matched,
                provider: MOCK_PROVIDER.to_string(),
                data: found.clone(),
            }),
            None => {
                tracing::warn!("未找到船舶,返回默认位置: vessel={}", vessel_name);
                Ok(VesselLookup {
                    source: LookupSource::Fallback,
                    provider: MOCK_FALLBACK_PROVIDER.to_string(),
                    data: fallback_position(vessel_name),
                })
            }
        }
    }
}

fn stop(port: &str, time: &str) -> ItineraryStop {
    ItineraryStop {
        port: port.to_string(),
        time: time.to_string(),
    }
}

fn mock_vessels() -> Vec<VesselPosition> {
    vec![
        VesselPosition {
            vessel_name: "MSC Zoe".to_string(),
            position: GeoPoint { lat: 13.5, lon: -65.5 },
            speed_knots: 14.5,
            course_deg: 270.0,
            voyage_status: "Underway using Engine".to_string(),
            origin: stop("Shanghai", "2024-10-01 14:00"),
            destination: stop("LA GUAIRA, VE", "2024-10-25 08:00"),
            last_port: "KINGSTON, JM".to_string(),
            imo: "9703318".to_string(),
            particulars: Some(VesselParticulars {
                flag: "Panama [PA]".to_string(),
                year_built: 2015,
                length_m: 395.0,
                width_m: 59.0,
            }),
            destination_point: Some(GeoPoint { lat: 10.60, lon: -66.95 }),
        },
        VesselPosition {
            vessel_name: "CMA CGM Marco Polo".to_string(),
            position: GeoPoint { lat: 11.2, lon: -67.1 },
            speed_knots: 0.0,
            course_deg: 120.0,
            voyage_status: "Moored".to_string(),
            origin: stop("Ningbo", "2024-09-28 10:00"),
            destination: stop("PUERTO CABELLO, VE", "2024-10-20 16:00"),
            last_port: "CARTAGENA, CO".to_string(),
            imo: "9454436".to_string(),
            particulars: Some(VesselParticulars {
                flag: "Bahamas [BS]".to_string(),
                year_built: 2012,
                length_m: 396.0,
                width_m: 53.0,
            }),
            destination_point: None,
        },
    ]
}

/// 默认占位记录 (船名保留查询值)
fn fallback_position(vessel_name: &str) -> VesselPosition {
    VesselPosition {
        vessel_name: vessel_name.to_string(),
        position: GeoPoint { lat: 10.60, lon: -66.95 },
        speed_knots: 12.0,
        course_deg: 180.0,
        voyage_status: "Underway".to_string(),
        origin: stop("Origin", "2024-10-05 08:00"),
        destination: stop("LA GUAIRA, VE", "2024-10-30 12:00"),
        last_port: "PANAMA CANAL".to_string(),
        imo: "0000000".to_string(),
        particulars: None,
        destination_point: None,
    }
}

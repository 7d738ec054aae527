// ==========================================
// 纺织品物流控制塔 - 船舶位置模型
// ==========================================
// 来源: 外部船舶定位服务 (当前为模拟数据)
// ==========================================

use serde::{Deserialize, Serialize};

/// 坐标
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

/// 航程节点 (港口 + 时间描述)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItineraryStop {
    pub port: String,
    pub time: String,
}

/// 船舶静态资料 (可选)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VesselParticulars {
    pub flag: String,
    pub year_built: u16,
    pub length_m: f64,
    pub width_m: f64,
}

/// 船舶实时位置与航程
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VesselPosition {
    pub vessel_name: String,
    pub position: GeoPoint,
    pub speed_knots: f64,
    pub course_deg: f64,
    pub voyage_status: String,
    pub origin: ItineraryStop,
    pub destination: ItineraryStop,
    pub last_port: String,
    pub imo: String,
    pub particulars: Option<VesselParticulars>,
    pub destination_point: Option<GeoPoint>,
}

/// 查询结果来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LookupSource {
    Matched,  // 命中船名
    Fallback, // 未命中,返回默认占位记录
}

/// 船舶查询结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VesselLookup {
    pub source: LookupSource,
    pub provider: String,
    pub data: VesselPosition,
}

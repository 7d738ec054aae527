// ==========================================
// 纺织品物流控制塔 - 领域类型定义
// ==========================================
// 依据: 集装箱四阶段工作流 (Transit → Port → Customs → Warehouse)
// 序列化格式: SCREAMING_SNAKE_CASE (与数据库一致)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 集装箱状态 (Container Status)
// ==========================================
// 顺序: Transit < Port < Customs < Warehouse
// 红线: 只能向前推进,不可回退,不可跳级
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContainerStatus {
    Transit,   // 国际运输中
    Port,      // 已到港
    Customs,   // 海关 / SENCAMER
    Warehouse, // 已入库 (终态)
}

impl ContainerStatus {
    /// 工作流全序列
    pub const ALL: [ContainerStatus; 4] = [
        ContainerStatus::Transit,
        ContainerStatus::Port,
        ContainerStatus::Customs,
        ContainerStatus::Warehouse,
    ];

    /// 从字符串解析状态
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "TRANSIT" => Some(ContainerStatus::Transit),
            "PORT" => Some(ContainerStatus::Port),
            "CUSTOMS" => Some(ContainerStatus::Customs),
            "WAREHOUSE" => Some(ContainerStatus::Warehouse),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            ContainerStatus::Transit => "TRANSIT",
            ContainerStatus::Port => "PORT",
            ContainerStatus::Customs => "CUSTOMS",
            ContainerStatus::Warehouse => "WAREHOUSE",
        }
    }

    /// 是否为终态
    pub fn is_terminal(&self) -> bool {
        matches!(self, ContainerStatus::Warehouse)
    }
}

impl fmt::Display for ContainerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// SENCAMER 许可状态
// ==========================================
// 与集装箱位置状态相互独立,不由 status 推导
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SencamerStatus {
    Valid,      // 有效
    Warning,    // 临近到期
    Expired,    // 已过期
    Processing, // 办理中
}

impl SencamerStatus {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "VALID" => Some(SencamerStatus::Valid),
            "WARNING" => Some(SencamerStatus::Warning),
            "EXPIRED" => Some(SencamerStatus::Expired),
            "PROCESSING" => Some(SencamerStatus::Processing),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            SencamerStatus::Valid => "VALID",
            SencamerStatus::Warning => "WARNING",
            SencamerStatus::Expired => "EXPIRED",
            SencamerStatus::Processing => "PROCESSING",
        }
    }

    /// 是否计入 "SENCAMER 问题" 指标
    pub fn is_issue(&self) -> bool {
        matches!(self, SencamerStatus::Expired | SencamerStatus::Warning)
    }
}

impl fmt::Display for SencamerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// 集装箱尺寸 (Container Size)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContainerSize {
    #[serde(rename = "20GP")]
    Gp20,
    #[serde(rename = "40HQ")]
    Hq40,
}

impl ContainerSize {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "20GP" => Some(ContainerSize::Gp20),
            "40HQ" => Some(ContainerSize::Hq40),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            ContainerSize::Gp20 => "20GP",
            ContainerSize::Hq40 => "40HQ",
        }
    }
}

impl fmt::Display for ContainerSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// 活动日志作者角色 (Author Role)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityRole {
    Manager, // 经理
    Analyst, // 分析员
    System,  // 系统自动
}

impl ActivityRole {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "MANAGER" => Some(ActivityRole::Manager),
            "ANALYST" => Some(ActivityRole::Analyst),
            "SYSTEM" => Some(ActivityRole::System),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            ActivityRole::Manager => "MANAGER",
            ActivityRole::Analyst => "ANALYST",
            ActivityRole::System => "SYSTEM",
        }
    }
}

impl fmt::Display for ActivityRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// 单证比对结果 (Match Status)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchStatus {
    Match,    // 一致
    Mismatch, // 不一致
    Missing,  // 一方缺失
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchStatus::Match => write!(f, "MATCH"),
            MatchStatus::Mismatch => write!(f, "MISMATCH"),
            MatchStatus::Missing => write!(f, "MISSING"),
        }
    }
}

// ==========================================
// 差异严重度 (Severity)
// ==========================================
// 顺序: Low < High < Critical
// Critical = 存在海关罚款风险
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Low,
    High,
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Low => write!(f, "LOW"),
            Severity::High => write!(f, "HIGH"),
            Severity::Critical => write!(f, "CRITICAL"),
        }
    }
}

// ==========================================
// 稽核结论 (Overall Status)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OverallStatus {
    Approved, // 通过
    Warning,  // 需关注
    Rejected, // 拒绝
}

impl fmt::Display for OverallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverallStatus::Approved => write!(f, "APPROVED"),
            OverallStatus::Warning => write!(f, "WARNING"),
            OverallStatus::Rejected => write!(f, "REJECTED"),
        }
    }
}

// ==========================================
// 比对对手单证 (Counterpart Document)
// ==========================================
// 每个字段只与其中一种单证比对
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentKind {
    Invoice,     // 商业发票
    PackingList, // 装箱单
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentKind::Invoice => write!(f, "INVOICE"),
            DocumentKind::PackingList => write!(f, "PACKING_LIST"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_container_status_db_roundtrip() {
        for status in ContainerStatus::ALL {
            assert_eq!(ContainerStatus::from_str(status.to_db_str()), Some(status));
        }
        assert_eq!(ContainerStatus::from_str(" port "), Some(ContainerStatus::Port));
        assert_eq!(ContainerStatus::from_str("DOCKED"), None);
    }

    #[test]
    fn test_status_order_follows_workflow() {
        assert!(ContainerStatus::Transit < ContainerStatus::Port);
        assert!(ContainerStatus::Port < ContainerStatus::Customs);
        assert!(ContainerStatus::Customs < ContainerStatus::Warehouse);
        assert!(ContainerStatus::Warehouse.is_terminal());
        assert!(!ContainerStatus::Customs.is_terminal());
    }

    #[test]
    fn test_sencamer_issue_flags() {
        assert!(SencamerStatus::Expired.is_issue());
        assert!(SencamerStatus::Warning.is_issue());
        assert!(!SencamerStatus::Valid.is_issue());
        assert!(!SencamerStatus::Processing.is_issue());
    }

    #[test]
    fn test_container_size_serde_names() {
        let json = serde_json::to_string(&ContainerSize::Hq40).unwrap();
        assert_eq!(json, "\"40HQ\"");
        let parsed: ContainerSize = serde_json::from_str("\"20GP\"").unwrap();
        assert_eq!(parsed, ContainerSize::Gp20);
    }

    #[test]
    fn test_severity_order() {
        assert!(Severity::Low < Severity::High);
        assert!(Severity::High < Severity::Critical);
    }
}

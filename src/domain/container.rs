// ==========================================
// 纺织品物流控制塔 - 集装箱领域模型
// ==========================================
// 红线: container_number 在注册表内唯一
// 红线: activity_log 只追加,不修改
// 对齐: schema container / container_activity 表
// ==========================================

use crate::domain::types::{ActivityRole, ContainerSize, ContainerStatus, SencamerStatus};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// Container - 集装箱实体
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Container {
    // ===== 主键 =====
    pub id: String,               // 注册表分配的内部ID
    pub container_number: String, // 业务编号 AAAA-NNNNNNN

    // ===== 状态 =====
    pub status: ContainerStatus,          // 工作流状态 (单调推进)
    pub sencamer_status: SencamerStatus,  // SENCAMER 许可状态 (独立)
    pub sencamer_expiration_date: Option<NaiveDate>,

    // ===== 货物信息 (仅展示,不影响状态转换) =====
    pub supplier: String,
    pub textile_type: String,
    pub container_size: Option<ContainerSize>,
    pub weight: Option<String>, // 申报重量原文, 如 "24,500 Kg"

    // ===== 运输信息 =====
    pub vessel: Option<String>,
    pub departure_date: Option<NaiveDate>,
    pub arrival_date: Option<NaiveDate>,
    pub eta: Option<DateTime<Utc>>,
    pub location: Option<String>, // 入库位置

    // ===== 责任人 / SLA =====
    pub assigned_to: Option<Assignee>,
    pub sla_deadline: Option<DateTime<Utc>>,

    // ===== 审计 =====
    pub activity_log: Vec<ActivityEntry>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Container {
    /// 在港天数 (仅 PORT 状态且有到港日期时计算)
    pub fn days_in_port(&self, today: NaiveDate) -> Option<i64> {
        if self.status != ContainerStatus::Port {
            return None;
        }
        self.arrival_date
            .map(|arrival| (today - arrival).num_days().max(0))
    }
}

// ==========================================
// Assignee - 分配的分析员
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignee {
    pub name: String,
    pub avatar: String,
}

// ==========================================
// ActivityEntry - 活动日志条目
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub id: String,
    pub author: String,
    pub role: ActivityRole,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl ActivityEntry {
    /// 创建新的日志条目 (ID 与时间戳自动生成)
    pub fn new(author: impl Into<String>, role: ActivityRole, message: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            author: author.into(),
            role,
            message: message.into(),
            timestamp: Utc::now(),
        }
    }

    /// 系统自动生成的条目
    pub fn system(message: impl Into<String>) -> Self {
        Self::new("System", ActivityRole::System, message)
    }
}

// ==========================================
// NewContainer - 创建候选
// ==========================================
// 由单证导入产生; status / sencamer_status / 时间戳由注册表赋值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewContainer {
    pub container_number: String,
    /// 上传的原始文件名 (用于重复检测的第二个匹配键)
    pub source_name: Option<String>,
    pub supplier: String,
    pub textile_type: String,
    pub container_size: Option<ContainerSize>,
    pub weight: Option<String>,
    pub vessel: Option<String>,
    pub departure_date: Option<NaiveDate>,
    pub eta: Option<DateTime<Utc>>,
    pub assigned_to: Option<Assignee>,
    pub sla_deadline: Option<DateTime<Utc>>,
}

impl NewContainer {
    pub fn new(
        container_number: impl Into<String>,
        supplier: impl Into<String>,
        textile_type: impl Into<String>,
    ) -> Self {
        Self {
            container_number: container_number.into(),
            source_name: None,
            supplier: supplier.into(),
            textile_type: textile_type.into(),
            container_size: None,
            weight: None,
            vessel: None,
            departure_date: None,
            eta: None,
            assigned_to: None,
            sla_deadline: None,
        }
    }
}

// ==========================================
// ContainerPatch - 字段编辑
// ==========================================
// 不含 status / container_number: 状态只能经由工作流推进
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContainerPatch {
    pub supplier: Option<String>,
    pub textile_type: Option<String>,
    pub sencamer_status: Option<SencamerStatus>,
    pub sencamer_expiration_date: Option<NaiveDate>,
    pub container_size: Option<ContainerSize>,
    pub weight: Option<String>,
    pub vessel: Option<String>,
    pub departure_date: Option<NaiveDate>,
    pub arrival_date: Option<NaiveDate>,
    pub eta: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub assigned_to: Option<Assignee>,
    pub sla_deadline: Option<DateTime<Utc>>,
}

impl ContainerPatch {
    /// 是否没有任何字段需要更新
    pub fn is_empty(&self) -> bool {
        *self == ContainerPatch::default()
    }

    /// 将补丁应用到实体 (仅覆盖 Some 字段)
    pub fn apply_to(&self, container: &mut Container) {
        if let Some(v) = &self.supplier {
            container.supplier = v.clone();
        }
        if let Some(v) = &self.textile_type {
            container.textile_type = v.clone();
        }
        if let Some(v) = self.sencamer_status {
            container.sencamer_status = v;
        }
        if let Some(v) = self.sencamer_expiration_date {
            container.sencamer_expiration_date = Some(v);
        }
        if let Some(v) = self.container_size {
            container.container_size = Some(v);
        }
        if let Some(v) = &self.weight {
            container.weight = Some(v.clone());
        }
        if let Some(v) = &self.vessel {
            container.vessel = Some(v.clone());
        }
        if let Some(v) = self.departure_date {
            container.departure_date = Some(v);
        }
        if let Some(v) = self.arrival_date {
            container.arrival_date = Some(v);
        }
        if let Some(v) = self.eta {
            container.eta = Some(v);
        }
        if let Some(v) = &self.location {
            container.location = Some(v.clone());
        }
        if let Some(v) = &self.assigned_to {
            container.assigned_to = Some(v.clone());
        }
        if let Some(v) = self.sla_deadline {
            container.sla_deadline = Some(v);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(status: ContainerStatus) -> Container {
        Container {
            id: "c1".to_string(),
            container_number: "MSCU-4567890".to_string(),
            status,
            sencamer_status: SencamerStatus::Processing,
            sencamer_expiration_date: None,
            supplier: "DenimWorld".to_string(),
            textile_type: "Mezclilla Pesada".to_string(),
            container_size: Some(ContainerSize::Hq40),
            weight: Some("26,000 Kg".to_string()),
            vessel: Some("MSC Zoe".to_string()),
            departure_date: NaiveDate::from_ymd_opt(2024, 9, 1),
            arrival_date: NaiveDate::from_ymd_opt(2024, 10, 15),
            eta: None,
            location: None,
            assigned_to: None,
            sla_deadline: None,
            activity_log: Vec::new(),
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[test]
    fn test_days_in_port_only_for_port_status() {
        let today = NaiveDate::from_ymd_opt(2024, 10, 20).unwrap();
        assert_eq!(sample(ContainerStatus::Port).days_in_port(today), Some(5));
        assert_eq!(sample(ContainerStatus::Customs).days_in_port(today), None);
    }

    #[test]
    fn test_patch_applies_only_present_fields() {
        let mut container = sample(ContainerStatus::Port);
        let patch = ContainerPatch {
            sencamer_status: Some(SencamerStatus::Valid),
            location: Some("Almacén B-12".to_string()),
            ..Default::default()
        };
        assert!(!patch.is_empty());

        patch.apply_to(&mut container);

        assert_eq!(container.sencamer_status, SencamerStatus::Valid);
        assert_eq!(container.location.as_deref(), Some("Almacén B-12"));
        assert_eq!(container.supplier, "DenimWorld");
        assert_eq!(container.status, ContainerStatus::Port);
    }

    #[test]
    fn test_empty_patch() {
        assert!(ContainerPatch::default().is_empty());
    }

    #[test]
    fn test_system_activity_entry() {
        let entry = ActivityEntry::system("creado");
        assert_eq!(entry.role, ActivityRole::System);
        assert_eq!(entry.author, "System");
        assert!(!entry.id.is_empty());
    }
}

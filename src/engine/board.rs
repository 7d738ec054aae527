// ==========================================
// 纺织品物流控制塔 - 看板视图引擎
// ==========================================
// 职责: 看板列分组、搜索过滤、"仅问题项" 过滤、SLA 状态判定
// 红线: 纯函数,不访问存储
// ==========================================

use crate::domain::container::Container;
use crate::domain::types::ContainerStatus;
use crate::engine::kpi::div_ceil;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// SLA 预警默认窗口 (小时)
pub const DEFAULT_SLA_WARNING_HOURS: i64 = 24;

// ==========================================
// BoardFilter - 看板过滤条件
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardFilter {
    /// 搜索词 (匹配箱号/供应商/面料类型,不区分大小写)
    pub search: Option<String>,
    /// 仅显示问题项 (SENCAMER 过期/预警 或 ETA 已过)
    pub issues_only: bool,
}

// ==========================================
// BoardColumn - 看板列
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardColumn {
    pub status: ContainerStatus,
    pub containers: Vec<Container>,
}

// ==========================================
// SlaState - SLA 状态
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SlaState {
    Overdue,                         // 已超期
    DueSoon { remaining_hours: i64 }, // 预警窗口内
    OnTrack { remaining_hours: i64 }, // 正常
}

/// 过滤条件匹配
pub fn matches_filter(container: &Container, filter: &BoardFilter, now: DateTime<Utc>) -> bool {
    let matches_search = match filter.search.as_deref().map(str::trim) {
        Some(term) if !term.is_empty() => {
            let term = term.to_lowercase();
            container.container_number.to_lowercase().contains(&term)
                || container.supplier.to_lowercase().contains(&term)
                || container.textile_type.to_lowercase().contains(&term)
        }
        _ => true,
    };

    let matches_issue = !filter.issues_only || has_issue(container, now);

    matches_search && matches_issue
}

/// 是否为问题项
pub fn has_issue(container: &Container, now: DateTime<Utc>) -> bool {
    container.sencamer_status.is_issue() || container.eta.map(|eta| eta < now).unwrap_or(false)
}

/// 应用过滤 (保持输入顺序)
pub fn apply_filter(containers: &[Container], filter: &BoardFilter, now: DateTime<Utc>) -> Vec<Container> {
    containers
        .iter()
        .filter(|c| matches_filter(c, filter, now))
        .cloned()
        .collect()
}

/// 按工作流状态分组为看板列 (列顺序 = 工作流顺序,列内保持输入顺序)
pub fn group_by_status(containers: &[Container]) -> Vec<BoardColumn> {
    ContainerStatus::ALL
        .iter()
        .map(|status| BoardColumn {
            status: *status,
            containers: containers
                .iter()
                .filter(|c| c.status == *status)
                .cloned()
                .collect(),
        })
        .collect()
}

/// SLA 状态判定 (无截止时间返回 None)
pub fn sla_state(container: &Container, now: DateTime<Utc>, warning_hours: i64) -> Option<SlaState> {
    let deadline = container.sla_deadline?;
    if deadline < now {
        return Some(SlaState::Overdue);
    }

    let remaining = deadline - now;
    let remaining_hours = div_ceil(remaining.num_seconds(), 3600);
    // 预警窗口超出可表示范围时视为覆盖全部剩余时间
    let within_window = Duration::try_hours(warning_hours).map_or(true, |window| remaining < window);
    if within_window {
        Some(SlaState::DueSoon { remaining_hours })
    } else {
        Some(SlaState::OnTrack { remaining_hours })
    }
}

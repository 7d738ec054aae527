// ==========================================
// 纺织品物流控制塔 - KPI 聚合引擎
// ==========================================
// 职责: 对当前集装箱全集计算驾驶舱指标
// 红线: 纯函数,无副作用,同一输入重复计算结果一致
// ==========================================

use crate::domain::container::Container;
use crate::domain::types::ContainerStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// 滞港风险默认阈值 (天)
pub const DEFAULT_DEMURRAGE_THRESHOLD_DAYS: i64 = 3;

const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

// ==========================================
// DashboardKpis - 驾驶舱指标
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DashboardKpis {
    pub total: usize,           // 集装箱总数
    pub in_port: usize,         // 在港数量
    pub sencamer_issues: usize, // SENCAMER 过期/预警数量
    pub demurrage_risk: usize,  // 滞港风险数量 (ETA ≤ 阈值天数,含已逾期)
}

// ==========================================
// KpiAggregator - KPI 聚合器
// ==========================================
#[derive(Debug, Clone, Copy)]
pub struct KpiAggregator {
    demurrage_threshold_days: i64,
}

impl Default for KpiAggregator {
    fn default() -> Self {
        Self::new(DEFAULT_DEMURRAGE_THRESHOLD_DAYS)
    }
}

impl KpiAggregator {
    pub fn new(demurrage_threshold_days: i64) -> Self {
        Self {
            demurrage_threshold_days,
        }
    }

    pub fn demurrage_threshold_days(&self) -> i64 {
        self.demurrage_threshold_days
    }

    /// 计算全部指标
    #[instrument(skip(self, containers), fields(count = containers.len()))]
    pub fn compute(&self, containers: &[Container], now: DateTime<Utc>) -> DashboardKpis {
        DashboardKpis {
            total: containers.len(),
            in_port: containers
                .iter()
                .filter(|c| c.status == ContainerStatus::Port)
                .count(),
            sencamer_issues: containers
                .iter()
                .filter(|c| c.sencamer_status.is_issue())
                .count(),
            demurrage_risk: containers
                .iter()
                .filter(|c| self.is_demurrage_risk(c, now))
                .count(),
        }
    }

    /// 单个集装箱是否存在滞港风险
    ///
    /// 规则: ETA 存在,且 ceil((ETA - now) / 1天) ≤ 阈值 (负数即已逾期,同样计入)
    pub fn is_demurrage_risk(&self, container: &Container, now: DateTime<Utc>) -> bool {
        match container.eta {
            Some(eta) => days_until_ceil(eta, now) <= self.demurrage_threshold_days,
            None => false,
        }
    }
}

/// 距目标时间的天数 (向上取整)
pub fn days_until_ceil(target: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let secs = (target - now).num_seconds();
    div_ceil(secs, SECONDS_PER_DAY)
}

/// 有符号整数向上取整除法
pub(crate) fn div_ceil(value: i64, divisor: i64) -> i64 {
    let q = value / divisor;
    if value % divisor > 0 {
        q + 1
    } else {
        q
    }
}

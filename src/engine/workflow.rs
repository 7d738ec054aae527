// ==========================================
// 纺织品物流控制塔 - 工作流状态机
// ==========================================
// 状态: TRANSIT → PORT → CUSTOMS → WAREHOUSE
// 红线: 单调推进,不可回退,不可跳级; WAREHOUSE 为终态
// 说明: 终态再推进是 no-op,不是错误
// ==========================================

use crate::domain::container::Container;
use crate::domain::types::ContainerStatus;
use serde::{Deserialize, Serialize};

// ==========================================
// AdvanceOutcome - 推进结果
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdvanceOutcome {
    /// 推进成功
    Advanced {
        from: ContainerStatus,
        to: ContainerStatus,
    },
    /// 已在终态,无后续状态
    Unavailable { current: ContainerStatus },
}

impl AdvanceOutcome {
    pub fn is_advanced(&self) -> bool {
        matches!(self, AdvanceOutcome::Advanced { .. })
    }

    /// 推进后的状态 (未推进时为当前状态)
    pub fn resulting_status(&self) -> ContainerStatus {
        match self {
            AdvanceOutcome::Advanced { to, .. } => *to,
            AdvanceOutcome::Unavailable { current } => *current,
        }
    }
}

// ==========================================
// WorkflowEngine - 工作流引擎
// ==========================================
#[derive(Debug, Clone, Copy, Default)]
pub struct WorkflowEngine;

impl WorkflowEngine {
    pub fn new() -> Self {
        Self
    }

    /// 后继状态 (终态返回 None)
    pub fn next_status(&self, current: ContainerStatus) -> Option<ContainerStatus> {
        let flow = ContainerStatus::ALL;
        let idx = flow.iter().position(|s| *s == current)?;
        flow.get(idx + 1).copied()
    }

    /// 对集装箱执行一次推进判定 (纯函数,不修改实体)
    pub fn advance(&self, container: &Container) -> AdvanceOutcome {
        self.advance_status(container.status)
    }

    /// 按状态执行推进判定
    pub fn advance_status(&self, current: ContainerStatus) -> AdvanceOutcome {
        match self.next_status(current) {
            Some(to) => AdvanceOutcome::Advanced { from: current, to },
            None => AdvanceOutcome::Unavailable { current },
        }
    }

    /// 检查一次状态变更是否是合法的单步前进
    pub fn is_legal_transition(&self, from: ContainerStatus, to: ContainerStatus) -> bool {
        self.next_status(from) == Some(to)
    }

    /// "推进" 按钮文案 (仅由当前状态决定; 终态无文案)
    pub fn advance_label(&self, current: ContainerStatus) -> Option<String> {
        let key = match current {
            ContainerStatus::Transit => "workflow.advance.transit",
            ContainerStatus::Port => "workflow.advance.port",
            ContainerStatus::Customs => "workflow.advance.customs",
            ContainerStatus::Warehouse => return None,
        };
        Some(crate::i18n::t(key))
    }
}

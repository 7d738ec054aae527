// ==========================================
// 纺织品物流控制塔 - 注册表错误类型
// ==========================================
// 工具: thiserror 派生宏
// ==========================================

use crate::domain::types::ContainerStatus;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// 注册表错误类型
#[derive(Error, Debug)]
pub enum RegistryError {
    /// 箱号已存在 (未做任何写入)
    #[error("集装箱编号重复: {container_number} (当前状态={existing_status}, 供应商={existing_supplier})")]
    Duplicate {
        container_number: String,
        existing_status: String,
        existing_supplier: String,
    },

    #[error("集装箱不存在: {0}")]
    NotFound(String),

    /// 状态已被其他写入者改变,本次转换未写入
    #[error("状态已变更: 期望 {expected}, 实际 {actual}")]
    StatusConflict {
        expected: ContainerStatus,
        actual: ContainerStatus,
    },

    /// 存储调用未在期限内返回; 写入可能已落库,调用方按可重试处理
    #[error("存储调用超时: {operation} 超过 {timeout_ms}ms")]
    StoreTimeout { operation: String, timeout_ms: u64 },

    #[error("存储错误: {0}")]
    Store(RepositoryError),

    #[error("后台任务失败: {0}")]
    TaskJoin(String),
}

impl RegistryError {
    /// 是否可由调用方重试
    pub fn is_retryable(&self) -> bool {
        match self {
            RegistryError::StoreTimeout { .. } | RegistryError::TaskJoin(_) => true,
            RegistryError::Store(RepositoryError::LockError(_))
            | RegistryError::Store(RepositoryError::DatabaseConnectionError(_)) => true,
            _ => false,
        }
    }
}

impl From<RepositoryError> for RegistryError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::DuplicateContainerNumber {
                container_number,
                existing_status,
                existing_supplier,
            } => RegistryError::Duplicate {
                container_number,
                existing_status,
                existing_supplier,
            },
            RepositoryError::NotFound { id, .. } => RegistryError::NotFound(id),
            other => RegistryError::Store(other),
        }
    }
}

/// Result 类型别名
pub type RegistryResult<T> = Result<T, RegistryError>;

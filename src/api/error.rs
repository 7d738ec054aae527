// ==========================================
// 纺织品物流控制塔 - API层错误类型
// ==========================================
// 职责: 汇总下层错误,转换为面向用户的错误消息
// 说明: 终态再推进不是错误 (AdvanceOutcome::Unavailable)
// 说明: 船名未命中不是错误 (LookupSource::Fallback)
// ==========================================

use crate::export::ExportError;
use crate::importer::error::ImportError;
use crate::registry::error::RegistryError;
use crate::repository::error::RepositoryError;
use crate::tracking::TrackingError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 业务规则错误
    // ==========================================
    /// 箱号重复: 携带现有记录摘要,供用户处理冲突
    #[error("集装箱编号重复: {container_number} (当前状态={existing_status}, 供应商={existing_supplier})")]
    DuplicateContainer {
        container_number: String,
        existing_status: String,
        existing_supplier: String,
    },

    /// 单证上传失败 (目标不可达或无权限),未创建集装箱
    #[error("单证上传失败: {0}")]
    IngestionFailure(String),

    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    // ==========================================
    // 数据访问错误
    // ==========================================
    /// 存储无响应 (超时),调用方可重试
    #[error("存储暂不可用: {0}")]
    StoreUnavailable(String),

    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("报表导出失败: {0}")]
    ExportError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ApiError {
    /// 是否可由调用方重试
    pub fn is_retryable(&self) -> bool {
        matches!(self, ApiError::StoreUnavailable(_))
    }

    /// 面向用户的本地化提示
    pub fn user_message(&self) -> String {
        match self {
            ApiError::DuplicateContainer {
                container_number,
                existing_status,
                existing_supplier,
            } => crate::i18n::t_with_args(
                "alerts.duplicate_container",
                &[
                    ("container_number", container_number.as_str()),
                    ("status", existing_status.as_str()),
                    ("supplier", existing_supplier.as_str()),
                ],
            ),
            ApiError::IngestionFailure(_) => crate::i18n::t("alerts.ingestion_failed"),
            ApiError::StoreUnavailable(_) => crate::i18n::t("alerts.store_unavailable"),
            other => other.to_string(),
        }
    }
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::DuplicateContainerNumber {
                container_number,
                existing_status,
                existing_supplier,
            } => ApiError::DuplicateContainer {
                container_number,
                existing_status,
                existing_supplier,
            },
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::LockError(msg) => {
                ApiError::StoreUnavailable(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseConnectionError(msg) => ApiError::StoreUnavailable(msg),
            RepositoryError::DatabaseTransactionError(msg)
            | RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::DatabaseError(format!("唯一约束违反: {}", msg))
            }
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::DatabaseError(format!("外键约束违反: {}", msg))
            }
            RepositoryError::FieldValueError { field, message } => {
                ApiError::InvalidInput(format!("字段{}错误: {}", field, message))
            }
            RepositoryError::InternalError(msg) => ApiError::InternalError(msg),
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

// ==========================================
// 从 RegistryError 转换
// ==========================================
impl From<RegistryError> for ApiError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::Duplicate {
                container_number,
                existing_status,
                existing_supplier,
            } => ApiError::DuplicateContainer {
                container_number,
                existing_status,
                existing_supplier,
            },
            RegistryError::NotFound(id) => ApiError::NotFound(format!("Container(id={})不存在", id)),
            RegistryError::StatusConflict { .. } => ApiError::InvalidInput(err.to_string()),
            RegistryError::StoreTimeout { .. } => ApiError::StoreUnavailable(err.to_string()),
            RegistryError::Store(inner) => inner.into(),
            RegistryError::TaskJoin(msg) => ApiError::StoreUnavailable(msg),
        }
    }
}

impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        match err {
            ImportError::EmptyBatch => ApiError::InvalidInput(err.to_string()),
            other => ApiError::IngestionFailure(other.to_string()),
        }
    }
}

impl From<ExportError> for ApiError {
    fn from(err: ExportError) -> Self {
        ApiError::ExportError(err.to_string())
    }
}

impl From<TrackingError> for ApiError {
    fn from(err: TrackingError) -> Self {
        ApiError::InvalidInput(err.to_string())
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

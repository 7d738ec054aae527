// ==========================================
// 纺织品物流控制塔 - 单证导入错误类型
// ==========================================
// 工具: thiserror 派生宏
// ==========================================

use std::io;
use std::path::Path;
use thiserror::Error;

/// 单证导入错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 批次错误 =====
    #[error("上传批次为空")]
    EmptyBatch,

    // ===== 目标位置错误 =====
    #[error("上传目标不可达: {path} ({message})")]
    TargetUnavailable { path: String, message: String },

    #[error("无写入权限: {path}")]
    PermissionDenied { path: String },

    #[error("文件写入失败: {file} ({message})")]
    FileWriteError { file: String, message: String },

    // ===== 通用错误 =====
    #[error("内部错误: {0}")]
    InternalError(String),
}

impl ImportError {
    /// 目录级 IO 错误分类
    pub fn from_folder_io(path: &Path, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::PermissionDenied => ImportError::PermissionDenied {
                path: path.display().to_string(),
            },
            _ => ImportError::TargetUnavailable {
                path: path.display().to_string(),
                message: err.to_string(),
            },
        }
    }

    /// 文件级 IO 错误分类
    pub fn from_file_io(path: &Path, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::PermissionDenied => ImportError::PermissionDenied {
                path: path.display().to_string(),
            },
            _ => ImportError::FileWriteError {
                file: path.display().to_string(),
                message: err.to_string(),
            },
        }
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;

// ==========================================
// 纺织品物流控制塔 - 单证批量落盘
// ==========================================
// 流程: 选主单证 → 目录名 (日期_主单证名) → 写入全部文件 → 生成箱号候选
// 红线: 整批成功或整批回滚; 失败时本批新建的文件/目录全部移除
// ==========================================

use super::container_number::{sanitize_file_name, ContainerCandidate};
use super::error::{ImportError, ImportResult};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

// ==========================================
// 上传数据
// ==========================================

/// 单个上传文件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedDocument {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl UploadedDocument {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }
}

/// 导入回执
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestionReceipt {
    pub folder_name: String,
    pub folder_path: PathBuf,
    pub primary_name: String,
    pub files_written: Vec<PathBuf>,
    pub candidate: ContainerCandidate,
}

// ==========================================
// 主单证与目录命名
// ==========================================

/// 选择主单证: 文件名 (大写) 含 "BL" 或 "BILL" 的第一个文件,否则第一个文件
pub fn select_primary(documents: &[UploadedDocument]) -> Option<&UploadedDocument> {
    documents
        .iter()
        .find(|d| {
            let upper = d.name.to_uppercase();
            upper.contains("BL") || upper.contains("BILL")
        })
        .or_else(|| documents.first())
}

/// 目标目录名: `YYYY-MM-DD_<清洗后主单证名去扩展名>`
pub fn folder_name(date: NaiveDate, primary_name: &str) -> String {
    let safe = sanitize_file_name(primary_name);
    let stem = Path::new(&safe)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or(safe.clone());
    format!("{}_{}", date.format("%Y-%m-%d"), stem)
}

// ==========================================
// DocumentSink - 落盘目标
// ==========================================

/// 单证落盘目标 (本地目录或挂载的网络共享)
pub trait DocumentSink: Send + Sync {
    /// 准备批次目录,返回 (目录路径, 是否本次新建)
    fn prepare_folder(&self, folder_name: &str) -> ImportResult<(PathBuf, bool)>;

    /// 写入文件,返回 (文件路径, 是否本次新建)
    fn write_file(&self, folder: &Path, file_name: &str, bytes: &[u8]) -> ImportResult<(PathBuf, bool)>;

    fn remove_file(&self, path: &Path) -> ImportResult<()>;

    fn remove_folder(&self, path: &Path) -> ImportResult<()>;
}

/// 文件系统落盘
#[derive(Debug, Clone)]
pub struct FsDocumentSink {
    root: PathBuf,
}

impl FsDocumentSink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl DocumentSink for FsDocumentSink {
    fn prepare_folder(&self, folder_name: &str) -> ImportResult<(PathBuf, bool)> {
        let folder = self.root.join(folder_name);
        if folder.is_dir() {
            return Ok((folder, false));
        }
        fs::create_dir_all(&folder).map_err(|e| ImportError::from_folder_io(&folder, e))?;
        Ok((folder, true))
    }

    fn write_file(&self, folder: &Path, file_name: &str, bytes: &[u8]) -> ImportResult<(PathBuf, bool)> {
        let path = folder.join(file_name);
        let created = !path.exists();
        fs::write(&path, bytes).map_err(|e| ImportError::from_file_io(&path, e))?;
        Ok((path, created))
    }

    fn remove_file(&self, path: &Path) -> ImportResult<()> {
        fs::remove_file(path).map_err(|e| ImportError::from_file_io(path, e))
    }

    fn remove_folder(&self, path: &Path) -> ImportResult<()> {
        fs::remove_dir(path).map_err(|e| ImportError::from_folder_io(path, e))
    }
}

// ==========================================
// DocumentIngestor - 批量导入
// ==========================================
pub struct DocumentIngestor {
    sink: Arc<dyn DocumentSink>,
}

impl DocumentIngestor {
    pub fn new(sink: Arc<dyn DocumentSink>) -> Self {
        Self { sink }
    }

    /// 以文件系统目录为落盘目标
    pub fn with_upload_root(root: impl Into<PathBuf>) -> Self {
        Self::new(Arc::new(FsDocumentSink::new(root)))
    }

    /// 导入一批单证
    ///
    /// # 错误
    /// - `EmptyBatch`: 批次为空
    /// - `TargetUnavailable` / `PermissionDenied`: 目录不可达或无权限
    /// - `FileWriteError`: 写入失败 (本批已写入的新文件会被移除)
    pub fn ingest(&self, documents: &[UploadedDocument], today: NaiveDate) -> ImportResult<IngestionReceipt> {
        let primary = select_primary(documents).ok_or(ImportError::EmptyBatch)?;
        let folder_name = folder_name(today, &primary.name);

        let (folder, folder_created) = self.sink.prepare_folder(&folder_name)?;

        let mut files_written = Vec::with_capacity(documents.len());
        let mut created_files = Vec::new();
        for doc in documents {
            let safe_name = sanitize_file_name(&doc.name);
            match self.sink.write_file(&folder, &safe_name, &doc.bytes) {
                Ok((path, created)) => {
                    if created {
                        created_files.push(path.clone());
                    }
                    files_written.push(path);
                }
                Err(e) => {
                    warn!("单证写入失败,回滚本批: folder={}, file={}, error={}", folder_name, safe_name, e);
                    self.rollback(&folder, folder_created, &created_files);
                    return Err(e);
                }
            }
        }

        let candidate = ContainerCandidate::from_batch(
            &primary.name,
            documents.iter().map(|d| d.name.as_str()),
        );

        info!(
            "单证已保存: folder={}, files={}, candidate={}",
            folder_name,
            files_written.len(),
            candidate.container_number
        );

        Ok(IngestionReceipt {
            folder_name,
            folder_path: folder,
            primary_name: primary.name.clone(),
            files_written,
            candidate,
        })
    }

    fn rollback(&self, folder: &Path, folder_created: bool, created_files: &[PathBuf]) {
        for path in created_files {
            if let Err(e) = self.sink.remove_file(path) {
                warn!("回滚删除文件失败: {} ({})", path.display(), e);
            }
        }
        if folder_created {
            if let Err(e) = self.sink.remove_folder(folder) {
                warn!("回滚删除目录失败: {} ({})", folder.display(), e);
            }
        }
    }
}

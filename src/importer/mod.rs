// ==========================================
// 纺织品物流控制塔 - 单证导入层
// ==========================================
// 职责: 接收上传批次,落盘到上传目录,给出箱号候选
// 说明: 不做 OCR,单证内容由外部服务提取
// ==========================================

pub mod container_number;
pub mod document_ingest;
pub mod error;

pub use container_number::{
    extract_container_number, sanitize_file_name, ContainerCandidate, CONTAINER_NUMBER_PATTERN,
};
pub use document_ingest::{
    folder_name, select_primary, DocumentIngestor, DocumentSink, FsDocumentSink, IngestionReceipt,
    UploadedDocument,
};
pub use error::{ImportError, ImportResult};

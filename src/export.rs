// ==========================================
// 纺织品物流控制塔 - 报表导出
// ==========================================
// 格式: 分号分隔 + UTF-8 BOM (西语 Excel 直接打开)
// 列顺序固定: 箱号/尺寸/重量/供应商/纺织品类型/状态/SENCAMER/船名/离港日期/到港日期或ETA
// 缺失值统一输出 "N/A"
// ==========================================

use crate::domain::container::Container;
use crate::i18n::t;
use chrono::NaiveDate;
use std::io::Write;
use thiserror::Error;

/// UTF-8 BOM
pub const UTF8_BOM: &str = "\u{FEFF}";

/// 字段分隔符
pub const DELIMITER: u8 = b';';

/// 缺失值占位
pub const NOT_AVAILABLE: &str = "N/A";

/// 表头翻译键 (按列顺序)
pub const HEADER_KEYS: [&str; 10] = [
    "export.headers.container_id",
    "export.headers.size",
    "export.headers.weight",
    "export.headers.supplier",
    "export.headers.textile_type",
    "export.headers.status",
    "export.headers.sencamer",
    "export.headers.vessel",
    "export.headers.departure_date",
    "export.headers.arrival_or_eta",
];

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("导出写入失败: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV 生成失败: {0}")]
    Csv(#[from] csv::Error),

    #[error("导出内容编码失败: {0}")]
    Encoding(String),
}

pub type ExportResult<T> = Result<T, ExportError>;

/// 当前语言的表头
pub fn export_headers() -> Vec<String> {
    HEADER_KEYS.iter().map(|key| t(key)).collect()
}

/// 单行数据 (与表头同序)
pub fn container_row(container: &Container) -> [String; 10] {
    let arrival_or_eta = container
        .arrival_date
        .or_else(|| container.eta.map(|eta| eta.date_naive()));

    [
        container.container_number.clone(),
        or_na(container.container_size.map(|s| s.to_db_str().to_string())),
        or_na(container.weight.clone()),
        container.supplier.clone(),
        container.textile_type.clone(),
        container.status.to_db_str().to_string(),
        container.sencamer_status.to_db_str().to_string(),
        or_na(container.vessel.clone()),
        or_na(container.departure_date.map(format_date)),
        or_na(arrival_or_eta.map(format_date)),
    ]
}

/// 写出完整报表 (BOM + 表头 + 每个集装箱一行)
pub fn write_containers_csv<W: Write>(mut writer: W, containers: &[Container]) -> ExportResult<()> {
    writer.write_all(UTF8_BOM.as_bytes())?;

    let mut csv_writer = csv::WriterBuilder::new()
        .delimiter(DELIMITER)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(writer);

    csv_writer.write_record(export_headers())?;
    for container in containers {
        csv_writer.write_record(container_row(container))?;
    }
    csv_writer.flush()?;

    tracing::info!("报表已导出: rows={}", containers.len());
    Ok(())
}

/// 报表内容 (字符串)
pub fn containers_to_csv_string(containers: &[Container]) -> ExportResult<String> {
    let mut buffer = Vec::new();
    write_containers_csv(&mut buffer, containers)?;
    String::from_utf8(buffer).map_err(|e| ExportError::Encoding(e.to_string()))
}

/// 默认文件名: reporte_detallado_YYYY-MM-DD.csv
pub fn export_file_name(date: NaiveDate) -> String {
    format!("reporte_detallado_{}.csv", date.format(DATE_FORMAT))
}

fn or_na(value: Option<String>) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => v,
        _ => NOT_AVAILABLE.to_string(),
    }
}

fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

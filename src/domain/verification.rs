// ==========================================
// 纺织品物流控制塔 - 单证稽核领域模型
// ==========================================
// 用途: 提单(B/L) vs 发票/装箱单 字段比对
// 说明: VerificationReport 为派生对象,每次请求重新计算,不持久化
// ==========================================

use crate::domain::types::{DocumentKind, MatchStatus, OverallStatus, Severity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ==========================================
// TrackedField - 稽核字段
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrackedField {
    Consignee,    // 收货人
    GrossWeight,  // 毛重
    PackageCount, // 件数
    NetWeight,    // 净重
    HsCode,       // HS 编码
    InvoiceDate,  // 发票日期
}

impl TrackedField {
    pub const ALL: [TrackedField; 6] = [
        TrackedField::Consignee,
        TrackedField::GrossWeight,
        TrackedField::PackageCount,
        TrackedField::NetWeight,
        TrackedField::HsCode,
        TrackedField::InvoiceDate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TrackedField::Consignee => "CONSIGNEE",
            TrackedField::GrossWeight => "GROSS_WEIGHT",
            TrackedField::PackageCount => "PACKAGE_COUNT",
            TrackedField::NetWeight => "NET_WEIGHT",
            TrackedField::HsCode => "HS_CODE",
            TrackedField::InvoiceDate => "INVOICE_DATE",
        }
    }
}

impl fmt::Display for TrackedField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// DocumentFields - 单份单证的已提取字段
// ==========================================
// OCR/解析由外部完成,这里只承载结果
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentFields {
    pub fields: BTreeMap<TrackedField, String>,
}

impl DocumentFields {
    pub fn new() -> Self {
        Self::default()
    }

    /// 链式添加字段
    pub fn with(mut self, field: TrackedField, value: impl Into<String>) -> Self {
        self.fields.insert(field, value.into());
        self
    }

    pub fn get(&self, field: TrackedField) -> Option<&str> {
        self.fields.get(&field).map(|s| s.as_str())
    }
}

// ==========================================
// DocumentSet - 一个集装箱的单证集合
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSet {
    pub bill_of_lading: DocumentFields,
    pub invoice: Option<DocumentFields>,
    pub packing_list: Option<DocumentFields>,
}

impl DocumentSet {
    /// 取得指定对手单证的字段值
    pub fn counterpart_value(&self, kind: DocumentKind, field: TrackedField) -> Option<&str> {
        let doc = match kind {
            DocumentKind::Invoice => self.invoice.as_ref(),
            DocumentKind::PackingList => self.packing_list.as_ref(),
        };
        doc.and_then(|d| d.get(field))
    }
}

// ==========================================
// Discrepancy - 单字段比对结果
// ==========================================
// 不变量: bl_value 与对手值不同 → MISMATCH; 相同 → MATCH
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Discrepancy {
    pub id: String,
    pub field: TrackedField,
    pub bl_value: Option<String>,
    /// 比对来源 (每条记录只有一种)
    pub counterpart: DocumentKind,
    pub counterpart_value: Option<String>,
    pub status: MatchStatus,
    pub severity: Severity,
}

impl Discrepancy {
    /// 发票侧取值 (比对来源为发票时)
    pub fn invoice_value(&self) -> Option<&str> {
        match self.counterpart {
            DocumentKind::Invoice => self.counterpart_value.as_deref(),
            DocumentKind::PackingList => None,
        }
    }

    /// 装箱单侧取值 (比对来源为装箱单时)
    pub fn packing_list_value(&self) -> Option<&str> {
        match self.counterpart {
            DocumentKind::PackingList => self.counterpart_value.as_deref(),
            DocumentKind::Invoice => None,
        }
    }

    /// 是否为问题项 (MISMATCH 或 MISSING)
    pub fn is_finding(&self) -> bool {
        self.status != MatchStatus::Match
    }
}

// ==========================================
// VerificationReport - 稽核报告
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationReport {
    pub container_id: String,
    pub bl_number: String,
    pub overall_status: OverallStatus,
    pub score: u8, // 0-100 置信度
    pub discrepancies: Vec<Discrepancy>,
    pub scan_date: DateTime<Utc>,
}

impl VerificationReport {
    /// 问题项数量
    pub fn finding_count(&self) -> usize {
        self.discrepancies.iter().filter(|d| d.is_finding()).count()
    }
}

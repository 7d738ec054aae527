// ==========================================
// 纺织品物流控制塔 - 单证差异分类器
// ==========================================
// 输入: 已提取的 B/L 字段 + 发票/装箱单字段
// 输出: 每个稽核字段一条 Discrepancy
// 规则: 每个字段只与一种对手单证比对; 相等 → MATCH, 不等 → MISMATCH,
//       一方缺失 → MISSING, 双方均缺失 → 不输出
// 红线: 纯函数,无随机性
// ==========================================

use crate::domain::types::{DocumentKind, MatchStatus, Severity};
use crate::domain::verification::{Discrepancy, DocumentSet, TrackedField};
use serde::{Deserialize, Serialize};
use tracing::instrument;

// ==========================================
// FieldRule - 字段比对规则
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRule {
    pub field: TrackedField,
    pub counterpart: DocumentKind,
    pub severity: Severity,
}

/// 默认规则表 (金额/数量类字段默认 HIGH; HS 编码错误有海关罚款风险)
pub const DEFAULT_FIELD_RULES: [FieldRule; 6] = [
    FieldRule { field: TrackedField::Consignee, counterpart: DocumentKind::Invoice, severity: Severity::High },
    FieldRule { field: TrackedField::GrossWeight, counterpart: DocumentKind::Invoice, severity: Severity::High },
    FieldRule { field: TrackedField::PackageCount, counterpart: DocumentKind::PackingList, severity: Severity::High },
    FieldRule { field: TrackedField::NetWeight, counterpart: DocumentKind::PackingList, severity: Severity::High },
    FieldRule { field: TrackedField::HsCode, counterpart: DocumentKind::Invoice, severity: Severity::Critical },
    FieldRule { field: TrackedField::InvoiceDate, counterpart: DocumentKind::Invoice, severity: Severity::Low },
];

// ==========================================
// DiscrepancyClassifier - 差异分类器
// ==========================================
#[derive(Debug, Clone)]
pub struct DiscrepancyClassifier {
    rules: Vec<FieldRule>,
}

impl Default for DiscrepancyClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_FIELD_RULES.to_vec())
    }
}

impl DiscrepancyClassifier {
    pub fn new(rules: Vec<FieldRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[FieldRule] {
        &self.rules
    }

    /// 对单证集合逐字段比对
    ///
    /// 返回顺序与规则表顺序一致; id 从 "1" 开始连续编号
    #[instrument(skip(self, documents))]
    pub fn classify(&self, documents: &DocumentSet) -> Vec<Discrepancy> {
        let mut out = Vec::new();

        for rule in &self.rules {
            let bl_value = documents.bill_of_lading.get(rule.field);
            let counterpart_value = documents.counterpart_value(rule.counterpart, rule.field);

            let status = match (bl_value, counterpart_value) {
                (None, None) => continue,
                (Some(bl), Some(other)) => compare_values(bl, other),
                _ => MatchStatus::Missing,
            };

            out.push(Discrepancy {
                id: (out.len() + 1).to_string(),
                field: rule.field,
                bl_value: bl_value.map(str::to_string),
                counterpart: rule.counterpart,
                counterpart_value: counterpart_value.map(str::to_string),
                status,
                severity: rule.severity,
            });
        }

        out
    }
}

/// 比较两个字段值 (去首尾空白、合并内部空白、忽略大小写)
pub fn compare_values(bl_value: &str, other: &str) -> MatchStatus {
    if normalize(bl_value) == normalize(other) {
        MatchStatus::Match
    } else {
        MatchStatus::Mismatch
    }
}

fn normalize(value: &str) -> String {
    value
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::verification::DocumentFields;

    fn clean_documents() -> DocumentSet {
        DocumentSet {
            bill_of_lading: DocumentFields::new()
                .with(TrackedField::Consignee, "SilkRoad Fabrics")
                .with(TrackedField::GrossWeight, "24,500 Kg")
                .with(TrackedField::HsCode, "5208.39.00"),
            invoice: Some(
                DocumentFields::new()
                    .with(TrackedField::Consignee, "SILKROAD  FABRICS ")
                    .with(TrackedField::GrossWeight, "24,500 Kg")
                    .with(TrackedField::HsCode, "5208.39.00"),
            ),
            packing_list: None,
        }
    }

    #[test]
    fn test_all_fields_match() {
        let result = DiscrepancyClassifier::default().classify(&clean_documents());
        assert_eq!(result.len(), 3);
        assert!(result.iter().all(|d| d.status == MatchStatus::Match));
        assert_eq!(result[0].id, "1");
        assert_eq!(result[0].field, TrackedField::Consignee);
    }

    #[test]
    fn test_mismatch_against_single_counterpart() {
        let documents = DocumentSet {
            bill_of_lading: DocumentFields::new()
                .with(TrackedField::NetWeight, "42,800")
                .with(TrackedField::PackageCount, "2,300 ROLLS"),
            invoice: Some(DocumentFields::new().with(TrackedField::NetWeight, "42,800")),
            packing_list: Some(
                DocumentFields::new()
                    .with(TrackedField::NetWeight, "28,025")
                    .with(TrackedField::PackageCount, "2,300 ROLLS"),
            ),
        };

        let result = DiscrepancyClassifier::default().classify(&documents);
        let net = result.iter().find(|d| d.field == TrackedField::NetWeight).unwrap();

        // 净重只与装箱单比对,发票中的相同值不影响结论
        assert_eq!(net.status, MatchStatus::Mismatch);
        assert_eq!(net.counterpart, DocumentKind::PackingList);
        assert_eq!(net.packing_list_value(), Some("28,025"));
        assert_eq!(net.invoice_value(), None);
        assert_eq!(net.severity, Severity::High);

        let count = result.iter().find(|d| d.field == TrackedField::PackageCount).unwrap();
        assert_eq!(count.status, MatchStatus::Match);
    }

    #[test]
    fn test_missing_counterpart_value() {
        let documents = DocumentSet {
            bill_of_lading: DocumentFields::new().with(TrackedField::HsCode, "5208.39.00"),
            invoice: None,
            packing_list: None,
        };

        let result = DiscrepancyClassifier::default().classify(&documents);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].status, MatchStatus::Missing);
        assert_eq!(result[0].severity, Severity::Critical);
        assert!(result[0].is_finding());
    }

    #[test]
    fn test_classification_is_deterministic() {
        let classifier = DiscrepancyClassifier::default();
        let documents = clean_documents();
        assert_eq!(classifier.classify(&documents), classifier.classify(&documents));
    }

    #[test]
    fn test_compare_values() {
        assert_eq!(compare_values("A  B", " a b"), MatchStatus::Match);
        assert_eq!(
            compare_values("IMPORTADORA TEXTIL ORIENTE C.A.", "IMPORTADORA TEXTIL ORIENT C.A."),
            MatchStatus::Mismatch
        );
    }
}

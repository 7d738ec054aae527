// ==========================================
// 纺织品物流控制塔 - 稽核评分器
// ==========================================
// 结论: 问题项 ≥2 → REJECTED; =1 → WARNING; =0 → APPROVED
// 评分: 100 - Σ严重度扣分, 下限 0
//   校准点: 0 问题 → 100; 2 个 HIGH → 40; 4 个 HIGH → 0
// 红线: 单调,问题越多/越严重,分数越低
// ==========================================

use crate::domain::container::Container;
use crate::domain::types::{OverallStatus, Severity};
use crate::domain::verification::{Discrepancy, DocumentSet, VerificationReport};
use crate::engine::discrepancy::DiscrepancyClassifier;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// ScoringWeights - 严重度扣分表
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringWeights {
    pub low: u32,
    pub high: u32,
    pub critical: u32,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            low: 5,
            high: 30,
            critical: 45,
        }
    }
}

impl ScoringWeights {
    /// 单项扣分上限
    pub const MAX_PENALTY: u32 = 100;
    /// HIGH 扣分下限: 2 项 HIGH 即降到 40 分以下
    pub const MIN_HIGH_PENALTY: u32 = 30;

    /// 校验扣分表: 1 <= low <= high <= critical <= 100 且 high >= 30
    pub fn validate(&self) -> Result<(), String> {
        if self.low == 0 {
            return Err(format!("LOW 扣分必须 >= 1,实际 {}", self.low));
        }
        if self.high < Self::MIN_HIGH_PENALTY {
            return Err(format!(
                "HIGH 扣分必须 >= {},实际 {}",
                Self::MIN_HIGH_PENALTY,
                self.high
            ));
        }
        if self.critical > Self::MAX_PENALTY {
            return Err(format!(
                "CRITICAL 扣分必须 <= {},实际 {}",
                Self::MAX_PENALTY,
                self.critical
            ));
        }
        if !(self.low <= self.high && self.high <= self.critical) {
            return Err(format!(
                "扣分需随严重度递增: low={}, high={}, critical={}",
                self.low, self.high, self.critical
            ));
        }
        Ok(())
    }

    pub fn penalty(&self, severity: Severity) -> u32 {
        match severity {
            Severity::Low => self.low,
            Severity::High => self.high,
            Severity::Critical => self.critical,
        }
    }
}

// ==========================================
// AuditScorer - 稽核评分器
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct AuditScorer {
    weights: ScoringWeights,
}

impl AuditScorer {
    pub fn new(weights: ScoringWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> ScoringWeights {
        self.weights
    }

    /// 结论判定 (只看问题项数量)
    pub fn overall_status(&self, discrepancies: &[Discrepancy]) -> OverallStatus {
        match discrepancies.iter().filter(|d| d.is_finding()).count() {
            0 => OverallStatus::Approved,
            1 => OverallStatus::Warning,
            _ => OverallStatus::Rejected,
        }
    }

    /// 置信度评分 0-100
    pub fn score(&self, discrepancies: &[Discrepancy]) -> u8 {
        let total_penalty: u32 = discrepancies
            .iter()
            .filter(|d| d.is_finding())
            .map(|d| self.weights.penalty(d.severity))
            .sum();

        100u32.saturating_sub(total_penalty) as u8
    }

    /// 组装完整报告
    pub fn build_report(
        &self,
        container: &Container,
        discrepancies: Vec<Discrepancy>,
        scan_date: DateTime<Utc>,
    ) -> VerificationReport {
        let overall_status = self.overall_status(&discrepancies);
        let score = self.score(&discrepancies);

        tracing::debug!(
            container_number = %container.container_number,
            %overall_status,
            score,
            "稽核报告生成"
        );

        VerificationReport {
            container_id: container.id.clone(),
            bl_number: container.container_number.clone(),
            overall_status,
            score,
            discrepancies,
            scan_date,
        }
    }
}

/// 稽核结论标题 (本地化)
pub fn verdict_title(status: OverallStatus) -> String {
    let key = match status {
        OverallStatus::Approved => "verification.verdict.approved",
        OverallStatus::Warning => "verification.verdict.warning",
        OverallStatus::Rejected => "verification.verdict.rejected",
    };
    crate::i18n::t(key)
}

// ==========================================
// VerificationEngine - 分类 + 评分组合
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct VerificationEngine {
    classifier: DiscrepancyClassifier,
    scorer: AuditScorer,
}

impl VerificationEngine {
    pub fn new(classifier: DiscrepancyClassifier, scorer: AuditScorer) -> Self {
        Self { classifier, scorer }
    }

    /// 对一个集装箱的单证集合生成稽核报告 (每次重新计算)
    pub fn verify(
        &self,
        container: &Container,
        documents: &DocumentSet,
        scan_date: DateTime<Utc>,
    ) -> VerificationReport {
        let discrepancies = self.classifier.classify(documents);
        self.scorer.build_report(container, discrepancies, scan_date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::{DocumentKind, MatchStatus};
    use crate::domain::verification::TrackedField;

    fn finding(id: usize, status: MatchStatus, severity: Severity) -> Discrepancy {
        Discrepancy {
            id: id.to_string(),
            field: TrackedField::GrossWeight,
            bl_value: Some("43,950".to_string()),
            counterpart: DocumentKind::Invoice,
            counterpart_value: Some("44,200".to_string()),
            status,
            severity,
        }
    }

    #[test]
    fn test_zero_mismatches_approved_high_score() {
        let scorer = AuditScorer::default();
        let items = vec![
            finding(1, MatchStatus::Match, Severity::High),
            finding(2, MatchStatus::Match, Severity::Low),
        ];
        assert_eq!(scorer.overall_status(&items), OverallStatus::Approved);
        assert!(scorer.score(&items) >= 90);
    }

    #[test]
    fn test_weights_validation() {
        assert!(ScoringWeights::default().validate().is_ok());

        let zero_high = ScoringWeights { low: 5, high: 0, critical: 45 };
        assert!(zero_high.validate().is_err());
        let zero_low = ScoringWeights { low: 0, high: 30, critical: 45 };
        assert!(zero_low.validate().is_err());
        let inverted = ScoringWeights { low: 5, high: 50, critical: 40 };
        assert!(inverted.validate().is_err());
        let over_max = ScoringWeights { low: 5, high: 30, critical: 101 };
        assert!(over_max.validate().is_err());
    }

    #[test]
    fn test_four_high_mismatches_stay_low_under_any_valid_weights() {
        let items: Vec<_> = (0..4)
            .map(|i| finding(i, MatchStatus::Mismatch, Severity::High))
            .collect();
        let weakest = ScoringWeights {
            low: 1,
            high: ScoringWeights::MIN_HIGH_PENALTY,
            critical: ScoringWeights::MIN_HIGH_PENALTY,
        };
        assert!(weakest.validate().is_ok());

        let scorer = AuditScorer::new(weakest);
        assert_eq!(scorer.overall_status(&items), OverallStatus::Rejected);
        assert!(scorer.score(&items) <= 40);
    }

    #[test]
    fn test_single_mismatch_is_warning() {
        let scorer = AuditScorer::default();
        let items = vec![
            finding(1, MatchStatus::Match, Severity::High),
            finding(2, MatchStatus::Mismatch, Severity::Low),
        ];
        assert_eq!(scorer.overall_status(&items), OverallStatus::Warning);
        assert_eq!(scorer.score(&items), 95);
    }

    #[test]
    fn test_four_high_mismatches_rejected_low_score() {
        let scorer = AuditScorer::default();
        let items: Vec<_> = (1..=4)
            .map(|i| finding(i, MatchStatus::Mismatch, Severity::High))
            .collect();
        assert_eq!(scorer.overall_status(&items), OverallStatus::Rejected);
        assert!(scorer.score(&items) <= 40);
    }

    #[test]
    fn test_two_high_mismatches_score_at_most_forty() {
        let scorer = AuditScorer::default();
        let items = vec![
            finding(1, MatchStatus::Mismatch, Severity::High),
            finding(2, MatchStatus::Mismatch, Severity::High),
        ];
        assert_eq!(scorer.score(&items), 40);
    }

    #[test]
    fn test_score_is_monotonic_in_severity_and_count() {
        let scorer = AuditScorer::default();
        let low = vec![finding(1, MatchStatus::Mismatch, Severity::Low)];
        let high = vec![finding(1, MatchStatus::Mismatch, Severity::High)];
        let critical = vec![finding(1, MatchStatus::Missing, Severity::Critical)];
        assert!(scorer.score(&low) > scorer.score(&high));
        assert!(scorer.score(&high) > scorer.score(&critical));

        let mut more = high.clone();
        more.push(finding(2, MatchStatus::Mismatch, Severity::Low));
        assert!(scorer.score(&more) < scorer.score(&high));
    }

    #[test]
    fn test_score_never_underflows() {
        let scorer = AuditScorer::default();
        let items: Vec<_> = (1..=10)
            .map(|i| finding(i, MatchStatus::Mismatch, Severity::Critical))
            .collect();
        assert_eq!(scorer.score(&items), 0);
    }

    #[test]
    fn test_verdict_titles_are_distinct() {
        let titles: Vec<String> = [OverallStatus::Approved, OverallStatus::Warning, OverallStatus::Rejected]
            .into_iter()
            .map(verdict_title)
            .collect();
        assert!(titles.iter().all(|t| !t.is_empty() && !t.starts_with("verification.")));
        assert_ne!(titles[0], titles[2]);
    }
}

// ==========================================
// 纺织品物流控制塔 - 箱号提取
// ==========================================
// 格式: AAAA-NNNNNNN (4 位大写字母 - 7 位数字)
// 规则: 先扫主单证文件名,再扫其余文件名; 都未命中时用主单证清洗后的文件名
// ==========================================

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// 箱号格式
pub const CONTAINER_NUMBER_PATTERN: &str = r"[A-Z]{4}-\d{7}";

fn container_number_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(CONTAINER_NUMBER_PATTERN).ok())
        .as_ref()
}

/// 从文本中提取第一个符合格式的箱号
pub fn extract_container_number(text: &str) -> Option<String> {
    container_number_regex()?
        .find(text)
        .map(|m| m.as_str().to_string())
}

/// 文件名清洗: 字母/数字/点/连字符以外的字符替换为 '_'
///
/// 纯点号名称 ("." / "..") 同样替换,避免逃逸上传目录
pub fn sanitize_file_name(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if sanitized.is_empty() {
        return "_".to_string();
    }
    if sanitized.chars().all(|c| c == '.') {
        return "_".repeat(sanitized.len());
    }
    sanitized
}

// ==========================================
// ContainerCandidate - 箱号候选
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerCandidate {
    /// 候选箱号 (提取结果或清洗后的文件名)
    pub container_number: String,
    /// 产生候选的原始文件名 (参与重复检测)
    pub source_name: String,
    /// 是否按格式提取成功
    pub extracted: bool,
}

impl ContainerCandidate {
    /// 从单个文件名生成候选
    pub fn from_file_name(name: &str) -> Self {
        match extract_container_number(name) {
            Some(number) => Self {
                container_number: number,
                source_name: name.to_string(),
                extracted: true,
            },
            None => Self {
                container_number: sanitize_file_name(name),
                source_name: name.to_string(),
                extracted: false,
            },
        }
    }

    /// 从一批文件名生成候选 (主单证优先)
    pub fn from_batch<'a>(primary: &str, others: impl IntoIterator<Item = &'a str>) -> Self {
        let from_primary = Self::from_file_name(primary);
        if from_primary.extracted {
            return from_primary;
        }

        others
            .into_iter()
            .filter(|name| *name != primary)
            .find_map(|name| {
                extract_container_number(name).map(|number| Self {
                    container_number: number,
                    source_name: name.to_string(),
                    extracted: true,
                })
            })
            .unwrap_or(from_primary)
    }
}

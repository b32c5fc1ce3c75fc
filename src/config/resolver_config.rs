// ==========================================
// RoRo 承运商规则核心 - 解析器配置
// ==========================================
// 职责: 拖车判定类别、牵引类别、附加费事件代码、PDF 类别关键词表
// 说明: 启动时加载一次，注入各引擎（引擎内不再硬编码关键词）
// ==========================================

use crate::domain::types::{PdfCategory, VehicleCategory};
use serde::{Deserialize, Serialize};

// ==========================================
// CategoryKeyword - PDF 类别关键词
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryKeyword {
    pub category: PdfCategory,
    pub keywords: Vec<String>,
}

/// PDF 类别关键词表（按顺序匹配，先到先得）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryKeywordTable {
    pub entries: Vec<CategoryKeyword>,
}

impl Default for CategoryKeywordTable {
    fn default() -> Self {
        // SVAN/BVAN 必须排在 CAR 之前，否则 "CAR_SMALL_VAN" 之类的组码会被先归为 CAR
        let entry = |category: PdfCategory, words: &[&str]| CategoryKeyword {
            category,
            keywords: words.iter().map(|w| w.to_string()).collect(),
        };
        Self {
            entries: vec![
                entry(PdfCategory::Svan, &["SVAN", "SMALL_VAN", "SMALLVAN", "SMALL VAN"]),
                entry(PdfCategory::Bvan, &["BVAN", "BIG_VAN", "BIGVAN", "BIG VAN", "LARGE_VAN"]),
                entry(PdfCategory::Lm, &["LM", "HH", "HIGH_AND_HEAVY", "TRUCK", "TRAILER", "RORO"]),
                entry(PdfCategory::Car, &["CAR", "SUV", "PASSENGER"]),
            ],
        }
    }
}

impl CategoryKeywordTable {
    /// 组码匹配: 先精确匹配四个标准码，再按关键词整词匹配
    ///
    /// 组码与关键词都按 `_`、空格等分隔符切词，关键词的词序列须在组码中连续出现
    /// （"GENERAL_CARGO" 不会命中 "CAR"）
    pub fn match_group_code(&self, code: &str) -> Option<PdfCategory> {
        let normalized = code.trim().to_uppercase();
        if normalized.is_empty() {
            return None;
        }
        if let Some(exact) = PdfCategory::from_code(&normalized) {
            return Some(exact);
        }
        let code_tokens = tokenize(&normalized);
        self.entries
            .iter()
            .find(|entry| {
                entry
                    .keywords
                    .iter()
                    .any(|kw| contains_token_run(&code_tokens, &tokenize(&kw.to_uppercase())))
            })
            .map(|entry| entry.category)
    }
}

fn tokenize(value: &str) -> Vec<&str> {
    value
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .collect()
}

fn contains_token_run(haystack: &[&str], needle: &[&str]) -> bool {
    !needle.is_empty() && haystack.windows(needle.len()).any(|window| window == needle)
}

// ==========================================
// ResolverConfig - 解析器配置
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// 拖车附加费事件代码
    pub towing_event_code: String,
    /// 需要判断拖车的类别（无动力可牵引设备）
    pub towing_categories: Vec<VehicleCategory>,
    /// 能提供牵引的类别（同票出现即免拖车费）
    pub tractor_categories: Vec<VehicleCategory>,
    pub pdf_category_keywords: CategoryKeywordTable,
    pub default_currency: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            towing_event_code: "TOWING".to_string(),
            towing_categories: vec![VehicleCategory::Trailer],
            tractor_categories: vec![VehicleCategory::Truck, VehicleCategory::Truckhead],
            pdf_category_keywords: CategoryKeywordTable::default(),
            default_currency: "EUR".to_string(),
        }
    }
}

impl ResolverConfig {
    pub fn is_towing_category(&self, category: VehicleCategory) -> bool {
        self.towing_categories.contains(&category)
    }

    pub fn is_tractor_category(&self, category: VehicleCategory) -> bool {
        self.tractor_categories.contains(&category)
    }

    pub fn is_towing_event(&self, event_code: &str) -> bool {
        self.towing_event_code.eq_ignore_ascii_case(event_code.trim())
    }
}

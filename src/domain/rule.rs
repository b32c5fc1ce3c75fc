// ==========================================
// RoRo 承运商规则核心 - 承运商规则模型
// ==========================================
// 职责: 接收规则 / 转换规则 / 附加费规则 及其适用范围
// 适用范围: 承运商 + (港口 或 港口组) + (类别 或 类别组) + 可选船名/船型
// 生效: is_active 且 today 落在 [effective_from, effective_to]
// ==========================================

use crate::domain::commodity::CommodityItem;
use crate::domain::types::{QuantityMode, SurchargeCalcMode};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ==========================================
// RuleScope - 适用范围
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleScope {
    pub port_ids: Vec<i64>,
    pub port_group_ids: Vec<i64>,
    pub vehicle_categories: Vec<String>,
    pub category_group_ids: Vec<i64>,
    pub vessel_names: Vec<String>,
    pub vessel_classes: Vec<String>,
}

impl RuleScope {
    pub fn has_port_scope(&self) -> bool {
        !self.port_ids.is_empty() || !self.port_group_ids.is_empty()
    }

    pub fn has_category_scope(&self) -> bool {
        !self.vehicle_categories.is_empty() || !self.category_group_ids.is_empty()
    }

    pub fn has_vessel_filter(&self) -> bool {
        !self.vessel_names.is_empty() || !self.vessel_classes.is_empty()
    }
}

// ==========================================
// EffectiveWindow - 生效窗口
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EffectiveWindow {
    pub effective_from: Option<NaiveDate>,
    pub effective_to: Option<NaiveDate>,
    pub is_active: bool,
}

impl EffectiveWindow {
    pub fn always() -> Self {
        Self {
            effective_from: None,
            effective_to: None,
            is_active: true,
        }
    }

    /// 是否在 today 生效（两端闭区间）
    pub fn is_effective_on(&self, today: NaiveDate) -> bool {
        self.is_active
            && self.effective_from.map_or(true, |from| from <= today)
            && self.effective_to.map_or(true, |to| to >= today)
    }
}

// ==========================================
// RuleHeader - 规则公共字段
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleHeader {
    pub id: i64,
    pub carrier_id: i64,
    pub name: String,
    pub scope: RuleScope,
    pub window: EffectiveWindow,
    pub priority: i32,   // 越大越优先
    pub sort_order: i32, // 同优先级时越小越优先
}

/// 所有规则类型共享的访问接口（供 RuleMatcher 泛型匹配）
pub trait CarrierRule {
    fn header(&self) -> &RuleHeader;
}

// ==========================================
// AcceptanceRule - 接收规则（互斥：最高优先级胜出）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcceptanceRule {
    pub header: RuleHeader,
    pub is_accepted: bool, // false 表示该类别在此范围内不承运
    pub min_length_cm: Option<f64>,
    pub max_length_cm: Option<f64>,
    pub min_width_cm: Option<f64>,
    pub max_width_cm: Option<f64>,
    pub min_height_cm: Option<f64>,
    pub max_height_cm: Option<f64>,
    pub max_weight_kg: Option<f64>,
    pub must_be_empty: bool,
    pub must_be_self_propelled: bool,
}

impl CarrierRule for AcceptanceRule {
    fn header(&self) -> &RuleHeader {
        &self.header
    }
}

/// 接收判定结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcceptanceVerdict {
    pub rule_id: Option<i64>,
    pub accepted: bool,
    pub reasons: Vec<String>,
}

impl AcceptanceVerdict {
    /// 无匹配规则：默认接收
    pub fn no_rule() -> Self {
        Self {
            rule_id: None,
            accepted: true,
            reasons: vec!["NO_RULE: no acceptance rule matched".to_string()],
        }
    }
}

impl AcceptanceRule {
    /// 对货物行做接收判定，每条不满足项都会写入 reasons
    ///
    /// 尺寸缺失时不判定该项（由审计报告数据缺口）
    pub fn evaluate(&self, item: &CommodityItem) -> AcceptanceVerdict {
        let mut reasons = Vec::new();

        if !self.is_accepted {
            reasons.push(format!("NOT_ACCEPTED: category '{}' excluded", item.category));
        }

        check_min(&mut reasons, "LENGTH", item.length_cm, self.min_length_cm);
        check_max(&mut reasons, "LENGTH", item.length_cm, self.max_length_cm);
        check_min(&mut reasons, "WIDTH", item.width_cm, self.min_width_cm);
        check_max(&mut reasons, "WIDTH", item.width_cm, self.max_width_cm);
        check_min(&mut reasons, "HEIGHT", item.height_cm, self.min_height_cm);
        check_max(&mut reasons, "HEIGHT", item.height_cm, self.max_height_cm);
        check_max(&mut reasons, "WEIGHT", item.weight_kg, self.max_weight_kg);

        if self.must_be_empty && !item.is_empty {
            reasons.push("MUST_BE_EMPTY: item is loaded".to_string());
        }
        if self.must_be_self_propelled && !item.self_propelled() {
            reasons.push("MUST_BE_SELF_PROPELLED: item is not self-propelled".to_string());
        }

        if reasons.is_empty() {
            AcceptanceVerdict {
                rule_id: Some(self.header.id),
                accepted: true,
                reasons: vec![format!("ACCEPTED: rule {}", self.header.id)],
            }
        } else {
            AcceptanceVerdict {
                rule_id: Some(self.header.id),
                accepted: false,
                reasons,
            }
        }
    }
}

fn check_min(reasons: &mut Vec<String>, label: &str, value: Option<f64>, min: Option<f64>) {
    if let (Some(v), Some(limit)) = (value, min) {
        if v < limit {
            reasons.push(format!("{}_BELOW_MIN: {} < {}", label, v, limit));
        }
    }
}

fn check_max(reasons: &mut Vec<String>, label: &str, value: Option<f64>, max: Option<f64>) {
    if let (Some(v), Some(limit)) = (value, max) {
        if v > limit {
            reasons.push(format!("{}_ABOVE_MAX: {} > {}", label, v, limit));
        }
    }
}

// ==========================================
// TransformRule - 转换规则（同 transform_code 互斥）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformRule {
    pub header: RuleHeader,
    pub transform_code: String,
    pub params: serde_json::Value,
}

impl CarrierRule for TransformRule {
    fn header(&self) -> &RuleHeader {
        &self.header
    }
}

// ==========================================
// SurchargeRule - 附加费规则（叠加：全部生效）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurchargeRule {
    pub header: RuleHeader,
    pub event_code: String,
    pub calc_mode: SurchargeCalcMode,
    pub amount: f64,
    pub article_id: Option<i64>,
    pub quantity_mode: QuantityMode,

    // ===== 触发阈值（全部已配置项都需超过） =====
    pub min_length_cm: Option<f64>,
    pub min_width_cm: Option<f64>,
    pub min_height_cm: Option<f64>,
    pub min_weight_kg: Option<f64>,
}

impl CarrierRule for SurchargeRule {
    fn header(&self) -> &RuleHeader {
        &self.header
    }
}

impl SurchargeRule {
    /// 阈值是否触发
    ///
    /// 未配置任何阈值 → 总是触发；配置了阈值但货物缺该尺寸 → 不触发
    pub fn thresholds_met(&self, item: &CommodityItem) -> bool {
        exceeds(item.length_cm, self.min_length_cm)
            && exceeds(item.width_cm, self.min_width_cm)
            && exceeds(item.height_cm, self.min_height_cm)
            && exceeds(item.weight_kg, self.min_weight_kg)
    }
}

fn exceeds(value: Option<f64>, threshold: Option<f64>) -> bool {
    match threshold {
        None => true,
        Some(limit) => value.map_or(false, |v| v > limit),
    }
}

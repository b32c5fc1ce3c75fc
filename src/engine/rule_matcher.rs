// ==========================================
// RoRo 承运商规则核心 - 规则匹配引擎
// ==========================================
// 职责: 按承运商/港口/类别/船舶/日期筛选并排序承运商规则
// 红线: Engine 不拼 SQL，规则与分组由调用方预先加载
// 排序: priority 降序 → sort_order 升序 → id 升序
// ==========================================

use crate::domain::carrier::{CarrierCategoryGroup, CarrierPortGroup};
use crate::domain::rule::{AcceptanceRule, CarrierRule, RuleScope, SurchargeRule, TransformRule};
use crate::domain::tariff::CarrierArticleMapping;
use crate::domain::types::VehicleCategory;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// 船舶信息（船名/船型）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VesselRef {
    pub name: Option<String>,
    pub class: Option<String>,
}

impl VesselRef {
    pub fn new(name: Option<String>, class: Option<String>) -> Option<Self> {
        if name.is_none() && class.is_none() {
            None
        } else {
            Some(Self { name, class })
        }
    }
}

/// 规则匹配条件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleQuery {
    pub carrier_id: i64,
    pub port_id: i64,
    pub category: VehicleCategory,
    pub vessel: Option<VesselRef>,
    pub today: NaiveDate,
}

// ==========================================
// RuleMatcher - 规则匹配器
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct RuleMatcher {
    port_groups: Vec<CarrierPortGroup>,
    category_groups: Vec<CarrierCategoryGroup>,
}

impl RuleMatcher {
    /// # 参数
    /// - port_groups / category_groups: 当前承运商的分组定义
    pub fn new(port_groups: Vec<CarrierPortGroup>, category_groups: Vec<CarrierCategoryGroup>) -> Self {
        Self {
            port_groups,
            category_groups,
        }
    }

    pub fn port_groups(&self) -> &[CarrierPortGroup] {
        &self.port_groups
    }

    pub fn category_groups(&self) -> &[CarrierCategoryGroup] {
        &self.category_groups
    }

    // ==========================================
    // 范围判定
    // ==========================================

    /// 港口命中: 直接列出或所属港口组被列出（不处理空范围）
    pub fn port_in_scope(&self, scope: &RuleScope, port_id: i64) -> bool {
        scope.port_ids.contains(&port_id)
            || self
                .port_groups
                .iter()
                .any(|g| scope.port_group_ids.contains(&g.id) && g.contains_port(port_id))
    }

    /// 类别命中: 直接列出（同义词归一）或所属类别组被列出（不处理空范围）
    pub fn category_in_scope(&self, scope: &RuleScope, category: VehicleCategory) -> bool {
        scope
            .vehicle_categories
            .iter()
            .any(|raw| VehicleCategory::parse(raw) == Some(category))
            || self
                .category_groups
                .iter()
                .any(|g| scope.category_group_ids.contains(&g.id) && g.contains_category(category))
    }

    /// 船舶过滤: 无过滤条件时放行；有过滤条件但未指定船舶时不命中
    pub fn vessel_in_scope(&self, scope: &RuleScope, vessel: Option<&VesselRef>) -> bool {
        if !scope.has_vessel_filter() {
            return true;
        }
        let vessel = match vessel {
            Some(v) => v,
            None => return false,
        };

        let name_hit = vessel.name.as_deref().map_or(false, |name| {
            scope.vessel_names.iter().any(|n| n.trim().eq_ignore_ascii_case(name.trim()))
        });
        let class_hit = vessel.class.as_deref().map_or(false, |class| {
            scope.vessel_classes.iter().any(|c| c.trim().eq_ignore_ascii_case(class.trim()))
        });

        name_hit || class_hit
    }

    /// 规则是否适用（空港口/空类别范围视为通配）
    pub fn rule_applies<R: CarrierRule>(&self, rule: &R, query: &RuleQuery) -> bool {
        let header = rule.header();
        header.carrier_id == query.carrier_id
            && header.window.is_effective_on(query.today)
            && (!header.scope.has_port_scope() || self.port_in_scope(&header.scope, query.port_id))
            && (!header.scope.has_category_scope() || self.category_in_scope(&header.scope, query.category))
            && self.vessel_in_scope(&header.scope, query.vessel.as_ref())
    }

    /// 物料映射是否命中（港口、类别范围必须显式命中）
    pub fn mapping_matches(
        &self,
        mapping: &CarrierArticleMapping,
        port_id: i64,
        category: VehicleCategory,
        vessel: Option<&VesselRef>,
    ) -> bool {
        mapping.is_usable()
            && self.port_in_scope(&mapping.scope, port_id)
            && self.category_in_scope(&mapping.scope, category)
            && self.vessel_in_scope(&mapping.scope, vessel)
    }

    // ==========================================
    // 规则筛选
    // ==========================================

    /// 适用规则（按优先级排序）
    pub fn ranked<'a, R: CarrierRule>(&self, rules: &'a [R], query: &RuleQuery) -> Vec<&'a R> {
        let mut matched: Vec<&R> = rules.iter().filter(|r| self.rule_applies(*r, query)).collect();
        matched.sort_by(|a, b| {
            let (ha, hb) = (a.header(), b.header());
            hb.priority
                .cmp(&ha.priority)
                .then(ha.sort_order.cmp(&hb.sort_order))
                .then(ha.id.cmp(&hb.id))
        });
        matched
    }

    /// 承运规则: 取最高优先级一条
    pub fn match_acceptance<'a>(&self, rules: &'a [AcceptanceRule], query: &RuleQuery) -> Option<&'a AcceptanceRule> {
        self.ranked(rules, query).into_iter().next()
    }

    /// 转换规则: 每个 transform_code 取最高优先级一条
    pub fn match_transforms<'a>(&self, rules: &'a [TransformRule], query: &RuleQuery) -> Vec<&'a TransformRule> {
        let mut seen: HashSet<String> = HashSet::new();
        self.ranked(rules, query)
            .into_iter()
            .filter(|r| seen.insert(r.transform_code.trim().to_uppercase()))
            .collect()
    }

    /// 附加费规则: 全部适用
    pub fn match_surcharges<'a>(&self, rules: &'a [SurchargeRule], query: &RuleQuery) -> Vec<&'a SurchargeRule> {
        self.ranked(rules, query)
    }
}

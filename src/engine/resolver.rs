// ==========================================
// RoRo 承运商规则核心 - 承运商规则解析器
// ==========================================
// 职责: 按所选船期为报价单的每个货物行解析
//       承运规则 → 转换规则 → 采购运价 → 附加费事件（含拖车费判定）
// 红线: 数据缺口降级处理（无规则/无运价/无类别不报错），只有基础设施错误向上抛出
// 持久化: resolve_quotation 在一个事务内写回整张报价单的 carrier_rule_meta；explain_quotation 只读
// ==========================================

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::ResolverConfig;
use crate::domain::carrier::Article;
use crate::domain::commodity::{CarrierRuleMeta, CommodityItem, SurchargeEvent};
use crate::domain::quotation::SelectedSchedule;
use crate::domain::rule::{AcceptanceRule, AcceptanceVerdict, SurchargeRule, TransformRule};
use crate::domain::types::{QuantityMode, SurchargeCalcMode, VehicleCategory};
use crate::engine::commodity_graph::CommodityGraph;
use crate::engine::repositories::CarrierRuleRepositories;
use crate::engine::rule_matcher::{RuleMatcher, RuleQuery, VesselRef};
use crate::engine::tariff_lookup::{TariffLookup, TariffResolution};
use crate::engine::towing::{TowingDecision, TowingPolicy};
use crate::repository::{RepositoryError, RepositoryResult};

/// 已知转换代码
pub mod transform_codes {
    /// 参数 {"to": "<类别>"}: 按新类别查找运价和附加费
    pub const RECATEGORIZE: &str = "RECATEGORIZE";
    /// 堆叠内非根货物不单独计费
    pub const BILL_STACK_AS_BASE: &str = "BILL_STACK_AS_BASE";
}

/// 某承运商的全部规则（一次加载，整张报价单复用）
#[derive(Debug, Clone)]
pub struct CarrierRuleSet {
    pub carrier_id: i64,
    pub matcher: RuleMatcher,
    pub acceptance_rules: Vec<AcceptanceRule>,
    pub transform_rules: Vec<TransformRule>,
    pub surcharge_rules: Vec<SurchargeRule>,
}

/// 规则匹配结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchedRules {
    pub acceptance: Option<AcceptanceRule>,
    pub transforms: Vec<TransformRule>,
    pub surcharges: Vec<SurchargeRule>,
}

/// 运价摘要
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TariffSummary {
    pub tariff_id: i64,
    pub mapping_id: i64,
    pub article_id: i64,
    pub currency: String,
    pub ambiguous: bool,
    pub base_freight_amount: f64,
    pub total_amount: f64,
}

/// 单个货物行的解析结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemResolution {
    pub item_id: i64,
    pub line_number: i32,
    pub raw_category: String,
    pub category: Option<VehicleCategory>,
    pub effective_category: Option<VehicleCategory>,
    pub acceptance: Option<AcceptanceVerdict>,
    pub applied_transforms: Vec<String>,
    pub billed_separately: bool,
    pub tariff: Option<TariffSummary>,
    pub article: Option<Article>,
    pub surcharge_events: Vec<SurchargeEvent>,
    pub towing: Option<TowingDecision>,
    pub notes: Vec<String>,
}

impl ItemResolution {
    fn unresolved(item: &CommodityItem) -> Self {
        Self {
            item_id: item.id,
            line_number: item.line_number,
            raw_category: item.category.clone(),
            category: item.vehicle_category(),
            effective_category: None,
            acceptance: None,
            applied_transforms: Vec::new(),
            billed_separately: true,
            tariff: None,
            article: None,
            surcharge_events: Vec::new(),
            towing: None,
            notes: Vec::new(),
        }
    }

    pub fn is_accepted(&self) -> bool {
        self.acceptance.as_ref().map_or(false, |v| v.accepted)
    }

    pub fn surcharge_total(&self) -> f64 {
        self.surcharge_events.iter().map(|e| e.amount).sum()
    }

    /// 转为持久化元数据
    pub fn to_meta(&self, schedule: &SelectedSchedule, resolved_at: DateTime<Utc>) -> CarrierRuleMeta {
        CarrierRuleMeta {
            resolved_at,
            carrier_id: schedule.carrier_id,
            port_id: schedule.port_id,
            effective_category: self.effective_category.map(|c| c.as_str().to_string()),
            acceptance: self.acceptance.clone(),
            applied_transforms: self.applied_transforms.clone(),
            tariff_id: self.tariff.as_ref().map(|t| t.tariff_id),
            article_id: self.article.as_ref().map(|a| a.id),
            surcharge_events: self.surcharge_events.clone(),
        }
    }
}

/// 报价单解析结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuotationResolution {
    pub quotation_id: i64,
    pub schedule: Option<SelectedSchedule>,
    pub resolved_at: DateTime<Utc>,
    pub items: Vec<ItemResolution>,
    pub skipped_reason: Option<String>,
    pub persisted: bool,
}

impl QuotationResolution {
    pub fn item(&self, item_id: i64) -> Option<&ItemResolution> {
        self.items.iter().find(|i| i.item_id == item_id)
    }
}

/// 转换规则应用结果
struct TransformOutcome {
    effective_category: VehicleCategory,
    billed_separately: bool,
    applied: Vec<String>,
    notes: Vec<String>,
}

// ==========================================
// CarrierRuleResolver - 承运商规则解析器
// ==========================================
pub struct CarrierRuleResolver {
    repos: CarrierRuleRepositories,
    config: ResolverConfig,
    towing: TowingPolicy,
    tariff_lookup: TariffLookup,
}

impl CarrierRuleResolver {
    pub fn new(repos: CarrierRuleRepositories, config: ResolverConfig) -> Self {
        let towing = TowingPolicy::from_config(&config);
        let tariff_lookup = TariffLookup::new(
            repos.carrier_repo.clone(),
            repos.tariff_repo.clone(),
            config.pdf_category_keywords.clone(),
        );
        Self {
            repos,
            config,
            towing,
            tariff_lookup,
        }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn tariff_lookup(&self) -> &TariffLookup {
        &self.tariff_lookup
    }

    pub fn towing_policy(&self) -> &TowingPolicy {
        &self.towing
    }

    // ==========================================
    // 拖车费判定
    // ==========================================

    /// 货物行所在报价单的关系图（货物行不存在时为空图）
    fn load_graph_for_item(&self, item_id: i64) -> RepositoryResult<CommodityGraph> {
        match self.repos.commodity_repo.find_by_id(item_id)? {
            Some(item) => Ok(CommodityGraph::new(
                self.repos.commodity_repo.find_by_quotation(item.quotation_id)?,
            )),
            None => Ok(CommodityGraph::new(Vec::new())),
        }
    }

    /// 是否收取拖车费
    pub fn should_apply_towing(&self, category: VehicleCategory, item_id: i64) -> RepositoryResult<bool> {
        Ok(self.explain_towing(category, item_id)?.apply)
    }

    /// 拖车费判定（含证据）
    pub fn explain_towing(&self, category: VehicleCategory, item_id: i64) -> RepositoryResult<TowingDecision> {
        if !self.config.is_towing_category(category) {
            return Ok(self.towing.explain(&CommodityGraph::new(Vec::new()), category, item_id));
        }
        let graph = self.load_graph_for_item(item_id)?;
        Ok(self.towing.explain(&graph, category, item_id))
    }

    // ==========================================
    // 规则匹配
    // ==========================================

    /// 加载承运商的分组与全部规则
    pub fn load_rule_set(&self, carrier_id: i64) -> RepositoryResult<CarrierRuleSet> {
        Ok(CarrierRuleSet {
            carrier_id,
            matcher: RuleMatcher::new(
                self.repos.carrier_repo.find_port_groups_by_carrier(carrier_id)?,
                self.repos.carrier_repo.find_category_groups_by_carrier(carrier_id)?,
            ),
            acceptance_rules: self.repos.rule_repo.find_acceptance_rules(carrier_id)?,
            transform_rules: self.repos.rule_repo.find_transform_rules(carrier_id)?,
            surcharge_rules: self.repos.rule_repo.find_surcharge_rules(carrier_id)?,
        })
    }

    /// 按条件匹配三类规则
    pub fn match_rules(&self, query: &RuleQuery) -> RepositoryResult<MatchedRules> {
        let rule_set = self.load_rule_set(query.carrier_id)?;
        Ok(match_rule_set(&rule_set, query))
    }

    // ==========================================
    // 报价单解析
    // ==========================================

    /// 解析报价单并写回货物行的 carrier_rule_meta
    pub fn resolve_quotation(&self, quotation_id: i64, today: NaiveDate) -> RepositoryResult<QuotationResolution> {
        self.run(quotation_id, today, true)
    }

    /// 解析报价单（只读，不写回）
    pub fn explain_quotation(&self, quotation_id: i64, today: NaiveDate) -> RepositoryResult<QuotationResolution> {
        self.run(quotation_id, today, false)
    }

    /// 解析单个货物行（只读）
    pub fn resolve_item(&self, item_id: i64, today: NaiveDate) -> RepositoryResult<ItemResolution> {
        let item = self
            .repos
            .commodity_repo
            .find_by_id(item_id)?
            .ok_or_else(|| RepositoryError::NotFound {
                entity: "commodity_item".to_string(),
                id: item_id.to_string(),
            })?;

        let resolution = self.explain_quotation(item.quotation_id, today)?;
        match resolution.items.into_iter().find(|i| i.item_id == item_id) {
            Some(found) => Ok(found),
            // 报价单未选船期
            None => Ok(ItemResolution::unresolved(&item)),
        }
    }

    fn run(&self, quotation_id: i64, today: NaiveDate, persist: bool) -> RepositoryResult<QuotationResolution> {
        let quotation = self
            .repos
            .quotation_repo
            .find_by_id(quotation_id)?
            .ok_or_else(|| RepositoryError::NotFound {
                entity: "quotation".to_string(),
                id: quotation_id.to_string(),
            })?;
        let items = self.repos.commodity_repo.find_by_quotation(quotation_id)?;
        let resolved_at = Utc::now();

        let schedule = match quotation.selected_schedule() {
            Some(s) => s,
            None => {
                tracing::info!(quotation_id, "报价单未选定承运商或目的港，跳过规则解析");
                if persist {
                    let stale: Vec<(i64, Option<&CarrierRuleMeta>)> = items
                        .iter()
                        .filter(|i| i.carrier_rule_meta.is_some())
                        .map(|i| (i.id, None))
                        .collect();
                    self.repos.commodity_repo.update_carrier_rule_meta_batch(&stale)?;
                }
                return Ok(QuotationResolution {
                    quotation_id,
                    schedule: None,
                    resolved_at,
                    items: Vec::new(),
                    skipped_reason: Some("NO_SELECTED_SCHEDULE".to_string()),
                    persisted: persist,
                });
            }
        };

        let rule_set = self.load_rule_set(schedule.carrier_id)?;
        let graph = CommodityGraph::new(items);

        // 按票计费的附加费规则：行号顺序下第一条命中的货物行计费
        let mut shipment_charged: HashSet<i64> = HashSet::new();
        let mut resolutions = Vec::with_capacity(graph.len());
        for item in graph.items() {
            resolutions.push(self.resolve_in_context(
                &rule_set,
                &graph,
                &schedule,
                item,
                today,
                &mut shipment_charged,
            )?);
        }

        if persist {
            let metas: Vec<(i64, CarrierRuleMeta)> = resolutions
                .iter()
                .map(|r| (r.item_id, r.to_meta(&schedule, resolved_at)))
                .collect();
            let updates: Vec<(i64, Option<&CarrierRuleMeta>)> =
                metas.iter().map(|(id, meta)| (*id, Some(meta))).collect();
            self.repos.commodity_repo.update_carrier_rule_meta_batch(&updates)?;
        }

        tracing::info!(
            quotation_id,
            carrier_id = schedule.carrier_id,
            port_id = schedule.port_id,
            item_count = resolutions.len(),
            persisted = persist,
            "报价单承运商规则解析完成"
        );

        Ok(QuotationResolution {
            quotation_id,
            schedule: Some(schedule),
            resolved_at,
            items: resolutions,
            skipped_reason: None,
            persisted: persist,
        })
    }

    /// 在已加载的规则与关系图上解析单个货物行
    fn resolve_in_context(
        &self,
        rule_set: &CarrierRuleSet,
        graph: &CommodityGraph,
        schedule: &SelectedSchedule,
        item: &CommodityItem,
        today: NaiveDate,
        shipment_charged: &mut HashSet<i64>,
    ) -> RepositoryResult<ItemResolution> {
        let mut resolution = ItemResolution::unresolved(item);

        let category = match item.vehicle_category() {
            Some(c) => c,
            None => {
                tracing::warn!(item_id = item.id, category = %item.category, "无法识别的车辆类别，跳过规则解析");
                resolution.notes.push(format!("UNMAPPED_CATEGORY: '{}'", item.category));
                return Ok(resolution);
            }
        };

        // 拖车判定按货物的实际类别
        if self.config.is_towing_category(category) {
            resolution.towing = Some(self.towing.explain(graph, category, item.id));
        }

        let vessel = VesselRef::new(schedule.vessel_name.clone(), schedule.vessel_class.clone());
        let query = RuleQuery {
            carrier_id: schedule.carrier_id,
            port_id: schedule.port_id,
            category,
            vessel: vessel.clone(),
            today,
        };

        // 1. 承运规则
        let verdict = match rule_set.matcher.match_acceptance(&rule_set.acceptance_rules, &query) {
            Some(rule) => rule.evaluate(item),
            None => AcceptanceVerdict::no_rule(),
        };
        let accepted = verdict.accepted;
        resolution.acceptance = Some(verdict);

        // 2. 转换规则
        let transforms = rule_set.matcher.match_transforms(&rule_set.transform_rules, &query);
        let outcome = apply_transforms(&transforms, item, category, graph);
        resolution.effective_category = Some(outcome.effective_category);
        resolution.billed_separately = outcome.billed_separately;
        resolution.applied_transforms = outcome.applied;
        resolution.notes.extend(outcome.notes);

        if !accepted {
            resolution.notes.push("REJECTED: no tariff or surcharges resolved".to_string());
            return Ok(resolution);
        }

        let effective_query = RuleQuery {
            category: outcome.effective_category,
            ..query
        };

        // 3. 采购运价
        let tariff_resolution = if outcome.billed_separately {
            self.tariff_lookup.resolve_with_matcher(
                &rule_set.matcher,
                schedule.carrier_id,
                schedule.port_id,
                outcome.effective_category,
                vessel.as_ref(),
                today,
            )?
        } else {
            resolution.notes.push("BILLED_WITH_STACK_BASE".to_string());
            None
        };

        let quantity = item.quantity.max(0) as f64;
        let lane_metres = item.lane_metres();
        let base_freight = tariff_resolution
            .as_ref()
            .map_or(0.0, |r| r.tariff.base_freight_amount(quantity, lane_metres));

        let currency = match &tariff_resolution {
            Some(found) if !found.tariff.currency.trim().is_empty() => found.tariff.currency.clone(),
            _ => self.config.default_currency.clone(),
        };

        if let Some(found) = &tariff_resolution {
            resolution.tariff = Some(summarize_tariff(found, quantity, lane_metres, &currency));
            resolution.article = found.article.clone();
            if found.ambiguous {
                resolution.notes.push(format!("TARIFF_AMBIGUOUS: {} candidates", found.candidate_count));
            }
        } else if outcome.billed_separately {
            resolution.notes.push("NO_ACTIVE_TARIFF".to_string());
        }

        // 4. 附加费
        for rule in rule_set.matcher.match_surcharges(&rule_set.surcharge_rules, &effective_query) {
            if !rule.thresholds_met(item) {
                continue;
            }

            if self.config.is_towing_event(&rule.event_code) {
                let decision = resolution
                    .towing
                    .clone()
                    .unwrap_or_else(|| self.towing.explain(graph, category, item.id));
                let apply = decision.apply;
                if resolution.towing.is_none() {
                    resolution.towing = Some(decision);
                }
                if !apply {
                    tracing::debug!(item_id = item.id, rule_id = rule.header.id, "拖车判定为不收取，跳过拖车附加费");
                    continue;
                }
            }

            let already_charged = shipment_charged.contains(&rule.header.id);
            let event_quantity = surcharge_quantity(rule.quantity_mode, item, graph, already_charged);
            if event_quantity <= 0.0 {
                continue;
            }
            if rule.quantity_mode == QuantityMode::PerShipment {
                shipment_charged.insert(rule.header.id);
            }

            let (unit_amount, amount) = surcharge_amount(rule, event_quantity, item, base_freight);
            if rule.calc_mode == SurchargeCalcMode::PercentOfBase && tariff_resolution.is_none() {
                resolution
                    .notes
                    .push(format!("PERCENT_WITHOUT_BASE: {}", rule.event_code));
            }

            resolution.surcharge_events.push(SurchargeEvent {
                event_id: Uuid::new_v4().to_string(),
                event_code: rule.event_code.clone(),
                rule_id: rule.header.id,
                article_id: rule.article_id,
                calc_mode: rule.calc_mode,
                quantity: event_quantity,
                unit_amount,
                amount,
                currency: currency.clone(),
            });
        }

        Ok(resolution)
    }
}

/// 在已加载的规则集上匹配（纯函数）
pub fn match_rule_set(rule_set: &CarrierRuleSet, query: &RuleQuery) -> MatchedRules {
    MatchedRules {
        acceptance: rule_set
            .matcher
            .match_acceptance(&rule_set.acceptance_rules, query)
            .cloned(),
        transforms: rule_set
            .matcher
            .match_transforms(&rule_set.transform_rules, query)
            .into_iter()
            .cloned()
            .collect(),
        surcharges: rule_set
            .matcher
            .match_surcharges(&rule_set.surcharge_rules, query)
            .into_iter()
            .cloned()
            .collect(),
    }
}

fn summarize_tariff(found: &TariffResolution, quantity: f64, lane_metres: f64, currency: &str) -> TariffSummary {
    TariffSummary {
        tariff_id: found.tariff.id,
        mapping_id: found.mapping.id,
        article_id: found.mapping.article_id,
        currency: currency.to_string(),
        ambiguous: found.ambiguous,
        base_freight_amount: round_money(found.tariff.base_freight_amount(quantity, lane_metres)),
        total_amount: round_money(found.tariff.total_amount(quantity, lane_metres)),
    }
}

/// 应用转换规则（已按优先级排序、按代码去重）
fn apply_transforms(
    transforms: &[&TransformRule],
    item: &CommodityItem,
    category: VehicleCategory,
    graph: &CommodityGraph,
) -> TransformOutcome {
    let mut outcome = TransformOutcome {
        effective_category: category,
        billed_separately: true,
        applied: Vec::new(),
        notes: Vec::new(),
    };

    for rule in transforms {
        let code = rule.transform_code.trim().to_uppercase();
        match code.as_str() {
            transform_codes::RECATEGORIZE => {
                let target = rule
                    .params
                    .get("to")
                    .and_then(|v| v.as_str())
                    .and_then(VehicleCategory::parse);
                match target {
                    Some(to) => {
                        outcome.effective_category = to;
                        outcome.applied.push(code);
                    }
                    None => {
                        tracing::warn!(rule_id = rule.header.id, params = %rule.params, "RECATEGORIZE 缺少有效的目标类别");
                        outcome.notes.push(format!("INVALID_TRANSFORM_PARAMS: rule {}", rule.header.id));
                    }
                }
            }
            transform_codes::BILL_STACK_AS_BASE => {
                if graph.is_in_stack(item.id) && !graph.is_stack_base(item.id) {
                    outcome.billed_separately = false;
                }
                outcome.applied.push(code);
            }
            _ => {
                outcome.notes.push(format!("UNAPPLIED_TRANSFORM: {}", code));
            }
        }
    }

    outcome
}

/// 附加费计费数量
///
/// already_charged: 按票计费的规则在本报价单内是否已对更早的行计费
fn surcharge_quantity(mode: QuantityMode, item: &CommodityItem, graph: &CommodityGraph, already_charged: bool) -> f64 {
    match mode {
        QuantityMode::PerItem => item.quantity.max(0) as f64,
        QuantityMode::PerStack => {
            if graph.is_in_stack(item.id) && !graph.is_stack_base(item.id) {
                0.0
            } else {
                1.0
            }
        }
        QuantityMode::PerShipment => {
            if already_charged {
                0.0
            } else {
                1.0
            }
        }
    }
}

/// 附加费金额 (单价, 金额)
fn surcharge_amount(rule: &SurchargeRule, quantity: f64, item: &CommodityItem, base_freight: f64) -> (f64, f64) {
    let amount = match rule.calc_mode {
        SurchargeCalcMode::Flat => rule.amount,
        SurchargeCalcMode::PerUnit => rule.amount * quantity,
        SurchargeCalcMode::PerLm => {
            let lane_metres = item.length_cm.map_or(0.0, |len| len.max(0.0) / 100.0) * quantity;
            rule.amount * lane_metres
        }
        SurchargeCalcMode::PercentOfBase => base_freight * rule.amount / 100.0,
    };
    (rule.amount, round_money(amount))
}

fn round_money(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::rule::{EffectiveWindow, RuleHeader, RuleScope};
    use crate::domain::types::RelationshipType;

    fn header(id: i64) -> RuleHeader {
        RuleHeader {
            id,
            carrier_id: 1,
            name: format!("rule-{}", id),
            scope: RuleScope::default(),
            window: EffectiveWindow::always(),
            priority: 0,
            sort_order: 0,
        }
    }

    fn transform(id: i64, code: &str, params: serde_json::Value) -> TransformRule {
        TransformRule {
            header: header(id),
            transform_code: code.to_string(),
            params,
        }
    }

    fn surcharge(mode: SurchargeCalcMode, amount: f64, quantity_mode: QuantityMode) -> SurchargeRule {
        SurchargeRule {
            header: header(1),
            event_code: "HEAVY".to_string(),
            calc_mode: mode,
            amount,
            article_id: None,
            quantity_mode,
            min_length_cm: None,
            min_width_cm: None,
            min_height_cm: None,
            min_weight_kg: None,
        }
    }

    fn stacked_graph() -> CommodityGraph {
        CommodityGraph::new(vec![
            CommodityItem::new(1, 1, 1, "trailer"),
            CommodityItem::new(2, 1, 2, "car").with_relation(RelationshipType::LoadedWith, Some(1)),
            CommodityItem::new(3, 1, 3, "car"),
        ])
    }

    #[test]
    fn test_recategorize_and_bill_stack_as_base() {
        let graph = stacked_graph();
        let recat = transform(1, "recategorize", serde_json::json!({"to": "big van"}));
        let stack = transform(2, "BILL_STACK_AS_BASE", serde_json::Value::Null);
        let unknown = transform(3, "SPLIT_AXLES", serde_json::Value::Null);
        let rules = vec![&recat, &stack, &unknown];

        let member = graph.item(2).unwrap();
        let outcome = apply_transforms(&rules, member, VehicleCategory::Car, &graph);
        assert_eq!(outcome.effective_category, VehicleCategory::BigVan);
        assert!(!outcome.billed_separately);
        assert_eq!(outcome.applied, vec!["RECATEGORIZE", "BILL_STACK_AS_BASE"]);
        assert_eq!(outcome.notes, vec!["UNAPPLIED_TRANSFORM: SPLIT_AXLES"]);

        let base = graph.item(1).unwrap();
        let outcome = apply_transforms(&[&stack], base, VehicleCategory::Trailer, &graph);
        assert!(outcome.billed_separately);
    }

    #[test]
    fn test_recategorize_with_bad_params_keeps_category() {
        let graph = stacked_graph();
        let recat = transform(1, "RECATEGORIZE", serde_json::json!({"to": "spaceship"}));
        let outcome = apply_transforms(&[&recat], graph.item(3).unwrap(), VehicleCategory::Car, &graph);
        assert_eq!(outcome.effective_category, VehicleCategory::Car);
        assert!(outcome.applied.is_empty());
        assert_eq!(outcome.notes.len(), 1);
    }

    #[test]
    fn test_surcharge_quantity_modes() {
        let graph = stacked_graph();
        let base = graph.item(1).unwrap();
        let member = graph.item(2).unwrap();
        let loose = graph.item(3).unwrap();

        assert_eq!(surcharge_quantity(QuantityMode::PerStack, base, &graph, false), 1.0);
        assert_eq!(surcharge_quantity(QuantityMode::PerStack, member, &graph, false), 0.0);
        assert_eq!(surcharge_quantity(QuantityMode::PerStack, loose, &graph, false), 1.0);
        assert_eq!(surcharge_quantity(QuantityMode::PerShipment, loose, &graph, false), 1.0);
        assert_eq!(surcharge_quantity(QuantityMode::PerShipment, base, &graph, true), 0.0);
        assert_eq!(surcharge_quantity(QuantityMode::PerItem, loose, &graph, false), 1.0);
    }

    #[test]
    fn test_surcharge_amounts() {
        let item = CommodityItem::new(1, 1, 1, "trailer").with_dimensions(1360.0, 255.0, 400.0, 9000.0);

        let (_, flat) = surcharge_amount(&surcharge(SurchargeCalcMode::Flat, 75.0, QuantityMode::PerItem), 3.0, &item, 0.0);
        assert_eq!(flat, 75.0);

        let (_, per_unit) =
            surcharge_amount(&surcharge(SurchargeCalcMode::PerUnit, 20.0, QuantityMode::PerItem), 3.0, &item, 0.0);
        assert_eq!(per_unit, 60.0);

        let (unit, per_lm) =
            surcharge_amount(&surcharge(SurchargeCalcMode::PerLm, 12.5, QuantityMode::PerItem), 1.0, &item, 0.0);
        assert_eq!(unit, 12.5);
        assert_eq!(per_lm, 170.0);

        let (_, percent) = surcharge_amount(
            &surcharge(SurchargeCalcMode::PercentOfBase, 7.5, QuantityMode::PerItem),
            1.0,
            &item,
            1224.0,
        );
        assert_eq!(percent, 91.8);
    }
}

// ==========================================
// RoRo 承运商规则核心 - 采购运价查找
// ==========================================
// 职责: 承运商 + 港口 + 类别 → 物料映射 → 当前有效采购运价
//       物料映射 → PDF 报表类别（CAR/SVAN/BVAN/LM）
// 选择: effective_from 降序 → sort_order 升序 → id 升序
// 约束: 排名前两条的 (effective_from, sort_order) 相同即标记为歧义
// ==========================================

use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::CategoryKeywordTable;
use crate::domain::carrier::{Article, CarrierCategoryGroup};
use crate::domain::tariff::{CarrierArticleMapping, CarrierPurchaseTariff};
use crate::domain::types::{PdfCategory, VehicleCategory};
use crate::engine::rule_matcher::{RuleMatcher, VesselRef};
use crate::repository::{CarrierRepository, RepositoryResult, TariffRepository};

/// 运价选择结果
#[derive(Debug, Clone, PartialEq)]
pub struct TariffSelection {
    pub selected: Option<CarrierPurchaseTariff>,
    pub candidate_count: usize,
    pub ambiguous: bool,
}

/// 当日有效运价选择（纯函数）
pub fn select_active_tariff(candidates: &[CarrierPurchaseTariff], today: NaiveDate) -> TariffSelection {
    let mut effective: Vec<&CarrierPurchaseTariff> =
        candidates.iter().filter(|t| t.is_effective_on(today)).collect();

    effective.sort_by(|a, b| {
        b.effective_from
            .cmp(&a.effective_from)
            .then(a.sort_order.cmp(&b.sort_order))
            .then(a.id.cmp(&b.id))
    });

    let ambiguous = match (effective.first(), effective.get(1)) {
        (Some(first), Some(second)) => {
            first.effective_from == second.effective_from && first.sort_order == second.sort_order
        }
        _ => false,
    };

    TariffSelection {
        selected: effective.first().map(|t| (*t).clone()),
        candidate_count: effective.len(),
        ambiguous,
    }
}

/// PDF 报表类别判定（纯函数）
///
/// 优先使用类别组组码，其次按映射中列出的车辆类别归桶；都不命中返回 None
pub fn classify_pdf_category(
    mapping: &CarrierArticleMapping,
    category_groups: &[CarrierCategoryGroup],
    keywords: &CategoryKeywordTable,
) -> Option<PdfCategory> {
    let from_groups = mapping
        .scope
        .category_group_ids
        .iter()
        .filter_map(|group_id| category_groups.iter().find(|g| g.id == *group_id))
        .find_map(|group| keywords.match_group_code(&group.code));

    if from_groups.is_some() {
        return from_groups;
    }

    mapping
        .scope
        .vehicle_categories
        .iter()
        .filter_map(|raw| VehicleCategory::parse(raw))
        .find_map(|category| category.pdf_bucket())
}

/// 运价查找结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TariffResolution {
    pub tariff: CarrierPurchaseTariff,
    pub mapping: CarrierArticleMapping,
    pub article: Option<Article>,
    pub candidate_count: usize,
    pub ambiguous: bool,
}

// ==========================================
// TariffLookup - 采购运价查找
// ==========================================
pub struct TariffLookup {
    carrier_repo: Arc<CarrierRepository>,
    tariff_repo: Arc<TariffRepository>,
    keywords: CategoryKeywordTable,
}

impl TariffLookup {
    pub fn new(
        carrier_repo: Arc<CarrierRepository>,
        tariff_repo: Arc<TariffRepository>,
        keywords: CategoryKeywordTable,
    ) -> Self {
        Self {
            carrier_repo,
            tariff_repo,
            keywords,
        }
    }

    fn load_matcher(&self, carrier_id: i64) -> RepositoryResult<RuleMatcher> {
        Ok(RuleMatcher::new(
            self.carrier_repo.find_port_groups_by_carrier(carrier_id)?,
            self.carrier_repo.find_category_groups_by_carrier(carrier_id)?,
        ))
    }

    /// 当前有效采购运价（不指定船舶，带船舶过滤的映射不参与）
    pub fn resolve_active_tariff(
        &self,
        carrier_id: i64,
        port_id: i64,
        category: VehicleCategory,
        today: NaiveDate,
    ) -> RepositoryResult<Option<TariffResolution>> {
        self.resolve_active_tariff_for_vessel(carrier_id, port_id, category, None, today)
    }

    /// 当前有效采购运价
    ///
    /// # 返回
    /// - Some: 命中映射且存在有效运价
    /// - None: 无命中映射或映射下无有效运价（不视为错误）
    pub fn resolve_active_tariff_for_vessel(
        &self,
        carrier_id: i64,
        port_id: i64,
        category: VehicleCategory,
        vessel: Option<&VesselRef>,
        today: NaiveDate,
    ) -> RepositoryResult<Option<TariffResolution>> {
        let matcher = self.load_matcher(carrier_id)?;
        self.resolve_with_matcher(&matcher, carrier_id, port_id, category, vessel, today)
    }

    /// 使用已加载的分组进行查找（解析整张报价单时复用）
    pub fn resolve_with_matcher(
        &self,
        matcher: &RuleMatcher,
        carrier_id: i64,
        port_id: i64,
        category: VehicleCategory,
        vessel: Option<&VesselRef>,
        today: NaiveDate,
    ) -> RepositoryResult<Option<TariffResolution>> {
        let mut mappings: Vec<CarrierArticleMapping> = self
            .tariff_repo
            .find_mappings_by_carrier(carrier_id, true)?
            .into_iter()
            .filter(|m| matcher.mapping_matches(m, port_id, category, vessel))
            .collect();

        if mappings.is_empty() {
            tracing::debug!(carrier_id, port_id, category = %category, "无命中的物料映射");
            return Ok(None);
        }

        mappings.sort_by(|a, b| a.sort_order.cmp(&b.sort_order).then(a.id.cmp(&b.id)));
        let mapping_ids: Vec<i64> = mappings.iter().map(|m| m.id).collect();
        let tariffs = self.tariff_repo.find_tariffs_by_mappings(&mapping_ids)?;

        let selection = select_active_tariff(&tariffs, today);
        let tariff = match selection.selected {
            Some(t) => t,
            None => {
                tracing::debug!(carrier_id, port_id, category = %category, %today, "命中映射但无有效运价");
                return Ok(None);
            }
        };

        if selection.ambiguous {
            tracing::warn!(
                carrier_id,
                port_id,
                category = %category,
                tariff_id = tariff.id,
                candidate_count = selection.candidate_count,
                "存在生效日与排序相同的多条运价，按ID取第一条"
            );
        }

        let mapping = match mappings.into_iter().find(|m| m.id == tariff.mapping_id) {
            Some(m) => m,
            None => return Ok(None),
        };
        let article = self.carrier_repo.find_article(mapping.article_id)?;
        if article.is_none() {
            tracing::warn!(mapping_id = mapping.id, article_id = mapping.article_id, "映射引用的物料不存在");
        }

        Ok(Some(TariffResolution {
            tariff,
            mapping,
            article,
            candidate_count: selection.candidate_count,
            ambiguous: selection.ambiguous,
        }))
    }

    /// 物料映射的 PDF 报表类别
    pub fn determine_pdf_category(&self, mapping: &CarrierArticleMapping) -> RepositoryResult<Option<PdfCategory>> {
        let groups = self.carrier_repo.find_category_groups_by_carrier(mapping.carrier_id)?;
        Ok(classify_pdf_category(mapping, &groups, &self.keywords))
    }

    pub fn keywords(&self) -> &CategoryKeywordTable {
        &self.keywords
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::rule::RuleScope;
    use crate::domain::tariff::TariffCharge;
    use crate::domain::types::{ChargeUnit, TariffComponent};
    use std::collections::BTreeMap;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn tariff(id: i64, from: NaiveDate, sort_order: i32) -> CarrierPurchaseTariff {
        let mut components = BTreeMap::new();
        components.insert(
            TariffComponent::BaseFreight,
            TariffCharge {
                amount: 100.0,
                unit: ChargeUnit::PerUnit,
            },
        );
        CarrierPurchaseTariff {
            id,
            mapping_id: 1,
            effective_from: from,
            effective_to: None,
            is_active: true,
            sort_order,
            currency: "EUR".to_string(),
            components,
        }
    }

    fn mapping(scope: RuleScope) -> CarrierArticleMapping {
        CarrierArticleMapping {
            id: 1,
            carrier_id: 1,
            article_id: 1,
            name: "m".to_string(),
            scope,
            is_active: true,
            sort_order: 0,
        }
    }

    #[test]
    fn test_latest_effective_from_wins() {
        let candidates = vec![
            tariff(1, date(2026, 1, 1), 0),
            tariff(2, date(2026, 3, 1), 5),
            tariff(3, date(2026, 6, 1), 0), // 尚未生效
        ];
        let selection = select_active_tariff(&candidates, date(2026, 4, 1));
        assert_eq!(selection.selected.map(|t| t.id), Some(2));
        assert_eq!(selection.candidate_count, 2);
        assert!(!selection.ambiguous);
    }

    #[test]
    fn test_sort_order_breaks_tie_and_flags_ambiguity() {
        let candidates = vec![
            tariff(7, date(2026, 1, 1), 1),
            tariff(8, date(2026, 1, 1), 0),
        ];
        let selection = select_active_tariff(&candidates, date(2026, 2, 1));
        assert_eq!(selection.selected.as_ref().map(|t| t.id), Some(8));
        assert!(!selection.ambiguous);

        let tied = vec![tariff(9, date(2026, 1, 1), 0), tariff(4, date(2026, 1, 1), 0)];
        let selection = select_active_tariff(&tied, date(2026, 2, 1));
        assert_eq!(selection.selected.map(|t| t.id), Some(4));
        assert!(selection.ambiguous);
    }

    #[test]
    fn test_inactive_and_expired_excluded() {
        let mut inactive = tariff(1, date(2026, 1, 1), 0);
        inactive.is_active = false;
        let mut expired = tariff(2, date(2025, 1, 1), 0);
        expired.effective_to = Some(date(2025, 12, 31));

        let selection = select_active_tariff(&[inactive, expired], date(2026, 2, 1));
        assert!(selection.selected.is_none());
        assert_eq!(selection.candidate_count, 0);
    }

    #[test]
    fn test_pdf_category_from_group_code_first() {
        let groups = vec![CarrierCategoryGroup {
            id: 5,
            carrier_id: 1,
            code: "GRIMALDI_BVAN".to_string(),
            name: "Big vans".to_string(),
            vehicle_categories: vec!["big_van".to_string()],
        }];
        let m = mapping(RuleScope {
            category_group_ids: vec![5],
            vehicle_categories: vec!["car".to_string()],
            ..Default::default()
        });
        assert_eq!(
            classify_pdf_category(&m, &groups, &CategoryKeywordTable::default()),
            Some(PdfCategory::Bvan)
        );
    }

    #[test]
    fn test_pdf_category_falls_back_to_vehicle_categories() {
        let m = mapping(RuleScope {
            category_group_ids: vec![404], // 不存在的组
            vehicle_categories: vec!["smallvan".to_string()],
            ..Default::default()
        });
        assert_eq!(
            classify_pdf_category(&m, &[], &CategoryKeywordTable::default()),
            Some(PdfCategory::Svan)
        );

        let unknown = mapping(RuleScope {
            vehicle_categories: vec!["boat".to_string(), "other".to_string()],
            ..Default::default()
        });
        assert_eq!(classify_pdf_category(&unknown, &[], &CategoryKeywordTable::default()), None);
    }
}

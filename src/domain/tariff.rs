// ==========================================
// RoRo 承运商规则核心 - 物料映射与采购运价
// ==========================================
// 职责: CarrierArticleMapping（销售物料 ↔ 承运商适用范围）
//       CarrierPurchaseTariff（挂在映射下的带日期成本表）
// 红线: 运价只追加不修改，新运价以更晚的 effective_from 覆盖旧运价
// ==========================================

use crate::domain::rule::RuleScope;
use crate::domain::types::{ChargeUnit, TariffComponent};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ==========================================
// CarrierArticleMapping - 物料映射
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarrierArticleMapping {
    pub id: i64,
    pub carrier_id: i64,
    pub article_id: i64,
    pub name: String,
    pub scope: RuleScope,
    pub is_active: bool,
    pub sort_order: i32,
}

impl CarrierArticleMapping {
    /// 映射可用条件: 港口范围与类别范围均非空
    pub fn is_usable(&self) -> bool {
        self.is_active && self.scope.has_port_scope() && self.scope.has_category_scope()
    }
}

// ==========================================
// TariffCharge - 单个费用项
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TariffCharge {
    pub amount: f64,
    pub unit: ChargeUnit,
}

impl TariffCharge {
    /// 按单位计算金额
    ///
    /// # 参数
    /// - quantity: 件数
    /// - lane_metres: 车道米
    /// - base_amount: 基础运费金额（百分比单位使用）
    pub fn charge_for(&self, quantity: f64, lane_metres: f64, base_amount: f64) -> f64 {
        match self.unit {
            ChargeUnit::LumpSum => self.amount,
            ChargeUnit::PerUnit => self.amount * quantity,
            ChargeUnit::PerLm => self.amount * lane_metres,
            ChargeUnit::PercentOfBase => base_amount * self.amount / 100.0,
        }
    }
}

// ==========================================
// CarrierPurchaseTariff - 采购运价
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarrierPurchaseTariff {
    pub id: i64,
    pub mapping_id: i64,
    pub effective_from: NaiveDate,
    pub effective_to: Option<NaiveDate>,
    pub is_active: bool,
    pub sort_order: i32,
    pub currency: String,
    pub components: BTreeMap<TariffComponent, TariffCharge>,
}

impl CarrierPurchaseTariff {
    /// 是否在 today 生效
    pub fn is_effective_on(&self, today: NaiveDate) -> bool {
        self.is_active && self.effective_from <= today && self.effective_to.map_or(true, |to| to >= today)
    }

    /// 基础海运费金额（百分比单位的基础运费按 0 处理）
    pub fn base_freight_amount(&self, quantity: f64, lane_metres: f64) -> f64 {
        match self.components.get(&TariffComponent::BaseFreight) {
            Some(charge) if charge.unit != ChargeUnit::PercentOfBase => {
                charge.charge_for(quantity, lane_metres, 0.0)
            }
            _ => 0.0,
        }
    }

    /// 单个费用项金额，未配置时为 None
    pub fn component_amount(&self, component: TariffComponent, quantity: f64, lane_metres: f64) -> Option<f64> {
        let base = self.base_freight_amount(quantity, lane_metres);
        self.components
            .get(&component)
            .map(|charge| charge.charge_for(quantity, lane_metres, base))
    }

    /// 全部费用项合计
    pub fn total_amount(&self, quantity: f64, lane_metres: f64) -> f64 {
        let base = self.base_freight_amount(quantity, lane_metres);
        self.components
            .iter()
            .map(|(component, charge)| {
                if *component == TariffComponent::BaseFreight {
                    base
                } else {
                    charge.charge_for(quantity, lane_metres, base)
                }
            })
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tariff() -> CarrierPurchaseTariff {
        let mut components = BTreeMap::new();
        components.insert(
            TariffComponent::BaseFreight,
            TariffCharge { amount: 90.0, unit: ChargeUnit::PerLm },
        );
        components.insert(
            TariffComponent::Baf,
            TariffCharge { amount: 10.0, unit: ChargeUnit::PercentOfBase },
        );
        components.insert(
            TariffComponent::Admin,
            TariffCharge { amount: 35.0, unit: ChargeUnit::LumpSum },
        );
        CarrierPurchaseTariff {
            id: 1,
            mapping_id: 1,
            effective_from: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            effective_to: None,
            is_active: true,
            sort_order: 0,
            currency: "EUR".to_string(),
            components,
        }
    }

    #[test]
    fn test_component_amounts() {
        let t = tariff();
        // 13.6 LM 挂车
        assert!((t.base_freight_amount(1.0, 13.6) - 1224.0).abs() < 1e-9);
        assert!((t.component_amount(TariffComponent::Baf, 1.0, 13.6).unwrap() - 122.4).abs() < 1e-9);
        assert_eq!(t.component_amount(TariffComponent::Ets, 1.0, 13.6), None);
        assert!((t.total_amount(1.0, 13.6) - 1381.4).abs() < 1e-9);
    }

    #[test]
    fn test_effective_window() {
        let mut t = tariff();
        t.effective_to = NaiveDate::from_ymd_opt(2026, 3, 31);
        assert!(!t.is_effective_on(NaiveDate::from_ymd_opt(2025, 12, 31).unwrap()));
        assert!(t.is_effective_on(NaiveDate::from_ymd_opt(2026, 3, 31).unwrap()));
        assert!(!t.is_effective_on(NaiveDate::from_ymd_opt(2026, 4, 1).unwrap()));
    }
}

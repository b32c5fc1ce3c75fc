// ==========================================
// RoRo 承运商规则核心 - 承运商主数据
// ==========================================
// 职责: 承运商、港口、港口组、类别组、销售物料
// 来源: 外部导入/同步（本模块只读）
// ==========================================

use crate::domain::types::VehicleCategory;
use serde::{Deserialize, Serialize};

/// 承运商
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Carrier {
    pub id: i64,
    pub code: String,
    pub name: String,
}

/// 港口（code 为 UN/LOCODE）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Port {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub country_code: Option<String>,
}

// ==========================================
// CarrierPortGroup - 承运商港口组
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarrierPortGroup {
    pub id: i64,
    pub carrier_id: i64,
    pub code: String,
    pub name: String,
    pub port_ids: Vec<i64>,
}

impl CarrierPortGroup {
    pub fn contains_port(&self, port_id: i64) -> bool {
        self.port_ids.contains(&port_id)
    }
}

// ==========================================
// CarrierCategoryGroup - 承运商类别组
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarrierCategoryGroup {
    pub id: i64,
    pub carrier_id: i64,
    pub code: String,
    pub name: String,
    pub vehicle_categories: Vec<String>, // 原始字符串，按 VehicleCategory::parse 比较
}

impl CarrierCategoryGroup {
    pub fn contains_category(&self, category: VehicleCategory) -> bool {
        self.vehicle_categories
            .iter()
            .any(|raw| VehicleCategory::parse(raw) == Some(category))
    }
}

/// 销售物料（报价行使用）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub id: i64,
    pub article_code: String,
    pub name: String,
    pub unit_type: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_group_membership_uses_synonyms() {
        let group = CarrierCategoryGroup {
            id: 1,
            carrier_id: 1,
            code: "HH".to_string(),
            name: "High & Heavy".to_string(),
            vehicle_categories: vec!["Tractor".to_string(), "semi-trailer".to_string()],
        };
        assert!(group.contains_category(VehicleCategory::Truckhead));
        assert!(group.contains_category(VehicleCategory::Trailer));
        assert!(!group.contains_category(VehicleCategory::Car));
    }
}

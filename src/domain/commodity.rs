// ==========================================
// RoRo 承运商规则核心 - 货物行领域模型
// ==========================================
// 职责: 报价单中的货物行（车辆/挂车/车头）及其组合关系
// 红线: 组合关系只允许指向同一报价单内的货物行
// ==========================================

use crate::domain::rule::AcceptanceVerdict;
use crate::domain::types::{RelationshipType, SurchargeCalcMode, VehicleCategory};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// CommodityItem - 货物行
// ==========================================
// 对齐: commodity_item 表
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommodityItem {
    // ===== 主键 / 归属 =====
    pub id: i64,
    pub quotation_id: i64,
    pub line_number: i32, // 报价单内排序

    // ===== 类别与数量 =====
    pub category: String, // 原始类别字符串（经 VehicleCategory::parse 归一）
    pub quantity: i32,

    // ===== 组合关系 =====
    pub relationship_type: RelationshipType,
    pub related_item_id: Option<i64>,

    // ===== 尺寸重量（接收规则使用） =====
    pub length_cm: Option<f64>,
    pub width_cm: Option<f64>,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    pub is_empty: bool,
    pub is_self_propelled: Option<bool>, // None 表示按类别推断

    // ===== 规则解析缓存 =====
    pub carrier_rule_meta: Option<CarrierRuleMeta>,
}

impl CommodityItem {
    /// 构造一个最小货物行（其余字段取默认值）
    pub fn new(id: i64, quotation_id: i64, line_number: i32, category: &str) -> Self {
        Self {
            id,
            quotation_id,
            line_number,
            category: category.to_string(),
            quantity: 1,
            relationship_type: RelationshipType::Separate,
            related_item_id: None,
            length_cm: None,
            width_cm: None,
            height_cm: None,
            weight_kg: None,
            is_empty: true,
            is_self_propelled: None,
            carrier_rule_meta: None,
        }
    }

    /// 设置组合关系（builder 风格，测试和导入使用）
    pub fn with_relation(mut self, relationship_type: RelationshipType, related_item_id: Option<i64>) -> Self {
        self.relationship_type = relationship_type;
        self.related_item_id = related_item_id;
        self
    }

    /// 设置尺寸重量
    pub fn with_dimensions(mut self, length_cm: f64, width_cm: f64, height_cm: f64, weight_kg: f64) -> Self {
        self.length_cm = Some(length_cm);
        self.width_cm = Some(width_cm);
        self.height_cm = Some(height_cm);
        self.weight_kg = Some(weight_kg);
        self
    }

    /// 归一后的车辆类别（无法识别时为 None）
    pub fn vehicle_category(&self) -> Option<VehicleCategory> {
        VehicleCategory::parse(&self.category)
    }

    /// 是否自带动力
    ///
    /// 未显式录入时按类别推断：挂车、滚装货、其他 视为无动力
    pub fn self_propelled(&self) -> bool {
        if let Some(flag) = self.is_self_propelled {
            return flag;
        }
        matches!(
            self.vehicle_category(),
            Some(
                VehicleCategory::Car
                    | VehicleCategory::Suv
                    | VehicleCategory::SmallVan
                    | VehicleCategory::BigVan
                    | VehicleCategory::Truck
                    | VehicleCategory::Truckhead
            )
        )
    }

    /// 车道米 = 长度(m) × 数量；缺长度时为 0
    pub fn lane_metres(&self) -> f64 {
        match self.length_cm {
            Some(len) if len > 0.0 => len / 100.0 * self.quantity.max(0) as f64,
            _ => 0.0,
        }
    }
}

// ==========================================
// CarrierRuleMeta - 规则解析缓存
// ==========================================
// 规则解析器写入，作为最近一次解析结果的快照（JSON 存储）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarrierRuleMeta {
    pub resolved_at: DateTime<Utc>,
    pub carrier_id: i64,
    pub port_id: i64,
    pub effective_category: Option<String>,
    pub acceptance: Option<AcceptanceVerdict>,
    pub applied_transforms: Vec<String>,
    pub tariff_id: Option<i64>,
    pub article_id: Option<i64>,
    pub surcharge_events: Vec<SurchargeEvent>,
}

impl CarrierRuleMeta {
    /// 是否包含指定附加费事件
    pub fn has_event(&self, event_code: &str) -> bool {
        self.surcharge_events
            .iter()
            .any(|e| e.event_code.eq_ignore_ascii_case(event_code))
    }
}

// ==========================================
// SurchargeEvent - 附加费事件
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurchargeEvent {
    pub event_id: String,
    pub event_code: String,
    pub rule_id: i64,
    pub article_id: Option<i64>,
    pub calc_mode: SurchargeCalcMode,
    pub quantity: f64,
    pub unit_amount: f64,
    pub amount: f64,
    #[serde(default)]
    pub currency: String, // 运价币种；无运价时取配置的默认币种
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_self_propelled_inferred_from_category() {
        let trailer = CommodityItem::new(1, 1, 1, "trailer");
        let truck = CommodityItem::new(2, 1, 2, "truckhead");
        assert!(!trailer.self_propelled());
        assert!(truck.self_propelled());

        let mut towed_car = CommodityItem::new(3, 1, 3, "car");
        towed_car.is_self_propelled = Some(false);
        assert!(!towed_car.self_propelled());
    }

    #[test]
    fn test_lane_metres() {
        let mut item = CommodityItem::new(1, 1, 1, "trailer").with_dimensions(1360.0, 255.0, 400.0, 8000.0);
        item.quantity = 2;
        assert!((item.lane_metres() - 27.2).abs() < 1e-9);

        let no_length = CommodityItem::new(2, 1, 2, "trailer");
        assert_eq!(no_length.lane_metres(), 0.0);
    }
}

// ==========================================
// RoRo 承运商规则核心 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型、纯判定方法
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod carrier;
pub mod commodity;
pub mod quotation;
pub mod rule;
pub mod tariff;
pub mod types;

// 重导出核心类型
pub use carrier::{Article, Carrier, CarrierCategoryGroup, CarrierPortGroup, Port};
pub use commodity::{CarrierRuleMeta, CommodityItem, SurchargeEvent};
pub use quotation::{Quotation, SelectedSchedule};
pub use rule::{
    AcceptanceRule, AcceptanceVerdict, CarrierRule, EffectiveWindow, RuleHeader, RuleScope,
    SurchargeRule, TransformRule,
};
pub use tariff::{CarrierArticleMapping, CarrierPurchaseTariff, TariffCharge};
pub use types::{
    ChargeUnit, PdfCategory, QuantityMode, RelationshipType, SurchargeCalcMode, TariffComponent,
    VehicleCategory,
};

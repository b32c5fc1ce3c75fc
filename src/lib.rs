// ==========================================
// RoRo 承运商规则核心 - 核心库
// ==========================================
// 职责: 货物组合关系、拖车费判定、承运商规则匹配、采购运价查找
// 技术栈: Rust + SQLite
// 系统定位: 报价后台的规则解析内核（不含导入/同步/界面）
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "zh-CN");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 规则判定
pub mod engine;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// API 层 - 业务接口
pub mod api;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{
    ChargeUnit, PdfCategory, QuantityMode, RelationshipType, SurchargeCalcMode, TariffComponent,
    VehicleCategory,
};

// 领域实体
pub use domain::{
    AcceptanceRule, Article, Carrier, CarrierArticleMapping, CarrierCategoryGroup,
    CarrierPortGroup, CarrierPurchaseTariff, CarrierRuleMeta, CommodityItem, Port, Quotation,
    SurchargeEvent, SurchargeRule, TransformRule,
};

// 引擎
pub use engine::{
    CarrierAuditEngine, CarrierRuleRepositories, CarrierRuleResolver, CommodityGraph, RuleMatcher,
    TariffLookup, TowingDecision, TowingPolicy,
};

// 配置
pub use config::{ConfigManager, ResolverConfig};

// API
pub use api::{ApiError, ApiResult, CarrierRuleApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "RoRo 承运商规则核心";

// 数据库版本
pub const DB_VERSION: &str = "v0.1";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}

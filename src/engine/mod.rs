// ==========================================
// RoRo 承运商规则核心 - 引擎层
// ==========================================
// 职责: 实现承运商规则判定，不拼 SQL
// 红线: Engine 不拼 SQL, 所有判定必须输出 reason
// ==========================================

pub mod audit;
pub mod commodity_graph;
pub mod repositories;
pub mod resolver;
pub mod rule_matcher;
pub mod tariff_lookup;
pub mod towing;

// 重导出核心引擎
pub use audit::{AuditFinding, AuditReport, AuditSeverity, AuditSubject, CarrierAuditEngine};
pub use commodity_graph::{CommodityGraph, GraphIssue, GraphIssueKind, StackRoot};
pub use repositories::CarrierRuleRepositories;
pub use resolver::{
    CarrierRuleResolver, CarrierRuleSet, ItemResolution, MatchedRules, QuotationResolution,
    TariffSummary,
};
pub use rule_matcher::{RuleMatcher, RuleQuery, VesselRef};
pub use tariff_lookup::{
    classify_pdf_category, select_active_tariff, TariffLookup, TariffResolution, TariffSelection,
};
pub use towing::{InspectedItem, TowingDecision, TowingPolicy, TowingReason};

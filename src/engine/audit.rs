// ==========================================
// RoRo 承运商规则核心 - 规则数据审计
// ==========================================
// 职责: 检查承运商映射/运价配置与报价单货物结构中的数据缺口
// 红线: 只读，不修改任何数据；审计结论不影响解析结果
// ==========================================

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::ResolverConfig;
use crate::domain::types::VehicleCategory;
use crate::engine::commodity_graph::{CommodityGraph, GraphIssueKind};
use crate::engine::repositories::CarrierRuleRepositories;
use crate::engine::tariff_lookup::{classify_pdf_category, select_active_tariff};
use crate::engine::towing::TowingPolicy;
use crate::repository::RepositoryResult;

/// 审计发现严重程度
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditSeverity {
    Info,
    Warning,
    Error,
}

impl AuditSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
        }
    }
}

/// 审计发现代码
pub mod finding_codes {
    pub const CARRIER_NOT_FOUND: &str = "CARRIER_NOT_FOUND";
    pub const MAPPING_NO_PORT_SCOPE: &str = "MAPPING_NO_PORT_SCOPE";
    pub const MAPPING_NO_CATEGORY_SCOPE: &str = "MAPPING_NO_CATEGORY_SCOPE";
    pub const MAPPING_UNKNOWN_PORT: &str = "MAPPING_UNKNOWN_PORT";
    pub const MAPPING_UNKNOWN_PORT_GROUP: &str = "MAPPING_UNKNOWN_PORT_GROUP";
    pub const MAPPING_UNKNOWN_CATEGORY: &str = "MAPPING_UNKNOWN_CATEGORY";
    pub const MAPPING_UNKNOWN_CATEGORY_GROUP: &str = "MAPPING_UNKNOWN_CATEGORY_GROUP";
    pub const MAPPING_UNKNOWN_ARTICLE: &str = "MAPPING_UNKNOWN_ARTICLE";
    pub const MAPPING_NO_ACTIVE_TARIFF: &str = "MAPPING_NO_ACTIVE_TARIFF";
    pub const MAPPING_NO_PDF_CATEGORY: &str = "MAPPING_NO_PDF_CATEGORY";
    pub const TARIFF_AMBIGUOUS: &str = "TARIFF_AMBIGUOUS";

    pub const QUOTATION_NOT_FOUND: &str = "QUOTATION_NOT_FOUND";
    pub const QUOTATION_NO_SCHEDULE: &str = "QUOTATION_NO_SCHEDULE";
    pub const ITEM_UNMAPPED_CATEGORY: &str = "ITEM_UNMAPPED_CATEGORY";
    pub const ITEM_TOWING_DECISION: &str = "ITEM_TOWING_DECISION";
}

/// 单条审计发现
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditFinding {
    pub severity: AuditSeverity,
    pub code: String,
    pub entity: String,
    pub entity_id: i64,
    pub message: String,
}

/// 审计对象
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum AuditSubject {
    Carrier(i64),
    Quotation(i64),
}

/// 审计报告
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditReport {
    pub run_id: String,
    pub subject: AuditSubject,
    pub audit_date: NaiveDate,
    pub generated_at: DateTime<Utc>,
    pub config_snapshot: ResolverConfig, // 审计时生效的解析口径
    pub findings: Vec<AuditFinding>,
}

impl AuditReport {
    fn new(subject: AuditSubject, audit_date: NaiveDate, config: &ResolverConfig) -> Self {
        Self {
            run_id: Uuid::new_v4().to_string(),
            subject,
            audit_date,
            generated_at: Utc::now(),
            config_snapshot: config.clone(),
            findings: Vec::new(),
        }
    }

    fn push(&mut self, severity: AuditSeverity, code: &str, entity: &str, entity_id: i64, message: String) {
        self.findings.push(AuditFinding {
            severity,
            code: code.to_string(),
            entity: entity.to_string(),
            entity_id,
            message,
        });
    }

    pub fn count(&self, severity: AuditSeverity) -> usize {
        self.findings.iter().filter(|f| f.severity == severity).count()
    }

    pub fn has_errors(&self) -> bool {
        self.count(AuditSeverity::Error) > 0
    }

    pub fn codes(&self) -> Vec<&str> {
        self.findings.iter().map(|f| f.code.as_str()).collect()
    }

    pub fn has_code(&self, code: &str) -> bool {
        self.findings.iter().any(|f| f.code == code)
    }
}

// ==========================================
// CarrierAuditEngine - 规则数据审计引擎
// ==========================================
pub struct CarrierAuditEngine {
    repos: CarrierRuleRepositories,
    config: ResolverConfig,
}

impl CarrierAuditEngine {
    pub fn new(repos: CarrierRuleRepositories, config: ResolverConfig) -> Self {
        Self { repos, config }
    }

    /// 审计承运商的物料映射与采购运价
    pub fn audit_carrier(&self, carrier_id: i64, today: NaiveDate) -> RepositoryResult<AuditReport> {
        use finding_codes::*;

        let mut report = AuditReport::new(AuditSubject::Carrier(carrier_id), today, &self.config);

        if self.repos.carrier_repo.find_carrier(carrier_id)?.is_none() {
            report.push(
                AuditSeverity::Error,
                CARRIER_NOT_FOUND,
                "carrier",
                carrier_id,
                format!("carrier {} does not exist", carrier_id),
            );
            return Ok(report);
        }

        let port_groups = self.repos.carrier_repo.find_port_groups_by_carrier(carrier_id)?;
        let category_groups = self.repos.carrier_repo.find_category_groups_by_carrier(carrier_id)?;
        let port_group_ids: HashSet<i64> = port_groups.iter().map(|g| g.id).collect();
        let category_group_ids: HashSet<i64> = category_groups.iter().map(|g| g.id).collect();

        let mappings = self.repos.tariff_repo.find_mappings_by_carrier(carrier_id, true)?;
        let mapping_ids: Vec<i64> = mappings.iter().map(|m| m.id).collect();
        let tariffs = self.repos.tariff_repo.find_tariffs_by_mappings(&mapping_ids)?;

        for mapping in &mappings {
            let scope = &mapping.scope;

            if !scope.has_port_scope() {
                report.push(
                    AuditSeverity::Error,
                    MAPPING_NO_PORT_SCOPE,
                    "carrier_article_mapping",
                    mapping.id,
                    format!("mapping '{}' has no port or port group", mapping.name),
                );
            }
            if !scope.has_category_scope() {
                report.push(
                    AuditSeverity::Error,
                    MAPPING_NO_CATEGORY_SCOPE,
                    "carrier_article_mapping",
                    mapping.id,
                    format!("mapping '{}' has no vehicle category or category group", mapping.name),
                );
            }

            let known_ports: HashSet<i64> = self
                .repos
                .carrier_repo
                .existing_port_ids(&scope.port_ids)?
                .into_iter()
                .collect();
            for port_id in scope.port_ids.iter().filter(|id| !known_ports.contains(id)) {
                report.push(
                    AuditSeverity::Warning,
                    MAPPING_UNKNOWN_PORT,
                    "carrier_article_mapping",
                    mapping.id,
                    format!("port {} does not exist", port_id),
                );
            }
            for group_id in scope.port_group_ids.iter().filter(|id| !port_group_ids.contains(id)) {
                report.push(
                    AuditSeverity::Warning,
                    MAPPING_UNKNOWN_PORT_GROUP,
                    "carrier_article_mapping",
                    mapping.id,
                    format!("port group {} is not defined for this carrier", group_id),
                );
            }
            for raw in scope
                .vehicle_categories
                .iter()
                .filter(|raw| VehicleCategory::parse(raw).is_none())
            {
                report.push(
                    AuditSeverity::Warning,
                    MAPPING_UNKNOWN_CATEGORY,
                    "carrier_article_mapping",
                    mapping.id,
                    format!("vehicle category '{}' is not recognised", raw),
                );
            }
            for group_id in scope
                .category_group_ids
                .iter()
                .filter(|id| !category_group_ids.contains(id))
            {
                report.push(
                    AuditSeverity::Warning,
                    MAPPING_UNKNOWN_CATEGORY_GROUP,
                    "carrier_article_mapping",
                    mapping.id,
                    format!("category group {} is not defined for this carrier", group_id),
                );
            }

            if self.repos.carrier_repo.find_article(mapping.article_id)?.is_none() {
                report.push(
                    AuditSeverity::Error,
                    MAPPING_UNKNOWN_ARTICLE,
                    "carrier_article_mapping",
                    mapping.id,
                    format!("article {} does not exist", mapping.article_id),
                );
            }

            let own_tariffs: Vec<_> = tariffs
                .iter()
                .filter(|t| t.mapping_id == mapping.id)
                .cloned()
                .collect();
            let selection = select_active_tariff(&own_tariffs, today);
            match &selection.selected {
                None => report.push(
                    AuditSeverity::Warning,
                    MAPPING_NO_ACTIVE_TARIFF,
                    "carrier_article_mapping",
                    mapping.id,
                    format!("mapping '{}' has no tariff effective on {}", mapping.name, today),
                ),
                Some(selected) if selection.ambiguous => report.push(
                    AuditSeverity::Warning,
                    TARIFF_AMBIGUOUS,
                    "carrier_purchase_tariff",
                    selected.id,
                    format!(
                        "{} tariffs share effective_from {} and sort_order {}",
                        selection.candidate_count, selected.effective_from, selected.sort_order
                    ),
                ),
                Some(_) => {}
            }

            if classify_pdf_category(mapping, &category_groups, &self.config.pdf_category_keywords).is_none() {
                report.push(
                    AuditSeverity::Info,
                    MAPPING_NO_PDF_CATEGORY,
                    "carrier_article_mapping",
                    mapping.id,
                    format!("mapping '{}' cannot be placed in a PDF category", mapping.name),
                );
            }
        }

        tracing::info!(
            carrier_id,
            run_id = %report.run_id,
            mapping_count = mappings.len(),
            finding_count = report.findings.len(),
            "承运商规则审计完成"
        );

        Ok(report)
    }

    /// 审计报价单的货物结构（关系完整性、类别识别、拖车判定）
    pub fn audit_quotation(&self, quotation_id: i64, today: NaiveDate) -> RepositoryResult<AuditReport> {
        use finding_codes::*;

        let mut report = AuditReport::new(AuditSubject::Quotation(quotation_id), today, &self.config);

        let quotation = match self.repos.quotation_repo.find_by_id(quotation_id)? {
            Some(q) => q,
            None => {
                report.push(
                    AuditSeverity::Error,
                    QUOTATION_NOT_FOUND,
                    "quotation",
                    quotation_id,
                    format!("quotation {} does not exist", quotation_id),
                );
                return Ok(report);
            }
        };

        if quotation.selected_schedule().is_none() {
            report.push(
                AuditSeverity::Info,
                QUOTATION_NO_SCHEDULE,
                "quotation",
                quotation_id,
                "no carrier or port of discharge selected".to_string(),
            );
        }

        let graph = CommodityGraph::new(self.repos.commodity_repo.find_by_quotation(quotation_id)?);

        for issue in graph.integrity_issues() {
            let severity = match issue.kind {
                GraphIssueKind::StackCycle | GraphIssueKind::DanglingRelation | GraphIssueKind::CrossQuotationRelation => {
                    AuditSeverity::Error
                }
                _ => AuditSeverity::Warning,
            };
            let code = serde_json::to_value(issue.kind)
                .ok()
                .and_then(|v| v.as_str().map(|s| format!("ITEM_{}", s)))
                .unwrap_or_else(|| "ITEM_RELATION_ISSUE".to_string());
            report.push(
                severity,
                &code,
                "commodity_item",
                issue.item_id,
                format!(
                    "line {} relation -> {}",
                    issue.line_number,
                    issue
                        .related_item_id
                        .map_or_else(|| "none".to_string(), |id| id.to_string())
                ),
            );
        }

        let towing = TowingPolicy::from_config(&self.config);
        for item in graph.items() {
            match item.vehicle_category() {
                None => report.push(
                    AuditSeverity::Warning,
                    ITEM_UNMAPPED_CATEGORY,
                    "commodity_item",
                    item.id,
                    format!("line {} category '{}' is not recognised", item.line_number, item.category),
                ),
                Some(category) if self.config.is_towing_category(category) => {
                    let decision = towing.explain(&graph, category, item.id);
                    report.push(
                        AuditSeverity::Info,
                        ITEM_TOWING_DECISION,
                        "commodity_item",
                        item.id,
                        format!(
                            "line {} towing={} ({})",
                            item.line_number,
                            decision.apply,
                            decision.reason_code()
                        ),
                    );
                }
                Some(_) => {}
            }
        }

        tracing::info!(
            quotation_id,
            run_id = %report.run_id,
            item_count = graph.len(),
            finding_count = report.findings.len(),
            "报价单货物结构审计完成"
        );

        Ok(report)
    }
}

// ==========================================
// RoRo 承运商规则核心 - 承运商规则 API
// ==========================================
// 职责: 拖车判定、运价查找、PDF 类别、报价单解析、规则审计的对外入口
// 约束: 原始字符串（类别/日期）在此校验，非法输入不进入引擎
// ==========================================

use std::sync::{Arc, Mutex};

use chrono::NaiveDate;

use crate::api::error::{ApiError, ApiResult};
use crate::config::{ConfigManager, ResolverConfig, ResolverConfigReader};
use crate::domain::types::{PdfCategory, VehicleCategory};
use crate::engine::audit::{AuditReport, CarrierAuditEngine};
use crate::engine::repositories::CarrierRuleRepositories;
use crate::engine::resolver::{CarrierRuleResolver, ItemResolution, QuotationResolution};
use crate::engine::tariff_lookup::TariffResolution;
use crate::engine::towing::TowingDecision;

// ==========================================
// CarrierRuleApi - 承运商规则 API
// ==========================================
pub struct CarrierRuleApi {
    repos: CarrierRuleRepositories,
    resolver: Arc<CarrierRuleResolver>,
    audit_engine: Arc<CarrierAuditEngine>,
}

impl CarrierRuleApi {
    pub fn new(repos: CarrierRuleRepositories, config: ResolverConfig) -> Self {
        Self {
            resolver: Arc::new(CarrierRuleResolver::new(repos.clone(), config.clone())),
            audit_engine: Arc::new(CarrierAuditEngine::new(repos.clone(), config)),
            repos,
        }
    }

    /// 打开数据库，从 config_kv 读取解析器配置
    pub fn open(db_path: &str) -> ApiResult<Self> {
        let conn = crate::db::open_and_check(db_path)
            .map_err(|e| ApiError::DatabaseConnectionError(e.to_string()))?;
        let conn = Arc::new(Mutex::new(conn));

        let config_manager =
            ConfigManager::from_connection(conn.clone()).map_err(|e| ApiError::ConfigError(e.to_string()))?;
        let config = config_manager
            .load_resolver_config()
            .map_err(|e| ApiError::ConfigError(e.to_string()))?;

        Ok(Self::new(CarrierRuleRepositories::from_connection(conn), config))
    }

    pub fn resolver(&self) -> &CarrierRuleResolver {
        &self.resolver
    }

    // ==========================================
    // 拖车判定
    // ==========================================

    /// 是否收取拖车费
    ///
    /// # 参数
    /// - category: 车辆类别（支持同义词）
    /// - item_id: 货物行ID
    pub fn should_apply_towing(&self, category: &str, item_id: i64) -> ApiResult<bool> {
        let category = parse_category(category)?;
        validate_id("货物行ID", item_id)?;
        Ok(self.resolver.should_apply_towing(category, item_id)?)
    }

    /// 拖车判定（含原因与检查过的货物行）
    pub fn explain_towing(&self, category: &str, item_id: i64) -> ApiResult<TowingDecision> {
        let category = parse_category(category)?;
        validate_id("货物行ID", item_id)?;
        Ok(self.resolver.explain_towing(category, item_id)?)
    }

    // ==========================================
    // 运价查找
    // ==========================================

    /// 当前有效采购运价
    ///
    /// # 返回
    /// - Ok(Some(TariffResolution)): 命中
    /// - Ok(None): 无映射或无有效运价
    pub fn resolve_active_tariff(
        &self,
        carrier_id: i64,
        port_id: i64,
        category: &str,
        today: &str,
    ) -> ApiResult<Option<TariffResolution>> {
        validate_id("承运商ID", carrier_id)?;
        validate_id("港口ID", port_id)?;
        let category = parse_category(category)?;
        let today = parse_date(today)?;

        Ok(self
            .resolver
            .tariff_lookup()
            .resolve_active_tariff(carrier_id, port_id, category, today)?)
    }

    /// 物料映射的 PDF 报表类别
    pub fn determine_pdf_category(&self, mapping_id: i64) -> ApiResult<Option<PdfCategory>> {
        validate_id("物料映射ID", mapping_id)?;

        let mapping = self
            .repos
            .tariff_repo
            .find_mapping(mapping_id)?
            .ok_or_else(|| ApiError::NotFound(format!("物料映射(id={})不存在", mapping_id)))?;

        Ok(self.resolver.tariff_lookup().determine_pdf_category(&mapping)?)
    }

    // ==========================================
    // 报价单解析
    // ==========================================

    /// 解析报价单并写回货物行元数据
    pub fn resolve_quotation(&self, quotation_id: i64, today: &str) -> ApiResult<QuotationResolution> {
        validate_id("报价单ID", quotation_id)?;
        let today = parse_date(today)?;
        Ok(self.resolver.resolve_quotation(quotation_id, today)?)
    }

    /// 解析报价单（只读）
    pub fn explain_quotation(&self, quotation_id: i64, today: &str) -> ApiResult<QuotationResolution> {
        validate_id("报价单ID", quotation_id)?;
        let today = parse_date(today)?;
        Ok(self.resolver.explain_quotation(quotation_id, today)?)
    }

    /// 解析单个货物行（只读）
    pub fn resolve_item(&self, item_id: i64, today: &str) -> ApiResult<ItemResolution> {
        validate_id("货物行ID", item_id)?;
        let today = parse_date(today)?;
        Ok(self.resolver.resolve_item(item_id, today)?)
    }

    // ==========================================
    // 审计
    // ==========================================

    pub fn audit_carrier(&self, carrier_id: i64, today: &str) -> ApiResult<AuditReport> {
        validate_id("承运商ID", carrier_id)?;
        let today = parse_date(today)?;
        Ok(self.audit_engine.audit_carrier(carrier_id, today)?)
    }

    pub fn audit_quotation(&self, quotation_id: i64, today: &str) -> ApiResult<AuditReport> {
        validate_id("报价单ID", quotation_id)?;
        let today = parse_date(today)?;
        Ok(self.audit_engine.audit_quotation(quotation_id, today)?)
    }
}

// ==========================================
// 输入校验
// ==========================================

fn validate_id(label: &str, id: i64) -> ApiResult<()> {
    if id <= 0 {
        return Err(ApiError::InvalidInput(format!("{}必须为正整数: {}", label, id)));
    }
    Ok(())
}

fn parse_category(raw: &str) -> ApiResult<VehicleCategory> {
    if raw.trim().is_empty() {
        return Err(ApiError::InvalidInput("车辆类别不能为空".to_string()));
    }
    VehicleCategory::parse(raw).ok_or_else(|| ApiError::InvalidInput(format!("未知车辆类别: {}", raw)))
}

fn parse_date(raw: &str) -> ApiResult<NaiveDate> {
    if raw.trim().is_empty() {
        return Err(ApiError::InvalidInput("日期不能为空".to_string()));
    }
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|e| ApiError::InvalidInput(format!("日期格式错误（应为 YYYY-MM-DD）: {} ({})", raw, e)))
}

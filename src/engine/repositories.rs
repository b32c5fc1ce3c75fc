// ==========================================
// RoRo 承运商规则核心 - 引擎层仓储聚合
// ==========================================
// 职责: 聚合规则解析与审计所需的所有 Repository
// 目标: 解析器/审计引擎/API 共享同一组仓储（同一数据库连接）
// ==========================================

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::repository::{
    CarrierRepository, CarrierRuleRepository, CommodityItemRepository, QuotationRepository,
    RepositoryResult, TariffRepository,
};

/// 承运商规则仓储集合
///
/// # 包含的仓储
/// - `carrier_repo`: 承运商、港口、分组、物料
/// - `tariff_repo`: 物料映射与采购运价
/// - `rule_repo`: 承运/转换/附加费规则
/// - `quotation_repo`: 报价单
/// - `commodity_repo`: 货物行
#[derive(Clone)]
pub struct CarrierRuleRepositories {
    pub carrier_repo: Arc<CarrierRepository>,
    pub tariff_repo: Arc<TariffRepository>,
    pub rule_repo: Arc<CarrierRuleRepository>,
    pub quotation_repo: Arc<QuotationRepository>,
    pub commodity_repo: Arc<CommodityItemRepository>,
}

impl CarrierRuleRepositories {
    pub fn new(
        carrier_repo: Arc<CarrierRepository>,
        tariff_repo: Arc<TariffRepository>,
        rule_repo: Arc<CarrierRuleRepository>,
        quotation_repo: Arc<QuotationRepository>,
        commodity_repo: Arc<CommodityItemRepository>,
    ) -> Self {
        Self {
            carrier_repo,
            tariff_repo,
            rule_repo,
            quotation_repo,
            commodity_repo,
        }
    }

    /// 基于同一连接创建全部仓储
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self::new(
            Arc::new(CarrierRepository::from_connection(conn.clone())),
            Arc::new(TariffRepository::from_connection(conn.clone())),
            Arc::new(CarrierRuleRepository::from_connection(conn.clone())),
            Arc::new(QuotationRepository::from_connection(conn.clone())),
            Arc::new(CommodityItemRepository::from_connection(conn)),
        )
    }

    /// 打开数据库并创建全部仓储
    pub fn open(db_path: &str) -> RepositoryResult<Self> {
        let conn = crate::db::open_sqlite_connection(db_path)?;
        Ok(Self::from_connection(Arc::new(Mutex::new(conn))))
    }
}

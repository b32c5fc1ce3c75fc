// ==========================================
// RoRo 承运商规则核心 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod carrier_repo;
pub mod carrier_rule_repo;
pub mod commodity_repo;
pub mod error;
pub mod quotation_repo;
pub mod row_codec;
pub mod tariff_repo;

// 重导出核心仓储
pub use carrier_repo::CarrierRepository;
pub use carrier_rule_repo::CarrierRuleRepository;
pub use commodity_repo::CommodityItemRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use quotation_repo::QuotationRepository;
pub use tariff_repo::TariffRepository;

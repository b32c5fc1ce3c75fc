// ==========================================
// RoRo 承运商规则核心 - API 层
// ==========================================
// 职责: 提供业务 API 接口，供命令行工具与上层服务调用
// ==========================================

pub mod carrier_rule_api;
pub mod error;

// 重导出核心类型
pub use carrier_rule_api::CarrierRuleApi;
pub use error::{ApiError, ApiResult};

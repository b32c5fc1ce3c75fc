// ==========================================
// RoRo 承运商规则核心 - 报价单
// ==========================================
// 职责: 报价单头及所选船期（承运商 + 目的港 + 船舶）
// ==========================================

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quotation {
    pub id: i64,
    pub reference: String,
    pub carrier_id: Option<i64>,
    pub pod_port_id: Option<i64>, // 目的港 (POD)
    pub vessel_name: Option<String>,
    pub vessel_class: Option<String>,
}

/// 所选船期
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectedSchedule {
    pub carrier_id: i64,
    pub port_id: i64,
    pub vessel_name: Option<String>,
    pub vessel_class: Option<String>,
}

impl Quotation {
    /// 报价单尚未选定承运商或目的港时返回 None
    pub fn selected_schedule(&self) -> Option<SelectedSchedule> {
        Some(SelectedSchedule {
            carrier_id: self.carrier_id?,
            port_id: self.pod_port_id?,
            vessel_name: self.vessel_name.clone(),
            vessel_class: self.vessel_class.clone(),
        })
    }
}

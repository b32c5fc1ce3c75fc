// ==========================================
// RoRo 承运商规则核心 - 行字段编解码
// ==========================================
// 职责: JSON 列表列、日期列、适用范围列的统一读写
// 说明: 列内容损坏时按空值处理并告警，不中断整批读取
// ==========================================

use crate::domain::rule::{EffectiveWindow, RuleScope};
use chrono::NaiveDate;
use rusqlite::Row;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// 规则/映射表共用的适用范围列（顺序固定）
pub const SCOPE_COLUMNS: &str =
    "port_ids, port_group_ids, vehicle_categories, category_group_ids, vessel_names, vessel_classes";

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// 解析 JSON 数组列
pub fn json_list<T: DeserializeOwned>(column: &str, raw: Option<String>) -> Vec<T> {
    let raw = match raw {
        Some(r) if !r.trim().is_empty() => r,
        _ => return Vec::new(),
    };
    match serde_json::from_str::<Vec<T>>(&raw) {
        Ok(list) => list,
        Err(e) => {
            tracing::warn!(column, raw = %raw, error = %e, "JSON 列表列解析失败，按空列表处理");
            Vec::new()
        }
    }
}

/// 序列化 JSON 数组列
pub fn to_json_list<T: Serialize>(list: &[T]) -> String {
    serde_json::to_string(list).unwrap_or_else(|_| "[]".to_string())
}

/// 解析可选日期列
pub fn parse_date_opt(raw: Option<String>) -> Option<NaiveDate> {
    raw.and_then(|s| NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).ok())
}

pub fn format_date_opt(date: Option<NaiveDate>) -> Option<String> {
    date.map(|d| d.format(DATE_FORMAT).to_string())
}

/// 从 offset 起读取 6 个适用范围列
pub fn read_scope(row: &Row<'_>, offset: usize) -> rusqlite::Result<RuleScope> {
    Ok(RuleScope {
        port_ids: json_list("port_ids", row.get(offset)?),
        port_group_ids: json_list("port_group_ids", row.get(offset + 1)?),
        vehicle_categories: json_list("vehicle_categories", row.get(offset + 2)?),
        category_group_ids: json_list("category_group_ids", row.get(offset + 3)?),
        vessel_names: json_list("vessel_names", row.get(offset + 4)?),
        vessel_classes: json_list("vessel_classes", row.get(offset + 5)?),
    })
}

/// 适用范围列的写入值（与 SCOPE_COLUMNS 顺序一致）
pub fn scope_values(scope: &RuleScope) -> [String; 6] {
    [
        to_json_list(&scope.port_ids),
        to_json_list(&scope.port_group_ids),
        to_json_list(&scope.vehicle_categories),
        to_json_list(&scope.category_group_ids),
        to_json_list(&scope.vessel_names),
        to_json_list(&scope.vessel_classes),
    ]
}

/// 从 offset 起读取 effective_from, effective_to, is_active
pub fn read_window(row: &Row<'_>, offset: usize) -> rusqlite::Result<EffectiveWindow> {
    Ok(EffectiveWindow {
        effective_from: parse_date_opt(row.get(offset)?),
        effective_to: parse_date_opt(row.get(offset + 1)?),
        is_active: row.get(offset + 2)?,
    })
}

/// id <= 0 时交给 SQLite 自动分配
pub fn id_param(id: i64) -> Option<i64> {
    if id > 0 {
        Some(id)
    } else {
        None
    }
}

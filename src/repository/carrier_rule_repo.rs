// ==========================================
// RoRo 承运商规则核心 - 承运商规则仓储
// ==========================================
// 红线: Repository 不含业务逻辑（匹配与排序由 RuleMatcher 负责）
// 表: carrier_acceptance_rule / carrier_transform_rule / carrier_surcharge_rule
// 公共列顺序: id, carrier_id, name, <SCOPE_COLUMNS>, effective_from, effective_to,
//             is_active, priority, sort_order（共 14 列），其后为各规则自有列
// ==========================================

use crate::domain::rule::{AcceptanceRule, RuleHeader, SurchargeRule, TransformRule};
use crate::domain::types::{QuantityMode, SurchargeCalcMode};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::row_codec::{
    format_date_opt, id_param, read_scope, read_window, scope_values, SCOPE_COLUMNS,
};
use rusqlite::{params, Connection, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

const HEADER_COLUMN_COUNT: usize = 14;

fn header_columns() -> String {
    format!(
        "id, carrier_id, name, {}, effective_from, effective_to, is_active, priority, sort_order",
        SCOPE_COLUMNS
    )
}

fn read_header(row: &Row<'_>) -> rusqlite::Result<RuleHeader> {
    Ok(RuleHeader {
        id: row.get(0)?,
        carrier_id: row.get(1)?,
        name: row.get(2)?,
        scope: read_scope(row, 3)?,
        window: read_window(row, 9)?,
        priority: row.get(12)?,
        sort_order: row.get(13)?,
    })
}

// ==========================================
// CarrierRuleRepository - 承运商规则仓储
// ==========================================
pub struct CarrierRuleRepository {
    conn: Arc<Mutex<Connection>>,
}

impl CarrierRuleRepository {
    /// 创建新的 CarrierRuleRepository 实例
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = crate::db::open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 写入规则公共列 + 自有列
    fn insert_rule(
        &self,
        table: &str,
        header: &RuleHeader,
        extra_columns: &[&str],
        extra_values: &[&dyn rusqlite::ToSql],
    ) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let [ports, port_groups, categories, category_groups, vessels, vessel_classes] =
            scope_values(&header.scope);
        let id = id_param(header.id);
        let from = format_date_opt(header.window.effective_from);
        let to = format_date_opt(header.window.effective_to);

        let header_values: [&dyn rusqlite::ToSql; HEADER_COLUMN_COUNT] = [
            &id,
            &header.carrier_id,
            &header.name,
            &ports,
            &port_groups,
            &categories,
            &category_groups,
            &vessels,
            &vessel_classes,
            &from,
            &to,
            &header.window.is_active,
            &header.priority,
            &header.sort_order,
        ];
        let mut values: Vec<&dyn rusqlite::ToSql> = header_values.to_vec();
        values.extend_from_slice(extra_values);

        let placeholders: Vec<String> = (1..=values.len()).map(|i| format!("?{}", i)).collect();
        let mut columns = header_columns();
        for col in extra_columns {
            columns.push_str(", ");
            columns.push_str(col);
        }

        conn.execute(
            &format!(
                "INSERT INTO {} ({}) VALUES ({})",
                table,
                columns,
                placeholders.join(", ")
            ),
            values.as_slice(),
        )?;
        Ok(conn.last_insert_rowid())
    }

    // ===== 接收规则 =====

    pub fn insert_acceptance_rule(&self, rule: &AcceptanceRule) -> RepositoryResult<i64> {
        self.insert_rule(
            "carrier_acceptance_rule",
            &rule.header,
            &[
                "is_accepted",
                "min_length_cm",
                "max_length_cm",
                "min_width_cm",
                "max_width_cm",
                "min_height_cm",
                "max_height_cm",
                "max_weight_kg",
                "must_be_empty",
                "must_be_self_propelled",
            ],
            &[
                &rule.is_accepted,
                &rule.min_length_cm,
                &rule.max_length_cm,
                &rule.min_width_cm,
                &rule.max_width_cm,
                &rule.min_height_cm,
                &rule.max_height_cm,
                &rule.max_weight_kg,
                &rule.must_be_empty,
                &rule.must_be_self_propelled,
            ],
        )
    }

    pub fn find_acceptance_rules(&self, carrier_id: i64) -> RepositoryResult<Vec<AcceptanceRule>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            r#"
            SELECT {},
                is_accepted, min_length_cm, max_length_cm, min_width_cm, max_width_cm,
                min_height_cm, max_height_cm, max_weight_kg, must_be_empty, must_be_self_propelled
            FROM carrier_acceptance_rule
            WHERE carrier_id = ?1
            "#,
            header_columns()
        ))?;

        let n = HEADER_COLUMN_COUNT;
        let rules = stmt
            .query_map(params![carrier_id], |row| {
                Ok(AcceptanceRule {
                    header: read_header(row)?,
                    is_accepted: row.get(n)?,
                    min_length_cm: row.get(n + 1)?,
                    max_length_cm: row.get(n + 2)?,
                    min_width_cm: row.get(n + 3)?,
                    max_width_cm: row.get(n + 4)?,
                    min_height_cm: row.get(n + 5)?,
                    max_height_cm: row.get(n + 6)?,
                    max_weight_kg: row.get(n + 7)?,
                    must_be_empty: row.get(n + 8)?,
                    must_be_self_propelled: row.get(n + 9)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(rules)
    }

    // ===== 转换规则 =====

    pub fn insert_transform_rule(&self, rule: &TransformRule) -> RepositoryResult<i64> {
        let params_json = serde_json::to_string(&rule.params)?;
        self.insert_rule(
            "carrier_transform_rule",
            &rule.header,
            &["transform_code", "params_json"],
            &[&rule.transform_code, &params_json],
        )
    }

    pub fn find_transform_rules(&self, carrier_id: i64) -> RepositoryResult<Vec<TransformRule>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {}, transform_code, params_json FROM carrier_transform_rule WHERE carrier_id = ?1",
            header_columns()
        ))?;

        let n = HEADER_COLUMN_COUNT;
        let rows = stmt
            .query_map(params![carrier_id], |row| {
                Ok((read_header(row)?, row.get::<_, String>(n)?, row.get::<_, String>(n + 1)?))
            })?
            .collect::<SqliteResult<Vec<_>>>()?;

        let mut rules = Vec::with_capacity(rows.len());
        for (header, transform_code, params_raw) in rows {
            let params = match serde_json::from_str(&params_raw) {
                Ok(v) => v,
                Err(e) => {
                    tracing::warn!(rule_id = header.id, error = %e, "转换规则参数解析失败，按空参数处理");
                    serde_json::Value::Object(Default::default())
                }
            };
            rules.push(TransformRule {
                header,
                transform_code,
                params,
            });
        }
        Ok(rules)
    }

    // ===== 附加费规则 =====

    pub fn insert_surcharge_rule(&self, rule: &SurchargeRule) -> RepositoryResult<i64> {
        let calc_mode = rule.calc_mode.as_str();
        let quantity_mode = rule.quantity_mode.as_str();
        self.insert_rule(
            "carrier_surcharge_rule",
            &rule.header,
            &[
                "event_code",
                "calc_mode",
                "amount",
                "article_id",
                "quantity_mode",
                "min_length_cm",
                "min_width_cm",
                "min_height_cm",
                "min_weight_kg",
            ],
            &[
                &rule.event_code,
                &calc_mode,
                &rule.amount,
                &rule.article_id,
                &quantity_mode,
                &rule.min_length_cm,
                &rule.min_width_cm,
                &rule.min_height_cm,
                &rule.min_weight_kg,
            ],
        )
    }

    /// 查询承运商的附加费规则
    ///
    /// calc_mode / quantity_mode 无法识别的规则会被跳过并告警
    pub fn find_surcharge_rules(&self, carrier_id: i64) -> RepositoryResult<Vec<SurchargeRule>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            r#"
            SELECT {},
                event_code, calc_mode, amount, article_id, quantity_mode,
                min_length_cm, min_width_cm, min_height_cm, min_weight_kg
            FROM carrier_surcharge_rule
            WHERE carrier_id = ?1
            "#,
            header_columns()
        ))?;

        let n = HEADER_COLUMN_COUNT;
        let rows = stmt
            .query_map(params![carrier_id], |row| {
                Ok((
                    read_header(row)?,
                    row.get::<_, String>(n)?,
                    row.get::<_, String>(n + 1)?,
                    row.get::<_, f64>(n + 2)?,
                    row.get::<_, Option<i64>>(n + 3)?,
                    row.get::<_, String>(n + 4)?,
                    [
                        row.get::<_, Option<f64>>(n + 5)?,
                        row.get::<_, Option<f64>>(n + 6)?,
                        row.get::<_, Option<f64>>(n + 7)?,
                        row.get::<_, Option<f64>>(n + 8)?,
                    ],
                ))
            })?
            .collect::<SqliteResult<Vec<_>>>()?;

        let mut rules = Vec::with_capacity(rows.len());
        for (header, event_code, calc_raw, amount, article_id, qty_raw, thresholds) in rows {
            let (calc_mode, quantity_mode) =
                match (SurchargeCalcMode::parse(&calc_raw), QuantityMode::parse(&qty_raw)) {
                    (Some(c), Some(q)) => (c, q),
                    _ => {
                        tracing::warn!(
                            rule_id = header.id,
                            calc_mode = %calc_raw,
                            quantity_mode = %qty_raw,
                            "附加费规则计算方式无法识别，已跳过"
                        );
                        continue;
                    }
                };
            let [min_length_cm, min_width_cm, min_height_cm, min_weight_kg] = thresholds;
            rules.push(SurchargeRule {
                header,
                event_code,
                calc_mode,
                amount,
                article_id,
                quantity_mode,
                min_length_cm,
                min_width_cm,
                min_height_cm,
                min_weight_kg,
            });
        }
        Ok(rules)
    }
}

// ==========================================
// RoRo 承运商规则核心 - 物料映射 / 采购运价仓储
// ==========================================
// 红线: Repository 不含业务逻辑（选择哪条运价由 TariffLookup 决定）
// 表: carrier_article_mapping / carrier_purchase_tariff(+component)
// ==========================================

use crate::domain::tariff::{CarrierArticleMapping, CarrierPurchaseTariff, TariffCharge};
use crate::domain::types::{ChargeUnit, TariffComponent};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::row_codec::{
    format_date_opt, id_param, parse_date_opt, read_scope, scope_values, DATE_FORMAT, SCOPE_COLUMNS,
};
use chrono::NaiveDate;
use rusqlite::{params, Connection, Result as SqliteResult};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

// ==========================================
// TariffRepository - 物料映射与运价仓储
// ==========================================
pub struct TariffRepository {
    conn: Arc<Mutex<Connection>>,
}

impl TariffRepository {
    /// 创建新的 TariffRepository 实例
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

    // ===== 物料映射 =====

    pub fn insert_mapping(&self, mapping: &CarrierArticleMapping) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let [ports, port_groups, categories, category_groups, vessels, vessel_classes] =
            scope_values(&mapping.scope);
        conn.execute(
            &format!(
                "INSERT INTO carrier_article_mapping (id, carrier_id, article_id, name, {}, is_active, sort_order)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                SCOPE_COLUMNS
            ),
            params![
                id_param(mapping.id),
                mapping.carrier_id,
                mapping.article_id,
                mapping.name,
                ports,
                port_groups,
                categories,
                category_groups,
                vessels,
                vessel_classes,
                mapping.is_active,
                mapping.sort_order,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// 查询承运商的物料映射
    ///
    /// # 参数
    /// - carrier_id: 承运商ID
    /// - active_only: 是否只返回启用的映射
    pub fn find_mappings_by_carrier(
        &self,
        carrier_id: i64,
        active_only: bool,
    ) -> RepositoryResult<Vec<CarrierArticleMapping>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            r#"
            SELECT id, carrier_id, article_id, name, {}, is_active, sort_order
            FROM carrier_article_mapping
            WHERE carrier_id = ?1 AND (?2 = 0 OR is_active = 1)
            ORDER BY sort_order ASC, id ASC
            "#,
            SCOPE_COLUMNS
        ))?;

        let mappings = stmt
            .query_map(params![carrier_id, active_only], map_mapping_row)?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(mappings)
    }

    pub fn find_mapping(&self, mapping_id: i64) -> RepositoryResult<Option<CarrierArticleMapping>> {
        let conn = self.get_conn()?;
        let result = conn.query_row(
            &format!(
                "SELECT id, carrier_id, article_id, name, {}, is_active, sort_order
                 FROM carrier_article_mapping WHERE id = ?1",
                SCOPE_COLUMNS
            ),
            params![mapping_id],
            map_mapping_row,
        );

        match result {
            Ok(mapping) => Ok(Some(mapping)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    // ===== 采购运价 =====

    /// 追加一条采购运价（含费用项）
    pub fn insert_tariff(&self, tariff: &CarrierPurchaseTariff) -> RepositoryResult<i64> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        tx.execute(
            r#"
            INSERT INTO carrier_purchase_tariff (
                id, mapping_id, effective_from, effective_to, is_active, sort_order, currency
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                id_param(tariff.id),
                tariff.mapping_id,
                tariff.effective_from.format(DATE_FORMAT).to_string(),
                format_date_opt(tariff.effective_to),
                tariff.is_active,
                tariff.sort_order,
                tariff.currency,
            ],
        )?;
        let tariff_id = tx.last_insert_rowid();
        {
            let mut stmt = tx.prepare(
                "INSERT INTO carrier_purchase_tariff_component (tariff_id, component, amount, unit)
                 VALUES (?1, ?2, ?3, ?4)",
            )?;
            for (component, charge) in &tariff.components {
                stmt.execute(params![tariff_id, component.as_str(), charge.amount, charge.unit.as_str()])?;
            }
        }
        tx.commit()?;
        Ok(tariff_id)
    }

    /// 查询一组映射下的全部运价（含费用项，不做生效过滤）
    pub fn find_tariffs_by_mappings(&self, mapping_ids: &[i64]) -> RepositoryResult<Vec<CarrierPurchaseTariff>> {
        let conn = self.get_conn()?;
        let mut tariff_stmt = conn.prepare(
            r#"
            SELECT id, mapping_id, effective_from, effective_to, is_active, sort_order, currency
            FROM carrier_purchase_tariff
            WHERE mapping_id = ?1
            ORDER BY effective_from DESC, sort_order ASC, id ASC
            "#,
        )?;
        let mut component_stmt = conn.prepare(
            "SELECT component, amount, unit FROM carrier_purchase_tariff_component WHERE tariff_id = ?1",
        )?;

        let mut tariffs = Vec::new();
        for mapping_id in mapping_ids {
            let rows = tariff_stmt
                .query_map(params![mapping_id], |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, Option<String>>(3)?,
                        row.get::<_, bool>(4)?,
                        row.get::<_, i32>(5)?,
                        row.get::<_, String>(6)?,
                    ))
                })?
                .collect::<SqliteResult<Vec<_>>>()?;

            for (id, mapping_id, from_raw, to_raw, is_active, sort_order, currency) in rows {
                let effective_from = NaiveDate::parse_from_str(&from_raw, DATE_FORMAT).map_err(|e| {
                    RepositoryError::FieldValueError {
                        field: format!("carrier_purchase_tariff[{}].effective_from", id),
                        message: e.to_string(),
                    }
                })?;

                let components = component_stmt
                    .query_map(params![id], |row| {
                        Ok((
                            row.get::<_, String>(0)?,
                            row.get::<_, f64>(1)?,
                            row.get::<_, String>(2)?,
                        ))
                    })?
                    .collect::<SqliteResult<Vec<_>>>()?;

                let mut charges = BTreeMap::new();
                for (component_raw, amount, unit_raw) in components {
                    match (TariffComponent::parse(&component_raw), ChargeUnit::parse(&unit_raw)) {
                        (Some(component), Some(unit)) => {
                            charges.insert(component, TariffCharge { amount, unit });
                        }
                        _ => tracing::warn!(
                            tariff_id = id,
                            component = %component_raw,
                            unit = %unit_raw,
                            "未知运价费用项或单位，已忽略"
                        ),
                    }
                }

                tariffs.push(CarrierPurchaseTariff {
                    id,
                    mapping_id,
                    effective_from,
                    effective_to: parse_date_opt(to_raw),
                    is_active,
                    sort_order,
                    currency,
                    components: charges,
                });
            }
        }

        Ok(tariffs)
    }

    /// 停用运价（过渡期人工处理重叠时使用）
    pub fn deactivate_tariff(&self, tariff_id: i64) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE carrier_purchase_tariff SET is_active = 0 WHERE id = ?1",
            params![tariff_id],
        )?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "carrier_purchase_tariff".to_string(),
                id: tariff_id.to_string(),
            });
        }
        Ok(())
    }
}

fn map_mapping_row(row: &rusqlite::Row<'_>) -> SqliteResult<CarrierArticleMapping> {
    Ok(CarrierArticleMapping {
        id: row.get(0)?,
        carrier_id: row.get(1)?,
        article_id: row.get(2)?,
        name: row.get(3)?,
        scope: read_scope(row, 4)?,
        is_active: row.get(10)?,
        sort_order: row.get(11)?,
    })
}

// ==========================================
// RoRo 承运商规则核心 - 货物行仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 表: commodity_item
// 说明: 同一报价单的 carrier_rule_meta 在一个事务内整体写回
// ==========================================

use crate::domain::commodity::{CarrierRuleMeta, CommodityItem};
use crate::domain::types::RelationshipType;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::row_codec::id_param;
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

const ITEM_COLUMNS: &str = r#"
    id, quotation_id, line_number, category, quantity,
    relationship_type, related_item_id,
    length_cm, width_cm, height_cm, weight_kg, is_empty, is_self_propelled,
    carrier_rule_meta
"#;

fn map_item(row: &Row<'_>) -> rusqlite::Result<CommodityItem> {
    let id: i64 = row.get(0)?;
    let relationship_raw: String = row.get(5)?;
    let relationship_type = RelationshipType::parse(&relationship_raw).unwrap_or_else(|| {
        tracing::warn!(item_id = id, relationship_type = %relationship_raw, "未知组合关系，按 separate 处理");
        RelationshipType::Separate
    });

    let meta_raw: Option<String> = row.get(13)?;
    let carrier_rule_meta = meta_raw.and_then(|raw| match serde_json::from_str::<CarrierRuleMeta>(&raw) {
        Ok(meta) => Some(meta),
        Err(e) => {
            tracing::warn!(item_id = id, error = %e, "carrier_rule_meta 解析失败，已忽略");
            None
        }
    });

    Ok(CommodityItem {
        id,
        quotation_id: row.get(1)?,
        line_number: row.get(2)?,
        category: row.get(3)?,
        quantity: row.get(4)?,
        relationship_type,
        related_item_id: row.get(6)?,
        length_cm: row.get(7)?,
        width_cm: row.get(8)?,
        height_cm: row.get(9)?,
        weight_kg: row.get(10)?,
        is_empty: row.get(11)?,
        is_self_propelled: row.get(12)?,
        carrier_rule_meta,
    })
}

// ==========================================
// CommodityItemRepository - 货物行仓储
// ==========================================
pub struct CommodityItemRepository {
    conn: Arc<Mutex<Connection>>,
}

impl CommodityItemRepository {
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = crate::db::open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 写入货物行
    pub fn insert(&self, item: &CommodityItem) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let meta = match &item.carrier_rule_meta {
            Some(m) => Some(serde_json::to_string(m)?),
            None => None,
        };
        conn.execute(
            &format!("INSERT INTO commodity_item ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)", ITEM_COLUMNS),
            params![
                id_param(item.id),
                item.quotation_id,
                item.line_number,
                item.category,
                item.quantity,
                item.relationship_type.as_str(),
                item.related_item_id,
                item.length_cm,
                item.width_cm,
                item.height_cm,
                item.weight_kg,
                item.is_empty,
                item.is_self_propelled,
                meta,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn find_by_id(&self, item_id: i64) -> RepositoryResult<Option<CommodityItem>> {
        let conn = self.get_conn()?;
        let item = conn
            .query_row(
                &format!("SELECT {} FROM commodity_item WHERE id = ?1", ITEM_COLUMNS),
                params![item_id],
                map_item,
            )
            .optional()?;
        Ok(item)
    }

    /// 查询报价单的全部货物行（按行号排序）
    pub fn find_by_quotation(&self, quotation_id: i64) -> RepositoryResult<Vec<CommodityItem>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM commodity_item WHERE quotation_id = ?1 ORDER BY line_number ASC, id ASC",
            ITEM_COLUMNS
        ))?;
        let items = stmt
            .query_map(params![quotation_id], map_item)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(items)
    }

    /// 更新组合关系（货物组成变化时调用）
    pub fn update_relationship(
        &self,
        item_id: i64,
        relationship_type: RelationshipType,
        related_item_id: Option<i64>,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE commodity_item SET relationship_type = ?1, related_item_id = ?2 WHERE id = ?3",
            params![relationship_type.as_str(), related_item_id, item_id],
        )?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "commodity_item".to_string(),
                id: item_id.to_string(),
            });
        }
        Ok(())
    }

    /// 批量写入规则解析缓存（单事务，任一行失败则全部回滚）
    pub fn update_carrier_rule_meta_batch(&self, updates: &[(i64, Option<&CarrierRuleMeta>)]) -> RepositoryResult<()> {
        let mut encoded = Vec::with_capacity(updates.len());
        for (item_id, meta) in updates {
            let raw = match meta {
                Some(m) => Some(serde_json::to_string(m)?),
                None => None,
            };
            encoded.push((*item_id, raw));
        }

        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare("UPDATE commodity_item SET carrier_rule_meta = ?1 WHERE id = ?2")?;
            for (item_id, raw) in &encoded {
                if stmt.execute(params![raw, item_id])? == 0 {
                    return Err(RepositoryError::NotFound {
                        entity: "commodity_item".to_string(),
                        id: item_id.to_string(),
                    });
                }
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// 写入规则解析缓存（None 表示清空）
    pub fn update_carrier_rule_meta(&self, item_id: i64, meta: Option<&CarrierRuleMeta>) -> RepositoryResult<()> {
        let raw = match meta {
            Some(m) => Some(serde_json::to_string(m)?),
            None => None,
        };
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE commodity_item SET carrier_rule_meta = ?1 WHERE id = ?2",
            params![raw, item_id],
        )?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "commodity_item".to_string(),
                id: item_id.to_string(),
            });
        }
        Ok(())
    }
}

// ==========================================
// RoRo 承运商规则核心 - 报价单仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 表: quotation（删除时级联删除 commodity_item）
// ==========================================

use crate::domain::quotation::Quotation;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::row_codec::id_param;
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

pub struct QuotationRepository {
    conn: Arc<Mutex<Connection>>,
}

impl QuotationRepository {
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

    pub fn insert(&self, quotation: &Quotation) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO quotation (id, reference, carrier_id, pod_port_id, vessel_name, vessel_class)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                id_param(quotation.id),
                quotation.reference,
                quotation.carrier_id,
                quotation.pod_port_id,
                quotation.vessel_name,
                quotation.vessel_class,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn find_by_id(&self, quotation_id: i64) -> RepositoryResult<Option<Quotation>> {
        let conn = self.get_conn()?;
        let quotation = conn
            .query_row(
                r#"
                SELECT id, reference, carrier_id, pod_port_id, vessel_name, vessel_class
                FROM quotation WHERE id = ?1
                "#,
                params![quotation_id],
                |row| {
                    Ok(Quotation {
                        id: row.get(0)?,
                        reference: row.get(1)?,
                        carrier_id: row.get(2)?,
                        pod_port_id: row.get(3)?,
                        vessel_name: row.get(4)?,
                        vessel_class: row.get(5)?,
                    })
                },
            )
            .optional()?;
        Ok(quotation)
    }

    /// 更新所选船期（承运商/目的港为空表示未选定）
    pub fn update_schedule(
        &self,
        quotation_id: i64,
        carrier_id: Option<i64>,
        pod_port_id: Option<i64>,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE quotation SET carrier_id = ?1, pod_port_id = ?2 WHERE id = ?3",
            params![carrier_id, pod_port_id, quotation_id],
        )?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "quotation".to_string(),
                id: quotation_id.to_string(),
            });
        }
        Ok(())
    }

    /// 删除报价单（货物行级联删除）
    pub fn delete(&self, quotation_id: i64) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let affected = conn.execute("DELETE FROM quotation WHERE id = ?1", params![quotation_id])?;
        Ok(affected)
    }
}

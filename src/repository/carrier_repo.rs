// ==========================================
// RoRo 承运商规则核心 - 承运商主数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 表: carrier / port / carrier_port_group(+member) /
//     carrier_category_group(+member) / article
// ==========================================

use crate::domain::carrier::{Article, Carrier, CarrierCategoryGroup, CarrierPortGroup, Port};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::row_codec::id_param;
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

// ==========================================
// CarrierRepository - 承运商主数据仓储
// ==========================================
pub struct CarrierRepository {
    conn: Arc<Mutex<Connection>>,
}

impl CarrierRepository {
    /// 创建新的 CarrierRepository 实例
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

    // ===== 承运商 =====

    pub fn insert_carrier(&self, carrier: &Carrier) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO carrier (id, code, name) VALUES (?1, ?2, ?3)",
            params![id_param(carrier.id), carrier.code, carrier.name],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn find_carrier(&self, carrier_id: i64) -> RepositoryResult<Option<Carrier>> {
        let conn = self.get_conn()?;
        let carrier = conn
            .query_row(
                "SELECT id, code, name FROM carrier WHERE id = ?1",
                params![carrier_id],
                |row| {
                    Ok(Carrier {
                        id: row.get(0)?,
                        code: row.get(1)?,
                        name: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(carrier)
    }

    // ===== 港口 =====

    pub fn insert_port(&self, port: &Port) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO port (id, code, name, country_code) VALUES (?1, ?2, ?3, ?4)",
            params![id_param(port.id), port.code, port.name, port.country_code],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn find_port(&self, port_id: i64) -> RepositoryResult<Option<Port>> {
        let conn = self.get_conn()?;
        let port = conn
            .query_row(
                "SELECT id, code, name, country_code FROM port WHERE id = ?1",
                params![port_id],
                |row| {
                    Ok(Port {
                        id: row.get(0)?,
                        code: row.get(1)?,
                        name: row.get(2)?,
                        country_code: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(port)
    }

    /// 批量查询存在的港口ID（审计引用校验使用）
    pub fn existing_port_ids(&self, port_ids: &[i64]) -> RepositoryResult<Vec<i64>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare("SELECT 1 FROM port WHERE id = ?1")?;
        let mut found = Vec::new();
        for id in port_ids {
            if stmt.exists(params![id])? {
                found.push(*id);
            }
        }
        Ok(found)
    }

    // ===== 港口组 =====

    /// 写入港口组及成员
    pub fn insert_port_group(&self, group: &CarrierPortGroup) -> RepositoryResult<i64> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO carrier_port_group (id, carrier_id, code, name) VALUES (?1, ?2, ?3, ?4)",
            params![id_param(group.id), group.carrier_id, group.code, group.name],
        )?;
        let group_id = tx.last_insert_rowid();
        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO carrier_port_group_member (group_id, port_id) VALUES (?1, ?2)",
            )?;
            for port_id in &group.port_ids {
                stmt.execute(params![group_id, port_id])?;
            }
        }
        tx.commit()?;
        Ok(group_id)
    }

    /// 查询承运商的全部港口组（含成员）
    pub fn find_port_groups_by_carrier(&self, carrier_id: i64) -> RepositoryResult<Vec<CarrierPortGroup>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT g.id, g.carrier_id, g.code, g.name, m.port_id
            FROM carrier_port_group g
            LEFT JOIN carrier_port_group_member m ON m.group_id = g.id
            WHERE g.carrier_id = ?1
            ORDER BY g.id ASC, m.port_id ASC
            "#,
        )?;

        let rows = stmt
            .query_map(params![carrier_id], |row| {
                Ok((
                    CarrierPortGroup {
                        id: row.get(0)?,
                        carrier_id: row.get(1)?,
                        code: row.get(2)?,
                        name: row.get(3)?,
                        port_ids: Vec::new(),
                    },
                    row.get::<_, Option<i64>>(4)?,
                ))
            })?
            .collect::<SqliteResult<Vec<_>>>()?;

        let mut groups: BTreeMap<i64, CarrierPortGroup> = BTreeMap::new();
        for (group, member) in rows {
            let entry = groups.entry(group.id).or_insert(group);
            if let Some(port_id) = member {
                entry.port_ids.push(port_id);
            }
        }
        Ok(groups.into_values().collect())
    }

    // ===== 类别组 =====

    /// 写入类别组及成员
    pub fn insert_category_group(&self, group: &CarrierCategoryGroup) -> RepositoryResult<i64> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO carrier_category_group (id, carrier_id, code, name) VALUES (?1, ?2, ?3, ?4)",
            params![id_param(group.id), group.carrier_id, group.code, group.name],
        )?;
        let group_id = tx.last_insert_rowid();
        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO carrier_category_group_member (group_id, vehicle_category) VALUES (?1, ?2)",
            )?;
            for category in &group.vehicle_categories {
                stmt.execute(params![group_id, category])?;
            }
        }
        tx.commit()?;
        Ok(group_id)
    }

    /// 查询承运商的全部类别组（含成员）
    pub fn find_category_groups_by_carrier(
        &self,
        carrier_id: i64,
    ) -> RepositoryResult<Vec<CarrierCategoryGroup>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT g.id, g.carrier_id, g.code, g.name, m.vehicle_category
            FROM carrier_category_group g
            LEFT JOIN carrier_category_group_member m ON m.group_id = g.id
            WHERE g.carrier_id = ?1
            ORDER BY g.id ASC, m.vehicle_category ASC
            "#,
        )?;

        let rows = stmt
            .query_map(params![carrier_id], |row| {
                Ok((
                    CarrierCategoryGroup {
                        id: row.get(0)?,
                        carrier_id: row.get(1)?,
                        code: row.get(2)?,
                        name: row.get(3)?,
                        vehicle_categories: Vec::new(),
                    },
                    row.get::<_, Option<String>>(4)?,
                ))
            })?
            .collect::<SqliteResult<Vec<_>>>()?;

        let mut groups: BTreeMap<i64, CarrierCategoryGroup> = BTreeMap::new();
        for (group, member) in rows {
            let entry = groups.entry(group.id).or_insert(group);
            if let Some(category) = member {
                entry.vehicle_categories.push(category);
            }
        }
        Ok(groups.into_values().collect())
    }

    // ===== 销售物料 =====

    pub fn insert_article(&self, article: &Article) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO article (id, article_code, name, unit_type) VALUES (?1, ?2, ?3, ?4)",
            params![id_param(article.id), article.article_code, article.name, article.unit_type],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn find_article(&self, article_id: i64) -> RepositoryResult<Option<Article>> {
        let conn = self.get_conn()?;
        let article = conn
            .query_row(
                "SELECT id, article_code, name, unit_type FROM article WHERE id = ?1",
                params![article_id],
                |row| {
                    Ok(Article {
                        id: row.get(0)?,
                        article_code: row.get(1)?,
                        name: row.get(2)?,
                        unit_type: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(article)
    }
}

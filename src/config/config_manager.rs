// ==========================================
// RoRo 承运商规则核心 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::resolver_config::{CategoryKeyword, CategoryKeywordTable, ResolverConfig};
use crate::db::open_sqlite_connection;
use crate::domain::types::VehicleCategory;
use rusqlite::{params, Connection};
use serde_json::json;
use std::collections::HashMap;
use std::error::Error;
use std::sync::{Arc, Mutex};

// ==========================================
// ResolverConfigReader Trait
// ==========================================
// 用途: 规则解析所需的配置读取接口
// 实现者: ConfigManager（从 config_kv 表读取）
pub trait ResolverConfigReader: Send + Sync {
    /// 拖车附加费事件代码（默认 TOWING）
    fn get_towing_event_code(&self) -> Result<String, Box<dyn Error>>;

    /// 需要判断拖车的类别（默认 ["trailer"]）
    fn get_towing_categories(&self) -> Result<Vec<VehicleCategory>, Box<dyn Error>>;

    /// 能提供牵引的类别（默认 ["truck","truckhead"]）
    fn get_tractor_categories(&self) -> Result<Vec<VehicleCategory>, Box<dyn Error>>;

    /// PDF 类别关键词表
    fn get_pdf_category_keywords(&self) -> Result<CategoryKeywordTable, Box<dyn Error>>;

    /// 默认币种（默认 EUR）
    fn get_default_currency(&self) -> Result<String, Box<dyn Error>>;

    /// 一次性读取完整解析器配置
    fn load_resolver_config(&self) -> Result<ResolverConfig, Box<dyn Error>> {
        Ok(ResolverConfig {
            towing_event_code: self.get_towing_event_code()?,
            towing_categories: self.get_towing_categories()?,
            tractor_categories: self.get_tractor_categories()?,
            pdf_category_keywords: self.get_pdf_category_keywords()?,
            default_currency: self.get_default_currency()?,
        })
    }
}

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    fn get_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 读取 global scope 的配置值（公开方法，供其他模块复用）
    pub fn get_global_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        self.get_config_value(key)
    }

    fn get_config_or_default(&self, key: &str, default: &str) -> Result<String, Box<dyn Error>> {
        Ok(self.get_config_value(key)?.unwrap_or_else(|| default.to_string()))
    }

    /// 写入 global scope 的配置值（UPSERT）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        Ok(())
    }

    /// 获取所有配置的快照（JSON格式）
    ///
    /// 原始键值（排查配置问题时使用；审计报告附带的是解析后的 ResolverConfig）
    pub fn get_config_snapshot(&self) -> Result<String, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let mut stmt = conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;

        let mut config_map: HashMap<String, String> = HashMap::new();
        let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?;

        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        Ok(serde_json::to_string(&json!(config_map))?)
    }

    /// 读取类别列表配置（JSON 数组），无法识别的类别跳过并告警
    fn get_category_list(&self, key: &str, default: &[VehicleCategory]) -> Result<Vec<VehicleCategory>, Box<dyn Error>> {
        let raw = match self.get_config_value(key)? {
            Some(v) => v,
            None => return Ok(default.to_vec()),
        };

        let names: Vec<String> = match serde_json::from_str(&raw) {
            Ok(list) => list,
            Err(_) => {
                tracing::warn!(config_key = key, raw_value = %raw, "类别列表配置格式错误，使用默认值");
                return Ok(default.to_vec());
            }
        };

        let mut categories = Vec::new();
        for name in names {
            match VehicleCategory::parse(&name) {
                Some(c) => categories.push(c),
                None => tracing::warn!(config_key = key, category = %name, "配置中存在未知类别，已忽略"),
            }
        }

        if categories.is_empty() {
            Ok(default.to_vec())
        } else {
            Ok(categories)
        }
    }
}

// ==========================================
// ResolverConfigReader Trait 实现
// ==========================================
impl ResolverConfigReader for ConfigManager {
    fn get_towing_event_code(&self) -> Result<String, Box<dyn Error>> {
        let value = self.get_config_or_default(config_keys::TOWING_EVENT_CODE, "TOWING")?;
        let value = value.trim().to_uppercase();
        if value.is_empty() {
            Ok("TOWING".to_string())
        } else {
            Ok(value)
        }
    }

    fn get_towing_categories(&self) -> Result<Vec<VehicleCategory>, Box<dyn Error>> {
        self.get_category_list(config_keys::TOWING_CATEGORIES, &[VehicleCategory::Trailer])
    }

    fn get_tractor_categories(&self) -> Result<Vec<VehicleCategory>, Box<dyn Error>> {
        self.get_category_list(
            config_keys::TRACTOR_CATEGORIES,
            &[VehicleCategory::Truck, VehicleCategory::Truckhead],
        )
    }

    fn get_pdf_category_keywords(&self) -> Result<CategoryKeywordTable, Box<dyn Error>> {
        let raw = match self.get_config_value(config_keys::PDF_CATEGORY_KEYWORDS)? {
            Some(v) => v,
            None => return Ok(CategoryKeywordTable::default()),
        };

        match serde_json::from_str::<Vec<CategoryKeyword>>(&raw) {
            Ok(entries) if !entries.is_empty() => Ok(CategoryKeywordTable { entries }),
            _ => {
                tracing::warn!(
                    config_key = config_keys::PDF_CATEGORY_KEYWORDS,
                    raw_value = %raw,
                    "PDF 类别关键词配置格式错误，使用默认关键词表"
                );
                Ok(CategoryKeywordTable::default())
            }
        }
    }

    fn get_default_currency(&self) -> Result<String, Box<dyn Error>> {
        let value = self.get_config_or_default(config_keys::DEFAULT_CURRENCY, "EUR")?;
        Ok(value.trim().to_uppercase())
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 拖车判定
    pub const TOWING_EVENT_CODE: &str = "towing_event_code";
    pub const TOWING_CATEGORIES: &str = "towing_categories"; // JSON 数组
    pub const TRACTOR_CATEGORIES: &str = "tractor_categories"; // JSON 数组

    // 类别归桶
    pub const PDF_CATEGORY_KEYWORDS: &str = "pdf_category_keywords"; // JSON 数组 [{category, keywords}]

    // 币种
    pub const DEFAULT_CURRENCY: &str = "default_currency";
}

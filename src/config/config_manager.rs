// ==========================================
// 校园选课管理系统 - 配置管理器
// ==========================================
// 职责: 系统设置的加载与查询
// 存储: setting 表 (key-value)
// 说明: 维护模式开关由管理后台写入, 本核心只读取
// ==========================================

use crate::db::configure_sqlite_connection;
use crate::db::open_sqlite_connection;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

/// 维护模式开关键
pub const KEY_MAINTENANCE: &str = "maintenance";

/// 单学期学分上限键（默认 24）
pub const KEY_MAX_TERM_CREDITS: &str = "registration.max_credits";

/// 先修课程通过线键（默认 40.0）
pub const KEY_PASSING_THRESHOLD: &str = "grading.passing_threshold";

/// 学分上限默认值
pub const DEFAULT_MAX_TERM_CREDITS: u32 = 24;

/// 通过线默认值
pub const DEFAULT_PASSING_THRESHOLD: f64 = 40.0;

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        {
            let conn_guard = conn
                .lock()
                .map_err(|e| RepositoryError::LockError(e.to_string()))?;
            configure_sqlite_connection(&conn_guard)?;
        }
        Ok(Self { conn })
    }

    /// 读取设置值
    fn get_value(&self, key: &str) -> RepositoryResult<Option<String>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;

        let result = conn.query_row(
            "SELECT value FROM setting WHERE key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 写入设置值（管理后台/种子工具使用）
    pub fn set_value(&self, key: &str, value: &str) -> RepositoryResult<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;

        conn.execute(
            r#"
            INSERT INTO setting (key, value, updated_at) VALUES (?1, ?2, datetime('now'))
            ON CONFLICT(key) DO UPDATE SET value = ?2, updated_at = datetime('now')
            "#,
            params![key, value],
        )?;
        Ok(())
    }

    /// 维护模式是否开启（缺省视为关闭）
    pub fn is_maintenance_mode(&self) -> RepositoryResult<bool> {
        let value = self.get_value(KEY_MAINTENANCE)?;
        Ok(value
            .map(|v| v.trim().eq_ignore_ascii_case("true"))
            .unwrap_or(false))
    }

    /// 单学期学分上限
    pub fn max_term_credits(&self) -> RepositoryResult<u32> {
        let value = self.get_value(KEY_MAX_TERM_CREDITS)?;
        Ok(value
            .and_then(|v| v.trim().parse::<u32>().ok())
            .unwrap_or(DEFAULT_MAX_TERM_CREDITS))
    }

    /// 先修课程通过线（总评达到该分数视为已修完成）
    pub fn passing_threshold(&self) -> RepositoryResult<f64> {
        let value = self.get_value(KEY_PASSING_THRESHOLD)?;
        Ok(value
            .and_then(|v| v.trim().parse::<f64>().ok())
            .unwrap_or(DEFAULT_PASSING_THRESHOLD))
    }
}

// ==========================================
// 校园选课管理系统 - 教师数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::faculty::Faculty;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

/// 教师仓储
pub struct FacultyRepository {
    conn: Arc<Mutex<Connection>>,
}

impl FacultyRepository {
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
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

    fn map_row(row: &Row<'_>) -> SqliteResult<Faculty> {
        Ok(Faculty {
            faculty_id: row.get(0)?,
            first_name: row.get(1)?,
            last_name: row.get(2)?,
            email: row.get(3)?,
            department: row.get(4)?,
            designation: row.get(5)?,
            username: row.get(6)?,
            status: row.get(7)?,
        })
    }

    const COLUMNS: &'static str =
        "faculty_id, first_name, last_name, email, department, designation, username, status";

    /// 按工号查询教师
    pub fn find_by_id(&self, faculty_id: &str) -> RepositoryResult<Option<Faculty>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM faculty WHERE faculty_id = ?1",
            Self::COLUMNS
        ))?;

        let faculty = stmt.query_row(params![faculty_id], Self::map_row).optional()?;
        Ok(faculty)
    }

    /// 按登录账号查询教师（成绩操作归属校验入口）
    pub fn find_by_username(&self, username: &str) -> RepositoryResult<Option<Faculty>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM faculty WHERE username = ?1 COLLATE NOCASE",
            Self::COLUMNS
        ))?;

        let faculty = stmt.query_row(params![username], Self::map_row).optional()?;
        Ok(faculty)
    }

    /// 插入或更新教师
    pub fn upsert(&self, faculty: &Faculty) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT OR REPLACE INTO faculty (
                faculty_id, first_name, last_name, email,
                department, designation, username, status
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                faculty.faculty_id,
                faculty.first_name,
                faculty.last_name,
                faculty.email,
                faculty.department,
                faculty.designation,
                faculty.username,
                faculty.status,
            ],
        )?;
        Ok(())
    }
}

// ==========================================
// 校园选课管理系统 - 学生数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::student::Student;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

/// 学生仓储
/// 职责: 管理 student 表的 CRUD 操作
pub struct StudentRepository {
    conn: Arc<Mutex<Connection>>,
}

impl StudentRepository {
    /// 创建新的学生仓储实例
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn map_row(row: &Row<'_>) -> SqliteResult<Student> {
        Ok(Student {
            student_id: row.get(0)?,
            first_name: row.get(1)?,
            last_name: row.get(2)?,
            email: row.get(3)?,
            phone: row.get(4)?,
            username: row.get(5)?,
            program: row.get(6)?,
            semester: row.get(7)?,
            admission_date: row
                .get::<_, Option<String>>(8)?
                .and_then(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok()),
            status: row.get(9)?,
        })
    }

    const COLUMNS: &'static str = "student_id, first_name, last_name, email, phone, \
         username, program, semester, admission_date, status";

    /// 按学号查询学生
    pub fn find_by_id(&self, student_id: &str) -> RepositoryResult<Option<Student>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM student WHERE student_id = ?1",
            Self::COLUMNS
        ))?;

        let student = stmt
            .query_row(params![student_id], Self::map_row)
            .optional()?;
        Ok(student)
    }

    /// 按登录账号查询学生
    pub fn find_by_username(&self, username: &str) -> RepositoryResult<Option<Student>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM student WHERE username = ?1 COLLATE NOCASE",
            Self::COLUMNS
        ))?;

        let student = stmt.query_row(params![username], Self::map_row).optional()?;
        Ok(student)
    }

    /// 查询全部学生
    pub fn list_all(&self) -> RepositoryResult<Vec<Student>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM student ORDER BY student_id",
            Self::COLUMNS
        ))?;

        let students = stmt
            .query_map([], Self::map_row)?
            .collect::<SqliteResult<Vec<Student>>>()?;
        Ok(students)
    }

    /// 插入或更新学生
    pub fn upsert(&self, student: &Student) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT OR REPLACE INTO student (
                student_id, first_name, last_name, email, phone,
                username, program, semester, admission_date, status
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                student.student_id,
                student.first_name,
                student.last_name,
                student.email,
                student.phone,
                student.username,
                student.program,
                student.semester,
                student
                    .admission_date
                    .map(|d| d.format("%Y-%m-%d").to_string()),
                student.status,
            ],
        )?;
        Ok(())
    }
}

// ==========================================
// 校园选课管理系统 - 课程数据仓储
// ==========================================
// 职责: course / course_prerequisite 表的数据访问
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::course::Course;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult};
use std::sync::{Arc, Mutex};

/// 课程仓储
pub struct CourseRepository {
    conn: Arc<Mutex<Connection>>,
}

impl CourseRepository {
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

    /// 按课程编码查询课程
    pub fn find_by_id(&self, course_id: &str) -> RepositoryResult<Option<Course>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT course_id, course_name, credit_hours FROM course WHERE course_id = ?1",
        )?;

        let course = stmt
            .query_row(params![course_id], |row| {
                Ok(Course {
                    course_id: row.get(0)?,
                    course_name: row.get(1)?,
                    credit_hours: row.get::<_, i64>(2)?.max(0) as u32,
                })
            })
            .optional()?;
        Ok(course)
    }

    /// 查询课程的先修课程编码列表
    pub fn find_prerequisites(&self, course_id: &str) -> RepositoryResult<Vec<String>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT prereq_course_id FROM course_prerequisite
            WHERE course_id = ?1
            ORDER BY prereq_course_id
            "#,
        )?;

        let prereqs = stmt
            .query_map(params![course_id], |row| row.get::<_, String>(0))?
            .collect::<SqliteResult<Vec<String>>>()?;
        Ok(prereqs)
    }

    /// 插入或更新课程
    pub fn upsert(&self, course: &Course) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT OR REPLACE INTO course (course_id, course_name, credit_hours) VALUES (?1, ?2, ?3)",
            params![course.course_id, course.course_name, course.credit_hours as i64],
        )?;
        Ok(())
    }

    /// 登记先修课程关系
    pub fn add_prerequisite(&self, course_id: &str, prereq_course_id: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT OR IGNORE INTO course_prerequisite (course_id, prereq_course_id) VALUES (?1, ?2)",
            params![course_id, prereq_course_id],
        )?;
        Ok(())
    }
}

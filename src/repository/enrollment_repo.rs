// ==========================================
// 校园选课管理系统 - 选课记录数据仓储
// ==========================================
// 职责: enrollment_record 表的数据访问, 以及
//       报名/退课的多行事务写入 (名单 + 记录同写同滚)
// 说明: section 表的 enrolled_json / waitlist_json
//       只在本仓储的事务方法中更新, 保证每次状态
//       迁移要么全部落库要么全部不落库
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::enrollment::EnrollmentRecord;
use crate::domain::section::Section;
use crate::domain::types::EnrollmentStatus;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

/// enrollment_record 表的原始行
struct RecordRow {
    student_id: String,
    section_id: String,
    status: String,
    component_scores_json: String,
    weighting_json: String,
    final_grade: f64,
    updated_at: String,
}

impl RecordRow {
    fn into_record(self) -> RepositoryResult<EnrollmentRecord> {
        let status = EnrollmentStatus::from_str(&self.status).ok_or_else(|| {
            RepositoryError::FieldValueError {
                field: "status".to_string(),
                message: format!("未知的选课状态: {}", self.status),
            }
        })?;

        let component_scores: BTreeMap<String, f64> =
            serde_json::from_str(&self.component_scores_json).map_err(|e| {
                RepositoryError::FieldValueError {
                    field: "component_scores_json".to_string(),
                    message: e.to_string(),
                }
            })?;
        let weighting: BTreeMap<String, f64> =
            serde_json::from_str(&self.weighting_json).map_err(|e| {
                RepositoryError::FieldValueError {
                    field: "weighting_json".to_string(),
                    message: e.to_string(),
                }
            })?;

        let updated_at = DateTime::parse_from_rfc3339(&self.updated_at)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| RepositoryError::FieldValueError {
                field: "updated_at".to_string(),
                message: e.to_string(),
            })?;

        Ok(EnrollmentRecord {
            student_id: self.student_id,
            section_id: self.section_id,
            status,
            component_scores,
            weighting,
            final_grade: self.final_grade,
            updated_at,
        })
    }
}

// ==========================================
// EnrollmentRepository - 选课记录仓储
// ==========================================
pub struct EnrollmentRepository {
    conn: Arc<Mutex<Connection>>,
}

impl EnrollmentRepository {
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

    const COLUMNS: &'static str = "student_id, section_id, status, component_scores_json, \
         weighting_json, final_grade, updated_at";

    fn map_row(row: &Row<'_>) -> SqliteResult<RecordRow> {
        Ok(RecordRow {
            student_id: row.get(0)?,
            section_id: row.get(1)?,
            status: row.get(2)?,
            component_scores_json: row.get(3)?,
            weighting_json: row.get(4)?,
            final_grade: row.get(5)?,
            updated_at: row.get(6)?,
        })
    }

    /// 查询单条选课记录
    pub fn find_record(
        &self,
        section_id: &str,
        student_id: &str,
    ) -> RepositoryResult<Option<EnrollmentRecord>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM enrollment_record WHERE section_id = ?1 AND student_id = ?2",
            Self::COLUMNS
        ))?;

        let row = stmt
            .query_row(params![section_id, student_id], Self::map_row)
            .optional()?;
        row.map(RecordRow::into_record).transpose()
    }

    /// 查询教学班的全部选课记录
    pub fn find_by_section(&self, section_id: &str) -> RepositoryResult<Vec<EnrollmentRecord>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM enrollment_record WHERE section_id = ?1 ORDER BY rowid",
            Self::COLUMNS
        ))?;

        let rows = stmt
            .query_map(params![section_id], Self::map_row)?
            .collect::<SqliteResult<Vec<RecordRow>>>()?;
        rows.into_iter().map(RecordRow::into_record).collect()
    }

    /// 查询学生的全部选课记录
    pub fn find_by_student(&self, student_id: &str) -> RepositoryResult<Vec<EnrollmentRecord>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM enrollment_record WHERE student_id = ?1 ORDER BY rowid",
            Self::COLUMNS
        ))?;

        let rows = stmt
            .query_map(params![student_id], Self::map_row)?
            .collect::<SqliteResult<Vec<RecordRow>>>()?;
        rows.into_iter().map(RecordRow::into_record).collect()
    }

    /// 保存单条选课记录（成绩录入/总评写回使用）
    pub fn save(&self, record: &EnrollmentRecord) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        Self::save_record_with_conn(&conn, record)
    }

    /// 报名事务: 教学班名单 + 选课记录一次落库
    pub fn persist_registration(
        &self,
        section: &Section,
        record: &EnrollmentRecord,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        Self::in_transaction(&conn, || {
            Self::update_roster_with_conn(&conn, section)?;
            Self::save_record_with_conn(&conn, record)?;
            Ok(())
        })
    }

    /// 退课事务: 教学班名单 + 退课记录 + 可选的晋升记录一次落库
    pub fn persist_drop(
        &self,
        section: &Section,
        dropped: &EnrollmentRecord,
        promoted: Option<&EnrollmentRecord>,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        Self::in_transaction(&conn, || {
            Self::update_roster_with_conn(&conn, section)?;
            Self::save_record_with_conn(&conn, dropped)?;
            if let Some(promoted) = promoted {
                Self::save_record_with_conn(&conn, promoted)?;
            }
            Ok(())
        })
    }

    // ==========================================
    // 事务与写入辅助
    // ==========================================

    fn in_transaction(
        conn: &Connection,
        body: impl FnOnce() -> RepositoryResult<()>,
    ) -> RepositoryResult<()> {
        conn.execute("BEGIN TRANSACTION", [])?;
        match body() {
            Ok(()) => {
                conn.execute("COMMIT", []).map_err(|e| {
                    RepositoryError::DatabaseTransactionError(e.to_string())
                })?;
                Ok(())
            }
            Err(err) => {
                // 回滚失败时保留原始错误
                let _ = conn.execute("ROLLBACK", []);
                Err(err)
            }
        }
    }

    fn save_record_with_conn(conn: &Connection, record: &EnrollmentRecord) -> RepositoryResult<()> {
        let scores_json = serde_json::to_string(&record.component_scores).map_err(|e| {
            RepositoryError::FieldValueError {
                field: "component_scores_json".to_string(),
                message: e.to_string(),
            }
        })?;
        let weighting_json = serde_json::to_string(&record.weighting).map_err(|e| {
            RepositoryError::FieldValueError {
                field: "weighting_json".to_string(),
                message: e.to_string(),
            }
        })?;

        conn.execute(
            r#"
            INSERT OR REPLACE INTO enrollment_record (
                student_id, section_id, status,
                component_scores_json, weighting_json, final_grade, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                record.student_id,
                record.section_id,
                record.status.to_db_str(),
                scores_json,
                weighting_json,
                record.final_grade,
                record.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn update_roster_with_conn(conn: &Connection, section: &Section) -> RepositoryResult<()> {
        let enrolled_json = serde_json::to_string(&section.enrolled).map_err(|e| {
            RepositoryError::FieldValueError {
                field: "enrolled_json".to_string(),
                message: e.to_string(),
            }
        })?;
        let waitlist_json = serde_json::to_string(&section.waitlist).map_err(|e| {
            RepositoryError::FieldValueError {
                field: "waitlist_json".to_string(),
                message: e.to_string(),
            }
        })?;

        let affected = conn.execute(
            r#"
            UPDATE section
            SET enrolled_json = ?2, waitlist_json = ?3, updated_at = datetime('now')
            WHERE section_id = ?1
            "#,
            params![section.section_id, enrolled_json, waitlist_json],
        )?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Section".to_string(),
                id: section.section_id.clone(),
            });
        }
        Ok(())
    }
}

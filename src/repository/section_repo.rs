// ==========================================
// 校园选课管理系统 - 教学班数据仓储
// ==========================================
// 职责: section 表的数据访问与行映射
// 说明: enrolled_json / waitlist_json 两列由
//       EnrollmentRepository 在报名/退课事务内写入,
//       本仓储只读取名单、写入教学班自身属性
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::section::Section;
use crate::domain::types::Term;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{NaiveDate, NaiveTime, Weekday};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex};

/// section 表的原始行（TEXT 字段解析延后到 into_section, 便于给出字段级错误）
struct SectionRow {
    section_id: String,
    course_id: String,
    title: String,
    faculty_id: Option<String>,
    day_of_week: String,
    start_time: String,
    end_time: String,
    location: Option<String>,
    capacity: i64,
    enrollment_deadline: String,
    drop_deadline: String,
    term: String,
    year: i64,
    enrolled_json: String,
    waitlist_json: String,
    assessment_weights_json: String,
}

impl SectionRow {
    fn into_section(self) -> RepositoryResult<Section> {
        let day_of_week: Weekday = self.day_of_week.parse().map_err(|_| field_error(
            "day_of_week",
            format!("无法解析星期: {}", self.day_of_week),
        ))?;
        let start_time = parse_time("start_time", &self.start_time)?;
        let end_time = parse_time("end_time", &self.end_time)?;
        let enrollment_deadline = parse_date("enrollment_deadline", &self.enrollment_deadline)?;
        let drop_deadline = parse_date("drop_deadline", &self.drop_deadline)?;

        let enrolled: Vec<String> = serde_json::from_str(&self.enrolled_json)
            .map_err(|e| field_error("enrolled_json", e.to_string()))?;
        let waitlist: VecDeque<String> = serde_json::from_str(&self.waitlist_json)
            .map_err(|e| field_error("waitlist_json", e.to_string()))?;
        let assessment_weights: BTreeMap<String, f64> =
            serde_json::from_str(&self.assessment_weights_json)
                .map_err(|e| field_error("assessment_weights_json", e.to_string()))?;

        Ok(Section {
            section_id: self.section_id,
            course_id: self.course_id,
            title: self.title,
            faculty_id: self.faculty_id,
            day_of_week,
            start_time,
            end_time,
            location: self.location,
            capacity: self.capacity.max(0) as u32,
            enrollment_deadline,
            drop_deadline,
            term: Term::from_str(&self.term),
            year: self.year as i32,
            enrolled,
            waitlist,
            assessment_weights,
        })
    }
}

fn field_error(field: &str, message: impl Into<String>) -> RepositoryError {
    RepositoryError::FieldValueError {
        field: field.to_string(),
        message: message.into(),
    }
}

fn parse_date(field: &str, value: &str) -> RepositoryResult<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|e| field_error(field, e.to_string()))
}

fn parse_time(field: &str, value: &str) -> RepositoryResult<NaiveTime> {
    NaiveTime::parse_from_str(value, "%H:%M").map_err(|e| field_error(field, e.to_string()))
}

// ==========================================
// SectionRepository - 教学班仓储
// ==========================================
pub struct SectionRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SectionRepository {
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

    const COLUMNS: &'static str = "section_id, course_id, title, faculty_id, day_of_week, \
         start_time, end_time, location, capacity, enrollment_deadline, drop_deadline, \
         term, year, enrolled_json, waitlist_json, assessment_weights_json";

    fn map_row(row: &Row<'_>) -> SqliteResult<SectionRow> {
        Ok(SectionRow {
            section_id: row.get(0)?,
            course_id: row.get(1)?,
            title: row.get(2)?,
            faculty_id: row.get(3)?,
            day_of_week: row.get(4)?,
            start_time: row.get(5)?,
            end_time: row.get(6)?,
            location: row.get(7)?,
            capacity: row.get(8)?,
            enrollment_deadline: row.get(9)?,
            drop_deadline: row.get(10)?,
            term: row.get(11)?,
            year: row.get(12)?,
            enrolled_json: row.get(13)?,
            waitlist_json: row.get(14)?,
            assessment_weights_json: row.get(15)?,
        })
    }

    /// 按教学班编码查询
    pub fn find_by_id(&self, section_id: &str) -> RepositoryResult<Option<Section>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM section WHERE section_id = ?1",
            Self::COLUMNS
        ))?;

        let row = stmt
            .query_row(params![section_id], Self::map_row)
            .optional()?;
        row.map(SectionRow::into_section).transpose()
    }

    /// 查询全部教学班
    pub fn list_all(&self) -> RepositoryResult<Vec<Section>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM section ORDER BY section_id",
            Self::COLUMNS
        ))?;

        let rows = stmt
            .query_map([], Self::map_row)?
            .collect::<SqliteResult<Vec<SectionRow>>>()?;

        rows.into_iter().map(SectionRow::into_section).collect()
    }

    /// 插入教学班（编码冲突报唯一约束错误）
    pub fn insert(&self, section: &Section) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO section (
                section_id, course_id, title, faculty_id, day_of_week,
                start_time, end_time, location, capacity,
                enrollment_deadline, drop_deadline, term, year,
                enrolled_json, waitlist_json, assessment_weights_json, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, datetime('now'))
            "#,
            params![
                section.section_id,
                section.course_id,
                section.title,
                section.faculty_id,
                section.day_of_week.to_string(),
                section.start_time.format("%H:%M").to_string(),
                section.end_time.format("%H:%M").to_string(),
                section.location,
                section.capacity as i64,
                section.enrollment_deadline.format("%Y-%m-%d").to_string(),
                section.drop_deadline.format("%Y-%m-%d").to_string(),
                section.term.to_db_str(),
                section.year as i64,
                serde_json::to_string(&section.enrolled)
                    .map_err(|e| field_error("enrolled_json", e.to_string()))?,
                serde_json::to_string(&section.waitlist)
                    .map_err(|e| field_error("waitlist_json", e.to_string()))?,
                serde_json::to_string(&section.assessment_weights)
                    .map_err(|e| field_error("assessment_weights_json", e.to_string()))?,
            ],
        )?;
        Ok(())
    }

    /// 变更任课教师
    pub fn assign_faculty(&self, section_id: &str, faculty_id: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE section SET faculty_id = ?2, updated_at = datetime('now') WHERE section_id = ?1",
            params![section_id, faculty_id],
        )?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Section".to_string(),
                id: section_id.to_string(),
            });
        }
        Ok(())
    }

    /// 整体替换考核权重方案
    pub fn update_assessment_weights(
        &self,
        section_id: &str,
        weights: &BTreeMap<String, f64>,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let weights_json = serde_json::to_string(weights)
            .map_err(|e| field_error("assessment_weights_json", e.to_string()))?;

        let affected = conn.execute(
            "UPDATE section SET assessment_weights_json = ?2, updated_at = datetime('now') WHERE section_id = ?1",
            params![section_id, weights_json],
        )?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Section".to_string(),
                id: section_id.to_string(),
            });
        }
        Ok(())
    }
}

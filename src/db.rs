// ==========================================
// 校园选课管理系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为，避免“部分模块外键开启/部分不开启”
// - 统一 busy_timeout，减少并发写入时的偶发 busy 错误
// - 提供建库入口 init_schema（测试与种子工具共用）
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
///
/// 说明：
/// - 这里的版本号用于**提示/告警**（不做自动迁移），避免静默在旧库上运行导致隐性错误。
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> =
        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

/// 默认数据库文件路径（~/.local/share/campus-enrollment/campus.db 或等价目录）
pub fn default_db_path() -> String {
    let base = dirs::data_dir().unwrap_or_else(std::env::temp_dir);
    let dir = base.join("campus-enrollment");
    dir.join("campus.db").to_string_lossy().to_string()
}

/// 初始化数据库 schema（幂等，CREATE TABLE IF NOT EXISTS）
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    // schema_version 表
    conn.execute(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )
        "#,
        [],
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;

    // setting 表 (系统设置: 维护模式/学分上限等)
    conn.execute(
        r#"
        CREATE TABLE IF NOT EXISTS setting (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        )
        "#,
        [],
    )?;

    // student 表
    conn.execute(
        r#"
        CREATE TABLE IF NOT EXISTS student (
            student_id TEXT PRIMARY KEY,
            first_name TEXT NOT NULL,
            last_name TEXT NOT NULL,
            email TEXT,
            phone TEXT,
            username TEXT,
            program TEXT,
            semester INTEGER NOT NULL DEFAULT 1,
            admission_date TEXT,
            status TEXT NOT NULL DEFAULT 'Active'
        )
        "#,
        [],
    )?;

    // faculty 表
    conn.execute(
        r#"
        CREATE TABLE IF NOT EXISTS faculty (
            faculty_id TEXT PRIMARY KEY,
            first_name TEXT NOT NULL,
            last_name TEXT NOT NULL,
            email TEXT,
            department TEXT,
            designation TEXT,
            username TEXT,
            status TEXT NOT NULL DEFAULT 'Active'
        )
        "#,
        [],
    )?;

    // course 表
    conn.execute(
        r#"
        CREATE TABLE IF NOT EXISTS course (
            course_id TEXT PRIMARY KEY,
            course_name TEXT NOT NULL,
            credit_hours INTEGER NOT NULL DEFAULT 3
        )
        "#,
        [],
    )?;

    // course_prerequisite 表 (先修课程关系)
    conn.execute(
        r#"
        CREATE TABLE IF NOT EXISTS course_prerequisite (
            course_id TEXT NOT NULL REFERENCES course(course_id) ON DELETE CASCADE,
            prereq_course_id TEXT NOT NULL,
            PRIMARY KEY (course_id, prereq_course_id)
        )
        "#,
        [],
    )?;

    // section 表
    // 说明: enrolled_json / waitlist_json 为有序 JSON 数组,
    //       顺序即选课顺序/候补队列位置 (FIFO)
    conn.execute(
        r#"
        CREATE TABLE IF NOT EXISTS section (
            section_id TEXT PRIMARY KEY,
            course_id TEXT NOT NULL REFERENCES course(course_id),
            title TEXT NOT NULL,
            faculty_id TEXT,
            day_of_week TEXT NOT NULL,
            start_time TEXT NOT NULL,
            end_time TEXT NOT NULL,
            location TEXT,
            capacity INTEGER NOT NULL,
            enrollment_deadline TEXT NOT NULL,
            drop_deadline TEXT NOT NULL,
            term TEXT NOT NULL,
            year INTEGER NOT NULL,
            enrolled_json TEXT NOT NULL DEFAULT '[]',
            waitlist_json TEXT NOT NULL DEFAULT '[]',
            assessment_weights_json TEXT NOT NULL DEFAULT '{}',
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        )
        "#,
        [],
    )?;

    // enrollment_record 表
    // 说明: 退课不删除记录 (status=DROPPED), 成绩历史随记录保留
    conn.execute(
        r#"
        CREATE TABLE IF NOT EXISTS enrollment_record (
            student_id TEXT NOT NULL REFERENCES student(student_id),
            section_id TEXT NOT NULL REFERENCES section(section_id),
            status TEXT NOT NULL,
            component_scores_json TEXT NOT NULL DEFAULT '{}',
            weighting_json TEXT NOT NULL DEFAULT '{}',
            final_grade REAL NOT NULL DEFAULT 0.0,
            updated_at TEXT NOT NULL,
            PRIMARY KEY (student_id, section_id)
        )
        "#,
        [],
    )?;

    Ok(())
}

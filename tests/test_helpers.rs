// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 提供测试所需的数据库初始化、服务装配、
//       基础档案种子数据
// ==========================================

use chrono::{Duration, Local, NaiveTime, Weekday};
use rusqlite::Connection;
use std::collections::{BTreeMap, VecDeque};
use std::error::Error;
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;

use campus_enrollment::api::{EnrollmentApi, GradebookApi, RegistrarApi};
use campus_enrollment::config::ConfigManager;
use campus_enrollment::db::{configure_sqlite_connection, init_schema};
use campus_enrollment::domain::types::{Role, Term};
use campus_enrollment::domain::{Course, Faculty, Section, Student, User};
use campus_enrollment::engine::{AdmissionEngine, OptionalEventPublisher};
use campus_enrollment::repository::{
    CourseRepository, EnrollmentRepository, FacultyRepository, SectionRepository,
    StudentRepository,
};

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file.path().to_str().unwrap().to_string();

    let conn = Connection::open(&db_path)?;
    configure_sqlite_connection(&conn)?;
    init_schema(&conn)?;

    Ok((temp_file, db_path))
}

/// 组装好的测试环境（所有仓储共享同一连接）
pub struct TestEnv {
    pub _temp_file: NamedTempFile,
    pub db_path: String,
    pub student_repo: Arc<StudentRepository>,
    pub faculty_repo: Arc<FacultyRepository>,
    pub course_repo: Arc<CourseRepository>,
    pub section_repo: Arc<SectionRepository>,
    pub enrollment_repo: Arc<EnrollmentRepository>,
    pub config: Arc<ConfigManager>,
    pub enrollment_api: Arc<EnrollmentApi>,
    pub gradebook_api: Arc<GradebookApi>,
    pub registrar_api: Arc<RegistrarApi>,
}

/// 创建测试环境
pub fn setup_test_env() -> TestEnv {
    let (temp_file, db_path) = create_test_db().unwrap();

    let conn = Connection::open(&db_path).unwrap();
    configure_sqlite_connection(&conn).unwrap();
    let conn = Arc::new(Mutex::new(conn));

    let student_repo = Arc::new(StudentRepository::from_connection(conn.clone()));
    let faculty_repo = Arc::new(FacultyRepository::from_connection(conn.clone()));
    let course_repo = Arc::new(CourseRepository::from_connection(conn.clone()));
    let section_repo = Arc::new(SectionRepository::from_connection(conn.clone()));
    let enrollment_repo = Arc::new(EnrollmentRepository::from_connection(conn.clone()));
    let config = Arc::new(ConfigManager::from_connection(conn.clone()).unwrap());

    let admission_engine = Arc::new(AdmissionEngine::new(
        section_repo.clone(),
        enrollment_repo.clone(),
        course_repo.clone(),
        config.clone(),
        OptionalEventPublisher::none(),
    ));

    let enrollment_api = Arc::new(EnrollmentApi::new(
        student_repo.clone(),
        section_repo.clone(),
        enrollment_repo.clone(),
        admission_engine,
        config.clone(),
    ));
    let gradebook_api = Arc::new(GradebookApi::new(
        section_repo.clone(),
        enrollment_repo.clone(),
        faculty_repo.clone(),
        config.clone(),
    ));
    let registrar_api = Arc::new(RegistrarApi::new(
        section_repo.clone(),
        course_repo.clone(),
        faculty_repo.clone(),
    ));

    TestEnv {
        _temp_file: temp_file,
        db_path,
        student_repo,
        faculty_repo,
        course_repo,
        section_repo,
        enrollment_repo,
        config,
        enrollment_api,
        gradebook_api,
        registrar_api,
    }
}

// ==========================================
// 操作者
// ==========================================

pub fn admin() -> User {
    User::new("registrar", Role::Admin, "教务员")
}

pub fn student_actor(username: &str) -> User {
    User::new(username, Role::Student, "学生")
}

pub fn instructor_actor(username: &str) -> User {
    User::new(username, Role::Faculty, "教师")
}

// ==========================================
// 种子数据
// ==========================================

/// 写入基础档案: 课程 CS101 / CS201(先修 CS101),
/// 教师 F001 (prof.zhang), 学生 S001-S006 (账号为学号小写)
pub fn seed_basic(env: &TestEnv) {
    env.course_repo
        .upsert(&Course::new("CS101", "程序设计基础", 3))
        .unwrap();
    env.course_repo
        .upsert(&Course::new("CS201", "数据结构", 4))
        .unwrap();
    env.course_repo.add_prerequisite("CS201", "CS101").unwrap();

    let mut faculty = Faculty::new("F001", "伟", "张");
    faculty.username = Some("prof.zhang".to_string());
    env.faculty_repo.upsert(&faculty).unwrap();

    for id in ["S001", "S002", "S003", "S004", "S005", "S006"] {
        let mut student = Student::new(id, "同学", id);
        student.username = Some(id.to_lowercase());
        env.student_repo.upsert(&student).unwrap();
    }
}

/// 构造教学班（报名/退课截止日期均在未来）
pub fn make_section(section_id: &str, course_id: &str, capacity: u32) -> Section {
    let today = Local::now().date_naive();
    Section {
        section_id: section_id.to_string(),
        course_id: course_id.to_string(),
        title: format!("{} 教学班", course_id),
        faculty_id: Some("F001".to_string()),
        day_of_week: Weekday::Mon,
        start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
        end_time: NaiveTime::from_hms_opt(10, 30, 0).unwrap(),
        location: None,
        capacity,
        enrollment_deadline: today + Duration::days(14),
        drop_deadline: today + Duration::days(28),
        term: Term::Fall,
        year: 2026,
        enrolled: Vec::new(),
        waitlist: VecDeque::new(),
        assessment_weights: BTreeMap::new(),
    }
}

/// 直接入库教学班（绕过教务 API, 供测试布置场景）
pub fn insert_section(env: &TestEnv, section: &Section) {
    env.section_repo.insert(section).unwrap();
}

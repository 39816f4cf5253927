// ==========================================
// 校园选课管理系统 - 演示数据种子工具
// ==========================================
// 用法: seed_demo_db [db_path]
// 职责: 建库 + 写入演示数据集 + 跑通一条选课链路
// ==========================================

use chrono::{Duration, Local, NaiveTime, Weekday};
use std::collections::{BTreeMap, VecDeque};
use std::error::Error;
use std::sync::{Arc, Mutex};

use campus_enrollment::api::{EnrollmentApi, GradebookApi, RegistrarApi};
use campus_enrollment::config::{ConfigManager, KEY_MAX_TERM_CREDITS};
use campus_enrollment::db::{default_db_path, init_schema, open_sqlite_connection};
use campus_enrollment::domain::{Course, Faculty, Section, Student, User};
use campus_enrollment::engine::{AdmissionEngine, OptionalEventPublisher};
use campus_enrollment::domain::types::{Role, Term};
use campus_enrollment::logging;
use campus_enrollment::repository::{
    CourseRepository, EnrollmentRepository, FacultyRepository, SectionRepository,
    StudentRepository,
};

fn main() -> Result<(), Box<dyn Error>> {
    logging::init();

    let db_path = std::env::args().nth(1).unwrap_or_else(default_db_path);
    if let Some(parent) = std::path::Path::new(&db_path).parent() {
        std::fs::create_dir_all(parent)?;
    }
    // 重建演示库, 保证多次执行结果一致
    if std::path::Path::new(&db_path).exists() {
        std::fs::remove_file(&db_path)?;
        tracing::info!("已删除旧演示库: {}", db_path);
    }

    tracing::info!("==================================================");
    tracing::info!("{} - 演示数据种子工具", campus_enrollment::APP_NAME);
    tracing::info!("系统版本: {}", campus_enrollment::VERSION);
    tracing::info!("使用数据库: {}", db_path);
    tracing::info!("==================================================");

    let conn = open_sqlite_connection(&db_path)?;
    init_schema(&conn)?;

    let conn = Arc::new(Mutex::new(conn));
    let student_repo = Arc::new(StudentRepository::from_connection(conn.clone()));
    let faculty_repo = Arc::new(FacultyRepository::from_connection(conn.clone()));
    let course_repo = Arc::new(CourseRepository::from_connection(conn.clone()));
    let section_repo = Arc::new(SectionRepository::from_connection(conn.clone()));
    let enrollment_repo = Arc::new(EnrollmentRepository::from_connection(conn.clone()));
    let config = Arc::new(ConfigManager::from_connection(conn.clone())?);

    seed_reference_data(&student_repo, &faculty_repo, &course_repo, &config)?;

    let admission_engine = Arc::new(AdmissionEngine::new(
        section_repo.clone(),
        enrollment_repo.clone(),
        course_repo.clone(),
        config.clone(),
        OptionalEventPublisher::none(),
    ));
    let registrar_api = RegistrarApi::new(
        section_repo.clone(),
        course_repo.clone(),
        faculty_repo.clone(),
    );
    let enrollment_api = EnrollmentApi::new(
        student_repo,
        section_repo.clone(),
        enrollment_repo,
        admission_engine,
        config.clone(),
    );
    let gradebook_api = GradebookApi::new(
        section_repo,
        Arc::new(EnrollmentRepository::from_connection(conn.clone())),
        faculty_repo,
        config,
    );

    let admin = User::new("registrar", Role::Admin, "教务员");

    seed_sections(&registrar_api, &admin)?;
    run_demo_flow(&enrollment_api, &gradebook_api, &admin)?;

    tracing::info!("种子数据写入完成: {}", db_path);
    Ok(())
}

/// 写入基础档案与系统设置
fn seed_reference_data(
    student_repo: &StudentRepository,
    faculty_repo: &FacultyRepository,
    course_repo: &CourseRepository,
    config: &ConfigManager,
) -> Result<(), Box<dyn Error>> {
    config.set_value(KEY_MAX_TERM_CREDITS, "24")?;

    let mut zhang = Faculty::new("F001", "伟", "张");
    zhang.username = Some("zhangwei".to_string());
    zhang.department = Some("计算机学院".to_string());
    faculty_repo.upsert(&zhang)?;

    course_repo.upsert(&Course::new("CS101", "程序设计基础", 3))?;
    course_repo.upsert(&Course::new("CS201", "数据结构", 4))?;
    course_repo.add_prerequisite("CS201", "CS101")?;

    for (id, first, last, username) in [
        ("S001", "小明", "王", "wangxm"),
        ("S002", "小红", "李", "lixh"),
        ("S003", "晨", "赵", "zhaochen"),
    ] {
        let mut student = Student::new(id, first, last);
        student.username = Some(username.to_string());
        student_repo.upsert(&student)?;
    }

    tracing::info!("基础档案写入完成: 教师 1, 课程 2, 学生 3");
    Ok(())
}

/// 创建演示教学班 (容量 1, 便于演示候补与晋升)
fn seed_sections(registrar_api: &RegistrarApi, admin: &User) -> Result<(), Box<dyn Error>> {
    let today = Local::now().date_naive();
    let section = Section {
        section_id: "SEC-100".to_string(),
        course_id: "CS101".to_string(),
        title: "程序设计基础".to_string(),
        faculty_id: Some("F001".to_string()),
        day_of_week: Weekday::Mon,
        start_time: NaiveTime::from_hms_opt(9, 0, 0).ok_or("invalid time")?,
        end_time: NaiveTime::from_hms_opt(10, 30, 0).ok_or("invalid time")?,
        location: Some("教一楼 101".to_string()),
        capacity: 1,
        enrollment_deadline: today + Duration::days(14),
        drop_deadline: today + Duration::days(28),
        term: Term::Fall,
        year: today.format("%Y").to_string().parse().unwrap_or(2026),
        enrolled: Vec::new(),
        waitlist: VecDeque::new(),
        assessment_weights: BTreeMap::new(),
    };

    if registrar_api.find_section("SEC-100")?.is_none() {
        registrar_api.create_section(Some(admin), &section)?;
    }
    Ok(())
}

/// 跑通报名 → 候补 → 退课晋升 → 成绩链路
fn run_demo_flow(
    enrollment_api: &EnrollmentApi,
    gradebook_api: &GradebookApi,
    admin: &User,
) -> Result<(), Box<dyn Error>> {
    let record = enrollment_api.register_section(Some(admin), "S001", "SEC-100")?;
    tracing::info!("S001 报名结果: {}", record.status);

    let record = enrollment_api.register_section(Some(admin), "S002", "SEC-100")?;
    tracing::info!(
        "S002 报名结果: {} (候补位次 {:?})",
        record.status,
        enrollment_api.waitlist_position("SEC-100", "S002")?
    );

    enrollment_api.drop_section(Some(admin), "S001", "SEC-100")?;
    let records = enrollment_api.enrollments_for_section("SEC-100")?;
    for record in &records {
        tracing::info!(
            "退课后状态: student_id={}, status={}",
            record.student_id,
            record.status
        );
    }

    let instructor = User::new("zhangwei", Role::Faculty, "张伟");
    let mut weights = BTreeMap::new();
    weights.insert("Quiz".to_string(), 20.0);
    weights.insert("Midterm".to_string(), 30.0);
    weights.insert("Final".to_string(), 50.0);
    gradebook_api.define_assessments(Some(&instructor), "SEC-100", weights)?;

    for (component, score) in [("Quiz", 80.0), ("Midterm", 70.0), ("Final", 90.0)] {
        gradebook_api.record_score(Some(&instructor), "SEC-100", "S002", component, score)?;
    }
    let final_grade = gradebook_api.compute_final(Some(&instructor), "SEC-100", "S002")?;
    tracing::info!("S002 总评: {:.2}", final_grade);

    Ok(())
}

// ==========================================
// 校园选课管理系统 - 选课 API
// ==========================================
// 职责: 报名/退课的编排与访问控制
// 校验顺序: 会话 → 维护模式 → 教学班 → 学生 →
//           截止日期 → 归属 → 委托准入引擎
// ==========================================

use crate::config::ConfigManager;
use crate::domain::enrollment::EnrollmentRecord;
use crate::domain::section::Section;
use crate::domain::student::Student;
use crate::domain::types::Role;
use crate::domain::user::User;
use crate::api::error::{ApiError, ApiResult};
use crate::engine::admission::AdmissionEngine;
use crate::repository::{EnrollmentRepository, SectionRepository, StudentRepository};
use chrono::{Local, NaiveDate};
use std::sync::Arc;

// ==========================================
// EnrollmentApi - 选课服务
// ==========================================
pub struct EnrollmentApi {
    student_repo: Arc<StudentRepository>,
    section_repo: Arc<SectionRepository>,
    enrollment_repo: Arc<EnrollmentRepository>,
    admission_engine: Arc<AdmissionEngine>,
    config: Arc<ConfigManager>,
}

impl EnrollmentApi {
    pub fn new(
        student_repo: Arc<StudentRepository>,
        section_repo: Arc<SectionRepository>,
        enrollment_repo: Arc<EnrollmentRepository>,
        admission_engine: Arc<AdmissionEngine>,
        config: Arc<ConfigManager>,
    ) -> Self {
        Self {
            student_repo,
            section_repo,
            enrollment_repo,
            admission_engine,
            config,
        }
    }

    // ==========================================
    // 报名
    // ==========================================

    /// 报名教学班
    ///
    /// 有名额时选入 (ENROLLED), 满员时进入候补 (WAITLISTED),
    /// 决策由准入引擎在教学班临界区内原子完成
    pub fn register_section(
        &self,
        actor: Option<&User>,
        student_id: &str,
        section_id: &str,
    ) -> ApiResult<EnrollmentRecord> {
        let actor = self.ensure_can_mutate(actor)?;

        let section = self.require_section(section_id)?;
        let student = self.require_student(student_id)?;

        if current_date() > section.enrollment_deadline {
            return Err(ApiError::DeadlinePassed {
                section_id: section_id.to_string(),
                deadline: section.enrollment_deadline,
                action: "报名".to_string(),
            });
        }

        if actor.role == Role::Student {
            self.enforce_student_owns_record(actor, &student)?;
        }

        tracing::debug!(
            "报名请求通过校验: actor={}, student_id={}, section_id={}",
            actor.username,
            student_id,
            section_id
        );

        let record = self.admission_engine.atomic_register(student_id, section_id)?;
        Ok(record)
    }

    // ==========================================
    // 退课
    // ==========================================

    /// 退出教学班
    ///
    /// 记录置 DROPPED (保留成绩历史); 在册学生退课时,
    /// 准入引擎在同一临界区内完成恰好一次队首候补晋升
    pub fn drop_section(
        &self,
        actor: Option<&User>,
        student_id: &str,
        section_id: &str,
    ) -> ApiResult<()> {
        let actor = self.ensure_can_mutate(actor)?;

        let section = self.require_section(section_id)?;
        let student = self.require_student(student_id)?;

        if current_date() > section.drop_deadline {
            return Err(ApiError::DeadlinePassed {
                section_id: section_id.to_string(),
                deadline: section.drop_deadline,
                action: "退课".to_string(),
            });
        }

        if actor.role == Role::Student {
            self.enforce_student_owns_record(actor, &student)?;
        }

        self.admission_engine.atomic_drop(student_id, section_id)?;
        Ok(())
    }

    // ==========================================
    // 自助查询
    // ==========================================

    /// 学生的全部选课记录
    pub fn enrollments_for_student(&self, student_id: &str) -> ApiResult<Vec<EnrollmentRecord>> {
        Ok(self.enrollment_repo.find_by_student(student_id)?)
    }

    /// 教学班的全部选课记录
    pub fn enrollments_for_section(&self, section_id: &str) -> ApiResult<Vec<EnrollmentRecord>> {
        Ok(self.enrollment_repo.find_by_section(section_id)?)
    }

    /// 候补位次（1 起; 不在候补队列返回 None）
    pub fn waitlist_position(
        &self,
        section_id: &str,
        student_id: &str,
    ) -> ApiResult<Option<usize>> {
        let section = self.require_section(section_id)?;
        Ok(section.waitlist_position(student_id))
    }

    // ==========================================
    // 访问控制
    // ==========================================

    /// 会话存在性 + 维护模式检查（管理员不受维护模式限制）
    fn ensure_can_mutate<'a>(&self, actor: Option<&'a User>) -> ApiResult<&'a User> {
        let actor = actor.ok_or(ApiError::Unauthenticated)?;
        if self.config.is_maintenance_mode()? && actor.role != Role::Admin {
            return Err(ApiError::MaintenanceLocked);
        }
        Ok(actor)
    }

    /// 学生自助操作只能针对本人档案
    fn enforce_student_owns_record(&self, actor: &User, student: &Student) -> ApiResult<()> {
        let owns = student
            .username
            .as_deref()
            .map(|username| actor.is_same_username(username))
            .unwrap_or(false);
        if !owns {
            return Err(ApiError::Forbidden("学生只能管理本人选课".to_string()));
        }
        Ok(())
    }

    fn require_section(&self, section_id: &str) -> ApiResult<Section> {
        self.section_repo
            .find_by_id(section_id)?
            .ok_or_else(|| ApiError::NotFound(format!("Section(id={})不存在", section_id)))
    }

    fn require_student(&self, student_id: &str) -> ApiResult<Student> {
        self.student_repo
            .find_by_id(student_id)?
            .ok_or_else(|| ApiError::NotFound(format!("Student(id={})不存在", student_id)))
    }
}

/// 业务规则使用的当前日期（本地日历日）
fn current_date() -> NaiveDate {
    Local::now().date_naive()
}

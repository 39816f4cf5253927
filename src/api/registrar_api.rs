// ==========================================
// 校园选课管理系统 - 教务管理 API
// ==========================================
// 职责: 教学班的创建与任课教师指派 (教务员操作)
// 准入: 仅管理员角色
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::domain::section::Section;
use crate::domain::types::Role;
use crate::domain::user::User;
use crate::repository::{CourseRepository, FacultyRepository, SectionRepository};
use std::sync::Arc;

// ==========================================
// RegistrarApi - 教务管理服务
// ==========================================
pub struct RegistrarApi {
    section_repo: Arc<SectionRepository>,
    course_repo: Arc<CourseRepository>,
    faculty_repo: Arc<FacultyRepository>,
}

impl RegistrarApi {
    pub fn new(
        section_repo: Arc<SectionRepository>,
        course_repo: Arc<CourseRepository>,
        faculty_repo: Arc<FacultyRepository>,
    ) -> Self {
        Self {
            section_repo,
            course_repo,
            faculty_repo,
        }
    }

    // ==========================================
    // 教学班管理
    // ==========================================

    /// 创建教学班
    ///
    /// 校验: 容量必须大于 0, 所属课程必须存在,
    /// 指派的教师 (若有) 必须存在
    pub fn create_section(&self, actor: Option<&User>, section: &Section) -> ApiResult<()> {
        self.ensure_admin(actor)?;

        if section.section_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("教学班编码不能为空".to_string()));
        }
        if section.capacity == 0 {
            return Err(ApiError::InvalidInput("容量必须大于 0".to_string()));
        }
        if section.drop_deadline < section.enrollment_deadline {
            return Err(ApiError::InvalidInput(
                "退课截止日期不能早于报名截止日期".to_string(),
            ));
        }

        if self.section_repo.find_by_id(&section.section_id)?.is_some() {
            return Err(ApiError::BusinessRuleViolation(format!(
                "教学班编码已存在: {}",
                section.section_id
            )));
        }
        if self.course_repo.find_by_id(&section.course_id)?.is_none() {
            return Err(ApiError::NotFound(format!(
                "Course(id={})不存在",
                section.course_id
            )));
        }
        if let Some(faculty_id) = &section.faculty_id {
            if self.faculty_repo.find_by_id(faculty_id)?.is_none() {
                return Err(ApiError::NotFound(format!(
                    "Faculty(id={})不存在",
                    faculty_id
                )));
            }
        }

        self.section_repo.insert(section)?;
        tracing::info!(
            "教学班已创建: section_id={}, course_id={}, capacity={}",
            section.section_id,
            section.course_id,
            section.capacity
        );
        Ok(())
    }

    /// 指派任课教师（已是该教师时为空操作）
    pub fn assign_instructor(
        &self,
        actor: Option<&User>,
        section_id: &str,
        faculty_id: &str,
    ) -> ApiResult<()> {
        let actor = self.ensure_admin(actor)?;

        if section_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("教学班编码不能为空".to_string()));
        }
        if faculty_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("教师工号不能为空".to_string()));
        }

        let section = self
            .section_repo
            .find_by_id(section_id)?
            .ok_or_else(|| ApiError::NotFound(format!("Section(id={})不存在", section_id)))?;

        if self.faculty_repo.find_by_id(faculty_id)?.is_none() {
            return Err(ApiError::NotFound(format!(
                "Faculty(id={})不存在",
                faculty_id
            )));
        }

        if section.faculty_id.as_deref() == Some(faculty_id) {
            return Ok(());
        }

        self.section_repo.assign_faculty(section_id, faculty_id)?;
        tracing::info!(
            "任课教师已指派: section_id={}, faculty_id={}, actor={}",
            section_id,
            faculty_id,
            actor.username
        );
        Ok(())
    }

    // ==========================================
    // 查询
    // ==========================================

    /// 按编码查询教学班
    pub fn find_section(&self, section_id: &str) -> ApiResult<Option<Section>> {
        Ok(self.section_repo.find_by_id(section_id)?)
    }

    /// 查询全部教学班
    pub fn list_sections(&self) -> ApiResult<Vec<Section>> {
        Ok(self.section_repo.list_all()?)
    }

    // ==========================================
    // 访问控制
    // ==========================================

    fn ensure_admin<'a>(&self, actor: Option<&'a User>) -> ApiResult<&'a User> {
        let actor = actor.ok_or(ApiError::Unauthenticated)?;
        if actor.role != Role::Admin {
            return Err(ApiError::Forbidden("仅管理员可执行教务管理操作".to_string()));
        }
        Ok(actor)
    }
}

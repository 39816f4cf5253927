// ==========================================
// 校园选课管理系统 - 成绩册 API
// ==========================================
// 职责: 任课教师的考核权重定义、成绩录入、
//       总评计算与教学班统计
// 准入: 所有操作要求 会话存在 + 维护模式关闭 +
//       教学班存在 + 操作者为该班任课教师
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::ConfigManager;
use crate::domain::enrollment::EnrollmentRecord;
use crate::domain::section::Section;
use crate::domain::types::EnrollmentStatus;
use crate::domain::user::User;
use crate::repository::{EnrollmentRepository, FacultyRepository, SectionRepository};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

// ==========================================
// 教学班成绩统计
// ==========================================

/// 总评统计（仅统计在册学生）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradeStatistics {
    pub count: usize,
    pub average: f64,
    pub max: Option<f64>,
    pub min: Option<f64>,
}

impl GradeStatistics {
    fn from_grades(grades: &[f64]) -> Self {
        if grades.is_empty() {
            return Self {
                count: 0,
                average: 0.0,
                max: None,
                min: None,
            };
        }
        let sum: f64 = grades.iter().sum();
        Self {
            count: grades.len(),
            average: sum / grades.len() as f64,
            max: grades.iter().copied().fold(None, |acc: Option<f64>, g| {
                Some(acc.map_or(g, |m| m.max(g)))
            }),
            min: grades.iter().copied().fold(None, |acc: Option<f64>, g| {
                Some(acc.map_or(g, |m| m.min(g)))
            }),
        }
    }
}

// ==========================================
// GradebookApi - 成绩册服务
// ==========================================
pub struct GradebookApi {
    section_repo: Arc<SectionRepository>,
    enrollment_repo: Arc<EnrollmentRepository>,
    faculty_repo: Arc<FacultyRepository>,
    config: Arc<ConfigManager>,
}

impl GradebookApi {
    pub fn new(
        section_repo: Arc<SectionRepository>,
        enrollment_repo: Arc<EnrollmentRepository>,
        faculty_repo: Arc<FacultyRepository>,
        config: Arc<ConfigManager>,
    ) -> Self {
        Self {
            section_repo,
            enrollment_repo,
            faculty_repo,
            config,
        }
    }

    // ==========================================
    // 考核权重
    // ==========================================

    /// 定义考核权重方案（整体替换, 旧组件不保留）
    ///
    /// 权重不强制合计 100, 仅在偏离时告警
    pub fn define_assessments(
        &self,
        instructor: Option<&User>,
        section_id: &str,
        weights: BTreeMap<String, f64>,
    ) -> ApiResult<()> {
        self.ensure_instructor_access(instructor, section_id)?;

        let total: f64 = weights.values().sum();
        if (total - 100.0).abs() > 1e-6 {
            tracing::warn!(
                "教学班 {} 的考核权重合计 {} != 100, 按原值继续",
                section_id,
                total
            );
        }

        self.section_repo
            .update_assessment_weights(section_id, &weights)?;

        tracing::info!(
            "考核权重已更新: section_id={}, 组件数={}",
            section_id,
            weights.len()
        );
        Ok(())
    }

    // ==========================================
    // 成绩录入
    // ==========================================

    /// 录入/覆盖单项成绩
    ///
    /// 记录存在即可录入 (退课学生的成绩历史仍可补录),
    /// 无选课记录报 NotFound
    pub fn record_score(
        &self,
        instructor: Option<&User>,
        section_id: &str,
        student_id: &str,
        component: &str,
        score: f64,
    ) -> ApiResult<()> {
        self.ensure_instructor_access(instructor, section_id)?;

        let mut record = self.locate_enrollment(section_id, student_id)?;
        record.put_score(component, score);
        self.enrollment_repo.save(&record)?;

        tracing::debug!(
            "成绩已录入: section_id={}, student_id={}, component={}, score={}",
            section_id,
            student_id,
            component,
            score
        );
        Ok(())
    }

    // ==========================================
    // 总评计算
    // ==========================================

    /// 计算并写回加权总评
    ///
    /// 同时把教学班在用权重方案快照到记录上:
    /// 之后修改权重不影响本次算出的总评, 直到再次计算
    pub fn compute_final(
        &self,
        instructor: Option<&User>,
        section_id: &str,
        student_id: &str,
    ) -> ApiResult<f64> {
        let section = self.ensure_instructor_access(instructor, section_id)?;

        let mut record = self.locate_enrollment(section_id, student_id)?;
        let final_grade = section.compute_final_score(&record.component_scores);
        record.record_final(final_grade, section.assessment_weights.clone());
        self.enrollment_repo.save(&record)?;

        tracing::info!(
            "总评已计算: section_id={}, student_id={}, final_grade={:.2}",
            section_id,
            student_id,
            final_grade
        );
        Ok(final_grade)
    }

    // ==========================================
    // 教学班统计
    // ==========================================

    /// 在册学生总评统计（候补/退课不参与）
    pub fn stats_for_section(
        &self,
        instructor: Option<&User>,
        section_id: &str,
    ) -> ApiResult<GradeStatistics> {
        self.ensure_instructor_access(instructor, section_id)?;

        let grades: Vec<f64> = self
            .enrollment_repo
            .find_by_section(section_id)?
            .into_iter()
            .filter(|record| record.status == EnrollmentStatus::Enrolled)
            .map(|record| record.final_grade)
            .collect();

        Ok(GradeStatistics::from_grades(&grades))
    }

    // ==========================================
    // 访问控制
    // ==========================================

    /// 任课教师准入检查, 通过后返回教学班快照
    fn ensure_instructor_access(
        &self,
        instructor: Option<&User>,
        section_id: &str,
    ) -> ApiResult<Section> {
        let instructor = instructor.ok_or(ApiError::Unauthenticated)?;

        if self.config.is_maintenance_mode()? {
            return Err(ApiError::MaintenanceLocked);
        }

        let section = self
            .section_repo
            .find_by_id(section_id)?
            .ok_or_else(|| ApiError::NotFound(format!("Section(id={})不存在", section_id)))?;

        let faculty = self
            .faculty_repo
            .find_by_username(&instructor.username)?
            .ok_or_else(|| ApiError::Forbidden("你未被指派到该教学班".to_string()))?;

        if section.faculty_id.as_deref() != Some(faculty.faculty_id.as_str()) {
            return Err(ApiError::Forbidden("你未被指派到该教学班".to_string()));
        }

        Ok(section)
    }

    fn locate_enrollment(
        &self,
        section_id: &str,
        student_id: &str,
    ) -> ApiResult<EnrollmentRecord> {
        self.enrollment_repo
            .find_record(section_id, student_id)?
            .ok_or_else(|| {
                ApiError::NotFound(format!(
                    "学生 {} 未选教学班 {}",
                    student_id, section_id
                ))
            })
    }
}

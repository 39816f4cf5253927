// ==========================================
// 校园选课管理系统 - 准入引擎
// ==========================================
// 职责: 报名 (选入或候补) 与退课 (含候补晋升) 的
//       原子状态迁移, 以及随迁移执行的业务规则
// 临界区: 以教学班为粒度加锁 —— 余量判定、名单变更、
//         落库必须在同一把锁内完成; 退课移除与晋升
//         决策同理。不同教学班互不阻塞。
// 红线: 引擎不拼 SQL, 持久化经由仓储事务方法
// ==========================================

use crate::config::ConfigManager;
use crate::domain::enrollment::EnrollmentRecord;
use crate::domain::section::Section;
use crate::domain::types::EnrollmentStatus;
use crate::engine::events::{EnrollmentEvent, EnrollmentEventType, OptionalEventPublisher};
use crate::repository::error::RepositoryError;
use crate::repository::{
    CourseRepository, EnrollmentRepository, SectionLockRegistry, SectionRepository,
};
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;

// ==========================================
// 引擎层错误类型
// ==========================================

/// 准入引擎错误
#[derive(Error, Debug)]
pub enum AdmissionError {
    #[error("记录未找到: {entity} with id={id}")]
    NotFound { entity: String, id: String },

    #[error("学生 {student_id} 已在教学班 {section_id} 在册或候补")]
    AlreadyRegistered {
        student_id: String,
        section_id: String,
    },

    #[error("学生 {student_id} 未在教学班 {section_id} 在册或候补")]
    NotRegistered {
        student_id: String,
        section_id: String,
    },

    #[error("课程 {course_id} 缺少先修课程: {}", .missing.join(", "))]
    PrerequisiteMissing {
        course_id: String,
        missing: Vec<String>,
    },

    #[error("教学班 {section_id} 与已选教学班 {conflicting_section_id} 上课时间冲突")]
    ScheduleConflict {
        section_id: String,
        conflicting_section_id: String,
    },

    #[error("学分超限: 已选 {current} 学分, 再选 {adding} 学分将超过上限 {max}")]
    CreditLimitExceeded { current: u32, adding: u32, max: u32 },

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

pub type AdmissionResult<T> = Result<T, AdmissionError>;

// ==========================================
// 退课结果
// ==========================================

/// 退课迁移的结果摘要
#[derive(Debug, Clone)]
pub struct DropOutcome {
    /// 退课前的状态
    pub previous_status: EnrollmentStatus,
    /// 本次退课触发晋升的候补学生（仅在册退课可能触发）
    pub promoted: Option<String>,
}

// ==========================================
// AdmissionEngine - 准入引擎
// ==========================================
pub struct AdmissionEngine {
    section_repo: Arc<SectionRepository>,
    enrollment_repo: Arc<EnrollmentRepository>,
    course_repo: Arc<CourseRepository>,
    config: Arc<ConfigManager>,
    locks: SectionLockRegistry,
    events: OptionalEventPublisher,
}

impl AdmissionEngine {
    pub fn new(
        section_repo: Arc<SectionRepository>,
        enrollment_repo: Arc<EnrollmentRepository>,
        course_repo: Arc<CourseRepository>,
        config: Arc<ConfigManager>,
        events: OptionalEventPublisher,
    ) -> Self {
        Self {
            section_repo,
            enrollment_repo,
            course_repo,
            config,
            locks: SectionLockRegistry::new(),
            events,
        }
    }

    // ==========================================
    // 报名: 余量判定 + 选入/候补决策
    // ==========================================

    /// 原子报名
    ///
    /// 在教学班锁内完成: 余量判定、选入或候补的决策、
    /// 名单与选课记录的事务落库。有名额时直接选入,
    /// 满员时追加候补队尾。
    pub fn atomic_register(
        &self,
        student_id: &str,
        section_id: &str,
    ) -> AdmissionResult<EnrollmentRecord> {
        let lock = self.locks.lock_for(section_id)?;
        let _guard = lock
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;

        let mut section = self.load_section(section_id)?;

        // 先修课程检查
        self.check_prerequisites(student_id, &section.course_id)?;

        // 重复报名检查（DROPPED 记录不占位, 可重新报名）
        let existing = self.enrollment_repo.find_record(section_id, student_id)?;
        if let Some(record) = &existing {
            if record.status.is_active() {
                return Err(AdmissionError::AlreadyRegistered {
                    student_id: student_id.to_string(),
                    section_id: section_id.to_string(),
                });
            }
        }

        // 上课时间冲突检查
        self.check_schedule_conflict(student_id, &section)?;

        // 余量判定与选入/候补决策
        let has_seat = !section.is_full();
        if has_seat {
            // 学分上限只在实际占用名额时检查, 候补不占学分
            self.check_credit_load(student_id, &section.course_id)?;
        }

        let status = if has_seat {
            EnrollmentStatus::Enrolled
        } else {
            EnrollmentStatus::Waitlisted
        };

        // 复用退课记录, 保留其成绩历史
        let mut record = existing.unwrap_or_else(|| {
            EnrollmentRecord::new(student_id, section_id, status)
        });
        record.set_status(status);

        if has_seat {
            section.enroll_student(student_id);
        } else {
            section.waitlist_student(student_id);
        }

        self.enrollment_repo
            .persist_registration(&section, &record)?;

        tracing::info!(
            "报名完成: student_id={}, section_id={}, status={}, 剩余名额={}",
            student_id,
            section_id,
            status,
            section.available_seats()
        );

        self.publish_registration_event(&section, student_id, status);

        Ok(record)
    }

    // ==========================================
    // 退课: 移除 + 晋升决策
    // ==========================================

    /// 原子退课
    ///
    /// 在教学班锁内完成: 从所在名单移除、记录置 DROPPED、
    /// 在册退课时恰好一次队首晋升、事务落库。
    /// 候补学生退课不触发晋升。
    pub fn atomic_drop(&self, student_id: &str, section_id: &str) -> AdmissionResult<DropOutcome> {
        let lock = self.locks.lock_for(section_id)?;
        let _guard = lock
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;

        let mut section = self.load_section(section_id)?;

        let mut record = self
            .enrollment_repo
            .find_record(section_id, student_id)?
            .filter(|r| r.status.is_active())
            .ok_or_else(|| AdmissionError::NotRegistered {
                student_id: student_id.to_string(),
                section_id: section_id.to_string(),
            })?;

        let previous_status = record.status;
        record.set_status(EnrollmentStatus::Dropped);
        section.remove_student(student_id);

        // 仅在册学生退课释放名额, 触发队首晋升
        let mut promoted_record = None;
        if previous_status == EnrollmentStatus::Enrolled {
            if let Some(promoted_id) = section.promote_next_waitlisted() {
                let mut promoted = self
                    .enrollment_repo
                    .find_record(section_id, &promoted_id)?
                    .unwrap_or_else(|| {
                        EnrollmentRecord::new(&promoted_id, section_id, EnrollmentStatus::Waitlisted)
                    });
                promoted.set_status(EnrollmentStatus::Enrolled);
                promoted_record = Some(promoted);
            }
        }

        self.enrollment_repo
            .persist_drop(&section, &record, promoted_record.as_ref())?;

        let promoted = promoted_record.map(|r| r.student_id);
        tracing::info!(
            "退课完成: student_id={}, section_id={}, 原状态={}, 晋升={:?}",
            student_id,
            section_id,
            previous_status,
            promoted
        );

        self.publish_event(
            student_id,
            section_id,
            EnrollmentEventType::Dropped,
            format!("你已退出 {} ({})。", section.title, section.section_id),
        );
        if let Some(promoted_id) = &promoted {
            self.publish_event(
                promoted_id,
                section_id,
                EnrollmentEventType::Promoted,
                format!("{} 有名额释放, 你已从候补选入。", section.title),
            );
        }

        Ok(DropOutcome {
            previous_status,
            promoted,
        })
    }

    // ==========================================
    // 业务规则检查
    // ==========================================

    fn load_section(&self, section_id: &str) -> AdmissionResult<Section> {
        self.section_repo
            .find_by_id(section_id)?
            .ok_or_else(|| AdmissionError::NotFound {
                entity: "Section".to_string(),
                id: section_id.to_string(),
            })
    }

    /// 先修课程检查: 每门先修课需已修完成（总评达到通过线）
    /// 或当前在修（在册/候补）
    fn check_prerequisites(&self, student_id: &str, course_id: &str) -> AdmissionResult<()> {
        let prereqs = self.course_repo.find_prerequisites(course_id)?;
        if prereqs.is_empty() {
            return Ok(());
        }

        let threshold = self.config.passing_threshold()?;
        let records = self.enrollment_repo.find_by_student(student_id)?;

        let mut completed: HashSet<String> = HashSet::new();
        let mut active: HashSet<String> = HashSet::new();
        for record in &records {
            let Some(section) = self.section_repo.find_by_id(&record.section_id)? else {
                continue;
            };
            if record.final_grade >= threshold {
                completed.insert(section.course_id.clone());
            }
            if record.status.is_active() {
                active.insert(section.course_id);
            }
        }

        let missing: Vec<String> = prereqs
            .into_iter()
            .filter(|p| !completed.contains(p) && !active.contains(p))
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(AdmissionError::PrerequisiteMissing {
                course_id: course_id.to_string(),
                missing,
            })
        }
    }

    /// 上课时间冲突检查: 目标教学班与任一在册教学班同星期且时段相交
    fn check_schedule_conflict(&self, student_id: &str, target: &Section) -> AdmissionResult<()> {
        let records = self.enrollment_repo.find_by_student(student_id)?;
        for record in records
            .iter()
            .filter(|r| r.status == EnrollmentStatus::Enrolled)
        {
            let Some(other) = self.section_repo.find_by_id(&record.section_id)? else {
                continue;
            };
            if other.overlaps(target) {
                return Err(AdmissionError::ScheduleConflict {
                    section_id: target.section_id.clone(),
                    conflicting_section_id: other.section_id,
                });
            }
        }
        Ok(())
    }

    /// 学分上限检查: 当前在册学分 + 本课程学分不得超过上限
    fn check_credit_load(&self, student_id: &str, course_id: &str) -> AdmissionResult<()> {
        let max = self.config.max_term_credits()?;
        let adding = self.course_credit_hours(course_id)?;

        let records = self.enrollment_repo.find_by_student(student_id)?;
        let mut current: u32 = 0;
        for record in records
            .iter()
            .filter(|r| r.status == EnrollmentStatus::Enrolled)
        {
            let Some(section) = self.section_repo.find_by_id(&record.section_id)? else {
                continue;
            };
            current += self.course_credit_hours(&section.course_id)?;
        }

        if current + adding > max {
            return Err(AdmissionError::CreditLimitExceeded {
                current,
                adding,
                max,
            });
        }
        Ok(())
    }

    /// 课程学分数（课程缺失或 0 学分按 3 学分兜底, 与历史口径一致）
    fn course_credit_hours(&self, course_id: &str) -> AdmissionResult<u32> {
        let credits = self
            .course_repo
            .find_by_id(course_id)?
            .map(|c| c.effective_credit_hours())
            .unwrap_or(3);
        Ok(credits)
    }

    // ==========================================
    // 事件发布
    // ==========================================

    fn publish_registration_event(
        &self,
        section: &Section,
        student_id: &str,
        status: EnrollmentStatus,
    ) {
        let (event_type, message) = match status {
            EnrollmentStatus::Enrolled => (
                EnrollmentEventType::Enrolled,
                format!("你已成功选入 {} ({})。", section.title, section.section_id),
            ),
            _ => {
                let position = section.waitlist_position(student_id).unwrap_or(0);
                (
                    EnrollmentEventType::Waitlisted,
                    format!(
                        "{} 已满员, 你在候补队列第 {} 位。",
                        section.title, position
                    ),
                )
            }
        };
        self.publish_event(student_id, &section.section_id, event_type, message);
    }

    fn publish_event(
        &self,
        student_id: &str,
        section_id: &str,
        event_type: EnrollmentEventType,
        message: String,
    ) {
        let event = EnrollmentEvent::new(student_id, section_id, event_type, message);
        if let Err(e) = self.events.publish(event) {
            tracing::warn!("选课事件发布失败: {}, 继续执行", e);
        }
    }
}

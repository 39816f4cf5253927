// ==========================================
// 校园选课管理系统 - API层错误类型
// ==========================================
// 职责: 定义调用方可见的错误分类，转换仓储层/引擎层
//       错误为用户可理解的业务错误
// 红线: 任何校验失败必须显式上抛, 不得吞错继续
// ==========================================

use crate::engine::admission::AdmissionError;
use crate::repository::error::RepositoryError;
use chrono::NaiveDate;
use thiserror::Error;

/// API层错误类型
/// 所有错误信息必须包含显式原因
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 访问控制错误
    // ==========================================
    #[error("未提供用户会话")]
    Unauthenticated,

    #[error("无权操作: {0}")]
    Forbidden(String),

    #[error("系统维护中, 仅管理员可执行变更操作")]
    MaintenanceLocked,

    // ==========================================
    // 业务规则错误
    // ==========================================
    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("教学班 {section_id} 的{action}截止日期 {deadline} 已过")]
    DeadlinePassed {
        section_id: String,
        deadline: NaiveDate,
        action: String,
    },

    #[error("学生 {student_id} 已在教学班 {section_id} 在册或候补")]
    AlreadyRegistered {
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

    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("业务规则违反: {0}")]
    BusinessRuleViolation(String),

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("持久化失败: {0}")]
    PersistenceFailure(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ==========================================
// 从 RepositoryError 转换
// 目的: 将仓储层的技术错误转换为调用方可见的错误分类
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }

            // 存储协作方未能完成操作 → 持久化失败
            RepositoryError::LockError(msg)
            | RepositoryError::DatabaseConnectionError(msg)
            | RepositoryError::DatabaseTransactionError(msg)
            | RepositoryError::DatabaseQueryError(msg) => ApiError::PersistenceFailure(msg),
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::PersistenceFailure(format!("唯一约束违反: {}", msg))
            }
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::PersistenceFailure(format!("外键约束违反: {}", msg))
            }
            // 库内数据不符合预期格式, 同样归为持久化层问题
            RepositoryError::FieldValueError { field, message } => {
                ApiError::PersistenceFailure(format!("字段{}错误: {}", field, message))
            }

            RepositoryError::BusinessRuleViolation(msg) => ApiError::BusinessRuleViolation(msg),
            RepositoryError::ValidationError(msg) => ApiError::InvalidInput(msg),

            RepositoryError::InternalError(msg) => ApiError::InternalError(msg),
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

// ==========================================
// 从 AdmissionError 转换
// ==========================================
impl From<AdmissionError> for ApiError {
    fn from(err: AdmissionError) -> Self {
        match err {
            AdmissionError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            AdmissionError::NotRegistered {
                student_id,
                section_id,
            } => ApiError::NotFound(format!(
                "学生 {} 未在教学班 {} 在册或候补",
                student_id, section_id
            )),
            AdmissionError::AlreadyRegistered {
                student_id,
                section_id,
            } => ApiError::AlreadyRegistered {
                student_id,
                section_id,
            },
            AdmissionError::PrerequisiteMissing { course_id, missing } => {
                ApiError::PrerequisiteMissing { course_id, missing }
            }
            AdmissionError::ScheduleConflict {
                section_id,
                conflicting_section_id,
            } => ApiError::ScheduleConflict {
                section_id,
                conflicting_section_id,
            },
            AdmissionError::CreditLimitExceeded {
                current,
                adding,
                max,
            } => ApiError::CreditLimitExceeded {
                current,
                adding,
                max,
            },
            AdmissionError::Repository(err) => err.into(),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_error_conversion() {
        // NotFound错误转换
        let repo_err = RepositoryError::NotFound {
            entity: "Section".to_string(),
            id: "SEC-100".to_string(),
        };
        let api_err: ApiError = repo_err.into();
        match api_err {
            ApiError::NotFound(msg) => {
                assert!(msg.contains("Section"));
                assert!(msg.contains("SEC-100"));
            }
            _ => panic!("Expected NotFound"),
        }

        // 数据库错误归为持久化失败
        let repo_err = RepositoryError::DatabaseTransactionError("disk I/O error".to_string());
        let api_err: ApiError = repo_err.into();
        assert!(matches!(api_err, ApiError::PersistenceFailure(_)));
    }

    #[test]
    fn test_admission_error_conversion() {
        let err = AdmissionError::AlreadyRegistered {
            student_id: "S001".to_string(),
            section_id: "SEC-100".to_string(),
        };
        let api_err: ApiError = err.into();
        assert!(matches!(api_err, ApiError::AlreadyRegistered { .. }));

        let err = AdmissionError::CreditLimitExceeded {
            current: 22,
            adding: 3,
            max: 24,
        };
        let api_err: ApiError = err.into();
        match api_err {
            ApiError::CreditLimitExceeded { current, adding, max } => {
                assert_eq!(current, 22);
                assert_eq!(adding, 3);
                assert_eq!(max, 24);
            }
            _ => panic!("Expected CreditLimitExceeded"),
        }
    }

    #[test]
    fn test_nested_repository_error_through_admission() {
        let err = AdmissionError::Repository(RepositoryError::NotFound {
            entity: "Student".to_string(),
            id: "S001".to_string(),
        });
        let api_err: ApiError = err.into();
        assert!(matches!(api_err, ApiError::NotFound(_)));
    }
}

// ==========================================
// 校园选课管理系统 - 引擎层
// ==========================================
// 职责: 实现业务规则引擎,不拼 SQL
// 红线: Engine 不拼 SQL, 所有拒绝必须输出原因
// ==========================================

pub mod admission;
pub mod events;

// 重导出核心引擎
pub use admission::{AdmissionEngine, AdmissionError, AdmissionResult, DropOutcome};
pub use events::{
    EnrollmentEvent, EnrollmentEventPublisher, EnrollmentEventType, NoOpEventPublisher,
    OptionalEventPublisher,
};

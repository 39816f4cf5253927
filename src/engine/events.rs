// ==========================================
// 校园选课管理系统 - 引擎层事件发布
// ==========================================
// 职责: 定义选课事件发布 trait，实现依赖倒置
// 说明: Engine 层定义 trait，通知子系统实现适配器;
//       消息投递本身由外部子系统负责
// ==========================================

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::sync::Arc;

// ==========================================
// 选课事件类型
// ==========================================

/// 选课事件触发类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnrollmentEventType {
    /// 选入成功
    Enrolled,
    /// 进入候补队列
    Waitlisted,
    /// 候补晋升
    Promoted,
    /// 退课
    Dropped,
}

impl EnrollmentEventType {
    /// 转换为字符串标识
    pub fn as_str(&self) -> &str {
        match self {
            EnrollmentEventType::Enrolled => "Enrolled",
            EnrollmentEventType::Waitlisted => "Waitlisted",
            EnrollmentEventType::Promoted => "Promoted",
            EnrollmentEventType::Dropped => "Dropped",
        }
    }
}

/// 选课事件
///
/// 引擎层在状态迁移落库后发布, 供通知子系统生成学生侧消息
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrollmentEvent {
    /// 学号
    pub student_id: String,
    /// 教学班编码
    pub section_id: String,
    /// 事件类型
    pub event_type: EnrollmentEventType,
    /// 面向学生的消息文本
    pub message: String,
}

impl EnrollmentEvent {
    pub fn new(
        student_id: impl Into<String>,
        section_id: impl Into<String>,
        event_type: EnrollmentEventType,
        message: impl Into<String>,
    ) -> Self {
        Self {
            student_id: student_id.into(),
            section_id: section_id.into(),
            event_type,
            message: message.into(),
        }
    }
}

// ==========================================
// 事件发布 Trait
// ==========================================

/// 选课事件发布者 Trait
///
/// Engine 层定义，通知子系统实现
/// 通过 trait 实现依赖倒置，引擎不依赖任何投递渠道
pub trait EnrollmentEventPublisher: Send + Sync {
    /// 发布选课事件
    ///
    /// # 返回
    /// - `Ok(())`: 已接收（投递由实现方负责）
    /// - `Err`: 发布失败（调用方仅记录, 不回滚业务状态）
    fn publish(&self, event: EnrollmentEvent) -> Result<(), Box<dyn Error + Send + Sync>>;
}

/// 空操作事件发布者
///
/// 用于不需要事件发布的场景（如单元测试）
#[derive(Debug, Clone, Default)]
pub struct NoOpEventPublisher;

impl EnrollmentEventPublisher for NoOpEventPublisher {
    fn publish(&self, event: EnrollmentEvent) -> Result<(), Box<dyn Error + Send + Sync>> {
        tracing::debug!(
            "NoOpEventPublisher: 跳过事件发布 - student_id={}, section_id={}, event_type={}",
            event.student_id,
            event.section_id,
            event.event_type.as_str()
        );
        Ok(())
    }
}

/// 可选的事件发布者包装
///
/// 简化 Option<Arc<dyn EnrollmentEventPublisher>> 的使用
pub struct OptionalEventPublisher {
    inner: Option<Arc<dyn EnrollmentEventPublisher>>,
}

impl OptionalEventPublisher {
    /// 创建带发布者的实例
    pub fn with_publisher(publisher: Arc<dyn EnrollmentEventPublisher>) -> Self {
        Self {
            inner: Some(publisher),
        }
    }

    /// 创建空实例（不发布事件）
    pub fn none() -> Self {
        Self { inner: None }
    }

    /// 发布事件（如果有发布者）
    pub fn publish(&self, event: EnrollmentEvent) -> Result<(), Box<dyn Error + Send + Sync>> {
        match &self.inner {
            Some(publisher) => publisher.publish(event),
            None => {
                tracing::debug!(
                    "OptionalEventPublisher: 未配置发布者，跳过事件 - student_id={}, event_type={}",
                    event.student_id,
                    event.event_type.as_str()
                );
                Ok(())
            }
        }
    }

    /// 检查是否配置了发布者
    pub fn is_configured(&self) -> bool {
        self.inner.is_some()
    }
}

impl Default for OptionalEventPublisher {
    fn default() -> Self {
        Self::none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_construction() {
        let event = EnrollmentEvent::new(
            "S001",
            "SEC-100",
            EnrollmentEventType::Enrolled,
            "你已成功选入 程序设计基础 (SEC-100)。",
        );
        assert_eq!(event.student_id, "S001");
        assert_eq!(event.event_type, EnrollmentEventType::Enrolled);
    }

    #[test]
    fn test_noop_publisher() {
        let publisher = NoOpEventPublisher;
        let event = EnrollmentEvent::new("S001", "SEC-100", EnrollmentEventType::Dropped, "已退课");
        assert!(publisher.publish(event).is_ok());
    }

    #[test]
    fn test_optional_publisher_none() {
        let publisher = OptionalEventPublisher::none();
        assert!(!publisher.is_configured());

        let event =
            EnrollmentEvent::new("S001", "SEC-100", EnrollmentEventType::Waitlisted, "候补中");
        assert!(publisher.publish(event).is_ok());
    }

    #[test]
    fn test_optional_publisher_with_noop() {
        let noop = Arc::new(NoOpEventPublisher) as Arc<dyn EnrollmentEventPublisher>;
        let publisher = OptionalEventPublisher::with_publisher(noop);
        assert!(publisher.is_configured());

        let event =
            EnrollmentEvent::new("S001", "SEC-100", EnrollmentEventType::Promoted, "已晋升");
        assert!(publisher.publish(event).is_ok());
    }
}

// ==========================================
// 校园选课管理系统 - 课程实体
// ==========================================
// 说明: 课程是教学班的模板; 考核权重属于教学班而非课程
// ==========================================

use serde::{Deserialize, Serialize};

/// 课程
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
    pub course_id: String,
    pub course_name: String,
    pub credit_hours: u32,
}

impl Course {
    pub fn new(course_id: impl Into<String>, course_name: impl Into<String>, credit_hours: u32) -> Self {
        Self {
            course_id: course_id.into(),
            course_name: course_name.into(),
            credit_hours,
        }
    }

    /// 学分数（历史数据中存在 0 学分脏数据，按 3 学分兜底）
    pub fn effective_credit_hours(&self) -> u32 {
        if self.credit_hours == 0 {
            3
        } else {
            self.credit_hours
        }
    }
}

// ==========================================
// 校园选课管理系统 - 教学班领域模型
// ==========================================
// 职责: 容量/候补队列状态与考核权重方案的唯一持有者
// 不变式:
// - |enrolled| <= capacity 恒成立
// - 同一学号最多出现在 enrolled / waitlist 之一
// - 候补队列只在队首弹出 (FIFO), 不重排
// ==========================================

use crate::domain::types::Term;
use chrono::{NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};

// ==========================================
// Section - 教学班
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Section {
    // ===== 标识 =====
    pub section_id: String, // 教学班编码
    pub course_id: String,  // 所属课程
    pub title: String,

    // ===== 教学安排 =====
    pub faculty_id: Option<String>, // 任课教师
    pub day_of_week: Weekday,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub location: Option<String>,

    // ===== 容量与期限 =====
    pub capacity: u32, // 必须 > 0
    pub enrollment_deadline: NaiveDate,
    pub drop_deadline: NaiveDate,

    // ===== 学期 =====
    pub term: Term,
    pub year: i32,

    // ===== 名单 =====
    // enrolled: 插入顺序即选课顺序; waitlist: 插入顺序即候补位次
    pub enrolled: Vec<String>,
    pub waitlist: VecDeque<String>,

    // ===== 考核权重方案 (组件名 -> 百分比权重) =====
    pub assessment_weights: BTreeMap<String, f64>,
}

impl Section {
    // ==========================================
    // 容量/候补引擎
    // ==========================================
    // 红线: enroll/waitlist 自身不做容量判断,
    //       余量检查与入队决策由持有教学班锁的调用方原子完成

    /// 选入学生（幂等；已在册则不重复计数）
    pub fn enroll_student(&mut self, student_id: &str) {
        if !self.enrolled.iter().any(|s| s == student_id) {
            self.enrolled.push(student_id.to_string());
        }
    }

    /// 追加候补（幂等；追加到队尾）
    pub fn waitlist_student(&mut self, student_id: &str) {
        if !self.waitlist.iter().any(|s| s == student_id) {
            self.waitlist.push_back(student_id.to_string());
        }
    }

    /// 从在册与候补名单中无条件移除（退课与晋升清理共用）
    pub fn remove_student(&mut self, student_id: &str) {
        self.enrolled.retain(|s| s != student_id);
        self.waitlist.retain(|s| s != student_id);
    }

    /// 晋升队首候补学生
    ///
    /// 严格 FIFO: 队首弹出即选入, 队列顺序本身就是唯一裁决依据。
    /// 这是候补离队进入在册的唯一通道, 每次在册学生退课恰好调用一次。
    ///
    /// # 返回
    /// - Some(student_id): 被晋升的学生
    /// - None: 候补队列为空
    pub fn promote_next_waitlisted(&mut self) -> Option<String> {
        let next = self.waitlist.pop_front()?;
        self.enroll_student(&next);
        Some(next)
    }

    /// 是否满员
    pub fn is_full(&self) -> bool {
        self.enrolled.len() as u32 >= self.capacity
    }

    /// 剩余名额
    pub fn available_seats(&self) -> u32 {
        self.capacity.saturating_sub(self.enrolled.len() as u32)
    }

    /// 学生是否已在册或候补
    pub fn has_student(&self, student_id: &str) -> bool {
        self.enrolled.iter().any(|s| s == student_id)
            || self.waitlist.iter().any(|s| s == student_id)
    }

    /// 候补位次（1 起；不在候补队列返回 None）
    pub fn waitlist_position(&self, student_id: &str) -> Option<usize> {
        self.waitlist.iter().position(|s| s == student_id).map(|i| i + 1)
    }

    // ==========================================
    // 考核权重方案
    // ==========================================

    /// 整体替换权重方案（全量覆盖, 旧组件不保留）
    pub fn replace_assessment_weights(&mut self, weights: BTreeMap<String, f64>) {
        self.assessment_weights = weights;
    }

    /// 按权重方案计算加权总评
    ///
    /// 口径: 仅遍历权重方案中的组件; 有权重无成绩按 0 分计,
    ///       有成绩无权重不参与计算, 不做归一化
    pub fn compute_final_score(&self, component_scores: &BTreeMap<String, f64>) -> f64 {
        self.assessment_weights
            .iter()
            .map(|(component, weight)| {
                let score = component_scores.get(component).copied().unwrap_or(0.0);
                score * weight / 100.0
            })
            .sum()
    }

    /// 课堂时间是否与另一教学班冲突（同星期且时段相交）
    pub fn overlaps(&self, other: &Section) -> bool {
        if self.day_of_week != other.day_of_week {
            return false;
        }
        !(other.end_time < self.start_time || other.start_time > self.end_time)
    }
}

// ==========================================
// 校园选课管理系统 - 选课记录领域模型
// ==========================================
// 职责: (学生, 教学班) 维度的状态与成绩载体
// 不变式:
// - final_grade 与 weighting 快照只能一起写入
// - 退课不删除记录, 成绩历史随记录保留
// ==========================================

use crate::domain::types::EnrollmentStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 总评未计算的哨兵值
pub const FINAL_GRADE_UNSET: f64 = 0.0;

// ==========================================
// EnrollmentRecord - 选课记录
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrollmentRecord {
    pub student_id: String,
    pub section_id: String,
    pub status: EnrollmentStatus,

    // 分项成绩 (组件名 -> 分数)
    pub component_scores: BTreeMap<String, f64>,

    // 总评计算时刻的权重快照, 与教学班的在用方案解耦:
    // 之后修改教学班权重不会回溯改变已算出的总评
    pub weighting: BTreeMap<String, f64>,

    // 加权总评 (0.0 = 尚未计算)
    pub final_grade: f64,

    pub updated_at: DateTime<Utc>,
}

impl EnrollmentRecord {
    pub fn new(
        student_id: impl Into<String>,
        section_id: impl Into<String>,
        status: EnrollmentStatus,
    ) -> Self {
        Self {
            student_id: student_id.into(),
            section_id: section_id.into(),
            status,
            component_scores: BTreeMap::new(),
            weighting: BTreeMap::new(),
            final_grade: FINAL_GRADE_UNSET,
            updated_at: Utc::now(),
        }
    }

    /// 变更状态并刷新时间戳
    pub fn set_status(&mut self, status: EnrollmentStatus) {
        self.status = status;
        self.touch();
    }

    /// 写入/覆盖单项成绩
    pub fn put_score(&mut self, component: &str, score: f64) {
        self.component_scores.insert(component.to_string(), score);
        self.touch();
    }

    /// 写入总评与权重快照
    ///
    /// 两个字段只在此处一起覆盖, 保证快照与总评始终对应同一次计算
    pub fn record_final(&mut self, final_grade: f64, weighting: BTreeMap<String, f64>) {
        self.final_grade = final_grade;
        self.weighting = weighting;
        self.touch();
    }

    /// 总评是否已计算过
    pub fn has_final_grade(&self) -> bool {
        !self.weighting.is_empty() || self.final_grade != FINAL_GRADE_UNSET
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_record_has_no_final() {
        let record = EnrollmentRecord::new("S1", "SEC-100", EnrollmentStatus::Enrolled);
        assert!(!record.has_final_grade());
        assert_eq!(record.final_grade, FINAL_GRADE_UNSET);
    }

    #[test]
    fn test_record_final_writes_both_fields() {
        let mut record = EnrollmentRecord::new("S1", "SEC-100", EnrollmentStatus::Enrolled);
        let mut weighting = BTreeMap::new();
        weighting.insert("Final".to_string(), 100.0);

        record.record_final(88.5, weighting.clone());
        assert_eq!(record.final_grade, 88.5);
        assert_eq!(record.weighting, weighting);
        assert!(record.has_final_grade());
    }

    #[test]
    fn test_put_score_touches_timestamp() {
        let mut record = EnrollmentRecord::new("S1", "SEC-100", EnrollmentStatus::Enrolled);
        let before = record.updated_at;
        record.put_score("Quiz", 75.0);
        assert_eq!(record.component_scores.get("Quiz"), Some(&75.0));
        assert!(record.updated_at >= before);
    }
}

// ==========================================
// 校园选课管理系统 - 学生实体
// ==========================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// 学生档案
///
/// 费用/考勤等字段属外部子系统, 此处仅保留选课核心所需字段
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Student {
    pub student_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    // 关联的登录账号 (学生自助操作的归属校验依据)
    pub username: Option<String>,
    pub program: Option<String>,
    pub semester: i32,
    pub admission_date: Option<NaiveDate>,
    pub status: String,
}

impl Student {
    pub fn new(student_id: impl Into<String>, first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            student_id: student_id.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: None,
            phone: None,
            username: None,
            program: None,
            semester: 1,
            admission_date: None,
            status: "Active".to_string(),
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

// ==========================================
// 校园选课管理系统 - 教师实体
// ==========================================

use serde::{Deserialize, Serialize};

/// 教师档案
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Faculty {
    pub faculty_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub department: Option<String>,
    pub designation: Option<String>,
    // 关联的登录账号 (成绩操作的归属校验依据)
    pub username: Option<String>,
    pub status: String,
}

impl Faculty {
    pub fn new(faculty_id: impl Into<String>, first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            faculty_id: faculty_id.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: None,
            department: None,
            designation: None,
            username: None,
            status: "Active".to_string(),
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

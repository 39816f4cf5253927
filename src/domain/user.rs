// ==========================================
// 校园选课管理系统 - 用户会话实体
// ==========================================
// 说明: 认证/口令管理属外部子系统, 此处仅保留
//       访问控制所需的会话身份信息
// ==========================================

use crate::domain::types::Role;
use serde::{Deserialize, Serialize};

/// 当前操作者（已通过外部认证的会话身份）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    pub role: Role,
    pub full_name: String,
    pub email: Option<String>,
    pub active: bool,
}

impl User {
    pub fn new(username: impl Into<String>, role: Role, full_name: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            role,
            full_name: full_name.into(),
            email: None,
            active: true,
        }
    }

    /// 用户名比较（大小写不敏感，与历史系统口径一致）
    pub fn is_same_username(&self, other: &str) -> bool {
        self.username.eq_ignore_ascii_case(other)
    }
}

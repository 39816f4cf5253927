// ==========================================
// 校园选课管理系统 - 领域类型定义
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 用户角色 (Role)
// ==========================================
// 角色决定可执行的操作: 学生只能管理本人选课,
// 教师操作名下教学班成绩, 管理员不受维护模式限制
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Student, // 学生
    Faculty, // 教师
    Admin,   // 管理员
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Student => write!(f, "STUDENT"),
            Role::Faculty => write!(f, "FACULTY"),
            Role::Admin => write!(f, "ADMIN"),
        }
    }
}

impl Role {
    /// 从字符串解析角色（大小写不敏感）
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "STUDENT" => Some(Role::Student),
            "FACULTY" => Some(Role::Faculty),
            "ADMIN" => Some(Role::Admin),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            Role::Student => "STUDENT",
            Role::Faculty => "FACULTY",
            Role::Admin => "ADMIN",
        }
    }
}

// ==========================================
// 选课状态 (Enrollment Status)
// ==========================================
// 状态机: 首次报名按余量进入 ENROLLED 或 WAITLISTED;
// 退课置 DROPPED (记录保留); 候补晋升仅指向 ENROLLED
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EnrollmentStatus {
    Enrolled,   // 已选入
    Waitlisted, // 候补中
    Dropped,    // 已退课
}

impl fmt::Display for EnrollmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnrollmentStatus::Enrolled => write!(f, "ENROLLED"),
            EnrollmentStatus::Waitlisted => write!(f, "WAITLISTED"),
            EnrollmentStatus::Dropped => write!(f, "DROPPED"),
        }
    }
}

impl EnrollmentStatus {
    /// 从字符串解析状态
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "ENROLLED" => Some(EnrollmentStatus::Enrolled),
            "WAITLISTED" => Some(EnrollmentStatus::Waitlisted),
            "DROPPED" => Some(EnrollmentStatus::Dropped),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            EnrollmentStatus::Enrolled => "ENROLLED",
            EnrollmentStatus::Waitlisted => "WAITLISTED",
            EnrollmentStatus::Dropped => "DROPPED",
        }
    }

    /// 是否为有效占位状态（在册或候补，未退课）
    pub fn is_active(&self) -> bool {
        !matches!(self, EnrollmentStatus::Dropped)
    }
}

// ==========================================
// 学期 (Term)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Term {
    Spring, // 春季
    Summer, // 夏季
    Fall,   // 秋季
    Winter, // 冬季
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Spring => write!(f, "SPRING"),
            Term::Summer => write!(f, "SUMMER"),
            Term::Fall => write!(f, "FALL"),
            Term::Winter => write!(f, "WINTER"),
        }
    }
}

impl Term {
    /// 从字符串解析学期（未识别时回退秋季，与历史数据一致）
    pub fn from_str(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "SPRING" => Term::Spring,
            "SUMMER" => Term::Summer,
            "WINTER" => Term::Winter,
            _ => Term::Fall,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            Term::Spring => "SPRING",
            Term::Summer => "SUMMER",
            Term::Fall => "FALL",
            Term::Winter => "WINTER",
        }
    }
}

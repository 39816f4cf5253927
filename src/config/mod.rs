// ==========================================
// 校园选课管理系统 - 配置层
// ==========================================
// 职责: 系统配置读取与默认值
// ==========================================

pub mod config_manager;

pub use config_manager::ConfigManager;
pub use config_manager::{
    DEFAULT_MAX_TERM_CREDITS, DEFAULT_PASSING_THRESHOLD, KEY_MAINTENANCE, KEY_MAX_TERM_CREDITS,
    KEY_PASSING_THRESHOLD,
};

// ==========================================
// 校园选课管理系统 - 教学班互斥锁注册表
// ==========================================
// 职责: 为每个教学班提供独立的临界区锁
// 红线: 按教学班编码加锁, 绝不使用全局大锁,
//       不同教学班的报名/退课互不阻塞
// ==========================================

use crate::repository::error::{RepositoryError, RepositoryResult};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// 教学班互斥锁注册表
///
/// 容量判定 + 名单变更 + 持久化写入必须在同一把教学班锁内完成,
/// 否则两个并发报名可能同时通过同一个余量检查。
#[derive(Default)]
pub struct SectionLockRegistry {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl SectionLockRegistry {
    pub fn new() -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// 获取指定教学班的锁句柄（首次访问时创建）
    pub fn lock_for(&self, section_id: &str) -> RepositoryResult<Arc<Mutex<()>>> {
        let mut locks = self
            .locks
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;

        let lock = locks
            .entry(section_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        Ok(lock)
    }
}

//! 增强候选帧的选择集

use thiserror::Error;

/// 单次增强最多处理的帧数
pub const MAX_SELECTED: usize = 8;

#[derive(Debug, Error, PartialEq)]
pub enum SelectionError {
    #[error("Selection is full ({max} frames max)")]
    CapacityReached { max: usize },
}

/// 按加入顺序保存被选中帧的时间戳
///
/// 顺序即"存储顺序"：增强管线的参考帧取该顺序的中间元素，
/// 因此这里用 Vec 而不是集合。
#[derive(Debug, Clone)]
pub struct SelectionStore {
    selected: Vec<u64>,
    cap: usize,
}

impl SelectionStore {
    pub fn new() -> Self {
        Self::with_capacity(MAX_SELECTED)
    }

    pub fn with_capacity(cap: usize) -> Self {
        Self {
            selected: Vec::new(),
            cap,
        }
    }

    /// 切换一个时间戳的选中状态
    ///
    /// 已选中则移除（总是允许），未选中则在容量内加入。
    /// 超出容量时拒绝变更并返回容量错误，调用方据此提示用户。
    pub fn toggle(&mut self, timestamp_ms: u64) -> Result<bool, SelectionError> {
        if let Some(pos) = self.selected.iter().position(|&t| t == timestamp_ms) {
            self.selected.remove(pos);
            return Ok(false);
        }

        if self.selected.len() >= self.cap {
            return Err(SelectionError::CapacityReached { max: self.cap });
        }

        self.selected.push(timestamp_ms);
        Ok(true)
    }

    /// 用候选列表的前 cap 个替换当前选择（超出部分静默截断）
    pub fn select_all(&mut self, candidates: &[u64]) {
        self.selected = candidates.iter().take(self.cap).copied().collect();
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    pub fn contains(&self, timestamp_ms: u64) -> bool {
        self.selected.contains(&timestamp_ms)
    }

    pub fn timestamps(&self) -> &[u64] {
        &self.selected
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }
}

impl Default for SelectionStore {
    fn default() -> Self {
        Self::new()
    }
}

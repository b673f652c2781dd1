//! 运行进度汇报

use std::sync::{Arc, Mutex};

/// 观察者读到的进度快照
#[derive(Debug, Clone, Default)]
pub struct ProgressSnapshot {
    pub message: String,
    pub current: u32,
    pub total: u32,
    /// 已接受 / 已产出的帧数
    pub accepted: u32,
    /// 最近处理的一帧（JPEG/PNG 字节），供界面预览
    pub preview: Option<Vec<u8>>,
}

/// 管线在每个工作单元之后写入的进度汇聚点
///
/// 只保存最新值：写入从不阻塞、不排队，观察者轮询慢于写入时
/// 中间值会被覆盖掉，这是预期行为。克隆句柄共享同一份状态。
#[derive(Clone)]
pub struct ProgressReporter {
    inner: Arc<Mutex<ProgressSnapshot>>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(ProgressSnapshot::default())),
        }
    }

    /// 开始一轮新任务：重置计数并设置总量与初始消息
    pub fn begin(&self, total: u32, message: &str) {
        if let Ok(mut state) = self.inner.lock() {
            *state = ProgressSnapshot {
                message: message.to_string(),
                total,
                ..Default::default()
            };
        }
    }

    pub fn set_message(&self, message: &str) {
        if let Ok(mut state) = self.inner.lock() {
            state.message = message.to_string();
        }
    }

    pub fn step(&self, current: u32) {
        if let Ok(mut state) = self.inner.lock() {
            state.current = current;
        }
    }

    pub fn set_accepted(&self, accepted: u32) {
        if let Ok(mut state) = self.inner.lock() {
            state.accepted = accepted;
        }
    }

    pub fn set_preview(&self, image: &[u8]) {
        if let Ok(mut state) = self.inner.lock() {
            state.preview = Some(image.to_vec());
        }
    }

    pub fn reset(&self) {
        if let Ok(mut state) = self.inner.lock() {
            *state = ProgressSnapshot::default();
        }
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        self.inner
            .lock()
            .map(|state| state.clone())
            .unwrap_or_default()
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

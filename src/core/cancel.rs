//! 协作式取消

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// 两条管线共用的取消标志
///
/// 只在每帧循环顶部检查：已经发出的远程调用会执行完，
/// 其结果照常落账，然后循环才退出。克隆句柄共享同一标志。
#[derive(Clone)]
pub struct CancelFlag {
    flag: Arc<AtomicBool>,
}

impl CancelFlag {
    pub fn new() -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// 新一轮运行开始前清除标志
    pub fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

impl Default for CancelFlag {
    fn default() -> Self {
        Self::new()
    }
}

use std::sync::atomic::{AtomicBool, Ordering};

/// 测试模式开关
///
/// 开启时 `enabled()` 只校验配置，不构造真实的适配器实例。
pub trait TestMode: Send + Sync {
    fn active(&self) -> bool;
}

impl TestMode for bool {
    fn active(&self) -> bool {
        *self
    }
}

/// 可在运行时切换的测试模式开关
#[derive(Debug, Default)]
pub struct TestModeFlag(AtomicBool);

impl TestModeFlag {
    pub fn new(active: bool) -> Self {
        Self(AtomicBool::new(active))
    }

    pub fn set(&self, active: bool) {
        self.0.store(active, Ordering::SeqCst);
    }
}

impl TestMode for TestModeFlag {
    fn active(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

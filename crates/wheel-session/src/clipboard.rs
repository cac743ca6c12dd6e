//! 剪贴板端口

use parking_lot::Mutex;

/// 剪贴板写入，尽力而为，返回是否成功
pub trait ClipboardSink: Send + Sync {
    fn copy(&self, text: &str) -> bool;
}

/// 内存剪贴板，记录最近一次写入
#[derive(Debug, Default)]
pub struct MemoryClipboard {
    content: Mutex<Option<String>>,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn content(&self) -> Option<String> {
        self.content.lock().clone()
    }
}

impl ClipboardSink for MemoryClipboard {
    fn copy(&self, text: &str) -> bool {
        *self.content.lock() = Some(text.to_string());
        true
    }
}

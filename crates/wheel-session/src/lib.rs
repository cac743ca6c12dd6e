//! 折扣转盘会话控制器
//!
//! 负责一次转盘会话的完整状态机：领取前检查、动画计时、折扣码签发与失败兜底。
//!
//! # 主要模块
//!
//! - `auth`: 认证端口，由调用方注入 token 的读取与轮换
//! - `clipboard`: 剪贴板端口
//! - `catalog`: 仅用于动画展示的预览码目录
//! - `session`: `WheelSession` 状态机

pub mod auth;
pub mod catalog;
pub mod clipboard;
pub mod session;

pub use auth::{AuthPort, MemoryAuth};
pub use catalog::{PreviewCatalog, PreviewTemplate};
pub use clipboard::{ClipboardSink, MemoryClipboard};
pub use session::{SessionPhase, SessionSnapshot, SpinOutcome, WheelSession};

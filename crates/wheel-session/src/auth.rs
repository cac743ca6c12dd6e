//! 认证端口
//!
//! 会话控制器不从全局上下文读取 token，而是在构造时注入 `AuthPort`。

use parking_lot::RwLock;

/// 认证提供方
#[cfg_attr(test, mockall::automock)]
pub trait AuthPort: Send + Sync {
    fn is_authenticated(&self) -> bool;

    /// 当前可用的最佳 token
    fn token(&self) -> Option<String>;

    /// 服务端轮换 token 后回写
    fn set_token(&self, token: String);
}

/// 内存版认证提供方
#[derive(Debug, Default)]
pub struct MemoryAuth {
    token: RwLock<Option<String>>,
}

impl MemoryAuth {
    pub fn new(token: Option<String>) -> Self {
        Self {
            token: RwLock::new(token.filter(|t| !t.trim().is_empty())),
        }
    }

    pub fn authenticated(token: impl Into<String>) -> Self {
        Self::new(Some(token.into()))
    }

    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn logout(&self) {
        *self.token.write() = None;
    }
}

impl AuthPort for MemoryAuth {
    fn is_authenticated(&self) -> bool {
        self.token.read().is_some()
    }

    fn token(&self) -> Option<String> {
        self.token.read().clone()
    }

    fn set_token(&self, token: String) {
        if token.trim().is_empty() {
            return;
        }
        *self.token.write() = Some(token);
    }
}

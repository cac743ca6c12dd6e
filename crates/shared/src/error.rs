//! 统一错误处理模块
//!
//! 定义转盘客户端、会话控制器与后台管理器共用的错误类型，使用 thiserror 提供良好的错误信息。

use thiserror::Error;

/// 服务端拒绝但未给出原因时展示给用户的通用文案
pub const GENERIC_REJECTION_MESSAGE: &str = "服务暂时无法处理请求，请稍后再试";

/// 系统错误类型
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuletaError {
    // ==================== 本地决策错误 ====================
    #[error("用户未登录")]
    Unauthenticated,

    #[error("无法转动转盘: {reason}")]
    PrecheckRejected { reason: String },

    #[error("转盘正在转动中")]
    SessionBusy,

    #[error("会话已关闭")]
    SessionClosed,

    // ==================== 传输错误 ====================
    #[error("请求超时")]
    Timeout,

    #[error("网络错误: {0}")]
    Network(String),

    #[error("服务端拒绝: {}", message.as_deref().unwrap_or(GENERIC_REJECTION_MESSAGE))]
    ServerRejected { message: Option<String> },

    #[error("无效的响应: {0}")]
    InvalidResponse(String),

    // ==================== 资源错误 ====================
    #[error("记录未找到: {entity} id={id}")]
    NotFound { entity: String, id: String },

    #[error("参数验证失败: {0}")]
    Validation(String),

    // ==================== 通用错误 ====================
    #[error("配置错误: {0}")]
    Config(String),

    #[error("内部错误: {0}")]
    Internal(String),
}

/// 错误结果类型别名
pub type Result<T> = std::result::Result<T, RuletaError>;

impl RuletaError {
    /// 获取错误码
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "UNAUTHENTICATED",
            Self::PrecheckRejected { .. } => "PRECHECK_REJECTED",
            Self::SessionBusy => "SESSION_BUSY",
            Self::SessionClosed => "SESSION_CLOSED",
            Self::Timeout => "TIMEOUT",
            Self::Network(_) => "NETWORK_ERROR",
            Self::ServerRejected { .. } => "SERVER_REJECTED",
            Self::InvalidResponse(_) => "INVALID_RESPONSE",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// 是否为可重试错误
    ///
    /// 只有网络/超时类的瞬时故障才值得重试，4xx 业务错误重试也不会成功。
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout | Self::Network(_))
    }

    /// 面向用户的错误说明
    ///
    /// 服务端给出的业务错误原样展示，其余错误使用本地文案。
    pub fn user_message(&self) -> String {
        match self {
            Self::ServerRejected {
                message: Some(message),
            } if !message.trim().is_empty() => message.clone(),
            Self::ServerRejected { .. } => GENERIC_REJECTION_MESSAGE.to_string(),
            Self::Timeout => "服务器响应超时，请检查网络后重试".to_string(),
            Self::Network(_) => "网络连接失败，请检查网络后重试".to_string(),
            other => other.to_string(),
        }
    }

    /// 服务端拒绝的快捷构造
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::ServerRejected {
            message: Some(message.into()),
        }
    }
}

impl From<config::ConfigError> for RuletaError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<serde_json::Error> for RuletaError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidResponse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code() {
        let err = RuletaError::PrecheckRejected {
            reason: "已达上限".to_string(),
        };
        assert_eq!(err.code(), "PRECHECK_REJECTED");
        assert_eq!(RuletaError::Timeout.code(), "TIMEOUT");
    }

    #[test]
    fn test_is_retryable() {
        assert!(RuletaError::Timeout.is_retryable());
        assert!(RuletaError::Network("connection reset".to_string()).is_retryable());

        assert!(!RuletaError::rejected("code limit reached").is_retryable());
        assert!(!RuletaError::Unauthenticated.is_retryable());
        assert!(!RuletaError::InvalidResponse("eof".to_string()).is_retryable());
    }

    #[test]
    fn test_user_message_uses_server_text_verbatim() {
        let err = RuletaError::rejected("Ya tienes el máximo de códigos activos");
        assert_eq!(err.user_message(), "Ya tienes el máximo de códigos activos");
    }

    #[test]
    fn test_user_message_falls_back_to_generic() {
        let err = RuletaError::ServerRejected { message: None };
        assert_eq!(err.user_message(), GENERIC_REJECTION_MESSAGE);

        let blank = RuletaError::rejected("   ");
        assert_eq!(blank.user_message(), GENERIC_REJECTION_MESSAGE);
    }

    #[test]
    fn test_display() {
        let err = RuletaError::ServerRejected { message: None };
        assert_eq!(err.to_string(), format!("服务端拒绝: {GENERIC_REJECTION_MESSAGE}"));

        let err = RuletaError::Network("dns".to_string());
        assert_eq!(err.to_string(), "网络错误: dns");
    }
}

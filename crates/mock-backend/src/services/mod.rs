//! Mock 服务路由
//!
//! 提供转盘接口与后台资源 CRUD 的 REST 端点实现。

pub mod admin_service;
pub mod ruleta_service;

pub use admin_service::admin_routes;
pub use ruleta_service::ruleta_routes;

use axum::{Json, http::StatusCode};
use serde_json::{Value, json};

/// 错误响应：状态码 + `{ success: false, message }`
pub type ApiError = (StatusCode, Json<Value>);

pub(crate) fn failure(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(json!({ "success": false, "message": message.into() })),
    )
}

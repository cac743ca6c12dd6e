//! Mock 转盘服务
//!
//! 提供折扣码生成与查询端点，支持 Bearer token 认证、可用码上限、
//! token 轮换以及故障注入，用于客户端与会话控制器的集成测试。

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    routing::{get, post},
};
use serde_json::{Value, json};

use super::{ApiError, failure};
use crate::state::MockBackendState;

/// 构建转盘服务路由
pub fn ruleta_routes() -> Router<Arc<MockBackendState>> {
    Router::new()
        .route("/clients/ruleta/generate", post(generate_code))
        .route("/clients/ruleta/codes", get(list_codes))
}

/// 生成新折扣码
#[tracing::instrument(skip_all)]
async fn generate_code(
    State(state): State<Arc<MockBackendState>>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    state.count_generate();
    let user_id = authenticate(&state, &headers, true).await?;

    let Some(code) = state.issue_code(&user_id) else {
        tracing::info!("用户 {} 已达可用折扣码上限", user_id);
        return Err(failure(
            StatusCode::BAD_REQUEST,
            format!(
                "已达到可用折扣码上限（{}），请先使用已有的折扣码",
                state.config.max_active
            ),
        ));
    };

    tracing::info!("为用户 {} 生成折扣码 {}", user_id, code.code);
    let token = state.rotate_token(&user_id);

    Ok(Json(json!({
        "success": true,
        "code": code,
        "token": token,
    })))
}

/// 查询用户折扣码
#[tracing::instrument(skip_all)]
async fn list_codes(
    State(state): State<Arc<MockBackendState>>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    state.count_codes();
    let user_id = authenticate(&state, &headers, false).await?;

    let codes = state.codes_for(&user_id);
    let active = state.active_count(&user_id);
    let token = state.rotate_token(&user_id);

    Ok(Json(json!({
        "success": true,
        "codes": codes,
        "activeCodes": active,
        "maxActiveAllowed": state.config.max_active,
        "token": token,
    })))
}

/// 依次处理延迟、故障注入与 token 校验，返回 user_id
async fn authenticate(
    state: &MockBackendState,
    headers: &HeaderMap,
    generate: bool,
) -> Result<String, ApiError> {
    let delay = state.delay();
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }

    if let Some(fault) = state.take_fault(generate) {
        let status = StatusCode::from_u16(fault.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        tracing::warn!("注入故障: {}", status);
        return Err(failure(status, "注入的故障"));
    }

    let token = bearer_token(headers)
        .ok_or_else(|| failure(StatusCode::UNAUTHORIZED, "缺少认证信息"))?;

    state
        .user_for_token(token)
        .ok_or_else(|| failure(StatusCode::UNAUTHORIZED, "token 无效或已过期"))
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

// ============================================================================
// 单元测试
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::MockConfig;
    use axum::{body::Body, http::Request};
    use tower::ServiceExt;

    fn create_test_app(state: Arc<MockBackendState>) -> Router {
        ruleta_routes().with_state(state)
    }

    fn request(method: &str, uri: &str, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        builder
            .header("content-type", "application/json")
            .body(Body::from("{}"))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_generate_code() {
        let state = Arc::new(MockBackendState::default());
        state.register_user("tok", "user-1");

        let response = create_test_app(state.clone())
            .oneshot(request("POST", "/clients/ruleta/generate", Some("tok")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["success"], json!(true));
        assert_eq!(body["code"]["status"], json!("active"));
        assert!(body["token"].is_string());
        assert_eq!(state.active_count("user-1"), 1);
        assert_eq!(state.generate_calls(), 1);
    }

    #[tokio::test]
    async fn test_generate_without_token() {
        let state = Arc::new(MockBackendState::default());

        let response = create_test_app(state)
            .oneshot(request("POST", "/clients/ruleta/generate", None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = body_json(response).await;
        assert_eq!(body["success"], json!(false));
    }

    #[tokio::test]
    async fn test_generate_over_cap() {
        let state = Arc::new(MockBackendState::new(MockConfig {
            max_active: 1,
            ..Default::default()
        }));
        state.register_user("tok", "user-1");
        state.issue_code("user-1");

        let response = create_test_app(state)
            .oneshot(request("POST", "/clients/ruleta/generate", Some("tok")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(body["message"].as_str().unwrap().contains("上限"));
    }

    #[tokio::test]
    async fn test_list_codes() {
        let state = Arc::new(MockBackendState::default());
        state.register_user("tok", "user-1");
        state.issue_code("user-1");
        state.issue_code("user-1");
        let first = state.codes_for("user-1")[0].code.clone();
        state.set_code_status("user-1", &first, "used");

        let response = create_test_app(state)
            .oneshot(request("GET", "/clients/ruleta/codes", Some("tok")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["codes"].as_array().unwrap().len(), 2);
        assert_eq!(body["activeCodes"], json!(1));
        assert_eq!(body["maxActiveAllowed"], json!(10));
    }

    #[tokio::test]
    async fn test_injected_fault() {
        let state = Arc::new(MockBackendState::default());
        state.register_user("tok", "user-1");
        state.fail_next(1, 503);

        let app = create_test_app(state.clone());
        let response = app
            .clone()
            .oneshot(request("GET", "/clients/ruleta/codes", Some("tok")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let response = app
            .oneshot(request("GET", "/clients/ruleta/codes", Some("tok")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(state.codes_calls(), 2);
    }
}

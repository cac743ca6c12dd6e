//! Mock 后台资源服务
//!
//! 对分类、商品、媒体、评价、销售单提供统一的内存 CRUD 端点，
//! 响应体使用 `{ success, data, message }` 信封。

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use chrono::Utc;
use serde_json::{Value, json};
use uuid::Uuid;

use super::{ApiError, failure};
use crate::state::MockBackendState;
use crate::store::MemoryStore;

/// 构建后台资源路由
pub fn admin_routes() -> Router<Arc<MockBackendState>> {
    Router::new()
        .route("/{resource}", get(list_resources).post(create_resource))
        .route(
            "/{resource}/{id}",
            get(get_resource).put(update_resource).delete(delete_resource),
        )
}

fn envelope(data: Value) -> Json<Value> {
    Json(json!({
        "success": true,
        "message": "操作成功",
        "data": data,
    }))
}

fn store_for(state: &MockBackendState, resource: &str) -> Result<MemoryStore, ApiError> {
    state
        .admin_store(resource)
        .ok_or_else(|| failure(StatusCode::NOT_FOUND, format!("未知资源: {resource}")))
}

fn not_found(resource: &str, id: &str) -> ApiError {
    failure(StatusCode::NOT_FOUND, format!("记录不存在: {resource} id={id}"))
}

/// 列出资源
#[tracing::instrument(skip(state))]
async fn list_resources(
    State(state): State<Arc<MockBackendState>>,
    Path(resource): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let store = store_for(&state, &resource)?;
    Ok(envelope(Value::Array(store.list())))
}

/// 获取单个资源
#[tracing::instrument(skip(state))]
async fn get_resource(
    State(state): State<Arc<MockBackendState>>,
    Path((resource, id)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError> {
    let store = store_for(&state, &resource)?;
    store
        .get(&id)
        .map(envelope)
        .ok_or_else(|| not_found(&resource, &id))
}

/// 创建资源，由服务端分配 id 与创建时间
#[tracing::instrument(skip_all, fields(resource = %resource))]
async fn create_resource(
    State(state): State<Arc<MockBackendState>>,
    Path(resource): Path<String>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let store = store_for(&state, &resource)?;
    let Value::Object(mut fields) = body else {
        return Err(failure(StatusCode::BAD_REQUEST, "请求体必须是 JSON 对象"));
    };

    let id = Uuid::new_v4().to_string();
    let now = Utc::now().to_rfc3339();
    fields.insert("id".to_string(), json!(id));
    fields.insert("createdAt".to_string(), json!(now));
    fields.insert("updatedAt".to_string(), json!(now));

    let entity = Value::Object(fields);
    store.upsert(&id, entity.clone());

    tracing::info!("创建 {} 成功: {}", resource, id);
    Ok((StatusCode::CREATED, envelope(entity)))
}

/// 整体替换资源，保留 id 与创建时间
#[tracing::instrument(skip_all, fields(resource = %resource))]
async fn update_resource(
    State(state): State<Arc<MockBackendState>>,
    Path((resource, id)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let store = store_for(&state, &resource)?;
    let existing = store.get(&id).ok_or_else(|| not_found(&resource, &id))?;
    let Value::Object(mut fields) = body else {
        return Err(failure(StatusCode::BAD_REQUEST, "请求体必须是 JSON 对象"));
    };

    fields.insert("id".to_string(), json!(id));
    if let Some(created_at) = existing.get("createdAt") {
        fields.insert("createdAt".to_string(), created_at.clone());
    }
    fields.insert("updatedAt".to_string(), json!(Utc::now().to_rfc3339()));

    let entity = Value::Object(fields);
    store.upsert(&id, entity.clone());

    tracing::info!("更新 {} 成功: {}", resource, id);
    Ok(envelope(entity))
}

/// 删除资源，成功响应不带 data
#[tracing::instrument(skip(state))]
async fn delete_resource(
    State(state): State<Arc<MockBackendState>>,
    Path((resource, id)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError> {
    let store = store_for(&state, &resource)?;
    store
        .remove(&id)
        .map(|_| Json(json!({ "success": true, "message": "删除成功" })))
        .ok_or_else(|| not_found(&resource, &id))
}

// ============================================================================
// 单元测试
// ============================================================================

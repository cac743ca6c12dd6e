//! 后台资源远程接口
//!
//! 后台接口统一返回 `{ success, data, message }` 信封。
//! 读、改、删在瞬时故障时按重试策略重试；创建不是幂等操作，只尝试一次。

use std::marker::PhantomData;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode, Url};
use ruleta_shared::config::AppConfig;
use ruleta_shared::error::{Result, RuletaError};
use ruleta_shared::observability::metrics::record_admin_request;
use ruleta_shared::retry::{RetryPolicy, retry_with_policy};
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::resource::Resource;

/// 资源远程接口
#[async_trait]
pub trait ResourceApi<T: Resource>: Send + Sync {
    async fn list(&self) -> Result<Vec<T>>;

    async fn get(&self, id: &str) -> Result<T>;

    async fn create(&self, draft: &T::Draft) -> Result<T>;

    /// 整体替换，返回服务端保存后的实体
    async fn update(&self, id: &str, draft: &T::Draft) -> Result<T>;

    async fn delete(&self, id: &str) -> Result<()>;
}

/// 后台接口响应信封
#[derive(Debug, Deserialize)]
struct Envelope<D> {
    success: bool,
    data: Option<D>,
    #[serde(default)]
    message: Option<String>,
}

impl<D> Envelope<D> {
    fn check(&self) -> Result<()> {
        if self.success {
            return Ok(());
        }
        Err(RuletaError::ServerRejected {
            message: self.message.clone().filter(|m| !m.trim().is_empty()),
        })
    }

    fn into_data(self, path: &str) -> Result<D> {
        self.check()?;
        self.data
            .ok_or_else(|| RuletaError::InvalidResponse(format!("{path} 响应缺少 data 字段")))
    }

    /// 只确认成功，不要求 data
    fn into_ack(self, _path: &str) -> Result<()> {
        self.check()
    }
}

/// 把成功信封转换为调用方需要的结果
type Finish<D, R> = fn(Envelope<D>, &str) -> Result<R>;

/// 基于 reqwest 的资源接口实现
pub struct RestResourceApi<T> {
    client: Client,
    base_url: String,
    token: Option<String>,
    retry: RetryPolicy,
    _resource: PhantomData<fn() -> T>,
}

impl<T> Clone for RestResourceApi<T> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            token: self.token.clone(),
            retry: self.retry.clone(),
            _resource: PhantomData,
        }
    }
}

impl<T: Resource> RestResourceApi<T> {
    pub fn new(base_url: &str, timeout: Duration, retry: RetryPolicy) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RuletaError::Config(format!("创建 HTTP 客户端失败: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
            retry,
            _resource: PhantomData,
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Self::new(
            &config.api.base_url,
            config.api.request_timeout(),
            config.retry.policy(),
        )
    }

    /// 附带 Bearer token
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into()).filter(|t| !t.trim().is_empty());
        self
    }

    fn collection_url(&self) -> String {
        format!("{}{}", self.base_url, T::PATH)
    }

    /// id 作为单个路径段编码，`/`、`?`、`#` 不会改变路由
    fn item_url(&self, id: &str) -> Result<String> {
        let mut url = Url::parse(&self.collection_url())
            .map_err(|e| RuletaError::Config(format!("无效的后台地址 {}: {e}", self.base_url)))?;
        url.path_segments_mut()
            .map_err(|_| RuletaError::Config(format!("后台地址不能拼接路径: {}", self.base_url)))?
            .push(id);
        Ok(url.to_string())
    }

    async fn execute<D, B, R>(
        &self,
        operation: &'static str,
        method: Method,
        url: String,
        body: Option<&B>,
        id: Option<&str>,
        finish: Finish<D, R>,
    ) -> Result<R>
    where
        D: DeserializeOwned,
        B: Serialize + Sync + ?Sized,
    {
        let policy = if method == Method::POST {
            RetryPolicy::none()
        } else {
            self.retry.clone()
        };
        let start = Instant::now();

        let result = retry_with_policy(&policy, operation, RuletaError::is_retryable, || {
            self.send_once(method.clone(), &url, body, id, finish)
        })
        .await;

        let outcome = match &result {
            Ok(_) => "ok",
            Err(RuletaError::NotFound { .. }) => "not_found",
            Err(e) if e.is_retryable() => "transient_error",
            Err(_) => "rejected",
        };
        record_admin_request(T::NAME, operation, outcome);
        debug!(
            resource = T::NAME,
            operation,
            outcome,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "后台资源请求完成"
        );

        result
    }

    async fn send_once<D, B, R>(
        &self,
        method: Method,
        url: &str,
        body: Option<&B>,
        id: Option<&str>,
        finish: Finish<D, R>,
    ) -> Result<R>
    where
        D: DeserializeOwned,
        B: Serialize + Sync + ?Sized,
    {
        let mut request = self.client.request(method, url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(classify_transport_error)?;
        let status = response.status();
        let bytes = response.bytes().await.map_err(classify_transport_error)?;

        if let (StatusCode::NOT_FOUND, Some(id)) = (status, id) {
            return Err(RuletaError::NotFound {
                entity: T::NAME.to_string(),
                id: id.to_string(),
            });
        }

        if status.is_server_error() {
            warn!(url, status = status.as_u16(), "后台接口返回 5xx");
            return Err(RuletaError::Network(format!("HTTP {status}")));
        }

        let envelope: Envelope<D> = match serde_json::from_slice(&bytes) {
            Ok(envelope) => envelope,
            Err(_) if status.is_client_error() => {
                return Err(RuletaError::ServerRejected { message: None });
            }
            Err(e) => {
                return Err(RuletaError::InvalidResponse(format!(
                    "解析 {url} 响应失败: {e}"
                )));
            }
        };

        if status.is_client_error() {
            warn!(url, status = status.as_u16(), message = ?envelope.message, "后台接口拒绝请求");
            return Err(RuletaError::ServerRejected {
                message: envelope.message.filter(|m| !m.trim().is_empty()),
            });
        }

        finish(envelope, url)
    }
}

#[async_trait]
impl<T: Resource> ResourceApi<T> for RestResourceApi<T> {
    async fn list(&self) -> Result<Vec<T>> {
        let url = self.collection_url();
        self.execute::<Vec<T>, Value, _>(
            "list",
            Method::GET,
            url,
            None,
            None,
            Envelope::into_data,
        )
        .await
    }

    async fn get(&self, id: &str) -> Result<T> {
        let url = self.item_url(id)?;
        self.execute::<T, Value, _>(
            "get",
            Method::GET,
            url,
            None,
            Some(id),
            Envelope::into_data,
        )
        .await
    }

    async fn create(&self, draft: &T::Draft) -> Result<T> {
        let url = self.collection_url();
        self.execute::<T, T::Draft, _>(
            "create",
            Method::POST,
            url,
            Some(draft),
            None,
            Envelope::into_data,
        )
        .await
    }

    async fn update(&self, id: &str, draft: &T::Draft) -> Result<T> {
        let url = self.item_url(id)?;
        self.execute::<T, T::Draft, _>(
            "update",
            Method::PUT,
            url,
            Some(draft),
            Some(id),
            Envelope::into_data,
        )
        .await
    }

    /// 删除成功的响应不一定带 data，只检查 success
    async fn delete(&self, id: &str) -> Result<()> {
        let url = self.item_url(id)?;
        self.execute::<IgnoredAny, Value, _>(
            "delete",
            Method::DELETE,
            url,
            None,
            Some(id),
            Envelope::into_ack,
        )
        .await
    }
}

fn classify_transport_error(err: reqwest::Error) -> RuletaError {
    if err.is_timeout() {
        RuletaError::Timeout
    } else {
        RuletaError::Network(err.to_string())
    }
}

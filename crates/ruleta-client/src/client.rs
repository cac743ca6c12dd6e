//! 转盘远程服务 HTTP 客户端
//!
//! 通过 `RuletaService` trait 抽象远程调用，会话控制器只依赖该接口，
//! 测试时可注入 mock 实现。

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, Method};
use ruleta_shared::config::AppConfig;
use ruleta_shared::error::{Result, RuletaError};
use ruleta_shared::observability::metrics::record_ruleta_request;
use ruleta_shared::retry::{RetryPolicy, retry_with_policy};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::models::{CodeListing, CodesResponse, ErrorBody, GenerateResponse, IssuedCode};

pub const GENERATE_PATH: &str = "/clients/ruleta/generate";
pub const CODES_PATH: &str = "/clients/ruleta/codes";

// ---------------------------------------------------------------------------
// Trait 抽象
// ---------------------------------------------------------------------------

/// 转盘远程服务接口
///
/// 调用方需先确认用户已登录；该层不做身份认证，只负责传输、超时、重试和错误分类。
#[async_trait]
pub trait RuletaService: Send + Sync {
    /// 请求服务端生成一个新折扣码
    async fn request_new_code(&self, token: &str) -> Result<IssuedCode>;

    /// 查询用户已有的折扣码及可用上限
    async fn list_user_codes(&self, token: &str) -> Result<CodeListing>;
}

// ---------------------------------------------------------------------------
// reqwest 实现
// ---------------------------------------------------------------------------

/// 基于 reqwest 的转盘服务客户端
///
/// reqwest::Client 内部带连接池，clone 是廉价操作。
#[derive(Clone)]
pub struct HttpRuletaClient {
    client: Client,
    base_url: String,
    retry: RetryPolicy,
}

impl HttpRuletaClient {
    /// 创建客户端
    ///
    /// `timeout` 是单次请求的等待上限，重试时每次尝试重新计时。
    pub fn new(base_url: &str, timeout: Duration, retry: RetryPolicy) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RuletaError::Config(format!("创建 HTTP 客户端失败: {e}")))?;

        info!(
            base_url,
            timeout_ms = timeout.as_millis() as u64,
            max_attempts = retry.max_attempts,
            "转盘服务客户端已初始化"
        );

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            retry,
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Self::new(
            &config.api.base_url,
            config.api.request_timeout(),
            config.retry.policy(),
        )
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// 带重试地执行一次接口调用
    async fn execute<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        method: Method,
        path: &str,
        token: &str,
    ) -> Result<T> {
        if token.trim().is_empty() {
            return Err(RuletaError::Unauthenticated);
        }

        let url = self.url(path);
        let start = Instant::now();

        let result = retry_with_policy(&self.retry, endpoint, RuletaError::is_retryable, || {
            self.send_once::<T>(method.clone(), &url, token)
        })
        .await;

        let outcome = match &result {
            Ok(_) => "ok",
            Err(e) if e.is_retryable() => "transient_error",
            Err(_) => "rejected",
        };
        record_ruleta_request(endpoint, outcome, start.elapsed());

        result
    }

    async fn send_once<T: DeserializeOwned>(
        &self,
        method: Method,
        url: &str,
        token: &str,
    ) -> Result<T> {
        let mut request = self.client.request(method.clone(), url).bearer_auth(token);
        if method == Method::POST {
            request = request.json(&serde_json::json!({}));
        }

        debug!(%method, url, "发送转盘服务请求");

        let response = request.send().await.map_err(classify_transport_error)?;
        let status = response.status();
        let body = response.bytes().await.map_err(classify_transport_error)?;

        if status.is_server_error() {
            warn!(url, status = status.as_u16(), "转盘服务返回 5xx");
            return Err(RuletaError::Network(format!("HTTP {status}")));
        }

        if status.is_client_error() {
            let message = serde_json::from_slice::<ErrorBody>(&body)
                .ok()
                .and_then(ErrorBody::into_message);
            warn!(url, status = status.as_u16(), ?message, "转盘服务拒绝请求");
            return Err(RuletaError::ServerRejected { message });
        }

        serde_json::from_slice(&body)
            .map_err(|e| RuletaError::InvalidResponse(format!("解析 {url} 响应失败: {e}")))
    }
}

#[async_trait]
impl RuletaService for HttpRuletaClient {
    async fn request_new_code(&self, token: &str) -> Result<IssuedCode> {
        let response: GenerateResponse = self
            .execute("generate", Method::POST, GENERATE_PATH, token)
            .await?;
        let issued = response.into_issued()?;

        info!(
            code = %issued.code.code,
            token_rotated = issued.rotated_token.is_some(),
            "折扣码生成成功"
        );
        Ok(issued)
    }

    async fn list_user_codes(&self, token: &str) -> Result<CodeListing> {
        let response: CodesResponse = self
            .execute("codes", Method::GET, CODES_PATH, token)
            .await?;
        let listing = response.into_listing()?;

        debug!(
            total = listing.codes.len(),
            active = listing.active_count,
            max_active = listing.max_active_allowed,
            "折扣码列表查询完成"
        );
        Ok(listing)
    }
}

/// 传输层错误分类：超时单独归类，其余都视为网络错误
fn classify_transport_error(err: reqwest::Error) -> RuletaError {
    if err.is_timeout() {
        RuletaError::Timeout
    } else {
        RuletaError::Network(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client =
            HttpRuletaClient::new("http://localhost:8090/", Duration::from_secs(1), RetryPolicy::none())
                .unwrap();
        assert_eq!(
            client.url(GENERATE_PATH),
            "http://localhost:8090/clients/ruleta/generate"
        );
    }

    #[tokio::test]
    async fn test_empty_token_rejected_locally() {
        // 端口 9 上没有服务，若真的发出请求会得到网络错误而不是 Unauthenticated
        let client =
            HttpRuletaClient::new("http://127.0.0.1:9", Duration::from_secs(1), RetryPolicy::none())
                .unwrap();

        assert_eq!(
            client.request_new_code("").await.unwrap_err(),
            RuletaError::Unauthenticated
        );
        assert_eq!(
            client.list_user_codes("   ").await.unwrap_err(),
            RuletaError::Unauthenticated
        );
    }

    #[test]
    fn test_from_config() {
        let config = AppConfig::default();
        let client = HttpRuletaClient::from_config(&config).unwrap();
        assert_eq!(client.retry.max_attempts, 3);
        assert_eq!(client.url(CODES_PATH), "http://localhost:8090/clients/ruleta/codes");
    }
}

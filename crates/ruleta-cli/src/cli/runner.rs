//! 命令执行器
//!
//! 负责执行各 CLI 子命令的具体逻辑，返回待输出的文本。

use std::fmt::Write as _;
use std::sync::Arc;

use admin_resources::models::{Category, Media, Product, Review, Sale};
use admin_resources::{Resource, ResourceManager, RestResourceApi};
use anyhow::{Context, Result};
use ruleta_client::{CodeListing, DiscountCode, HttpRuletaClient};
use ruleta_shared::config::AppConfig;
use serde::Serialize;
use tracing::info;
use wheel_session::{AuthPort, MemoryAuth, SpinOutcome, WheelSession};

use super::commands::AdminResource;

/// 命令执行器
pub struct CommandRunner {
    config: AppConfig,
    token: Option<String>,
}

impl CommandRunner {
    pub fn new(config: AppConfig, token: Option<String>) -> Self {
        Self { config, token }
    }

    fn session(&self) -> Result<(WheelSession<HttpRuletaClient, MemoryAuth>, Arc<MemoryAuth>)> {
        let client = HttpRuletaClient::from_config(&self.config).context("创建转盘客户端失败")?;
        let auth = Arc::new(MemoryAuth::new(self.token.clone()));
        let session = WheelSession::new(Arc::new(client), auth.clone(), &self.config.wheel);
        Ok((session, auth))
    }

    /// 执行 spin 命令
    pub async fn run_spin(&self) -> Result<String> {
        let (session, auth) = self.session()?;
        info!(base_url = %self.config.api.base_url, "开始转动转盘");

        let outcome = session
            .spin()
            .await
            .map_err(|e| anyhow::anyhow!(e.user_message()))
            .context("无法转动转盘")?;

        let mut output = render_outcome(&outcome);
        self.append_rotated_token(&mut output, auth.as_ref());
        Ok(output)
    }

    /// 执行 codes 命令
    pub async fn run_codes(&self) -> Result<String> {
        let (session, auth) = self.session()?;

        let listing = session
            .refresh_codes()
            .await
            .map_err(|e| anyhow::anyhow!(e.user_message()))
            .context("查询折扣码失败")?;

        let mut output = render_listing(&listing);
        self.append_rotated_token(&mut output, auth.as_ref());
        Ok(output)
    }

    /// 执行 admin list 命令，输出 JSON 格式的分页结果
    pub async fn run_admin_list(
        &self,
        resource: AdminResource,
        page: usize,
        page_size: usize,
    ) -> Result<String> {
        match resource {
            AdminResource::Categories => self.list_page::<Category>(page, page_size).await,
            AdminResource::Products => self.list_page::<Product>(page, page_size).await,
            AdminResource::Media => self.list_page::<Media>(page, page_size).await,
            AdminResource::Reviews => self.list_page::<Review>(page, page_size).await,
            AdminResource::Sales => self.list_page::<Sale>(page, page_size).await,
        }
    }

    async fn list_page<T>(&self, page: usize, page_size: usize) -> Result<String>
    where
        T: Resource + Serialize,
    {
        let mut api = RestResourceApi::<T>::from_config(&self.config)
            .with_context(|| format!("创建 {} 客户端失败", T::NAME))?;
        if let Some(token) = &self.token {
            api = api.with_token(token.clone());
        }

        let manager: ResourceManager<T> = ResourceManager::new(Arc::new(api));
        manager
            .refresh()
            .await
            .with_context(|| format!("加载 {} 失败", T::NAME))?;

        let page = manager.page(page, page_size);
        serde_json::to_string_pretty(&page).context("序列化分页结果失败")
    }

    fn append_rotated_token(&self, output: &mut String, auth: &MemoryAuth) {
        if let Some(current) = auth.token().filter(|t| Some(t) != self.token.as_ref()) {
            let _ = write!(output, "\ntoken 已轮换: {current}");
        }
    }
}

fn render_code(code: &DiscountCode) -> String {
    format!("{}  {}  {}", code.code, code.name, code.discount_label)
}

/// 渲染转盘结果；降级结果必须明确标注
pub fn render_outcome(outcome: &SpinOutcome) -> String {
    match outcome {
        SpinOutcome::Confirmed(code) => format!("恭喜获得折扣码: {}", render_code(code)),
        SpinOutcome::Degraded { preview, reason } => format!(
            "[降级] 预览码: {}（仅供展示，未实际签发）\n原因: {}",
            render_code(preview),
            reason
        ),
        SpinOutcome::Withheld { reason } => format!("未获得折扣码\n原因: {reason}"),
    }
}

/// 渲染折扣码列表
pub fn render_listing(listing: &CodeListing) -> String {
    let mut output = format!(
        "可用折扣码: {}/{}",
        listing.active_count, listing.max_active_allowed
    );
    if listing.codes.is_empty() {
        output.push_str("\n（暂无折扣码）");
    }
    for code in &listing.codes {
        let status = serde_json::to_value(code.status)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default();
        let _ = write!(output, "\n{}  [{}]", render_code(code), status);
    }
    output
}

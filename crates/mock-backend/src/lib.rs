//! Mock Backend
//!
//! 模拟电商后台的内存 HTTP 服务，用于开发和测试环境。
//!
//! # 主要模块
//!
//! - `state`: 用户、折扣码、后台资源的内存状态与故障注入
//! - `store`: 按插入顺序列出的内存存储
//! - `services`: 转盘接口与后台资源 CRUD 路由
//!
//! # 使用示例
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use mock_backend::{MockBackendState, MockConfig, spawn};
//!
//! # async fn demo() -> std::io::Result<()> {
//! let state = Arc::new(MockBackendState::new(MockConfig::default()));
//! state.register_user("token-1", "user-1");
//! let server = spawn(state).await?;
//! println!("listening on {}", server.base_url());
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod services;
pub mod state;
pub mod store;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

pub use state::{MockBackendState, MockCode, MockConfig};

/// 组装完整路由：转盘接口 + 后台资源 CRUD
pub fn router(state: Arc<MockBackendState>) -> Router {
    Router::new()
        .merge(services::ruleta_routes())
        .merge(services::admin_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// 运行中的 mock 服务
pub struct MockServer {
    addr: SocketAddr,
    handle: JoinHandle<()>,
}

impl MockServer {
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// 在给定 listener 上启动服务
pub fn serve(listener: TcpListener, state: Arc<MockBackendState>) -> std::io::Result<MockServer> {
    let addr = listener.local_addr()?;
    let app = router(state);

    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!("Mock 服务异常退出: {}", e);
        }
    });

    info!(%addr, "Mock 服务已启动");
    Ok(MockServer { addr, handle })
}

/// 绑定 127.0.0.1 的随机端口并启动服务，供集成测试使用
pub async fn spawn(state: Arc<MockBackendState>) -> std::io::Result<MockServer> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    serve(listener, state)
}

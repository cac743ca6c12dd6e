//! 转盘会话集成测试
//!
//! - 使用手写的慢速服务验证计时与并发语义（暂停时钟）
//! - 使用真实 mock-backend 验证端到端流程

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use mock_backend::{MockBackendState, MockConfig};
use parking_lot::Mutex;
use ruleta_client::{
    CodeListing, CodeStatus, DiscountCode, HttpRuletaClient, IssuedCode, RuletaService,
};
use ruleta_shared::config::WheelConfig;
use ruleta_shared::error::{Result, RuletaError};
use ruleta_shared::retry::RetryPolicy;
use tokio::time::Instant;
use wheel_session::{AuthPort, MemoryAuth, SessionPhase, SpinOutcome, WheelSession};

// ==================== 手写的慢速服务 ====================

/// 可配置响应延迟的转盘服务
struct SlowRuleta {
    precheck_delay: Duration,
    issue_delay: Duration,
    issue_calls: AtomicU32,
    tokens_seen: Mutex<Vec<String>>,
}

impl SlowRuleta {
    fn new(issue_delay: Duration) -> Self {
        Self {
            precheck_delay: Duration::ZERO,
            issue_delay,
            issue_calls: AtomicU32::new(0),
            tokens_seen: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl RuletaService for SlowRuleta {
    async fn request_new_code(&self, token: &str) -> Result<IssuedCode> {
        self.issue_calls.fetch_add(1, Ordering::SeqCst);
        self.tokens_seen.lock().push(token.to_string());
        tokio::time::sleep(self.issue_delay).await;
        Ok(IssuedCode {
            code: DiscountCode {
                code: "SLOW01".to_string(),
                name: "Bienvenida".to_string(),
                discount_label: "15% OFF".to_string(),
                color: None,
                text_color: None,
                status: CodeStatus::Active,
                expires_at: None,
            },
            rotated_token: Some("rotated".to_string()),
        })
    }

    async fn list_user_codes(&self, _token: &str) -> Result<CodeListing> {
        tokio::time::sleep(self.precheck_delay).await;
        Ok(CodeListing {
            codes: vec![],
            active_count: 0,
            max_active_allowed: 10,
            rotated_token: None,
        })
    }
}

fn slow_session(
    service: SlowRuleta,
) -> (Arc<WheelSession<SlowRuleta, MemoryAuth>>, Arc<SlowRuleta>, Arc<MemoryAuth>) {
    let service = Arc::new(service);
    let auth = Arc::new(MemoryAuth::authenticated("tok"));
    let session = Arc::new(WheelSession::new(
        service.clone(),
        auth.clone(),
        &WheelConfig::default(),
    ));
    (session, service, auth)
}

// ==================== 计时与并发 ====================

#[tokio::test(start_paused = true)]
async fn test_settles_no_earlier_than_animation() {
    let (session, _, _) = slow_session(SlowRuleta::new(Duration::ZERO));

    let start = Instant::now();
    session.spin().await.unwrap();

    assert!(start.elapsed() >= Duration::from_millis(4000));
}

#[tokio::test(start_paused = true)]
async fn test_issuance_runs_concurrently_with_animation() {
    let (session, _, _) = slow_session(SlowRuleta::new(Duration::from_millis(1500)));

    let start = Instant::now();
    session.spin().await.unwrap();

    // 1.5 秒的请求被 4 秒动画覆盖，而不是叠加
    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_millis(4000));
    assert!(elapsed < Duration::from_millis(5500));
}

#[tokio::test(start_paused = true)]
async fn test_slow_issuance_extends_spin() {
    let (session, _, _) = slow_session(SlowRuleta::new(Duration::from_secs(6)));

    let start = Instant::now();
    let outcome = session.spin().await.unwrap();

    assert!(start.elapsed() >= Duration::from_secs(6));
    assert!(matches!(outcome, SpinOutcome::Confirmed(_)));
}

#[tokio::test(start_paused = true)]
async fn test_second_spin_while_spinning_is_busy() {
    let (session, service, _) = slow_session(SlowRuleta::new(Duration::ZERO));

    let running = tokio::spawn({
        let session = session.clone();
        async move { session.spin().await }
    });
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert!(session.is_spinning());
    assert_eq!(session.spin().await, Err(RuletaError::SessionBusy));
    assert_eq!(session.reset(), Err(RuletaError::SessionBusy));

    let outcome = running.await.unwrap().unwrap();
    assert!(matches!(outcome, SpinOutcome::Confirmed(_)));
    assert_eq!(service.issue_calls.load(Ordering::SeqCst), 1);
    assert_eq!(*service.tokens_seen.lock(), vec!["tok".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn test_second_spin_during_precheck_is_busy() {
    let (session, service, _) = slow_session(SlowRuleta {
        precheck_delay: Duration::from_secs(2),
        ..SlowRuleta::new(Duration::ZERO)
    });

    let running = tokio::spawn({
        let session = session.clone();
        async move { session.spin().await }
    });
    tokio::time::sleep(Duration::from_millis(500)).await;

    // 检查阶段尚未开始动画
    assert_eq!(session.phase(), SessionPhase::Idle);
    assert_eq!(session.spin().await, Err(RuletaError::SessionBusy));

    running.await.unwrap().unwrap();
    assert_eq!(service.issue_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_abandons_in_flight_spin() {
    let (session, _, auth) = slow_session(SlowRuleta::new(Duration::from_secs(10)));

    let running = tokio::spawn({
        let session = session.clone();
        async move { session.spin().await }
    });
    tokio::time::sleep(Duration::from_secs(1)).await;
    let before = session.snapshot();

    session.shutdown();

    assert_eq!(running.await.unwrap(), Err(RuletaError::SessionClosed));
    // 关闭之后不再修改状态，也不回写 token
    assert_eq!(session.snapshot(), before);
    assert_eq!(auth.token().as_deref(), Some("tok"));
    assert_eq!(session.spin().await, Err(RuletaError::SessionClosed));
}

#[tokio::test(start_paused = true)]
async fn test_dropped_spin_releases_session() {
    let (session, service, _) = slow_session(SlowRuleta::new(Duration::ZERO));

    // 调用方放弃等待：spin future 在转动中被丢弃
    let abandoned = tokio::time::timeout(Duration::from_secs(1), session.spin()).await;
    assert!(abandoned.is_err());
    assert_eq!(session.phase(), SessionPhase::Idle);

    session.spin().await.unwrap();
    assert_eq!(service.issue_calls.load(Ordering::SeqCst), 2);
}

// ==================== 端到端 ====================

const TOKEN: &str = "tok-e2e";
const USER: &str = "user-e2e";

fn fast_wheel() -> WheelConfig {
    WheelConfig {
        spin_duration_ms: 50,
        ..Default::default()
    }
}

async fn backend_session(
    config: MockConfig,
) -> (
    Arc<MockBackendState>,
    mock_backend::MockServer,
    WheelSession<HttpRuletaClient, MemoryAuth>,
    Arc<MemoryAuth>,
) {
    let state = Arc::new(MockBackendState::new(config));
    state.register_user(TOKEN, USER);
    let server = mock_backend::spawn(state.clone()).await.unwrap();

    let client = HttpRuletaClient::new(
        &server.base_url(),
        Duration::from_secs(5),
        RetryPolicy::fixed(3, Duration::from_millis(10)),
    )
    .unwrap();
    let auth = Arc::new(MemoryAuth::authenticated(TOKEN));
    let session = WheelSession::new(Arc::new(client), auth.clone(), &fast_wheel());

    (state, server, session, auth)
}

#[tokio::test]
async fn test_end_to_end_confirmed_spin() {
    let (state, _server, session, auth) = backend_session(MockConfig::default()).await;

    let outcome = session.spin().await.unwrap();

    let SpinOutcome::Confirmed(code) = outcome else {
        panic!("预期真实折扣码，实际 {outcome:?}");
    };
    assert!(state.codes_for(USER).iter().any(|c| c.code == code.code));
    assert_ne!(auth.token().as_deref(), Some(TOKEN));

    let listing = session.refresh_codes().await.unwrap();
    assert_eq!(listing.active_count, 1);
}

#[tokio::test]
async fn test_end_to_end_cap_reached() {
    let (state, _server, session, _) = backend_session(MockConfig {
        max_active: 2,
        ..Default::default()
    })
    .await;
    state.issue_code(USER);
    state.issue_code(USER);

    let err = session.spin().await.unwrap_err();

    match err {
        RuletaError::PrecheckRejected { reason } => assert!(reason.contains('2')),
        other => panic!("预期 PrecheckRejected，实际 {other:?}"),
    }
    assert_eq!(state.generate_calls(), 0);
    assert_eq!(session.phase(), SessionPhase::Idle);
}

#[tokio::test]
async fn test_end_to_end_backend_outage_degrades() {
    let (state, _server, session, _) = backend_session(MockConfig::default()).await;
    // 领取前检查正常，签发请求的三次尝试全部失败
    state.fail_next_generate(3, 503);

    let outcome = session.spin().await.unwrap();

    assert!(outcome.is_degraded());
    assert!(outcome.code().is_some());
    assert!(session.last_error().is_some());
    assert_eq!(state.codes_calls(), 1);
    assert_eq!(state.generate_calls(), 3);
    assert_eq!(state.active_count(USER), 0);
}

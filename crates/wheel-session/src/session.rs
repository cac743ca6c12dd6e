//! 转盘会话状态机
//!
//! 状态流转：`Idle --spin()--> Spinning --动画结束且签发完成--> Settled --reset()--> Idle`。
//!
//! - 领取前检查（查询可用码数量）必须在动画开始前完成，失败或已达上限时拒绝转动
//! - 签发请求与动画计时并发执行，结算等待两者中较慢的一方
//! - 签发失败不向外抛错，按兜底策略结算为降级结果
//! - `shutdown()` 之后不再修改任何状态

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use ruleta_client::{CodeListing, DiscountCode, RuletaService};
use ruleta_shared::config::{FallbackPolicy, WheelConfig};
use ruleta_shared::error::{Result, RuletaError};
use ruleta_shared::observability::metrics::{
    SPIN_CONFIRMED, SPIN_DEGRADED, SPIN_REJECTED, SPIN_WITHHELD, record_spin,
};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::auth::AuthPort;
use crate::catalog::PreviewCatalog;
use crate::clipboard::ClipboardSink;

// ---------------------------------------------------------------------------
// 状态与结果
// ---------------------------------------------------------------------------

/// 一次转盘的结算结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpinOutcome {
    /// 服务端签发的真实折扣码
    Confirmed(DiscountCode),
    /// 签发失败，展示预览码并标记为降级
    Degraded { preview: DiscountCode, reason: String },
    /// 签发失败，不展示任何码
    Withheld { reason: String },
}

impl SpinOutcome {
    /// 需要展示的折扣码
    pub fn code(&self) -> Option<&DiscountCode> {
        match self {
            Self::Confirmed(code) => Some(code),
            Self::Degraded { preview, .. } => Some(preview),
            Self::Withheld { .. } => None,
        }
    }

    pub fn is_degraded(&self) -> bool {
        !matches!(self, Self::Confirmed(_))
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Confirmed(_) => None,
            Self::Degraded { reason, .. } | Self::Withheld { reason } => Some(reason),
        }
    }

    fn metric_label(&self) -> &'static str {
        match self {
            Self::Confirmed(_) => SPIN_CONFIRMED,
            Self::Degraded { .. } => SPIN_DEGRADED,
            Self::Withheld { .. } => SPIN_WITHHELD,
        }
    }
}

/// 会话阶段
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionPhase {
    #[default]
    Idle,
    Spinning { preview: DiscountCode },
    Settled { outcome: SpinOutcome },
}

/// 会话状态快照，通过 `subscribe()` 推送给视图层
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionSnapshot {
    pub phase: SessionPhase,
    pub last_error: Option<String>,
    pub has_spun_this_session: bool,
}

// ---------------------------------------------------------------------------
// WheelSession
// ---------------------------------------------------------------------------

/// 转盘会话控制器
///
/// 同一会话内同时只允许一次转动：领取前检查开始时即占用会话，
/// 期间再次调用 `spin()` 返回 `SessionBusy`。
pub struct WheelSession<S, A> {
    service: Arc<S>,
    auth: Arc<A>,
    spin_duration: Duration,
    fallback: FallbackPolicy,
    catalog: Mutex<PreviewCatalog>,
    state: watch::Sender<SessionSnapshot>,
    /// 转动（含领取前检查）进行中
    busy: AtomicBool,
    alive: AtomicBool,
    shutdown_tx: watch::Sender<bool>,
    codes: RwLock<Option<CodeListing>>,
}

impl<S, A> WheelSession<S, A>
where
    S: RuletaService,
    A: AuthPort,
{
    pub fn new(service: Arc<S>, auth: Arc<A>, config: &WheelConfig) -> Self {
        Self::with_catalog(service, auth, config, PreviewCatalog::new())
    }

    pub fn with_catalog(
        service: Arc<S>,
        auth: Arc<A>,
        config: &WheelConfig,
        catalog: PreviewCatalog,
    ) -> Self {
        let (state, _) = watch::channel(SessionSnapshot::default());
        let (shutdown_tx, _) = watch::channel(false);

        Self {
            service,
            auth,
            spin_duration: config.spin_duration(),
            fallback: config.fallback,
            catalog: Mutex::new(catalog),
            state,
            busy: AtomicBool::new(false),
            alive: AtomicBool::new(true),
            shutdown_tx,
            codes: RwLock::new(None),
        }
    }

    // ==================== 查询 ====================

    pub fn snapshot(&self) -> SessionSnapshot {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.state.subscribe()
    }

    pub fn phase(&self) -> SessionPhase {
        self.state.borrow().phase.clone()
    }

    pub fn is_spinning(&self) -> bool {
        matches!(self.state.borrow().phase, SessionPhase::Spinning { .. })
    }

    /// 已结算的结果；未结算时为 None
    pub fn current_result(&self) -> Option<SpinOutcome> {
        match &self.state.borrow().phase {
            SessionPhase::Settled { outcome } => Some(outcome.clone()),
            _ => None,
        }
    }

    pub fn last_error(&self) -> Option<String> {
        self.state.borrow().last_error.clone()
    }

    pub fn has_spun_this_session(&self) -> bool {
        self.state.borrow().has_spun_this_session
    }

    /// 最近一次查询到的折扣码列表，可能已过时
    pub fn cached_codes(&self) -> Option<CodeListing> {
        self.codes.read().clone()
    }

    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    // ==================== 操作 ====================

    /// 转动转盘
    ///
    /// 只有 `Idle` 阶段可以转动；`Settled` 之后需先 `reset()`。
    /// 未登录、领取前检查失败或已达上限时返回错误且阶段保持 `Idle`；
    /// 一旦开始转动，签发失败按兜底策略结算，返回 `Ok`。
    pub async fn spin(&self) -> Result<SpinOutcome> {
        if !self.is_alive() {
            return Err(RuletaError::SessionClosed);
        }
        if self
            .busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(RuletaError::SessionBusy);
        }
        let mut guard = InFlight {
            session: self,
            armed: true,
        };

        if !matches!(self.state.borrow().phase, SessionPhase::Idle) {
            return Err(RuletaError::SessionBusy);
        }

        let token = match self.auth.token() {
            Some(token) if self.auth.is_authenticated() => token,
            _ => return Err(self.reject(RuletaError::Unauthenticated)),
        };

        // 领取前检查
        let listing = match self.until_shutdown(self.service.list_user_codes(&token)).await? {
            Ok(listing) => listing,
            Err(e) => {
                warn!(error = %e, "领取前检查失败");
                return Err(self.reject(RuletaError::PrecheckRejected {
                    reason: e.user_message(),
                }));
            }
        };
        self.accept_listing(&listing);

        if !listing.has_capacity() {
            info!(
                active = listing.active_count,
                max = listing.max_active_allowed,
                "可用折扣码已达上限，拒绝转动"
            );
            return Err(self.reject(RuletaError::PrecheckRejected {
                reason: format!(
                    "已达到可用折扣码上限（{}/{}），请先使用已有的折扣码",
                    listing.active_count, listing.max_active_allowed
                ),
            }));
        }

        let preview = self.catalog.lock().next_preview();
        debug!(preview = %preview.code, "开始转动");
        self.state.send_modify(|s| {
            s.phase = SessionPhase::Spinning {
                preview: preview.clone(),
            };
            s.last_error = None;
            s.has_spun_this_session = true;
        });

        // 领取前检查可能已轮换 token
        let token = self.auth.token().unwrap_or(token);
        let (issued, ()) = self
            .until_shutdown(async {
                tokio::join!(
                    self.service.request_new_code(&token),
                    tokio::time::sleep(self.spin_duration)
                )
            })
            .await?;

        let outcome = match issued {
            Ok(issued) => {
                if let Some(rotated) = issued.rotated_token {
                    self.auth.set_token(rotated);
                }
                info!(code = %issued.code.code, "折扣码签发成功");
                SpinOutcome::Confirmed(issued.code)
            }
            Err(e) => {
                let reason = e.user_message();
                warn!(error = %e, code = e.code(), "折扣码签发失败，使用兜底结果");
                match self.fallback {
                    FallbackPolicy::ShowPreview => SpinOutcome::Degraded { preview, reason },
                    FallbackPolicy::Withhold => SpinOutcome::Withheld { reason },
                }
            }
        };

        record_spin(outcome.metric_label());
        self.state.send_modify(|s| {
            s.last_error = outcome.reason().map(str::to_string);
            s.phase = SessionPhase::Settled {
                outcome: outcome.clone(),
            };
        });
        guard.armed = false;
        self.busy.store(false, Ordering::SeqCst);

        Ok(outcome)
    }

    /// 回到 `Idle` 并清空本轮结果与错误
    pub fn reset(&self) -> Result<()> {
        if !self.is_alive() {
            return Err(RuletaError::SessionClosed);
        }
        if self.busy.load(Ordering::SeqCst) {
            return Err(RuletaError::SessionBusy);
        }

        self.state.send_if_modified(|s| {
            if s.phase == SessionPhase::Idle && s.last_error.is_none() {
                return false;
            }
            s.phase = SessionPhase::Idle;
            s.last_error = None;
            true
        });
        Ok(())
    }

    /// 关闭会话，放弃进行中的请求
    pub fn shutdown(&self) {
        if self.alive.swap(false, Ordering::SeqCst) {
            let _ = self.shutdown_tx.send(true);
            info!("转盘会话已关闭");
        }
    }

    /// 刷新用户的折扣码列表
    pub async fn refresh_codes(&self) -> Result<CodeListing> {
        if !self.is_alive() {
            return Err(RuletaError::SessionClosed);
        }
        let token = match self.auth.token() {
            Some(token) if self.auth.is_authenticated() => token,
            _ => return Err(RuletaError::Unauthenticated),
        };

        let listing = self
            .until_shutdown(self.service.list_user_codes(&token))
            .await??;
        self.accept_listing(&listing);
        Ok(listing)
    }

    /// 复制当前折扣码
    ///
    /// 只复制服务端确认的折扣码，降级的预览码不会被复制。
    pub fn copy_current_code(&self, sink: &dyn ClipboardSink) -> bool {
        match self.current_result() {
            Some(SpinOutcome::Confirmed(code)) => sink.copy(&code.code),
            _ => false,
        }
    }

    // ==================== 内部辅助 ====================

    /// 在会话关闭时提前返回 `SessionClosed`
    async fn until_shutdown<T>(&self, fut: impl Future<Output = T>) -> Result<T> {
        let mut shutdown = self.shutdown_tx.subscribe();
        tokio::select! {
            biased;
            _ = shutdown.wait_for(|closed| *closed) => Err(RuletaError::SessionClosed),
            output = fut => {
                if self.is_alive() {
                    Ok(output)
                } else {
                    Err(RuletaError::SessionClosed)
                }
            }
        }
    }

    /// 回写轮换的 token 并缓存列表
    fn accept_listing(&self, listing: &CodeListing) {
        if let Some(rotated) = &listing.rotated_token {
            self.auth.set_token(rotated.clone());
        }
        *self.codes.write() = Some(listing.clone());
    }

    /// 拒绝转动：记录原因，阶段保持 `Idle`
    fn reject(&self, err: RuletaError) -> RuletaError {
        record_spin(SPIN_REJECTED);
        let reason = err.user_message();
        self.state.send_modify(|s| s.last_error = Some(reason));
        err
    }
}

/// 转动占用标记
///
/// 正常结算前被提前释放（拒绝、取消或 future 被丢弃）时，
/// 释放占用并把未结算的 `Spinning` 退回 `Idle`；会话关闭后不再修改状态。
struct InFlight<'a, S, A> {
    session: &'a WheelSession<S, A>,
    armed: bool,
}

impl<S, A> Drop for InFlight<'_, S, A> {
    fn drop(&mut self) {
        if !self.armed || !self.session.alive.load(Ordering::SeqCst) {
            return;
        }
        self.session.state.send_if_modified(|s| {
            if matches!(s.phase, SessionPhase::Spinning { .. }) {
                s.phase = SessionPhase::Idle;
                true
            } else {
                false
            }
        });
        self.session.busy.store(false, Ordering::SeqCst);
    }
}

// ============================================================================
// 单元测试
// ============================================================================

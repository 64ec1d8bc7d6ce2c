//! Points bus: authorize → execute → consume for billable actions.
//!
//! ```text
//! Detected → Authorizing ─┬─ Authorized → Executing → Consuming → Done
//!                         ├─ NeedsTopup  → (modal) → retry
//!                         ├─ NeedsUpgrade → (modal) → retry
//!                         └─ Denied
//! ```
//!
//! The action runs through its registered handler, and points are consumed
//! only after the handler reports completion. A trigger that is already in
//! flight cannot be intercepted again until its round trip ends.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::{Arc, Mutex};

use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use reelforge_client::wire::{AuthorizeRequest, ConsumeRequest};
use reelforge_client::PointsBackend;
use reelforge_core::{ReelError, WalletInfo};

use crate::decision::AuthDecision;
use crate::detection::ActionInfo;

/// Toast shown when authorize fails at the transport level.
pub const GENERIC_FAILURE: &str = "處理失敗，請稍後再試";
/// Toast shown when no user is signed in.
pub const LOGIN_PROMPT: &str = "請先登入";
/// Label shown on a control while its action is in flight.
pub const BUSY_LABEL: &str = "處理中...";

/// Explicit completion signal returned by an action handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionCompletion {
    Completed,
    Failed(String),
}

/// Where an action currently is in its round trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionPhase {
    Authorizing,
    Executing,
    Consuming,
    Done,
}

/// Observable bus activity.
#[derive(Debug, Clone, PartialEq)]
pub enum BusEvent {
    Phase { trigger_id: String, phase: ActionPhase },
    Wallet(WalletInfo),
}

/// Final result of processing one action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BusOutcome {
    /// The action ran to completion. `consumed` is false when the consume
    /// call failed; usage is then under-reported.
    Done { usage_id: String, consumed: bool },
    /// The handler reported failure; nothing was billed.
    ActionFailed { message: String },
    NeedsTopup { action: ActionInfo, suggest_pack_ids: Vec<u32> },
    NeedsUpgrade { action: ActionInfo },
    Denied { message: String },
    LoginRequired,
    /// The same trigger is already being processed.
    AlreadyInFlight,
    /// Authorization could not be obtained.
    Failed { message: String },
}

impl BusOutcome {
    /// Toast text for outcomes that surface one.
    pub fn toast(&self) -> Option<String> {
        match self {
            BusOutcome::Denied { message }
            | BusOutcome::Failed { message }
            | BusOutcome::ActionFailed { message } => Some(message.clone()),
            BusOutcome::LoginRequired => Some(LOGIN_PROMPT.to_string()),
            _ => None,
        }
    }
}

/// Receives bus phases and wallet refreshes synchronously, in emit order.
pub type EventSink = Arc<dyn Fn(BusEvent) + Send + Sync>;

/// Gate billable actions behind the points backend.
pub struct PointsBus {
    backend: Arc<dyn PointsBackend>,
    user_id: Option<String>,
    pending: Mutex<HashMap<String, ActionInfo>>,
    in_flight: Arc<Mutex<HashSet<String>>>,
    wallet: RwLock<Option<WalletInfo>>,
    events: Option<EventSink>,
}

impl PointsBus {
    pub fn new(backend: Arc<dyn PointsBackend>, user_id: Option<String>) -> Self {
        info!(signed_in = user_id.is_some(), "Points bus initialized");
        Self {
            backend,
            user_id,
            pending: Mutex::new(HashMap::new()),
            in_flight: Arc::new(Mutex::new(HashSet::new())),
            wallet: RwLock::new(None),
            events: None,
        }
    }

    /// Report phases and wallet refreshes through `sink`.
    pub fn with_events(mut self, sink: impl Fn(BusEvent) + Send + Sync + 'static) -> Self {
        self.set_events(sink);
        self
    }

    pub fn set_events(&mut self, sink: impl Fn(BusEvent) + Send + Sync + 'static) {
        self.events = Some(Arc::new(sink));
    }

    pub async fn wallet(&self) -> Option<WalletInfo> {
        *self.wallet.read().await
    }

    /// Actions between execution and the end of their consume call.
    pub fn pending_count(&self) -> usize {
        self.pending.lock().map(|p| p.len()).unwrap_or(0)
    }

    /// Authorize `action`, run it through `run`, then bill it.
    pub async fn process<F, Fut>(&self, action: ActionInfo, run: F) -> BusOutcome
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ActionCompletion>,
    {
        if self.user_id.is_none() {
            info!(trigger = %action.trigger_id, "Billable action without a signed-in user");
            return BusOutcome::LoginRequired;
        }

        let Some(_guard) = InFlightGuard::acquire(&self.in_flight, &action.trigger_id) else {
            warn!(trigger = %action.trigger_id, "Re-entrant interception rejected");
            return BusOutcome::AlreadyInFlight;
        };

        self.emit_phase(&action.trigger_id, ActionPhase::Authorizing);
        let decision = match self.authorize(&action).await {
            Ok(d) => d,
            Err(e) => {
                error!(trigger = %action.trigger_id, error = %e, "Authorize failed");
                self.emit_phase(&action.trigger_id, ActionPhase::Done);
                return BusOutcome::Failed { message: GENERIC_FAILURE.to_string() };
            }
        };

        let outcome = match decision {
            AuthDecision::Authorized => self.execute(action.clone(), run).await,
            AuthDecision::NeedsTopup { suggest_pack_ids } => {
                info!(trigger = %action.trigger_id, ?suggest_pack_ids, "Top-up required");
                BusOutcome::NeedsTopup { action: action.clone(), suggest_pack_ids }
            }
            AuthDecision::NeedsUpgrade => {
                info!(trigger = %action.trigger_id, "Upgrade required");
                BusOutcome::NeedsUpgrade { action: action.clone() }
            }
            AuthDecision::Denied { reason } => {
                warn!(trigger = %action.trigger_id, %reason, "Authorization denied");
                BusOutcome::Denied { message: format!("授權失敗：{reason}") }
            }
        };
        self.emit_phase(&action.trigger_id, ActionPhase::Done);
        outcome
    }

    async fn authorize(&self, action: &ActionInfo) -> Result<AuthDecision, ReelError> {
        let request = AuthorizeRequest {
            module: action.module.clone(),
            mode: action.mode.clone(),
            count: action.count,
        };
        let resp = self.backend.authorize(&request).await?;
        Ok(resp.into())
    }

    async fn execute<F, Fut>(&self, action: ActionInfo, run: F) -> BusOutcome
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ActionCompletion>,
    {
        let usage_id = generate_usage_id();
        if let Ok(mut pending) = self.pending.lock() {
            pending.insert(usage_id.clone(), action.clone());
        }

        self.emit_phase(&action.trigger_id, ActionPhase::Executing);
        let completion = run().await;

        let outcome = match completion {
            ActionCompletion::Completed => {
                self.emit_phase(&action.trigger_id, ActionPhase::Consuming);
                let consumed = self.consume(&usage_id, &action).await;
                BusOutcome::Done { usage_id: usage_id.clone(), consumed }
            }
            ActionCompletion::Failed(message) => {
                info!(trigger = %action.trigger_id, %message, "Action failed; not billed");
                BusOutcome::ActionFailed { message }
            }
        };

        if let Ok(mut pending) = self.pending.lock() {
            pending.remove(&usage_id);
        }
        outcome
    }

    /// Bill a completed action. Failures are logged and otherwise ignored.
    async fn consume(&self, usage_id: &str, action: &ActionInfo) -> bool {
        let request = ConsumeRequest {
            usage_id: usage_id.to_string(),
            module: action.module.clone(),
            mode: action.mode.clone(),
            count: action.count,
            points: action.cost.unwrap_or(0),
        };
        match self.backend.consume(&request).await {
            Ok(()) => {
                debug!(usage_id, "Points consumed");
                self.refresh_wallet().await;
                true
            }
            Err(e) => {
                error!(usage_id, error = %e, "Consume failed");
                false
            }
        }
    }

    /// Refetch the wallet wholesale.
    pub async fn refresh_wallet(&self) -> Option<WalletInfo> {
        match self.backend.wallet().await {
            Ok(wallet) => {
                *self.wallet.write().await = Some(wallet);
                if let Some(sink) = &self.events {
                    sink(BusEvent::Wallet(wallet));
                }
                Some(wallet)
            }
            Err(e) => {
                error!(error = %e, "Wallet refresh failed");
                None
            }
        }
    }

    fn emit_phase(&self, trigger_id: &str, phase: ActionPhase) {
        if let Some(sink) = &self.events {
            sink(BusEvent::Phase { trigger_id: trigger_id.to_string(), phase });
        }
    }
}

/// `action_<uuid>` usage id for consume calls.
fn generate_usage_id() -> String {
    format!("action_{}", Uuid::new_v4().simple())
}

/// Marks a trigger as in flight until dropped.
struct InFlightGuard {
    set: Arc<Mutex<HashSet<String>>>,
    trigger_id: String,
}

impl InFlightGuard {
    fn acquire(set: &Arc<Mutex<HashSet<String>>>, trigger_id: &str) -> Option<Self> {
        let mut guard = set.lock().ok()?;
        if !guard.insert(trigger_id.to_string()) {
            return None;
        }
        Some(Self { set: Arc::clone(set), trigger_id: trigger_id.to_string() })
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if let Ok(mut set) = self.set.lock() {
            set.remove(&self.trigger_id);
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use tokio::sync::mpsc;

    use reelforge_client::wire::{AuthorizeResponse, CheckoutResponse};
    use reelforge_core::{Plan, PointPack};

    use super::*;

    /// Scriptable points backend.
    #[derive(Default)]
    pub(crate) struct FakePoints {
        pub authorize_replies: Mutex<Vec<Result<AuthorizeResponse, ReelError>>>,
        pub consumed: Mutex<Vec<ConsumeRequest>>,
        pub consume_fails: bool,
        pub balance: i64,
        pub wallet_calls: AtomicUsize,
        pub checkout_error: Option<fn() -> ReelError>,
        pub checkouts: Mutex<Vec<u32>>,
    }

    impl FakePoints {
        pub fn replying(reply: AuthorizeResponse) -> Self {
            Self { authorize_replies: Mutex::new(vec![Ok(reply)]), balance: 80, ..Default::default() }
        }
    }

    #[async_trait]
    impl PointsBackend for FakePoints {
        async fn authorize(
            &self,
            _request: &AuthorizeRequest,
        ) -> Result<AuthorizeResponse, ReelError> {
            let mut replies = self.authorize_replies.lock().unwrap();
            if replies.is_empty() {
                return Ok(AuthorizeResponse { authorized: true, ..Default::default() });
            }
            replies.remove(0)
        }

        async fn consume(&self, request: &ConsumeRequest) -> Result<(), ReelError> {
            if self.consume_fails {
                return Err(ReelError::Http { status: 500 });
            }
            self.consumed.lock().unwrap().push(request.clone());
            Ok(())
        }

        async fn wallet(&self) -> Result<WalletInfo, ReelError> {
            self.wallet_calls.fetch_add(1, Ordering::SeqCst);
            Ok(WalletInfo { balance: self.balance, expiring_soon: 0 })
        }

        async fn packs(&self) -> Result<Vec<PointPack>, ReelError> {
            Ok(vec![
                PointPack { pack_id: 1, name: "小額包".into(), points: 100, price_ntd: 99, valid_days: 30 },
                PointPack { pack_id: 3, name: "標準包".into(), points: 500, price_ntd: 399, valid_days: 90 },
            ])
        }

        async fn plans(&self) -> Result<Vec<Plan>, ReelError> {
            Ok(vec![Plan {
                plan_id: 7,
                name: "專業方案".into(),
                monthly_points: 3000,
                batch_limit: 10,
                roles_limit: 5,
            }])
        }

        async fn checkout(&self, pack_id: u32) -> Result<CheckoutResponse, ReelError> {
            if let Some(make) = self.checkout_error {
                return Err(make());
            }
            self.checkouts.lock().unwrap().push(pack_id);
            Ok(CheckoutResponse::default())
        }
    }

    fn action(trigger: &str) -> ActionInfo {
        ActionInfo {
            module: "腳本".into(),
            mode: "oneclick".into(),
            count: 2,
            trigger_id: trigger.into(),
            original_action: "script:oneclick:2".into(),
            cost: None,
        }
    }

    fn authorized() -> AuthorizeResponse {
        AuthorizeResponse { authorized: true, ..Default::default() }
    }

    #[tokio::test]
    async fn consumes_only_after_completion() {
        let backend = Arc::new(FakePoints::replying(authorized()));
        let bus = PointsBus::new(backend.clone(), Some("web-1".into()));

        let watcher = backend.clone();
        let outcome = bus
            .process(action("gen"), || async move {
                // Nothing is billed while the action is still running.
                assert!(watcher.consumed.lock().unwrap().is_empty());
                ActionCompletion::Completed
            })
            .await;

        let BusOutcome::Done { usage_id, consumed } = outcome else {
            panic!("expected Done, got {outcome:?}");
        };
        assert!(consumed);
        assert!(usage_id.starts_with("action_"));
        let consumed = backend.consumed.lock().unwrap();
        assert_eq!(consumed.len(), 1);
        assert_eq!(consumed[0].count, 2);
        assert_eq!(consumed[0].points, 0);
        assert_eq!(bus.wallet().await.unwrap().balance, 80);
        assert_eq!(bus.pending_count(), 0);
    }

    #[tokio::test]
    async fn failed_action_is_not_billed() {
        let backend = Arc::new(FakePoints::replying(authorized()));
        let bus = PointsBus::new(backend.clone(), Some("web-1".into()));
        let outcome = bus
            .process(action("gen"), || async { ActionCompletion::Failed("boom".into()) })
            .await;
        assert_eq!(outcome, BusOutcome::ActionFailed { message: "boom".into() });
        assert!(backend.consumed.lock().unwrap().is_empty());
        assert_eq!(backend.wallet_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn consume_failure_is_swallowed() {
        let backend = Arc::new(FakePoints { consume_fails: true, ..Default::default() });
        let bus = PointsBus::new(backend.clone(), Some("web-1".into()));
        let outcome = bus.process(action("gen"), || async { ActionCompletion::Completed }).await;
        assert!(matches!(outcome, BusOutcome::Done { consumed: false, .. }));
        assert_eq!(backend.wallet_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn topup_carries_suggestions_and_skips_handler() {
        let backend = Arc::new(FakePoints::replying(AuthorizeResponse {
            need_topup: true,
            suggest_pack_ids: vec![3],
            ..Default::default()
        }));
        let bus = PointsBus::new(backend, Some("web-1".into()));
        let ran = AtomicUsize::new(0);
        let outcome = bus
            .process(action("gen"), || async {
                ran.fetch_add(1, Ordering::SeqCst);
                ActionCompletion::Completed
            })
            .await;
        assert_eq!(ran.load(Ordering::SeqCst), 0);
        match outcome {
            BusOutcome::NeedsTopup { suggest_pack_ids, action } => {
                assert_eq!(suggest_pack_ids, vec![3]);
                assert_eq!(action.trigger_id, "gen");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn denial_and_transport_errors_become_toasts() {
        let backend = Arc::new(FakePoints {
            authorize_replies: Mutex::new(vec![
                Ok(AuthorizeResponse { reason: Some("BANNED".into()), ..Default::default() }),
                Err(ReelError::Network("refused".into())),
            ]),
            ..Default::default()
        });
        let bus = PointsBus::new(backend, Some("web-1".into()));
        let denied = bus.process(action("a"), || async { ActionCompletion::Completed }).await;
        assert_eq!(denied.toast().as_deref(), Some("授權失敗：BANNED"));
        let failed = bus.process(action("a"), || async { ActionCompletion::Completed }).await;
        assert_eq!(failed.toast().as_deref(), Some(GENERIC_FAILURE));
    }

    #[tokio::test]
    async fn requires_login() {
        let bus = PointsBus::new(Arc::new(FakePoints::default()), None);
        let outcome = bus.process(action("a"), || async { ActionCompletion::Completed }).await;
        assert_eq!(outcome, BusOutcome::LoginRequired);
    }

    #[tokio::test]
    async fn nested_interception_is_rejected() {
        let backend = Arc::new(FakePoints::default());
        let bus = Arc::new(PointsBus::new(backend.clone(), Some("web-1".into())));
        let inner_bus = bus.clone();
        let outcome = bus
            .process(action("gen"), || async move {
                let nested = inner_bus
                    .process(action("gen"), || async { ActionCompletion::Completed })
                    .await;
                assert_eq!(nested, BusOutcome::AlreadyInFlight);
                ActionCompletion::Completed
            })
            .await;
        assert!(matches!(outcome, BusOutcome::Done { consumed: true, .. }));
        assert_eq!(backend.consumed.lock().unwrap().len(), 1);

        // The guard is released afterwards.
        let again = bus.process(action("gen"), || async { ActionCompletion::Completed }).await;
        assert!(matches!(again, BusOutcome::Done { .. }));
    }

    #[tokio::test]
    async fn emits_phases_in_order() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let bus = PointsBus::new(Arc::new(FakePoints::default()), Some("u".into()))
            .with_events(move |event| {
                let _ = tx.send(event);
            });
        bus.process(action("gen"), || async { ActionCompletion::Completed }).await;
        let mut phases = Vec::new();
        while let Ok(event) = rx.try_recv() {
            if let BusEvent::Phase { phase, .. } = event {
                phases.push(phase);
            }
        }
        assert_eq!(
            phases,
            vec![
                ActionPhase::Authorizing,
                ActionPhase::Executing,
                ActionPhase::Consuming,
                ActionPhase::Done
            ]
        );
    }
}

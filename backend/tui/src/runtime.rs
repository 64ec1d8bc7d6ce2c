//! Effect runtime.
//!
//! Each [`Effect`] runs on its own tokio task and reports back by sending an
//! [`Action`] into the UI loop.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::mpsc::UnboundedSender;
use tracing::warn;

use logging::{ClientEvent, EventLogger};
use reelforge_client::{AgentClient, PointsBackend};
use reelforge_config::{load_state, save_state};
use reelforge_points::{load_catalog, log_outcome, ActionCompletion, PointsBus};

use crate::action::{Action, Effect, Job};
use crate::streaming::stream_topics;

/// Backend handles shared by every effect task.
pub struct Services {
    pub agents: AgentClient,
    pub points: Arc<dyn PointsBackend>,
    pub bus: PointsBus,
    pub state_path: PathBuf,
}

impl Services {
    pub fn new(
        agents: AgentClient,
        points: Arc<dyn PointsBackend>,
        account_id: Option<String>,
        state_path: PathBuf,
    ) -> Self {
        let bus = PointsBus::new(points.clone(), account_id);
        Self { agents, points, bus, state_path }
    }
}

#[derive(Clone)]
pub struct EffectRunner {
    services: Arc<Services>,
    tx: UnboundedSender<Action>,
}

impl EffectRunner {
    /// Bus phases and wallet updates go out on `tx` at the moment they
    /// happen, so they stay ordered with the job replies sent there.
    pub fn new(mut services: Services, tx: UnboundedSender<Action>) -> Self {
        let bus_tx = tx.clone();
        services.bus.set_events(move |event| {
            let _ = bus_tx.send(Action::Bus(event));
        });
        Self { services: Arc::new(services), tx }
    }

    pub fn run(&self, effect: Effect) {
        let services = self.services.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            if let Some(action) = execute(&services, effect, &tx).await {
                let _ = tx.send(action);
            }
        });
    }
}

async fn execute(services: &Services, effect: Effect, tx: &UnboundedSender<Action>) -> Option<Action> {
    let agents = &services.agents;
    match effect {
        Effect::LoadProfile => Some(Action::ProfileLoaded(agents.load_profile().await)),
        Effect::LoadNotes(agent) => Some(Action::NotesLoaded { agent, result: agents.notes(agent).await }),
        Effect::Analyze { text } => {
            let result = agents.analyze(&text).await;
            Some(Action::PositioningReplied { oneclick: false, user_text: text, result })
        }
        Effect::StreamTopics { text } => {
            let result = stream_topics(agents, &text, tx).await;
            Some(Action::TopicsFinished { user_text: text, result })
        }
        Effect::ScriptChat { text, options } => {
            let result = agents.generate_script_content(&text, options.as_ref()).await;
            Some(Action::ScriptReplied { oneclick: false, user_text: text, result })
        }
        Effect::SaveProfile(profile) => Some(Action::ProfileSaved(agents.save_profile(&profile).await)),
        Effect::Run(job) => {
            run_job(services, job, tx).await;
            None
        }
        Effect::Billable { action, job } => {
            let trigger_id = action.trigger_id.clone();
            let outcome = services.bus.process(action.clone(), || run_job(services, job, tx)).await;
            log_outcome(agents.user_id(), &action, &outcome);
            Some(Action::BillableSettled { trigger_id, outcome })
        }
        Effect::RefreshWallet => Some(Action::WalletLoaded(services.bus.refresh_wallet().await)),
        Effect::LoadCatalog => {
            let (packs, plans, errors) = load_catalog(services.points.as_ref()).await;
            Some(Action::CatalogLoaded { packs, plans, errors })
        }
        Effect::Checkout(pack_id) => {
            let result = services.points.checkout(pack_id).await.map(|_| ());
            EventLogger::log_event(
                agents.user_id(),
                ClientEvent::Purchase {
                    pack_id,
                    ok: result.is_ok(),
                    message: result.as_ref().err().map(|e| e.display_text()).unwrap_or_default(),
                },
            );
            Some(Action::PurchaseSettled(result))
        }
        Effect::Copy(text) => {
            let copied = tokio::task::spawn_blocking(move || {
                arboard::Clipboard::new().and_then(|mut clipboard| clipboard.set_text(text))
            })
            .await;
            match copied {
                Ok(Ok(())) => None,
                Ok(Err(e)) => {
                    warn!(error = %e, "Clipboard unavailable");
                    Some(Action::Toast("複製失敗".to_string()))
                }
                Err(e) => {
                    warn!(error = %e, "Clipboard task failed");
                    Some(Action::Toast("複製失敗".to_string()))
                }
            }
        }
        Effect::PersistSettings(settings) => {
            let mut state = load_state(&services.state_path).await;
            state.ai_points_settings = Some(settings.merge_into(state.ai_points_settings.as_ref()));
            if let Err(e) = save_state(&state, &services.state_path).await {
                warn!(error = %e, "Saving points settings failed");
            }
            None
        }
    }
}

/// Run one-click work, post its reply into the loop, and report completion
/// to the bus.
async fn run_job(services: &Services, job: Job, tx: &UnboundedSender<Action>) -> ActionCompletion {
    let agents = &services.agents;
    let (action, failure) = match job {
        Job::Positioning { theme } => {
            let result = agents.generate_positioning(&theme).await;
            let failure = result.as_ref().err().map(|e| e.display_text());
            (Action::PositioningReplied { oneclick: true, user_text: theme, result }, failure)
        }
        Job::Topics { theme } => {
            let result = stream_topics(agents, &theme, tx).await;
            let failure = result.as_ref().err().map(|e| e.display_text());
            (Action::TopicsFinished { user_text: theme, result }, failure)
        }
        Job::Script { theme, options } => {
            let result = agents.generate_script(&theme, &options).await;
            let failure = result.as_ref().err().map(|e| e.display_text());
            (Action::ScriptReplied { oneclick: true, user_text: theme, result }, failure)
        }
    };
    let _ = tx.send(action);
    match failure {
        None => ActionCompletion::Completed,
        Some(message) => ActionCompletion::Failed(message),
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use reelforge_client::wire::{
        AnalyzeRequest, AuthorizeRequest, AuthorizeResponse, ChatStreamRequest, CheckoutResponse,
        ConsumeRequest, ContentGenerateRequest, ContentResponse, PositioningGenerateRequest,
        PositioningReplyBody, ProfileResponse, SaveProfileRequest, ScriptGenerateRequest,
    };
    use reelforge_client::{AgentBackend, DeltaSink, ScriptOptions};
    use reelforge_core::{Note, Plan, PointPack, ReelError, WalletInfo};
    use reelforge_points::{ActionInfo, BusEvent};
    use tokio::sync::mpsc;

    use super::*;

    /// Every generate call fails at once.
    struct DownAgents;

    #[async_trait]
    impl AgentBackend for DownAgents {
        async fn fetch_profile(&self, _user_id: &str) -> Result<ProfileResponse, ReelError> {
            unimplemented!()
        }
        async fn analyze_positioning(&self, _r: &AnalyzeRequest) -> Result<PositioningReplyBody, ReelError> {
            unimplemented!()
        }
        async fn generate_positioning(
            &self,
            _r: &PositioningGenerateRequest,
        ) -> Result<PositioningReplyBody, ReelError> {
            Err(ReelError::Backend("down".into()))
        }
        async fn save_profile(&self, _r: &SaveProfileRequest) -> Result<(), ReelError> {
            unimplemented!()
        }
        async fn fetch_notes(&self, _user_id: &str, _agent_type: &str) -> Result<Vec<Note>, ReelError> {
            unimplemented!()
        }
        async fn chat_stream(
            &self,
            _request: &ChatStreamRequest,
            _on_delta: DeltaSink<'_>,
        ) -> Result<String, ReelError> {
            unimplemented!()
        }
        async fn generate_content(&self, _r: &ContentGenerateRequest) -> Result<ContentResponse, ReelError> {
            unimplemented!()
        }
        async fn generate_script(&self, _r: &ScriptGenerateRequest) -> Result<ContentResponse, ReelError> {
            Err(ReelError::Backend("down".into()))
        }
    }

    /// Authorizes everything.
    struct OpenPoints;

    #[async_trait]
    impl PointsBackend for OpenPoints {
        async fn authorize(&self, _r: &AuthorizeRequest) -> Result<AuthorizeResponse, ReelError> {
            Ok(AuthorizeResponse { authorized: true, ..Default::default() })
        }
        async fn consume(&self, _r: &ConsumeRequest) -> Result<(), ReelError> {
            Ok(())
        }
        async fn wallet(&self) -> Result<WalletInfo, ReelError> {
            Ok(WalletInfo { balance: 10, expiring_soon: 0 })
        }
        async fn packs(&self) -> Result<Vec<PointPack>, ReelError> {
            Ok(Vec::new())
        }
        async fn plans(&self) -> Result<Vec<Plan>, ReelError> {
            Ok(Vec::new())
        }
        async fn checkout(&self, _pack_id: u32) -> Result<CheckoutResponse, ReelError> {
            Ok(CheckoutResponse::default())
        }
    }

    fn label(action: Action) -> String {
        match action {
            Action::Bus(BusEvent::Phase { phase, .. }) => format!("{phase:?}"),
            Action::ScriptReplied { .. } => "reply".to_string(),
            other => format!("{other:?}"),
        }
    }

    #[tokio::test]
    async fn bus_phases_stay_ordered_with_job_replies() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let services = Services::new(
            AgentClient::new(Arc::new(DownAgents), "web-abc123"),
            Arc::new(OpenPoints),
            Some("acct-1".into()),
            PathBuf::from("state.json"),
        );
        let runner = EffectRunner::new(services, tx.clone());
        let action = ActionInfo {
            module: "腳本".into(),
            mode: "oneclick".into(),
            count: 1,
            trigger_id: "oneclick-script".into(),
            original_action: "script:oneclick:1".into(),
            cost: None,
        };
        let job = Job::Script { theme: "咖啡".into(), options: ScriptOptions::default() };

        let settled = execute(&runner.services, Effect::Billable { action, job }, &tx).await;
        assert!(matches!(settled, Some(Action::BillableSettled { .. })));

        let mut order = Vec::new();
        while let Ok(action) = rx.try_recv() {
            order.push(label(action));
        }
        assert_eq!(order, ["Authorizing", "Executing", "reply", "Done"]);
    }
}

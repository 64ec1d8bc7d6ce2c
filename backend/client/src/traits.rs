use async_trait::async_trait;

use reelforge_core::{Note, Plan, PointPack, ReelError, WalletInfo};

use crate::wire::{
    AnalyzeRequest, AuthorizeRequest, AuthorizeResponse, ChatStreamRequest, CheckoutResponse,
    ConsumeRequest, ContentGenerateRequest, ContentResponse, PositioningGenerateRequest,
    PositioningReplyBody, ProfileResponse, SaveProfileRequest, ScriptGenerateRequest,
};

/// Receives the accumulated streamed text after every delta.
pub type DeltaSink<'a> = &'a mut (dyn FnMut(&str) + Send);

/// The agent endpoints of the backend.
#[async_trait]
pub trait AgentBackend: Send + Sync {
    /// `GET /agent/positioning/profile`
    async fn fetch_profile(&self, user_id: &str) -> Result<ProfileResponse, ReelError>;

    /// `POST /agent/positioning/analyze`
    async fn analyze_positioning(
        &self,
        request: &AnalyzeRequest,
    ) -> Result<PositioningReplyBody, ReelError>;

    /// `POST /agent/positioning/generate`
    async fn generate_positioning(
        &self,
        request: &PositioningGenerateRequest,
    ) -> Result<PositioningReplyBody, ReelError>;

    /// `PUT /agent/positioning/profile`
    async fn save_profile(&self, request: &SaveProfileRequest) -> Result<(), ReelError>;

    /// `GET /agent/notes`
    async fn fetch_notes(&self, user_id: &str, agent_type: &str) -> Result<Vec<Note>, ReelError>;

    /// `POST /chat_stream`; returns the full accumulated text.
    async fn chat_stream(
        &self,
        request: &ChatStreamRequest,
        on_delta: DeltaSink<'_>,
    ) -> Result<String, ReelError>;

    /// `POST /agent/content/generate`
    async fn generate_content(
        &self,
        request: &ContentGenerateRequest,
    ) -> Result<ContentResponse, ReelError>;

    /// `POST /agent/script/generate`
    async fn generate_script(
        &self,
        request: &ScriptGenerateRequest,
    ) -> Result<ContentResponse, ReelError>;
}

/// The points and catalog endpoints of the backend.
#[async_trait]
pub trait PointsBackend: Send + Sync {
    /// `POST /points/authorize`
    async fn authorize(&self, request: &AuthorizeRequest) -> Result<AuthorizeResponse, ReelError>;

    /// `POST /points/consume`
    async fn consume(&self, request: &ConsumeRequest) -> Result<(), ReelError>;

    /// `GET /points/wallet`
    async fn wallet(&self) -> Result<WalletInfo, ReelError>;

    /// `GET /points/packs`
    async fn packs(&self) -> Result<Vec<PointPack>, ReelError>;

    /// `GET /plans/list`
    async fn plans(&self) -> Result<Vec<Plan>, ReelError>;

    /// `POST /points/checkout`
    async fn checkout(&self, pack_id: u32) -> Result<CheckoutResponse, ReelError>;
}

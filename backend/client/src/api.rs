//! reqwest implementation of the backend traits.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use reelforge_core::{Note, Plan, PointPack, ReelError, WalletInfo};

use crate::stream::read_frames;
use crate::traits::{AgentBackend, DeltaSink, PointsBackend};
use crate::wire::{
    AnalyzeRequest, AuthorizeRequest, AuthorizeResponse, ChatStreamRequest, CheckoutRequest,
    CheckoutResponse, ConsumeRequest, ContentGenerateRequest, ContentResponse, NotesResponse,
    PositioningGenerateRequest, PositioningReplyBody, ProfileResponse, SaveProfileRequest,
    ScriptGenerateRequest,
};

/// Page size for note history requests.
const NOTES_LIMIT: u32 = 8;

/// HTTP client for the content-creation backend.
///
/// Cookies are kept across requests so points endpoints see the session.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ReelError> {
        let client = Client::builder()
            .cookie_store(true)
            .connect_timeout(timeout)
            .build()
            .map_err(network)?;
        Ok(Self { client, base_url: base_url.into().trim_end_matches('/').to_string(), timeout })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// A request bounded by the configured timeout. Streams use the bare
    /// client since a long reply is not a stall.
    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client.request(method, self.url(path)).timeout(self.timeout)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ReelError> {
        debug!(path, "GET");
        let resp = self.request(Method::GET, path).query(query).send().await.map_err(network)?;
        decode(resp).await
    }

    async fn send_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<T, ReelError> {
        debug!(path, %method, "send");
        let resp = self
            .request(method, path)
            .json(body)
            .send()
            .await
            .map_err(network)?;
        decode(resp).await
    }
}

fn network(err: reqwest::Error) -> ReelError {
    ReelError::Network(err.to_string())
}

/// Decode a JSON body; non-2xx statuses become a backend message when the
/// body carries one, else `Http { status }`.
async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T, ReelError> {
    let status = resp.status();
    let bytes = resp.bytes().await.map_err(network)?;
    if !status.is_success() {
        return Err(status_error(status, &bytes));
    }
    serde_json::from_slice(&bytes).map_err(ReelError::from)
}

fn status_error(status: StatusCode, body: &[u8]) -> ReelError {
    let message = serde_json::from_slice::<serde_json::Value>(body).ok().and_then(|v| {
        ["assistant_message", "error", "detail"]
            .iter()
            .find_map(|k| v.get(*k).and_then(|m| m.as_str()).map(str::to_string))
    });
    match message {
        Some(msg) if !msg.is_empty() => ReelError::Backend(msg),
        _ => ReelError::Http { status: status.as_u16() },
    }
}

/// A 2xx body that still reports `error` is a backend failure.
fn reject_error_field(error: Option<String>) -> Result<(), ReelError> {
    match error {
        Some(e) if !e.is_empty() => Err(ReelError::Backend(e)),
        _ => Ok(()),
    }
}

#[async_trait]
impl AgentBackend for ApiClient {
    async fn fetch_profile(&self, user_id: &str) -> Result<ProfileResponse, ReelError> {
        let resp: ProfileResponse = self
            .get_json("/agent/positioning/profile", &[("user_id", user_id.to_string())])
            .await?;
        reject_error_field(resp.error.clone())?;
        Ok(resp)
    }

    async fn analyze_positioning(
        &self,
        request: &AnalyzeRequest,
    ) -> Result<PositioningReplyBody, ReelError> {
        self.send_json(Method::POST, "/agent/positioning/analyze", request).await
    }

    async fn generate_positioning(
        &self,
        request: &PositioningGenerateRequest,
    ) -> Result<PositioningReplyBody, ReelError> {
        self.send_json(Method::POST, "/agent/positioning/generate", request).await
    }

    async fn save_profile(&self, request: &SaveProfileRequest) -> Result<(), ReelError> {
        let resp = self
            .request(Method::PUT, "/agent/positioning/profile")
            .json(request)
            .send()
            .await
            .map_err(network)?;
        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            let body = resp.bytes().await.map_err(network)?;
            Err(status_error(status, &body))
        }
    }

    async fn fetch_notes(&self, user_id: &str, agent_type: &str) -> Result<Vec<Note>, ReelError> {
        let resp: NotesResponse = self
            .get_json(
                "/agent/notes",
                &[
                    ("user_id", user_id.to_string()),
                    ("agent_type", agent_type.to_string()),
                    ("memory_type", "note".to_string()),
                    ("limit", NOTES_LIMIT.to_string()),
                ],
            )
            .await?;
        reject_error_field(resp.error)?;
        Ok(resp.notes)
    }

    async fn chat_stream(
        &self,
        request: &ChatStreamRequest,
        on_delta: DeltaSink<'_>,
    ) -> Result<String, ReelError> {
        let resp = self
            .client
            .post(self.url("/chat_stream"))
            .json(request)
            .send()
            .await
            .map_err(network)?;
        let status = resp.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "chat_stream rejected");
            return Err(ReelError::Http { status: status.as_u16() });
        }
        read_frames(resp.bytes_stream(), on_delta).await
    }

    async fn generate_content(
        &self,
        request: &ContentGenerateRequest,
    ) -> Result<ContentResponse, ReelError> {
        self.send_json(Method::POST, "/agent/content/generate", request).await
    }

    async fn generate_script(
        &self,
        request: &ScriptGenerateRequest,
    ) -> Result<ContentResponse, ReelError> {
        self.send_json(Method::POST, "/agent/script/generate", request).await
    }
}

#[async_trait]
impl PointsBackend for ApiClient {
    async fn authorize(&self, request: &AuthorizeRequest) -> Result<AuthorizeResponse, ReelError> {
        // Any non-2xx here is a transport-level failure, never a decision.
        let resp = self
            .request(Method::POST, "/points/authorize")
            .json(request)
            .send()
            .await
            .map_err(network)?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ReelError::Http { status: status.as_u16() });
        }
        resp.json().await.map_err(network)
    }

    async fn consume(&self, request: &ConsumeRequest) -> Result<(), ReelError> {
        let resp = self
            .request(Method::POST, "/points/consume")
            .json(request)
            .send()
            .await
            .map_err(network)?;
        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(ReelError::Http { status: status.as_u16() })
        }
    }

    async fn wallet(&self) -> Result<WalletInfo, ReelError> {
        self.get_json("/points/wallet", &[]).await
    }

    async fn packs(&self) -> Result<Vec<PointPack>, ReelError> {
        self.get_json("/points/packs", &[]).await
    }

    async fn plans(&self) -> Result<Vec<Plan>, ReelError> {
        self.get_json("/plans/list", &[]).await
    }

    async fn checkout(&self, pack_id: u32) -> Result<CheckoutResponse, ReelError> {
        self.send_json(Method::POST, "/points/checkout", &CheckoutRequest { pack_id })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_prefers_backend_message() {
        let err = status_error(StatusCode::BAD_REQUEST, br#"{"detail": "pack sold out"}"#);
        assert!(matches!(err, ReelError::Backend(ref m) if m == "pack sold out"));

        let err = status_error(StatusCode::INTERNAL_SERVER_ERROR, b"<html>oops</html>");
        assert!(matches!(err, ReelError::Http { status: 500 }));
    }

    #[test]
    fn error_field_rejected() {
        assert!(reject_error_field(None).is_ok());
        assert!(reject_error_field(Some(String::new())).is_ok());
        assert!(reject_error_field(Some("no profile".into())).is_err());
    }

    #[test]
    fn trims_trailing_slash() {
        let client = ApiClient::new("http://localhost:8080/", Duration::from_secs(5)).unwrap();
        assert_eq!(client.url("/points/wallet"), "http://localhost:8080/points/wallet");
    }

    #[test]
    fn json_requests_carry_timeout() {
        let client = ApiClient::new("http://localhost:8080", Duration::from_secs(7)).unwrap();
        let request = client.request(Method::POST, "/points/authorize").build().unwrap();
        assert_eq!(request.timeout(), Some(&Duration::from_secs(7)));
        assert_eq!(request.url().as_str(), "http://localhost:8080/points/authorize");
    }
}

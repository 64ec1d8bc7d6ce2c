//! Agent chat clients: positioning, topics and script.
//!
//! Each call is a straight request → reply pipeline. Chat logs live with the
//! caller; these helpers only validate input, build requests and normalize
//! replies.

use std::sync::Arc;

use tracing::{info, warn};

use reelforge_core::{AgentKind, Note, ReelError, ScriptSegment, UserProfile};

use crate::traits::{AgentBackend, DeltaSink};
use crate::wire::{
    AnalyzeRequest, ChatStreamRequest, ContentGenerateRequest, PositioningGenerateRequest,
    SaveProfileRequest, ScriptGenerateRequest,
};

/// Topic presets that prefill the topics input.
pub const TOPIC_PRESETS: [(&str, &str); 4] = [
    ("trending", "我想要熱門趨勢類型的選題建議"),
    ("educational", "我想要教育分享類型的選題建議"),
    ("personal", "我想要個人故事類型的選題建議"),
    ("product", "我想要產品介紹類型的選題建議"),
];

/// Quick questions offered in free script mode.
pub const SCRIPT_QUICK_QUESTIONS: [&str; 4] = [
    "幫我把這個想法拆成 60 秒腳本，Hook 要很強：",
    "請先用簡短方式介紹 A~F 六種結構的差異與適用情境，然後依我這個主題挑一種並給第一版：",
    "我想要一個能快速抓住注意力的開場，適合我的主題：",
    "請幫我設計一個有記憶點的結尾 CTA：",
];

/// Prefill text for a topic preset key.
pub fn topic_preset(key: &str) -> Option<&'static str> {
    TOPIC_PRESETS.iter().find(|(k, _)| *k == key).map(|(_, text)| *text)
}

/// Trim user input; `None` when nothing is left.
pub fn validate_input(text: &str) -> Option<&str> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

/// Script structure and length chosen in guide mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptOptions {
    /// Template letter `A`..=`F`.
    pub template_type: String,
    pub duration: u32,
}

impl Default for ScriptOptions {
    fn default() -> Self {
        Self { template_type: "A".to_string(), duration: 30 }
    }
}

/// Normalized positioning reply.
#[derive(Debug, Clone, Default)]
pub struct PositioningReply {
    pub response: Option<String>,
    pub profile: Option<UserProfile>,
}

/// Normalized script reply.
#[derive(Debug, Clone, Default)]
pub struct ScriptReply {
    pub assistant_message: Option<String>,
    pub segments: Option<Vec<ScriptSegment>>,
}

/// Profile plus its notes, as mirrored into the view.
#[derive(Debug, Clone, Default)]
pub struct ProfileSnapshot {
    pub profile: Option<UserProfile>,
    pub notes: Vec<Note>,
}

/// Agent-facing client bound to one user id.
#[derive(Clone)]
pub struct AgentClient {
    backend: Arc<dyn AgentBackend>,
    user_id: String,
}

impl AgentClient {
    pub fn new(backend: Arc<dyn AgentBackend>, user_id: impl Into<String>) -> Self {
        Self { backend, user_id: user_id.into() }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub async fn load_profile(&self) -> Result<ProfileSnapshot, ReelError> {
        let resp = self.backend.fetch_profile(&self.user_id).await?;
        Ok(ProfileSnapshot { profile: resp.user_profile, notes: resp.user_notes })
    }

    pub async fn analyze(&self, text: &str) -> Result<PositioningReply, ReelError> {
        let text = require(text, "請輸入內容")?;
        let body = self
            .backend
            .analyze_positioning(&AnalyzeRequest {
                user_id: self.user_id.clone(),
                user_input: text.to_string(),
            })
            .await?;
        info!(agent = %AgentKind::Positioning, has_reply = body.response.is_some(), "Positioning analyzed");
        Ok(PositioningReply { response: body.response, profile: body.user_profile })
    }

    pub async fn generate_positioning(&self, theme: &str) -> Result<PositioningReply, ReelError> {
        let theme = require(theme, "請輸入主題")?;
        let body = self
            .backend
            .generate_positioning(&PositioningGenerateRequest {
                user_id: self.user_id.clone(),
                theme: theme.to_string(),
            })
            .await?;
        Ok(PositioningReply { response: body.response, profile: body.user_profile })
    }

    pub async fn save_profile(&self, profile: &UserProfile) -> Result<(), ReelError> {
        self.backend
            .save_profile(&SaveProfileRequest {
                user_id: self.user_id.clone(),
                profile_data: profile.clone(),
            })
            .await
    }

    /// Note history for the topics or script agent.
    pub async fn notes(&self, agent: AgentKind) -> Result<Vec<Note>, ReelError> {
        let Some(agent_type) = agent.notes_agent_type() else {
            return Ok(self.load_profile().await?.notes);
        };
        self.backend.fetch_notes(&self.user_id, agent_type).await
    }

    /// Stream a topics reply; `on_delta` sees the accumulated text.
    pub async fn stream_topics(
        &self,
        text: &str,
        on_delta: DeltaSink<'_>,
    ) -> Result<String, ReelError> {
        let text = require(text, "請輸入內容")?;
        let request = ChatStreamRequest {
            user_id: self.user_id.clone(),
            user_input: text.to_string(),
            agent_type: AgentKind::Topics.to_string(),
        };
        let full = self.backend.chat_stream(&request, on_delta).await?;
        if full.is_empty() {
            warn!("Topics stream ended without content");
        }
        Ok(full)
    }

    /// Conversational script generation.
    pub async fn generate_script_content(
        &self,
        text: &str,
        options: Option<&ScriptOptions>,
    ) -> Result<ScriptReply, ReelError> {
        let text = require(text, "請先輸入內容")?;
        let resp = self
            .backend
            .generate_content(&ContentGenerateRequest {
                user_id: self.user_id.clone(),
                user_input: text.to_string(),
                mode: "script".to_string(),
                template_type: options.map(|o| o.template_type.clone()),
                duration: options.map(|o| o.duration),
            })
            .await?;
        Ok(ScriptReply {
            segments: resp.conversational_segments(),
            assistant_message: resp.assistant_message,
        })
    }

    /// One-click script generation from a theme.
    pub async fn generate_script(
        &self,
        theme: &str,
        options: &ScriptOptions,
    ) -> Result<ScriptReply, ReelError> {
        let theme = require(theme, "請輸入主題")?;
        let resp = self
            .backend
            .generate_script(&ScriptGenerateRequest {
                user_id: self.user_id.clone(),
                theme: theme.to_string(),
                template_type: options.template_type.clone(),
                duration: options.duration,
            })
            .await?;
        reject_backend_error(resp.error.as_deref())?;
        Ok(ScriptReply {
            segments: resp.oneclick_segments(),
            assistant_message: resp.assistant_message,
        })
    }
}

fn require<'a>(text: &'a str, message: &str) -> Result<&'a str, ReelError> {
    validate_input(text).ok_or_else(|| ReelError::Backend(message.to_string()))
}

fn reject_backend_error(error: Option<&str>) -> Result<(), ReelError> {
    match error {
        Some(e) if !e.is_empty() => Err(ReelError::Backend(e.to_string())),
        _ => Ok(()),
    }
}

/// Inline assistant line for a failed chat request.
pub fn error_line(err: &ReelError) -> String {
    format!("❌ 錯誤：{}", err.display_text())
}

/// Inline assistant line for a failed one-click generation.
pub fn generation_error_line(err: &ReelError) -> String {
    format!("❌ 生成失敗：{}", err.display_text())
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::wire::{ContentResponse, PositioningReplyBody, ProfileResponse};

    #[derive(Default)]
    struct FakeBackend {
        content_requests: Mutex<Vec<ContentGenerateRequest>>,
        stream_requests: Mutex<Vec<ChatStreamRequest>>,
    }

    #[async_trait]
    impl AgentBackend for FakeBackend {
        async fn fetch_profile(&self, _user_id: &str) -> Result<ProfileResponse, ReelError> {
            Ok(ProfileResponse {
                user_notes: vec![Note { content: "note".into(), created_at: None }],
                ..Default::default()
            })
        }

        async fn analyze_positioning(
            &self,
            request: &AnalyzeRequest,
        ) -> Result<PositioningReplyBody, ReelError> {
            Ok(PositioningReplyBody {
                response: Some(format!("analysis of {}", request.user_input)),
                ..Default::default()
            })
        }

        async fn generate_positioning(
            &self,
            _request: &PositioningGenerateRequest,
        ) -> Result<PositioningReplyBody, ReelError> {
            Err(ReelError::Http { status: 503 })
        }

        async fn save_profile(&self, _request: &SaveProfileRequest) -> Result<(), ReelError> {
            Ok(())
        }

        async fn fetch_notes(
            &self,
            _user_id: &str,
            agent_type: &str,
        ) -> Result<Vec<Note>, ReelError> {
            Ok(vec![Note { content: agent_type.to_string(), created_at: None }])
        }

        async fn chat_stream(
            &self,
            request: &ChatStreamRequest,
            on_delta: DeltaSink<'_>,
        ) -> Result<String, ReelError> {
            self.stream_requests.lock().unwrap().push(request.clone());
            on_delta("第一");
            on_delta("第一第二");
            Ok("第一第二".to_string())
        }

        async fn generate_content(
            &self,
            request: &ContentGenerateRequest,
        ) -> Result<ContentResponse, ReelError> {
            self.content_requests.lock().unwrap().push(request.clone());
            Ok(serde_json::from_value(serde_json::json!({
                "assistant_message": "done",
                "segments": [{"dialog": "a"}, {"dialog": "b"}]
            }))
            .unwrap())
        }

        async fn generate_script(
            &self,
            _request: &ScriptGenerateRequest,
        ) -> Result<ContentResponse, ReelError> {
            Ok(ContentResponse { error: Some("模型忙碌".into()), ..Default::default() })
        }
    }

    fn client() -> (Arc<FakeBackend>, AgentClient) {
        let backend = Arc::new(FakeBackend::default());
        (backend.clone(), AgentClient::new(backend, "web-abc123"))
    }

    #[tokio::test]
    async fn analyze_trims_and_rejects_empty() {
        let (_, client) = client();
        let reply = client.analyze("  咖啡店  ").await.unwrap();
        assert_eq!(reply.response.as_deref(), Some("analysis of 咖啡店"));
        assert!(client.analyze("   ").await.is_err());
    }

    #[tokio::test]
    async fn stream_topics_forwards_deltas() {
        let (backend, client) = client();
        let mut seen = Vec::new();
        let mut sink = |t: &str| seen.push(t.to_string());
        let full = client.stream_topics("靈感", &mut sink).await.unwrap();
        assert_eq!(full, "第一第二");
        assert_eq!(seen.len(), 2);
        let requests = backend.stream_requests.lock().unwrap();
        assert_eq!(requests[0].agent_type, "topics");
        assert_eq!(requests[0].user_id, "web-abc123");
    }

    #[tokio::test]
    async fn script_content_carries_options() {
        let (backend, client) = client();
        let options = ScriptOptions { template_type: "C".into(), duration: 60 };
        let reply = client.generate_script_content("主題", Some(&options)).await.unwrap();
        assert_eq!(reply.segments.unwrap().len(), 2);
        let requests = backend.content_requests.lock().unwrap();
        assert_eq!(requests[0].template_type.as_deref(), Some("C"));
        assert_eq!(requests[0].duration, Some(60));
        assert_eq!(requests[0].mode, "script");
    }

    #[tokio::test]
    async fn oneclick_script_surfaces_backend_error() {
        let (_, client) = client();
        let err = client.generate_script("主題", &ScriptOptions::default()).await.unwrap_err();
        assert_eq!(generation_error_line(&err), "❌ 生成失敗：模型忙碌");
    }

    #[tokio::test]
    async fn notes_route_by_agent() {
        let (_, client) = client();
        let notes = client.notes(AgentKind::Script).await.unwrap();
        assert_eq!(notes[0].content, "script_copy");
        let notes = client.notes(AgentKind::Positioning).await.unwrap();
        assert_eq!(notes[0].content, "note");
    }

    #[test]
    fn presets_lookup() {
        assert_eq!(topic_preset("product"), Some("我想要產品介紹類型的選題建議"));
        assert!(topic_preset("unknown").is_none());
        assert_eq!(error_line(&ReelError::Http { status: 500 }), "❌ 錯誤：HTTP 500");
    }
}

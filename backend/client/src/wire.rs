//! Request and response bodies exchanged with the backend.

use serde::{Deserialize, Serialize};

use reelforge_core::types::null_as_default;
use reelforge_core::{Note, ScriptSegment, UserProfile};

#[derive(Debug, Clone, Serialize)]
pub struct AnalyzeRequest {
    pub user_id: String,
    pub user_input: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PositioningGenerateRequest {
    pub user_id: String,
    pub theme: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SaveProfileRequest {
    pub user_id: String,
    pub profile_data: UserProfile,
}

/// Reply from the positioning analyze/generate endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PositioningReplyBody {
    #[serde(default)]
    pub response: Option<String>,
    #[serde(default)]
    pub user_profile: Option<UserProfile>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileResponse {
    #[serde(default)]
    pub user_profile: Option<UserProfile>,
    #[serde(default)]
    pub user_notes: Vec<Note>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotesResponse {
    #[serde(default)]
    pub notes: Vec<Note>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatStreamRequest {
    pub user_id: String,
    pub user_input: String,
    pub agent_type: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContentGenerateRequest {
    pub user_id: String,
    pub user_input: String,
    pub mode: String,
    pub template_type: Option<String>,
    pub duration: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScriptGenerateRequest {
    pub user_id: String,
    pub theme: String,
    pub template_type: String,
    pub duration: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GeneratedContent {
    #[serde(default)]
    pub segments: Option<Vec<ScriptSegment>>,
}

/// Reply from the script content/generate endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContentResponse {
    #[serde(default)]
    pub assistant_message: Option<String>,
    #[serde(default)]
    pub generated_content: Option<GeneratedContent>,
    #[serde(default)]
    pub segments: Option<Vec<ScriptSegment>>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ContentResponse {
    /// Segments from a conversational generate: nested first, then top level.
    pub fn conversational_segments(&self) -> Option<Vec<ScriptSegment>> {
        self.generated_content
            .as_ref()
            .and_then(|g| g.segments.clone())
            .or_else(|| self.segments.clone())
    }

    /// Segments from a one-click generate: non-empty top level first, then nested.
    pub fn oneclick_segments(&self) -> Option<Vec<ScriptSegment>> {
        match &self.segments {
            Some(s) if !s.is_empty() => Some(s.clone()),
            _ => self.generated_content.as_ref().and_then(|g| g.segments.clone()),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct AuthorizeRequest {
    pub module: String,
    pub mode: String,
    pub count: u32,
}

/// Wire shape of `POST /points/authorize` (camelCase).
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizeResponse {
    #[serde(default)]
    pub authorized: bool,
    #[serde(default)]
    pub need_topup: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub suggest_pack_ids: Vec<u32>,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ConsumeRequest {
    pub usage_id: String,
    pub module: String,
    pub mode: String,
    pub count: u32,
    pub points: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckoutRequest {
    pub pack_id: u32,
}

/// Checkout result; the body shape is backend-defined.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckoutResponse {
    #[serde(flatten)]
    pub body: serde_json::Map<String, serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authorize_response_reads_camel_case() {
        let resp: AuthorizeResponse = serde_json::from_str(
            r#"{"authorized": false, "needTopup": true, "suggestPackIds": [3, 5]}"#,
        )
        .unwrap();
        assert!(resp.need_topup);
        assert_eq!(resp.suggest_pack_ids, vec![3, 5]);
        assert!(resp.reason.is_none());
    }

    #[test]
    fn authorize_response_tolerates_null_suggestions() {
        let resp: AuthorizeResponse = serde_json::from_str(
            r#"{"authorized":false,"needTopup":true,"suggestPackIds":null,"reason":null}"#,
        )
        .unwrap();
        assert!(resp.need_topup);
        assert!(resp.suggest_pack_ids.is_empty());
    }

    #[test]
    fn segment_sources_follow_endpoint_precedence() {
        let resp: ContentResponse = serde_json::from_value(serde_json::json!({
            "assistant_message": "ok",
            "segments": [],
            "generated_content": {"segments": [{"dialog": "nested"}]}
        }))
        .unwrap();
        assert_eq!(resp.conversational_segments().unwrap()[0].dialog.as_deref(), Some("nested"));
        assert_eq!(resp.oneclick_segments().unwrap()[0].dialog.as_deref(), Some("nested"));

        let resp: ContentResponse = serde_json::from_value(serde_json::json!({
            "segments": [{"dialog": "top"}]
        }))
        .unwrap();
        assert_eq!(resp.conversational_segments().unwrap()[0].dialog.as_deref(), Some("top"));
    }
}

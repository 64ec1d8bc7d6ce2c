//! Streaming consumer
//!
//! Forwards the accumulated topics reply into the UI loop as it arrives.

use logging::{ClientEvent, EventLogger};
use reelforge_client::AgentClient;
use reelforge_core::{AgentKind, ReelError};
use tokio::sync::mpsc::UnboundedSender;

use crate::action::Action;

/// Stream a topics reply, sending a `TopicsDelta` for every chunk.
pub async fn stream_topics(
    agents: &AgentClient,
    text: &str,
    tx: &UnboundedSender<Action>,
) -> Result<String, ReelError> {
    let delta_tx = tx.clone();
    let mut on_delta = move |accumulated: &str| {
        // the loop may already be shutting down
        let _ = delta_tx.send(Action::TopicsDelta(accumulated.to_string()));
    };
    let full = agents.stream_topics(text, &mut on_delta).await?;
    EventLogger::log_event(
        agents.user_id(),
        ClientEvent::StreamCompleted {
            agent: AgentKind::Topics.to_string(),
            chars: full.chars().count(),
        },
    );
    Ok(full)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use reelforge_client::wire::{
        AnalyzeRequest, ChatStreamRequest, ContentGenerateRequest, ContentResponse,
        PositioningGenerateRequest, PositioningReplyBody, ProfileResponse, SaveProfileRequest,
        ScriptGenerateRequest,
    };
    use reelforge_client::{AgentBackend, DeltaSink};
    use reelforge_core::Note;
    use tokio::sync::mpsc;

    use super::*;

    struct ChunkedBackend;

    #[async_trait]
    impl AgentBackend for ChunkedBackend {
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
            unimplemented!()
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
            on_delta: DeltaSink<'_>,
        ) -> Result<String, ReelError> {
            let mut full = String::new();
            for chunk in ["熱門", "選題", "一"] {
                full.push_str(chunk);
                on_delta(&full);
            }
            Ok(full)
        }
        async fn generate_content(&self, _r: &ContentGenerateRequest) -> Result<ContentResponse, ReelError> {
            unimplemented!()
        }
        async fn generate_script(&self, _r: &ScriptGenerateRequest) -> Result<ContentResponse, ReelError> {
            unimplemented!()
        }
    }

    #[tokio::test]
    async fn forwards_accumulated_text() {
        let agents = AgentClient::new(Arc::new(ChunkedBackend), "web-abc123");
        let (tx, mut rx) = mpsc::unbounded_channel();

        let full = stream_topics(&agents, "選題", &tx).await.unwrap();
        assert_eq!(full, "熱門選題一");

        let mut seen = Vec::new();
        while let Ok(Action::TopicsDelta(text)) = rx.try_recv() {
            seen.push(text);
        }
        assert_eq!(seen, ["熱門", "熱門選題", "熱門選題一"]);
    }
}

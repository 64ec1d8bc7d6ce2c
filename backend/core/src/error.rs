use thiserror::Error;

/// Top-level error type for the ReelForge client.
///
/// Every variant renders as freeform text; the UI only tells "transport
/// failed" from "backend said no". Authorization denials are bus outcomes.
#[derive(Debug, Error)]
pub enum ReelError {
    #[error("HTTP {status}")]
    Http { status: u16 },

    #[error("network error: {0}")]
    Network(String),

    #[error("{0}")]
    Backend(String),

    #[error("decode error: {0}")]
    Decode(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ReelError {
    /// Text suitable for an inline assistant line or a toast.
    pub fn display_text(&self) -> String {
        match self {
            ReelError::Backend(msg) => msg.clone(),
            other => other.to_string(),
        }
    }
}

impl From<serde_json::Error> for ReelError {
    fn from(err: serde_json::Error) -> Self {
        ReelError::Decode(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_errors_display_verbatim() {
        let err = ReelError::Backend("quota exceeded".into());
        assert_eq!(err.display_text(), "quota exceeded");
        assert_eq!(ReelError::Http { status: 502 }.display_text(), "HTTP 502");
    }
}

//! DigestSender trait

use serde::Serialize;
use std::path::Path;

pub type SendResult<T> = Result<T, SendError>;

#[derive(Debug, thiserror::Error)]
pub enum SendError {
    #[error("artifact not found: {0}")]
    ArtifactMissing(String),

    #[error("missing credential: {0}")]
    MissingToken(&'static str),

    #[error("cannot derive a date from artifact name: {0}")]
    BadArtifactName(String),

    #[error("send command failed: {0}")]
    CommandFailed(String),

    #[error("api error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("duplicate reported but existing draft not found")]
    DuplicateNotFound,

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// What a successful send did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SendReceipt {
    /// Draft sent to all subscribers.
    Sent { email_id: String },
    /// The service reports this email already went out earlier.
    AlreadySent { email_id: String },
    /// An external command exited successfully; nothing more is known.
    Delivered,
}

/// Delivers one digest artifact to subscribers.
#[async_trait::async_trait]
pub trait DigestSender: Send + Sync {
    fn name(&self) -> &str;

    async fn send(&self, artifact: &Path) -> SendResult<SendReceipt>;
}

use async_trait::async_trait;
use domain::PushMessage;
use storage::CredentialsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PushError {
    #[error("request to push gateway failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("push gateway returned {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error(transparent)]
    Credentials(#[from] CredentialsError),
}

#[async_trait]
pub trait PushGateway: Send + Sync {
    /// Delivers one message and returns the gateway's message id.
    async fn send(&self, message: &PushMessage) -> Result<String, PushError>;
}

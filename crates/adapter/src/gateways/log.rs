use crate::traits::{PushError, PushGateway};
use async_trait::async_trait;
use domain::PushMessage;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::info;

/// Dry-run gateway: logs the message instead of delivering it.
#[derive(Default)]
pub struct LogGateway {
    sent: AtomicU64,
}

impl LogGateway {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PushGateway for LogGateway {
    async fn send(&self, message: &PushMessage) -> Result<String, PushError> {
        let seq = self.sent.fetch_add(1, Ordering::Relaxed) + 1;
        info!(
            token = %message.token,
            title = %message.notification.title,
            body = %message.notification.body,
            data = ?message.data,
            "[dry-run] push #{}",
            seq
        );
        Ok(format!("dry-run/{}", seq))
    }
}

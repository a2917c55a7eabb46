mod dispatcher;
mod gateways;
mod traits;

pub use dispatcher::{DispatchError, Dispatcher, Outcome};
pub use gateways::fcm::{FcmConfig, FcmGateway};
pub use gateways::log::LogGateway;
pub use traits::{PushError, PushGateway};

use reqwest::Client;
use std::sync::Arc;
use storage::TokenSource;
use tracing::info;

#[derive(Debug, Clone)]
pub enum PushConfig {
    Fcm(FcmConfig),
    Log,
}

pub fn build_gateway(config: PushConfig, http: Client, tokens: TokenSource) -> Arc<dyn PushGateway> {
    match config {
        PushConfig::Fcm(fcm) => {
            info!("Push gateway: FCM (project {})", fcm.project_id);
            Arc::new(FcmGateway::new(http, fcm, tokens))
        }
        PushConfig::Log => {
            info!("Push gateway: dry-run, messages are only logged");
            Arc::new(LogGateway::new())
        }
    }
}

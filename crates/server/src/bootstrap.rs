use adapter::{Dispatcher, FcmConfig, PushConfig};
use anyhow::Context;
use std::sync::Arc;
use std::time::Duration;
use storage::{Db, DocumentStore, FirestoreConfig, FirestoreStore, TokenSource};
use tokio::sync::OnceCell;
use tracing::info;

use crate::config::{PushSettings, Settings, StoreSettings};

static DISPATCHER: OnceCell<Dispatcher> = OnceCell::const_new();

/// Builds the store and gateway clients on first call; later calls get the same handles.
pub async fn dispatcher(settings: &Settings) -> anyhow::Result<Dispatcher> {
    DISPATCHER
        .get_or_try_init(|| build_dispatcher(settings))
        .await
        .cloned()
}

async fn build_dispatcher(settings: &Settings) -> anyhow::Result<Dispatcher> {
    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(settings.http.timeout_secs))
        .build()
        .context("Failed to build HTTP client")?;

    let tokens = match &settings.auth.access_token {
        Some(token) => {
            info!("Using static access token from configuration");
            TokenSource::fixed(token.clone())
        }
        None => TokenSource::metadata(http.clone(), settings.auth.metadata_url.clone()),
    };

    let store: Arc<dyn DocumentStore> = match &settings.store {
        StoreSettings::Firestore {
            project_id,
            database,
            base_url,
        } => {
            let project_id = settings.resolve_project(project_id.as_ref())?;
            info!("Document store: Firestore (project {}, database {})", project_id, database);
            Arc::new(FirestoreStore::new(
                http.clone(),
                FirestoreConfig {
                    base_url: base_url.clone(),
                    project_id,
                    database: database.clone(),
                },
                tokens.clone(),
            )?)
        }
        StoreSettings::Sqlite { url } => {
            info!("Document store: SQLite at {}", url);
            Arc::new(
                Db::new(url)
                    .await
                    .with_context(|| format!("Failed to open SQLite store at {}", url))?,
            )
        }
    };

    let push = match &settings.push {
        PushSettings::Fcm {
            project_id,
            base_url,
        } => PushConfig::Fcm(FcmConfig {
            base_url: base_url.clone(),
            project_id: settings.resolve_project(project_id.as_ref())?,
        }),
        PushSettings::Log => PushConfig::Log,
    };
    let gateway = adapter::build_gateway(push, http, tokens);

    Ok(Dispatcher::new(store, gateway))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn local_settings(db_url: &str) -> Settings {
        let env = HashMap::from([
            ("store.mode".to_string(), "sqlite".to_string()),
            ("store.url".to_string(), db_url.to_string()),
            ("push.mode".to_string(), "log".to_string()),
        ]);
        Settings::build("test", env).unwrap()
    }

    #[tokio::test]
    async fn test_firestore_requires_project() {
        let settings = Settings::build("test", HashMap::new()).unwrap();
        let err = build_dispatcher(&settings).await.err().unwrap();
        assert!(err.to_string().contains("project"));
    }

    #[tokio::test]
    async fn test_initializes_once() {
        let first = dispatcher(&local_settings("sqlite::memory:")).await;
        assert!(first.is_ok());

        // already initialized, so this bogus store is never opened
        let second = dispatcher(&local_settings("sqlite:///proc/not-writable/notifier.db")).await;
        assert!(second.is_ok());
    }
}

use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::debug;

pub const DEFAULT_METADATA_TOKEN_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-account/default/token";

// refresh this long before the server-side expiry
const EXPIRY_MARGIN_SECS: i64 = 60;

#[derive(Debug, Error)]
pub enum CredentialsError {
    #[error("token request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("metadata server returned {status}: {body}")]
    Status { status: u16, body: String },
}

#[derive(Deserialize)]
struct MetadataToken {
    access_token: String,
    expires_in: i64,
}

struct CachedToken {
    token: String,
    expires_at: DateTime<Utc>,
}

enum Source {
    Fixed(String),
    Metadata {
        http: Client,
        url: String,
        cache: RwLock<Option<CachedToken>>,
    },
}

/// Bearer tokens for Google APIs. Shared by the Firestore and FCM clients.
#[derive(Clone)]
pub struct TokenSource {
    inner: Arc<Source>,
}

impl TokenSource {
    pub fn fixed(token: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(Source::Fixed(token.into())),
        }
    }

    pub fn metadata(http: Client, url: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(Source::Metadata {
                http,
                url: url.into(),
                cache: RwLock::new(None),
            }),
        }
    }

    pub async fn access_token(&self) -> Result<String, CredentialsError> {
        match self.inner.as_ref() {
            Source::Fixed(token) => Ok(token.clone()),
            Source::Metadata { http, url, cache } => {
                let now = Utc::now();
                if let Some(cached) = cache.read().await.as_ref() {
                    if cached.expires_at > now {
                        return Ok(cached.token.clone());
                    }
                }

                let mut guard = cache.write().await;
                // another task may have refreshed while we waited
                if let Some(cached) = guard.as_ref() {
                    if cached.expires_at > now {
                        return Ok(cached.token.clone());
                    }
                }

                let resp = http.get(url).header("Metadata-Flavor", "Google").send().await?;
                let status = resp.status();
                if !status.is_success() {
                    let body = resp.text().await.unwrap_or_default();
                    return Err(CredentialsError::Status {
                        status: status.as_u16(),
                        body,
                    });
                }

                let fetched: MetadataToken = resp.json().await?;
                debug!("Fetched access token, expires in {}s", fetched.expires_in);

                let expires_at =
                    Utc::now() + Duration::seconds(fetched.expires_in - EXPIRY_MARGIN_SECS);
                *guard = Some(CachedToken {
                    token: fetched.access_token.clone(),
                    expires_at,
                });
                Ok(fetched.access_token)
            }
        }
    }
}

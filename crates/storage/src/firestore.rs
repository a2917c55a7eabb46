use crate::{DocumentStore, StoreError, TokenSource};
use async_trait::async_trait;
use domain::{protocol::decode_fields, Document};
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct FirestoreConfig {
    /// e.g. https://firestore.googleapis.com
    pub base_url: String,
    pub project_id: String,
    pub database: String,
}

#[derive(Deserialize)]
struct RestDocument {
    #[serde(default)]
    fields: Map<String, Value>,
}

/// Read-only client for the Firestore REST API.
#[derive(Clone)]
pub struct FirestoreStore {
    http: Client,
    base_url: Url,
    config: FirestoreConfig,
    tokens: TokenSource,
}

impl FirestoreStore {
    pub fn new(http: Client, config: FirestoreConfig, tokens: TokenSource) -> anyhow::Result<Self> {
        let base_url = Url::parse(&config.base_url)?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("Firestore base URL cannot carry a path: {}", config.base_url);
        }
        Ok(Self {
            http,
            base_url,
            config,
            tokens,
        })
    }

    fn document_url(&self, collection: &str, id: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend([
                "v1",
                "projects",
                &self.config.project_id,
                "databases",
                &self.config.database,
                "documents",
                collection,
                id,
            ]);
        }
        url
    }
}

#[async_trait]
impl DocumentStore for FirestoreStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let url = self.document_url(collection, id);
        let token = self.tokens.access_token().await?;

        let resp = self.http.get(url).bearer_auth(token).send().await?;
        let status = resp.status();

        if status == StatusCode::NOT_FOUND {
            debug!("Document {}/{} does not exist", collection, id);
            return Ok(None);
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(StoreError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let doc: RestDocument = resp.json().await?;
        Ok(Some(Document::new(id, decode_fields(&doc.fields))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        extract::Path,
        http::{HeaderMap, StatusCode as AxumStatus},
        response::IntoResponse,
        routing::get,
        Json, Router,
    };

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    async fn fake_document(
        Path((collection, id)): Path<(String, String)>,
        headers: HeaderMap,
    ) -> axum::response::Response {
        if headers.get("authorization").and_then(|v| v.to_str().ok()) != Some("Bearer t0k") {
            return (AxumStatus::UNAUTHORIZED, "missing token").into_response();
        }
        match (collection.as_str(), id.as_str()) {
            ("sites", "s1") => Json(serde_json::json!({
                "name": "projects/demo/databases/(default)/documents/sites/s1",
                "fields": {
                    "userId": { "stringValue": "u1" },
                    "siteName": { "stringValue": "My Blog" }
                },
                "createTime": "2024-01-01T00:00:00Z",
                "updateTime": "2024-01-01T00:00:00Z"
            }))
            .into_response(),
            ("users", "empty") => Json(serde_json::json!({
                "name": "projects/demo/databases/(default)/documents/users/empty"
            }))
            .into_response(),
            ("users", "broken") => (AxumStatus::SERVICE_UNAVAILABLE, "try later").into_response(),
            _ => (AxumStatus::NOT_FOUND, "not found").into_response(),
        }
    }

    async fn store() -> FirestoreStore {
        let app = Router::new().route(
            "/v1/projects/demo/databases/(default)/documents/:collection/:id",
            get(fake_document),
        );
        let base = serve(app).await;
        FirestoreStore::new(
            Client::new(),
            FirestoreConfig {
                base_url: base,
                project_id: "demo".to_string(),
                database: "(default)".to_string(),
            },
            TokenSource::fixed("t0k"),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_get_existing_document() {
        let store = store().await;
        let doc = store.get("sites", "s1").await.unwrap().unwrap();
        assert_eq!(doc.id, "s1");
        assert_eq!(doc.str_field("userId"), Some("u1"));
        assert_eq!(doc.str_field("siteName"), Some("My Blog"));
    }

    #[tokio::test]
    async fn test_not_found_is_none() {
        let store = store().await;
        assert!(store.get("sites", "missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_document_without_fields() {
        let store = store().await;
        let doc = store.get("users", "empty").await.unwrap().unwrap();
        assert!(doc.fields.is_empty());
    }

    #[tokio::test]
    async fn test_server_error_propagates() {
        let store = store().await;
        match store.get("users", "broken").await {
            Err(StoreError::Status { status, .. }) => assert_eq!(status, 503),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_document_url_escapes_ids() {
        let store = FirestoreStore::new(
            Client::new(),
            FirestoreConfig {
                base_url: "https://firestore.googleapis.com".to_string(),
                project_id: "demo".to_string(),
                database: "(default)".to_string(),
            },
            TokenSource::fixed("x"),
        )
        .unwrap();

        let url = store.document_url("users", "a b/c");
        assert_eq!(
            url.as_str(),
            "https://firestore.googleapis.com/v1/projects/demo/databases/(default)/documents/users/a%20b%2Fc"
        );
    }
}

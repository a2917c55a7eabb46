use crate::traits::{PushError, PushGateway};
use async_trait::async_trait;
use domain::PushMessage;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use storage::TokenSource;

#[derive(Debug, Clone)]
pub struct FcmConfig {
    /// e.g. https://fcm.googleapis.com
    pub base_url: String,
    pub project_id: String,
}

#[derive(Serialize)]
struct SendRequest<'a> {
    message: &'a PushMessage,
}

#[derive(Deserialize)]
struct SendResponse {
    name: String,
}

/// FCM HTTP v1 `messages:send`.
pub struct FcmGateway {
    http: Client,
    config: FcmConfig,
    tokens: TokenSource,
}

impl FcmGateway {
    pub fn new(http: Client, config: FcmConfig, tokens: TokenSource) -> Self {
        Self {
            http,
            config,
            tokens,
        }
    }

    fn send_url(&self) -> String {
        format!(
            "{}/v1/projects/{}/messages:send",
            self.config.base_url.trim_end_matches('/'),
            self.config.project_id
        )
    }
}

#[async_trait]
impl PushGateway for FcmGateway {
    async fn send(&self, message: &PushMessage) -> Result<String, PushError> {
        let token = self.tokens.access_token().await?;

        let resp = self
            .http
            .post(self.send_url())
            .bearer_auth(token)
            .json(&SendRequest { message })
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(PushError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let sent: SendResponse = resp.json().await?;
        Ok(sent.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        http::{HeaderMap, Method, StatusCode, Uri},
        response::IntoResponse,
        Json, Router,
    };
    use std::collections::BTreeMap;
    use std::sync::{Arc, Mutex};

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn message(token: &str) -> PushMessage {
        let mut data = BTreeMap::new();
        data.insert("siteId".to_string(), "s1".to_string());
        PushMessage {
            token: token.to_string(),
            notification: domain::NotificationContent {
                title: "New Comment on Your Site".to_string(),
                body: "Someone commented on your site: My Blog".to_string(),
            },
            data,
        }
    }

    #[tokio::test]
    async fn test_send_posts_v1_message() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        // ':' in the path is not routable, so catch everything and record the uri
        let app = Router::new().fallback(
            move |method: Method, uri: Uri, headers: HeaderMap, Json(body): Json<serde_json::Value>| {
                let sink = sink.clone();
                async move {
                    let auth = headers
                        .get("authorization")
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or_default()
                        .to_string();
                    sink.lock()
                        .unwrap()
                        .push((method, uri.path().to_string(), auth, body));
                    Json(serde_json::json!({ "name": "projects/demo/messages/0:123" }))
                }
            },
        );
        let base = serve(app).await;

        let gateway = FcmGateway::new(
            Client::new(),
            FcmConfig {
                base_url: base,
                project_id: "demo".to_string(),
            },
            TokenSource::fixed("t0k"),
        );

        let id = gateway.send(&message("TOK123")).await.unwrap();
        assert_eq!(id, "projects/demo/messages/0:123");

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        let (method, path, auth, body) = &seen[0];
        assert_eq!(*method, Method::POST);
        assert_eq!(path, "/v1/projects/demo/messages:send");
        assert_eq!(auth, "Bearer t0k");
        assert_eq!(
            body,
            &serde_json::json!({
                "message": {
                    "token": "TOK123",
                    "notification": {
                        "title": "New Comment on Your Site",
                        "body": "Someone commented on your site: My Blog"
                    },
                    "data": { "siteId": "s1" }
                }
            })
        );
    }

    #[tokio::test]
    async fn test_rejected_send() {
        let app = Router::new().fallback(|| async {
            (
                StatusCode::NOT_FOUND,
                r#"{"error":{"status":"NOT_FOUND","message":"Requested entity was not found."}}"#,
            )
                .into_response()
        });
        let base = serve(app).await;

        let gateway = FcmGateway::new(
            Client::new(),
            FcmConfig {
                base_url: base,
                project_id: "demo".to_string(),
            },
            TokenSource::fixed("t0k"),
        );

        match gateway.send(&message("stale")).await {
            Err(PushError::Rejected { status, body }) => {
                assert_eq!(status, 404);
                assert!(body.contains("NOT_FOUND"));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }
}

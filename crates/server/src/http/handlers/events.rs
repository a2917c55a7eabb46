use axum::{extract::State, http::StatusCode, Json};
use domain::{
    protocol::{decode_fields, parse_comment_path},
    CommentEvent,
};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::state::AppState;

/// A document-created event. `document` is the created document's path or
/// full resource name; `value.fields` uses Firestore's typed encoding.
#[derive(Deserialize)]
pub struct DocumentCreatedEvent {
    pub document: String,
    #[serde(default)]
    pub value: Option<EventDocument>,
}

#[derive(Deserialize)]
pub struct EventDocument {
    #[serde(default)]
    pub fields: Option<Map<String, Value>>,
}

pub async fn comment_created(
    State(state): State<AppState>,
    Json(payload): Json<DocumentCreatedEvent>,
) -> Result<Json<Value>, (StatusCode, String)> {
    let path = parse_comment_path(&payload.document).ok_or_else(|| {
        (
            StatusCode::BAD_REQUEST,
            format!(
                "Document {} does not match sites/{{siteId}}/comments/{{commentId}}",
                payload.document
            ),
        )
    })?;

    // a document with no fields still exists; only a missing value means no data
    let fields = payload
        .value
        .map(|doc| decode_fields(&doc.fields.unwrap_or_default()));
    let event = CommentEvent::new(path, fields);

    tracing::info!("Comment created: {}", event.path);

    match state.dispatcher.dispatch(&event).await {
        Ok(outcome) => {
            let mut body = serde_json::json!({ "outcome": outcome.as_str() });
            if let adapter::Outcome::Sent { message_id } = &outcome {
                body["messageId"] = Value::String(message_id.clone());
            }
            Ok(Json(body))
        }
        Err(e) => {
            // non-2xx lets the platform decide whether to redeliver
            tracing::error!("Dispatch failed for {}: {}", event.path, e);
            Err((StatusCode::BAD_GATEWAY, e.to_string()))
        }
    }
}

use crate::models::{CommentPath, Fields, NotificationContent, PushMessage, Site, SiteId};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

pub const COMMENT_TITLE: &str = "New Comment on Your Site";
pub const COMMENT_BODY_PREFIX: &str = "Someone commented on your site: ";

// String concatenation of a missing field yields this.
const MISSING_SITE_NAME: &str = "undefined";

/// Accepts `sites/{siteId}/comments/{commentId}`, optionally prefixed by
/// `documents/` or a full `projects/.../databases/.../documents/` resource name.
pub fn parse_comment_path(document: &str) -> Option<CommentPath> {
    let path = if document.starts_with("projects/") {
        let idx = document.find("/documents/")?;
        &document[idx + "/documents/".len()..]
    } else {
        document.strip_prefix("documents/").unwrap_or(document)
    };
    let path = path.trim_matches('/');

    let mut segments = path.split('/');
    let (sites, site_id, comments, comment_id) = (
        segments.next()?,
        segments.next()?,
        segments.next()?,
        segments.next()?,
    );
    if segments.next().is_some() || sites != "sites" || comments != "comments" {
        return None;
    }
    if comment_id.is_empty() {
        return None;
    }

    let site_id = SiteId::new(site_id).ok()?;
    Some(CommentPath {
        site_id,
        comment_id: comment_id.to_string(),
    })
}

/// Turns a Firestore typed value (`{"stringValue": "x"}`) into plain JSON.
pub fn decode_value(value: &Value) -> Value {
    let Some(obj) = value.as_object() else {
        return value.clone();
    };
    if obj.len() != 1 {
        return value.clone();
    }
    let Some((kind, inner)) = obj.iter().next() else {
        return value.clone();
    };

    match kind.as_str() {
        "nullValue" => Value::Null,
        "booleanValue" => inner.clone(),
        "integerValue" => match inner {
            Value::String(s) => s
                .parse::<i64>()
                .map(Value::from)
                .unwrap_or_else(|_| inner.clone()),
            other => other.clone(),
        },
        "doubleValue" | "stringValue" | "timestampValue" | "referenceValue" | "bytesValue"
        | "geoPointValue" => inner.clone(),
        "mapValue" => {
            let fields = inner
                .get("fields")
                .and_then(Value::as_object)
                .map(decode_fields)
                .unwrap_or_default();
            Value::Object(fields)
        }
        "arrayValue" => {
            let values = inner
                .get("values")
                .and_then(Value::as_array)
                .map(|vs| vs.iter().map(decode_value).collect())
                .unwrap_or_default();
            Value::Array(values)
        }
        _ => value.clone(),
    }
}

pub fn decode_fields(fields: &Map<String, Value>) -> Fields {
    fields
        .iter()
        .map(|(k, v)| (k.clone(), decode_value(v)))
        .collect()
}

/// Inverse of [`decode_value`], used when we have to talk to Firestore ourselves.
pub fn encode_value(value: &Value) -> Value {
    match value {
        Value::Null => serde_json::json!({ "nullValue": null }),
        Value::Bool(b) => serde_json::json!({ "booleanValue": b }),
        Value::Number(n) => match n.as_i64() {
            Some(i) => serde_json::json!({ "integerValue": i.to_string() }),
            None => serde_json::json!({ "doubleValue": n }),
        },
        Value::String(s) => serde_json::json!({ "stringValue": s }),
        Value::Array(values) => {
            let values: Vec<Value> = values.iter().map(encode_value).collect();
            serde_json::json!({ "arrayValue": { "values": values } })
        }
        Value::Object(fields) => serde_json::json!({ "mapValue": { "fields": encode_fields(fields) } }),
    }
}

pub fn encode_fields(fields: &Map<String, Value>) -> Map<String, Value> {
    fields
        .iter()
        .map(|(k, v)| (k.clone(), encode_value(v)))
        .collect()
}

/// Renders a field the way string concatenation does on the client side:
/// `null` stays `null`, arrays join with commas, objects collapse.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::String(s) => s.clone(),
        Value::Number(n) => {
            if n.is_i64() || n.is_u64() {
                return n.to_string();
            }
            match n.as_f64() {
                Some(f) if f.fract() == 0.0 && f.abs() < 1e21 => format!("{:.0}", f),
                Some(f) => f.to_string(),
                None => n.to_string(),
            }
        }
        Value::Array(items) => items
            .iter()
            .map(|v| match v {
                Value::Null => String::new(),
                other => display_value(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}

pub fn build_comment_notification(token: String, site: &Site) -> PushMessage {
    let site_name = site
        .name
        .as_ref()
        .map(display_value)
        .unwrap_or_else(|| MISSING_SITE_NAME.to_string());

    let mut data = BTreeMap::new();
    data.insert("siteId".to_string(), site.id.as_str().to_string());

    PushMessage {
        token,
        notification: NotificationContent {
            title: COMMENT_TITLE.to_string(),
            body: format!("{}{}", COMMENT_BODY_PREFIX, site_name),
        },
        data,
    }
}

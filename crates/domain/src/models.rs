use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

pub type Fields = Map<String, Value>;

pub const SITES: &str = "sites";
pub const USERS: &str = "users";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SiteId(String);

impl SiteId {
    pub fn new(s: impl Into<String>) -> Result<Self, String> {
        let s = s.into();
        if s.is_empty() {
            return Err("Site ID cannot be empty.".to_string());
        }
        if s.contains('/') {
            return Err("Site ID cannot contain '/'.".to_string());
        }
        if s.len() > 1500 {
            return Err("Site ID is too long (max 1500 bytes).".to_string());
        }
        Ok(Self(s))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SiteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The two path parameters of `sites/{siteId}/comments/{commentId}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentPath {
    pub site_id: SiteId,
    pub comment_id: String,
}

impl fmt::Display for CommentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sites/{}/comments/{}", self.site_id, self.comment_id)
    }
}

/// A point-lookup result from the document store, already decoded to plain JSON.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Fields,
}

impl Document {
    pub fn new(id: impl Into<String>, fields: Fields) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    /// Non-empty string field, `None` for anything else.
    pub fn str_field(&self, key: &str) -> Option<&str> {
        str_field(&self.fields, key)
    }
}

pub(crate) fn str_field<'a>(fields: &'a Fields, key: &str) -> Option<&'a str> {
    fields
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

#[derive(Debug, Clone, PartialEq)]
pub struct Site {
    pub id: SiteId,
    pub owner_id: Option<String>,
    // kept raw: the body renders whatever is stored, null and "" included
    pub name: Option<Value>,
}

impl Site {
    pub fn from_document(id: SiteId, doc: &Document) -> Self {
        Self {
            id,
            owner_id: doc.str_field("userId").map(str::to_owned),
            name: doc.fields.get("siteName").cloned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UserProfile {
    pub fcm_token: Option<String>,
}

impl UserProfile {
    pub fn from_document(doc: &Document) -> Self {
        Self {
            fcm_token: doc.str_field("fcmToken").map(str::to_owned),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationContent {
    pub title: String,
    pub body: String,
}

/// One outbound push, addressed to a single device token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushMessage {
    pub token: String,
    pub notification: NotificationContent,
    pub data: BTreeMap<String, String>,
}

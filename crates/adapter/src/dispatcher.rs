//! Comment-created → push notification pipeline.
//!
//! Strictly linear: read site, read owner, read token, send. Every expected
//! absence ends the pipeline with an [`Outcome`]; only store and gateway
//! failures are errors.

use crate::traits::{PushError, PushGateway};
use domain::{protocol::build_comment_notification, CommentEvent, Site, UserProfile, SITES, USERS};
use std::fmt;
use std::sync::Arc;
use storage::{DocumentStore, StoreError};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("document store: {0}")]
    Store(#[from] StoreError),

    #[error("push gateway: {0}")]
    Push(#[from] PushError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Sent { message_id: String },
    EmptyPayload,
    SiteMissing,
    OwnerMissing,
    SelfComment,
    TokenMissing,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Sent { .. } => "sent",
            Outcome::EmptyPayload => "empty_payload",
            Outcome::SiteMissing => "site_missing",
            Outcome::OwnerMissing => "owner_missing",
            Outcome::SelfComment => "self_comment",
            Outcome::TokenMissing => "token_missing",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Holds only read-only handles; one instance serves every event.
#[derive(Clone)]
pub struct Dispatcher {
    store: Arc<dyn DocumentStore>,
    gateway: Arc<dyn PushGateway>,
}

impl Dispatcher {
    pub fn new(store: Arc<dyn DocumentStore>, gateway: Arc<dyn PushGateway>) -> Self {
        Self { store, gateway }
    }

    pub async fn dispatch(&self, event: &CommentEvent) -> Result<Outcome, DispatchError> {
        let path = &event.path;

        if event.fields.is_none() {
            debug!("{}: no document data, skipping", path);
            return Ok(Outcome::EmptyPayload);
        }
        let commenter_id = event.commenter_id();

        let Some(site_doc) = self.store.get(SITES, path.site_id.as_str()).await? else {
            debug!("{}: site does not exist", path);
            return Ok(Outcome::SiteMissing);
        };
        let site = Site::from_document(path.site_id.clone(), &site_doc);

        let owner_id = match site.owner_id.as_deref() {
            None => {
                debug!("{}: site has no owner", path);
                return Ok(Outcome::OwnerMissing);
            }
            Some(owner) if Some(owner) == commenter_id => {
                debug!("{}: owner commented on own site", path);
                return Ok(Outcome::SelfComment);
            }
            Some(owner) => owner,
        };

        let token = self
            .store
            .get(USERS, owner_id)
            .await?
            .map(|doc| UserProfile::from_document(&doc))
            .and_then(|user| user.fcm_token);
        let Some(token) = token else {
            debug!("{}: owner {} has no push token", path, owner_id);
            return Ok(Outcome::TokenMissing);
        };

        let message = build_comment_notification(token, &site);
        let message_id = self.gateway.send(&message).await?;

        info!(
            "{}: notified owner {} (message {})",
            path, owner_id, message_id
        );
        Ok(Outcome::Sent { message_id })
    }
}

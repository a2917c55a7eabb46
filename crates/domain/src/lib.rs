mod events;
mod models;
pub mod protocol;

pub use events::CommentEvent;
pub use models::{
    CommentPath, Document, Fields, NotificationContent, PushMessage, Site, SiteId, UserProfile,
    SITES, USERS,
};

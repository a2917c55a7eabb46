use crate::models::{str_field, CommentPath, Fields};

/// A newly created comment, as delivered by the trigger.
#[derive(Debug, Clone, PartialEq)]
pub struct CommentEvent {
    pub path: CommentPath,
    // None when the trigger carried no readable document data
    pub fields: Option<Fields>,
}

impl CommentEvent {
    pub fn new(path: CommentPath, fields: Option<Fields>) -> Self {
        Self { path, fields }
    }

    pub fn commenter_id(&self) -> Option<&str> {
        self.fields.as_ref().and_then(|f| str_field(f, "userId"))
    }
}

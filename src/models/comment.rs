use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub post_id: u64,
    pub author: String,
    pub content: String,
    pub date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    pub user_id: String,
}

impl Comment {
    pub fn new(
        post_id: u64,
        author: String,
        content: String,
        parent_id: Option<String>,
        user_id: String,
    ) -> Self {
        let now = Utc::now();
        let prefix = if parent_id.is_some() { "reply" } else { "comment" };

        Self {
            id: format!(
                "{}_{}_{}",
                prefix,
                now.timestamp_millis(),
                Uuid::new_v4().simple()
            ),
            post_id,
            author,
            content,
            date: now,
            parent_id,
            user_id,
        }
    }

    pub fn is_reply(&self) -> bool {
        self.parent_id.is_some()
    }

    pub fn is_owned_by(&self, actor_id: &str) -> bool {
        self.user_id == actor_id
    }
}

/// A top-level comment with its direct replies.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CommentThread {
    #[serde(flatten)]
    pub comment: Comment,
    pub replies: Vec<Comment>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentRequest {
    #[validate(length(min = 1))]
    pub content: String,
    pub parent_id: Option<String>,
}

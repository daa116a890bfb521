use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::comment::CommentThread;
use crate::utils::listing::parse_timestamp;

/// Board category. Wire values are the labels shown on the board.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum PostCategory {
    #[serde(rename = "팁")]
    Tip,
    #[serde(rename = "질문")]
    Question,
    #[serde(rename = "자유")]
    Free,
}

impl PostCategory {
    /// Accepts either the board label or the English name.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "팁" | "tip" => Some(Self::Tip),
            "질문" | "question" => Some(Self::Question),
            "자유" | "free" => Some(Self::Free),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: u64,
    pub category: PostCategory,
    pub title: String,
    pub author: String,
    /// ISO date (`2024-01-01`) for seed posts, RFC 3339 datetime for written ones.
    pub date: String,
    #[serde(default)]
    pub views: u64,
    #[serde(default)]
    pub recommends: u64,
    #[serde(default)]
    pub comments: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

impl Post {
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.date)
    }

    pub fn is_owned_by(&self, actor_id: &str) -> bool {
        self.user_id.as_deref() == Some(actor_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreatePostRequest {
    pub category: PostCategory,

    #[validate(length(min = 1))]
    pub title: String,

    #[validate(length(min = 1))]
    pub content: String,
}

/// Query string of the board list page.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PostQuery {
    pub category: Option<String>,
    pub search: Option<String>,
    pub sort: Option<String>,
}

/// Everything the detail page renders after one read.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostDetail {
    pub post: Post,
    pub comments: Vec<CommentThread>,
    pub comment_total: usize,
    pub recommended: bool,
}

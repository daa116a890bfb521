use std::collections::HashMap;

use crate::models::comment::{Comment, CommentThread};

/// Groups a flat comment list into top-level comments with their direct
/// replies. Both levels keep input order. Replies whose parent is missing or
/// is itself a reply are left out of the tree.
pub fn build_comment_tree(comments: &[Comment]) -> Vec<CommentThread> {
    let mut replies: HashMap<&str, Vec<Comment>> = HashMap::new();
    for comment in comments {
        if let Some(parent_id) = comment.parent_id.as_deref() {
            replies.entry(parent_id).or_default().push(comment.clone());
        }
    }

    comments
        .iter()
        .filter(|comment| !comment.is_reply())
        .map(|comment| CommentThread {
            comment: comment.clone(),
            replies: replies.remove(comment.id.as_str()).unwrap_or_default(),
        })
        .collect()
}

/// Inverse of [`build_comment_tree`] for well-formed input.
pub fn flatten_tree(threads: &[CommentThread]) -> Vec<Comment> {
    threads
        .iter()
        .flat_map(|thread| {
            std::iter::once(thread.comment.clone()).chain(thread.replies.iter().cloned())
        })
        .collect()
}

/// Incrementally maintained parent -> replies index.
///
/// Yields the same tree as [`build_comment_tree`] over the comments in
/// insertion order.
#[derive(Debug, Default, Clone)]
pub struct ThreadIndex {
    comments: HashMap<String, Comment>,
    roots: Vec<String>,
    children: HashMap<String, Vec<String>>,
}

impl ThreadIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_comments(comments: &[Comment]) -> Self {
        let mut index = Self::new();
        for comment in comments {
            index.insert(comment.clone());
        }
        index
    }

    pub fn len(&self) -> usize {
        self.comments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.comments.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Comment> {
        self.comments.get(id)
    }

    /// Re-inserting an existing id replaces it in place.
    pub fn insert(&mut self, comment: Comment) {
        if self.comments.contains_key(&comment.id) {
            self.remove(&comment.id);
        }

        match comment.parent_id.as_deref() {
            Some(parent_id) => self
                .children
                .entry(parent_id.to_string())
                .or_default()
                .push(comment.id.clone()),
            None => self.roots.push(comment.id.clone()),
        }
        self.comments.insert(comment.id.clone(), comment);
    }

    /// Removes one comment. Its replies stay indexed but detached.
    pub fn remove(&mut self, id: &str) -> Option<Comment> {
        let comment = self.comments.remove(id)?;
        match comment.parent_id.as_deref() {
            Some(parent_id) => {
                if let Some(siblings) = self.children.get_mut(parent_id) {
                    siblings.retain(|child| child != id);
                    if siblings.is_empty() {
                        self.children.remove(parent_id);
                    }
                }
            }
            None => self.roots.retain(|root| root != id),
        }
        Some(comment)
    }

    pub fn tree(&self) -> Vec<CommentThread> {
        self.roots
            .iter()
            .filter_map(|root_id| self.comments.get(root_id))
            .map(|root| CommentThread {
                comment: root.clone(),
                replies: self
                    .children
                    .get(&root.id)
                    .map(|ids| {
                        ids.iter()
                            .filter_map(|id| self.comments.get(id))
                            .cloned()
                            .collect()
                    })
                    .unwrap_or_default(),
            })
            .collect()
    }
}

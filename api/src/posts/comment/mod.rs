pub mod create;
pub mod get;
pub mod tree;

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::models::comment::Comment;

// The model returned to the client after a comment is created
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct CommentView {
    pub id: i32,
    pub post: i32,
    pub author: String,
    pub content: String,
    pub parent: Option<i32>,
    pub created_at: NaiveDateTime,
}

impl CommentView {
    pub fn new(comment: Comment, author: String) -> Self {
        CommentView {
            id: comment.id,
            post: comment.post_id,
            author,
            content: comment.content,
            parent: comment.parent_id,
            created_at: comment.created_at,
        }
    }
}

use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::Serialize;

#[derive(Queryable, Selectable, Debug, Serialize, Clone, PartialEq)]
#[diesel(table_name = crate::schema::comments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Comment {
    pub id: i32,
    pub post_id: i32,
    pub author_id: i32,
    pub content: String,
    pub parent_id: Option<i32>,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::comments)]
pub struct NewComment {
    pub post_id: i32,
    pub author_id: i32,
    pub content: String,
    pub parent_id: Option<i32>,
    pub created_at: NaiveDateTime,
}

/// A comment joined with its author's username, the input of the comment
/// tree builder.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthoredComment {
    pub comment: Comment,
    pub author: String,
}

impl From<(Comment, String)> for AuthoredComment {
    fn from((comment, author): (Comment, String)) -> Self {
        AuthoredComment { comment, author }
    }
}

use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::Serialize;

/// What a like points at. A like always has exactly one target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum LikeTarget {
    Post(i32),
    Comment(i32),
}

#[derive(Queryable, Selectable, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::likes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Like {
    pub id: i32,
    pub user_id: i32,
    pub post_id: Option<i32>,
    pub comment_id: Option<i32>,
    pub created_at: NaiveDateTime,
}

impl Like {
    /// Returns `None` only for rows that violate the one-target constraint.
    pub fn target(&self) -> Option<LikeTarget> {
        match (self.post_id, self.comment_id) {
            (Some(post_id), None) => Some(LikeTarget::Post(post_id)),
            (None, Some(comment_id)) => Some(LikeTarget::Comment(comment_id)),
            _ => None,
        }
    }
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::likes)]
pub struct NewLike {
    pub user_id: i32,
    pub post_id: Option<i32>,
    pub comment_id: Option<i32>,
    pub created_at: NaiveDateTime,
}

impl NewLike {
    pub fn new(user_id: i32, target: LikeTarget) -> Self {
        let (post_id, comment_id) = match target {
            LikeTarget::Post(id) => (Some(id), None),
            LikeTarget::Comment(id) => (None, Some(id)),
        };

        NewLike {
            user_id,
            post_id,
            comment_id,
            created_at: chrono::Utc::now().naive_utc(),
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct LikeView {
    pub id: i32,
    pub user: i32,
    pub target: LikeTarget,
    pub created_at: NaiveDateTime,
}

impl TryFrom<Like> for LikeView {
    type Error = &'static str;

    fn try_from(like: Like) -> Result<Self, Self::Error> {
        Ok(LikeView {
            target: like.target().ok_or("like has no single target")?,
            id: like.id,
            user: like.user_id,
            created_at: like.created_at,
        })
    }
}

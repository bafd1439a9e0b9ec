use chrono::NaiveDateTime;
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Integer, Text, Timestamp};
use serde::Serialize;

#[derive(Queryable, Selectable, Debug, Serialize, Clone, PartialEq)]
#[diesel(table_name = crate::schema::posts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Post {
    pub id: i32,
    pub author_id: i32,
    pub content: String,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::posts)]
pub struct NewPost {
    pub author_id: i32,
    pub content: String,
    pub created_at: NaiveDateTime,
}

impl NewPost {
    pub fn new(author_id: i32, content: String) -> Self {
        NewPost {
            author_id,
            content,
            created_at: chrono::Utc::now().naive_utc(),
        }
    }
}

/// A post as listed in the feed, with its author's username and the number
/// of likes pointing at it.
#[derive(QueryableByName, Debug, Serialize, Clone, PartialEq)]
pub struct FeedPost {
    #[diesel(sql_type = Integer)]
    pub id: i32,
    #[diesel(sql_type = Text)]
    pub author: String,
    #[diesel(sql_type = Text)]
    pub content: String,
    #[diesel(sql_type = Timestamp)]
    pub created_at: NaiveDateTime,
    #[diesel(sql_type = BigInt)]
    pub like_count: i64,
}

//! Persistence collaborators. Handlers and services only talk to [`Store`];
//! PostgreSQL backs it in production and [`memory::MemoryStore`] backs tests
//! and benchmarks.

use async_trait::async_trait;
use chrono::NaiveDateTime;

use crate::models::{
    comment::{AuthoredComment, Comment, NewComment},
    karma::{KarmaTotal, KarmaTransaction, NewKarmaTransaction},
    like::{Like, NewLike},
    post::{FeedPost, NewPost, Post},
    user::User,
};

pub mod memory;
pub mod postgres;

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("constraint violated: {0}")]
    Constraint(String),

    #[error("could not get a database connection: {0}")]
    Pool(String),

    #[error(transparent)]
    Database(diesel::result::Error),
}

impl From<diesel::result::Error> for StoreError {
    fn from(e: diesel::result::Error) -> Self {
        use diesel::result::{DatabaseErrorKind, Error};

        match e {
            Error::NotFound => StoreError::NotFound("record"),
            Error::DatabaseError(
                DatabaseErrorKind::ForeignKeyViolation
                | DatabaseErrorKind::CheckViolation
                | DatabaseErrorKind::UniqueViolation
                | DatabaseErrorKind::NotNullViolation,
                info,
            ) => StoreError::Constraint(info.message().to_owned()),
            e => StoreError::Database(e),
        }
    }
}

impl From<diesel_async::pooled_connection::deadpool::PoolError> for StoreError {
    fn from(e: diesel_async::pooled_connection::deadpool::PoolError) -> Self {
        StoreError::Pool(e.to_string())
    }
}

#[async_trait]
pub trait Store: Send + Sync {
    /// The user owning an unexpired session with this token.
    async fn user_by_session_token(
        &self,
        token: &str,
        now: NaiveDateTime,
    ) -> Result<Option<User>, StoreError>;

    /// Every post, newest first, annotated with its like count.
    async fn feed(&self) -> Result<Vec<FeedPost>, StoreError>;

    async fn create_post(&self, post: NewPost) -> Result<Post, StoreError>;

    async fn post(&self, id: i32) -> Result<Post, StoreError>;

    async fn comment(&self, id: i32) -> Result<Comment, StoreError>;

    /// Comments of a post in chronological order.
    async fn post_comments(&self, post_id: i32) -> Result<Vec<AuthoredComment>, StoreError>;

    async fn create_comment(&self, comment: NewComment) -> Result<Comment, StoreError>;

    /// Inserts the like and its karma award in a single transaction. Either
    /// both rows are persisted or neither is.
    async fn record_like(
        &self,
        like: NewLike,
        award: NewKarmaTransaction,
    ) -> Result<(Like, KarmaTransaction), StoreError>;

    /// Per-user karma sums of transactions created at or after `since`,
    /// highest first, ties by username, at most `limit` rows.
    async fn karma_totals_since(
        &self,
        since: NaiveDateTime,
        limit: i64,
    ) -> Result<Vec<KarmaTotal>, StoreError>;
}

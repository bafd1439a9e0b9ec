use async_trait::async_trait;
use chrono::NaiveDateTime;
use tokio::sync::Mutex;

use crate::{
    karma::leaderboard,
    models::{
        comment::{AuthoredComment, Comment, NewComment},
        karma::{KarmaTotal, KarmaTransaction, NewKarmaTransaction},
        like::{Like, NewLike},
        post::{FeedPost, NewPost, Post},
        user::{Session, User},
    },
};

use super::{Store, StoreError};

/// Process-local store with the same constraints as the PostgreSQL schema
/// (foreign keys, one like target, same-post parents are checked by callers).
/// Every write happens under one lock, so multi-row writes are atomic.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    sessions: Vec<Session>,
    posts: Vec<Post>,
    comments: Vec<Comment>,
    likes: Vec<Like>,
    karma: Vec<KarmaTransaction>,
}

fn next_id(len: usize) -> i32 {
    len as i32 + 1
}

impl Tables {
    fn user(&self, id: i32) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    fn require_user(&self, id: i32) -> Result<&User, StoreError> {
        self.user(id)
            .ok_or_else(|| StoreError::Constraint(format!("user {id} does not exist")))
    }

    fn check_like(&self, like: &NewLike) -> Result<(), StoreError> {
        self.require_user(like.user_id)?;

        match (like.post_id, like.comment_id) {
            (Some(post_id), None) => {
                if !self.posts.iter().any(|p| p.id == post_id) {
                    return Err(StoreError::Constraint(format!(
                        "post {post_id} does not exist"
                    )));
                }
            }
            (None, Some(comment_id)) => {
                if !self.comments.iter().any(|c| c.id == comment_id) {
                    return Err(StoreError::Constraint(format!(
                        "comment {comment_id} does not exist"
                    )));
                }
            }
            _ => {
                return Err(StoreError::Constraint(
                    "a like needs exactly one of post or comment".into(),
                ));
            }
        }

        Ok(())
    }

    fn insert_karma(&mut self, award: NewKarmaTransaction) -> Result<KarmaTransaction, StoreError> {
        self.require_user(award.user_id)?;

        let karma = KarmaTransaction {
            id: next_id(self.karma.len()),
            user_id: award.user_id,
            points: award.points,
            created_at: award.created_at,
        };
        self.karma.push(karma.clone());

        Ok(karma)
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_user(&self, username: &str) -> User {
        let mut tables = self.tables.lock().await;
        let user = User {
            id: next_id(tables.users.len()),
            username: username.to_owned(),
            created_at: chrono::Utc::now().naive_utc(),
        };
        tables.users.push(user.clone());
        user
    }

    pub async fn add_session(&self, user_id: i32, token: &str, expires_at: NaiveDateTime) {
        let mut tables = self.tables.lock().await;
        let session = Session {
            id: next_id(tables.sessions.len()),
            token: token.to_owned(),
            user_id,
            expires_at,
            created_at: chrono::Utc::now().naive_utc(),
        };
        tables.sessions.push(session);
    }

    /// Appends a ledger entry outside of any like, e.g. to seed history.
    pub async fn append_karma(
        &self,
        award: NewKarmaTransaction,
    ) -> Result<KarmaTransaction, StoreError> {
        self.tables.lock().await.insert_karma(award)
    }

    pub async fn likes(&self) -> Vec<Like> {
        self.tables.lock().await.likes.clone()
    }

    pub async fn karma_transactions(&self) -> Vec<KarmaTransaction> {
        self.tables.lock().await.karma.clone()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn user_by_session_token(
        &self,
        token: &str,
        now: NaiveDateTime,
    ) -> Result<Option<User>, StoreError> {
        let tables = self.tables.lock().await;

        Ok(tables
            .sessions
            .iter()
            .find(|s| s.token == token && s.is_active_at(now))
            .and_then(|s| tables.user(s.user_id))
            .cloned())
    }

    async fn feed(&self) -> Result<Vec<FeedPost>, StoreError> {
        let tables = self.tables.lock().await;

        let mut feed = tables
            .posts
            .iter()
            .map(|p| -> Result<FeedPost, StoreError> {
                Ok(FeedPost {
                    id: p.id,
                    author: tables.require_user(p.author_id)?.username.clone(),
                    content: p.content.clone(),
                    created_at: p.created_at,
                    like_count: tables
                        .likes
                        .iter()
                        .filter(|l| l.post_id == Some(p.id))
                        .count() as i64,
                })
            })
            .collect::<Result<Vec<_>, StoreError>>()?;

        feed.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));

        Ok(feed)
    }

    async fn create_post(&self, post: NewPost) -> Result<Post, StoreError> {
        let mut tables = self.tables.lock().await;
        tables.require_user(post.author_id)?;

        let post = Post {
            id: next_id(tables.posts.len()),
            author_id: post.author_id,
            content: post.content,
            created_at: post.created_at,
        };
        tables.posts.push(post.clone());

        Ok(post)
    }

    async fn post(&self, id: i32) -> Result<Post, StoreError> {
        self.tables
            .lock()
            .await
            .posts
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or(StoreError::NotFound("post"))
    }

    async fn comment(&self, id: i32) -> Result<Comment, StoreError> {
        self.tables
            .lock()
            .await
            .comments
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or(StoreError::NotFound("comment"))
    }

    async fn post_comments(&self, post_id: i32) -> Result<Vec<AuthoredComment>, StoreError> {
        let tables = self.tables.lock().await;

        let mut comments = tables
            .comments
            .iter()
            .filter(|c| c.post_id == post_id)
            .map(|c| -> Result<AuthoredComment, StoreError> {
                Ok(AuthoredComment {
                    comment: c.clone(),
                    author: tables.require_user(c.author_id)?.username.clone(),
                })
            })
            .collect::<Result<Vec<_>, StoreError>>()?;

        comments.sort_by_key(|c| (c.comment.created_at, c.comment.id));

        Ok(comments)
    }

    async fn create_comment(&self, comment: NewComment) -> Result<Comment, StoreError> {
        let mut tables = self.tables.lock().await;
        tables.require_user(comment.author_id)?;

        if !tables.posts.iter().any(|p| p.id == comment.post_id) {
            return Err(StoreError::Constraint(format!(
                "post {} does not exist",
                comment.post_id
            )));
        }

        if let Some(parent_id) = comment.parent_id {
            if !tables.comments.iter().any(|c| c.id == parent_id) {
                return Err(StoreError::Constraint(format!(
                    "comment {parent_id} does not exist"
                )));
            }
        }

        let comment = Comment {
            id: next_id(tables.comments.len()),
            post_id: comment.post_id,
            author_id: comment.author_id,
            content: comment.content,
            parent_id: comment.parent_id,
            created_at: comment.created_at,
        };
        tables.comments.push(comment.clone());

        Ok(comment)
    }

    async fn record_like(
        &self,
        like: NewLike,
        award: NewKarmaTransaction,
    ) -> Result<(Like, KarmaTransaction), StoreError> {
        let mut tables = self.tables.lock().await;

        // both rows are validated before either is written
        tables.check_like(&like)?;
        tables.require_user(award.user_id)?;

        let like = Like {
            id: next_id(tables.likes.len()),
            user_id: like.user_id,
            post_id: like.post_id,
            comment_id: like.comment_id,
            created_at: like.created_at,
        };
        tables.likes.push(like.clone());
        let karma = tables.insert_karma(award)?;

        Ok((like, karma))
    }

    async fn karma_totals_since(
        &self,
        since: NaiveDateTime,
        limit: i64,
    ) -> Result<Vec<KarmaTotal>, StoreError> {
        let tables = self.tables.lock().await;

        let mut ledger = Vec::with_capacity(tables.karma.len());
        for k in &tables.karma {
            ledger.push((tables.require_user(k.user_id)?.username.as_str(), k));
        }

        Ok(leaderboard::rank(
            ledger,
            since,
            usize::try_from(limit).unwrap_or(0),
        ))
    }
}

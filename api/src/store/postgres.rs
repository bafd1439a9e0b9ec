use async_trait::async_trait;
use chrono::NaiveDateTime;
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Timestamp};
use diesel_async::{
    AsyncConnection, AsyncPgConnection, RunQueryDsl,
    pooled_connection::{AsyncDieselConnectionManager, deadpool::Pool},
};

use crate::{
    models::{
        comment::{AuthoredComment, Comment, NewComment},
        karma::{KarmaTotal, KarmaTransaction, NewKarmaTransaction},
        like::{Like, NewLike},
        post::{FeedPost, NewPost, Post},
        user::User,
    },
    schema::{comments, karma_transactions, likes, posts, sessions, users},
};

use super::{Store, StoreError};

pub type DieselPool = Pool<AsyncPgConnection>;

pub struct PgStore {
    pool: DieselPool,
}

impl PgStore {
    pub fn connect(database_url: &str, max_connections: usize) -> Result<Self, eyre::Error> {
        let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(database_url);
        let pool = Pool::builder(manager).max_size(max_connections).build()?;

        Ok(PgStore { pool })
    }
}

const FEED_QUERY: &str = "
    SELECT
        p.id,
        u.username AS author,
        p.content,
        p.created_at,
        COUNT(l.id) AS like_count
    FROM posts p
    JOIN users u ON u.id = p.author_id
    LEFT JOIN likes l ON l.post_id = p.id
    GROUP BY p.id, u.username
    ORDER BY p.created_at DESC, p.id DESC
";

const KARMA_TOTALS_QUERY: &str = "
    SELECT
        u.username,
        SUM(k.points)::INT8 AS total_karma
    FROM karma_transactions k
    JOIN users u ON u.id = k.user_id
    WHERE k.created_at >= $1
    GROUP BY u.id, u.username
    ORDER BY total_karma DESC, u.username ASC
    LIMIT $2
";

#[async_trait]
impl Store for PgStore {
    async fn user_by_session_token(
        &self,
        token: &str,
        now: NaiveDateTime,
    ) -> Result<Option<User>, StoreError> {
        let mut conn = self.pool.get().await?;

        Ok(users::table
            .inner_join(sessions::table)
            .filter(sessions::token.eq(token))
            .filter(sessions::expires_at.gt(now))
            .select(User::as_select())
            .first::<User>(&mut conn)
            .await
            .optional()?)
    }

    async fn feed(&self) -> Result<Vec<FeedPost>, StoreError> {
        let mut conn = self.pool.get().await?;

        Ok(diesel::sql_query(FEED_QUERY)
            .load::<FeedPost>(&mut conn)
            .await?)
    }

    async fn create_post(&self, post: NewPost) -> Result<Post, StoreError> {
        let mut conn = self.pool.get().await?;

        Ok(diesel::insert_into(posts::table)
            .values(&post)
            .returning(Post::as_returning())
            .get_result(&mut conn)
            .await?)
    }

    async fn post(&self, id: i32) -> Result<Post, StoreError> {
        let mut conn = self.pool.get().await?;

        posts::table
            .find(id)
            .select(Post::as_select())
            .first::<Post>(&mut conn)
            .await
            .optional()?
            .ok_or(StoreError::NotFound("post"))
    }

    async fn comment(&self, id: i32) -> Result<Comment, StoreError> {
        let mut conn = self.pool.get().await?;

        comments::table
            .find(id)
            .select(Comment::as_select())
            .first::<Comment>(&mut conn)
            .await
            .optional()?
            .ok_or(StoreError::NotFound("comment"))
    }

    async fn post_comments(&self, post_id: i32) -> Result<Vec<AuthoredComment>, StoreError> {
        let mut conn = self.pool.get().await?;

        let rows = comments::table
            .inner_join(users::table)
            .filter(comments::post_id.eq(post_id))
            .order((comments::created_at.asc(), comments::id.asc()))
            .select((Comment::as_select(), users::username))
            .load::<(Comment, String)>(&mut conn)
            .await?;

        Ok(rows.into_iter().map(AuthoredComment::from).collect())
    }

    async fn create_comment(&self, comment: NewComment) -> Result<Comment, StoreError> {
        let mut conn = self.pool.get().await?;

        Ok(diesel::insert_into(comments::table)
            .values(&comment)
            .returning(Comment::as_returning())
            .get_result(&mut conn)
            .await?)
    }

    #[tracing::instrument(skip_all, fields(liker = like.user_id, recipient = award.user_id))]
    async fn record_like(
        &self,
        like: NewLike,
        award: NewKarmaTransaction,
    ) -> Result<(Like, KarmaTransaction), StoreError> {
        let mut pooled = self.pool.get().await?;
        let conn: &mut AsyncPgConnection = &mut pooled;

        Ok(conn
            .transaction(|conn| {
                Box::pin(async move {
                    let like = diesel::insert_into(likes::table)
                        .values(&like)
                        .returning(Like::as_returning())
                        .get_result::<Like>(conn)
                        .await?;

                    let karma = diesel::insert_into(karma_transactions::table)
                        .values(&award)
                        .returning(KarmaTransaction::as_returning())
                        .get_result::<KarmaTransaction>(conn)
                        .await?;

                    Ok::<_, diesel::result::Error>((like, karma))
                })
            })
            .await?)
    }

    async fn karma_totals_since(
        &self,
        since: NaiveDateTime,
        limit: i64,
    ) -> Result<Vec<KarmaTotal>, StoreError> {
        let mut conn = self.pool.get().await?;

        Ok(diesel::sql_query(KARMA_TOTALS_QUERY)
            .bind::<Timestamp, _>(since)
            .bind::<BigInt, _>(limit)
            .load::<KarmaTotal>(&mut conn)
            .await?)
    }
}

//! The karma ledger. Karma only ever changes by appending transactions, and
//! the only writers are the two like operations below.

pub mod leaderboard;
pub mod routes;

use crate::{
    models::{
        comment::Comment,
        karma::KarmaTransaction,
        like::{Like, LikeTarget, NewLike},
        post::Post,
        user::User,
    },
    store::{Store, StoreError},
};

/// Karma earned by a post's author each time the post is liked.
pub const POST_LIKE_KARMA: i32 = 5;

/// Karma earned by a comment's author each time the comment is liked.
pub const COMMENT_LIKE_KARMA: i32 = 1;

/// Likes `post` on behalf of `user` and awards the post's author. Liking the
/// same post again records another like and another award.
#[tracing::instrument(skip_all, fields(liker = user.id, post = post.id))]
pub async fn like_post(
    store: &dyn Store,
    user: &User,
    post: &Post,
) -> Result<(Like, KarmaTransaction), StoreError> {
    let (like, karma) = store
        .record_like(
            NewLike::new(user.id, LikeTarget::Post(post.id)),
            KarmaTransaction::award(post.author_id, POST_LIKE_KARMA),
        )
        .await?;

    tracing::info!(
        like = like.id,
        recipient = karma.user_id,
        points = karma.points,
        "Post liked"
    );

    Ok((like, karma))
}

#[tracing::instrument(skip_all, fields(liker = user.id, comment = comment.id))]
pub async fn like_comment(
    store: &dyn Store,
    user: &User,
    comment: &Comment,
) -> Result<(Like, KarmaTransaction), StoreError> {
    let (like, karma) = store
        .record_like(
            NewLike::new(user.id, LikeTarget::Comment(comment.id)),
            KarmaTransaction::award(comment.author_id, COMMENT_LIKE_KARMA),
        )
        .await?;

    tracing::info!(
        like = like.id,
        recipient = karma.user_id,
        points = karma.points,
        "Comment liked"
    );

    Ok((like, karma))
}

#[cfg(test)]
mod tests {
    use chrono::{TimeDelta, Utc};

    use super::*;
    use crate::{
        models::{comment::NewComment, post::NewPost},
        store::memory::MemoryStore,
    };

    async fn total_for(store: &MemoryStore, username: &str) -> i64 {
        leaderboard::get_leaderboard(store, Utc::now().naive_utc(), TimeDelta::hours(24), 100)
            .await
            .unwrap()
            .into_iter()
            .find(|row| row.username == username)
            .map(|row| row.total_karma)
            .unwrap_or(0)
    }

    async fn seed() -> (MemoryStore, User, User, Post) {
        let store = MemoryStore::new();
        let author = store.add_user("author").await;
        let liker = store.add_user("liker").await;
        let post = store
            .create_post(NewPost::new(author.id, "hello".into()))
            .await
            .unwrap();
        (store, author, liker, post)
    }

    #[tokio::test]
    async fn liking_a_post_awards_its_author_five_points() {
        let (store, author, liker, post) = seed().await;

        let (like, karma) = like_post(&store, &liker, &post).await.unwrap();

        assert_eq!(like.user_id, liker.id);
        assert_eq!(like.target(), Some(LikeTarget::Post(post.id)));
        assert_eq!(karma.user_id, author.id);
        assert_eq!(karma.points, POST_LIKE_KARMA);
        assert_eq!(total_for(&store, "author").await, 5);
        assert_eq!(total_for(&store, "liker").await, 0);
    }

    #[tokio::test]
    async fn liking_a_comment_awards_its_author_one_point() {
        let (store, author, liker, post) = seed().await;
        let comment = store
            .create_comment(NewComment {
                post_id: post.id,
                author_id: liker.id,
                content: "first".into(),
                parent_id: None,
                created_at: Utc::now().naive_utc(),
            })
            .await
            .unwrap();

        like_comment(&store, &author, &comment).await.unwrap();

        assert_eq!(total_for(&store, "liker").await, 1);
        assert_eq!(total_for(&store, "author").await, 0);
    }

    #[tokio::test]
    async fn repeated_likes_keep_awarding() {
        let (store, _author, liker, post) = seed().await;

        like_post(&store, &liker, &post).await.unwrap();
        like_post(&store, &liker, &post).await.unwrap();

        assert_eq!(store.likes().await.len(), 2);
        assert_eq!(total_for(&store, "author").await, 10);
    }

    #[tokio::test]
    async fn failed_like_leaves_no_karma_behind() {
        let (store, author, liker, _post) = seed().await;
        let missing = Post {
            id: 404,
            author_id: author.id,
            content: String::new(),
            created_at: Utc::now().naive_utc(),
        };

        let err = like_post(&store, &liker, &missing).await.unwrap_err();

        assert!(matches!(err, StoreError::Constraint(_)));
        assert!(store.likes().await.is_empty());
        assert!(store.karma_transactions().await.is_empty());
    }

    #[tokio::test]
    async fn invalid_award_is_rejected_before_the_like_is_written() {
        let (store, _author, liker, post) = seed().await;

        let err = store
            .record_like(
                NewLike::new(liker.id, LikeTarget::Post(post.id)),
                KarmaTransaction::award(999, POST_LIKE_KARMA),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::Constraint(_)));
        assert!(store.likes().await.is_empty());
        assert!(store.karma_transactions().await.is_empty());
    }
}

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;

use crate::{
    App,
    error::{AppError, FieldErrors},
    identity::AuthUser,
    models::comment::NewComment,
    posts::clean_content,
    store::StoreError,
};

use super::CommentView;

#[derive(Deserialize)]
pub struct CommentSubmission {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    parent: Option<i32>,
}

#[axum::debug_handler(state = App)]
pub async fn create_comment(
    State(ctx): State<App>,
    Path(post_id): Path<i32>,
    AuthUser(user): AuthUser,
    crate::json::Json(submission): crate::json::Json<CommentSubmission>,
) -> Result<(StatusCode, Json<CommentView>), AppError> {
    let mut errors = FieldErrors::new();
    let content = clean_content(submission.content, "content", &mut errors);

    let post = ctx.store.post(post_id).await?;

    // check if the parent comment actually belongs to the post
    if let Some(parent_id) = submission.parent {
        match ctx.store.comment(parent_id).await {
            Ok(parent) if parent.post_id == post.id => {}
            Ok(_) => errors.add(
                "parent",
                "You're replying to a comment that does not belong to this post.",
            ),
            Err(StoreError::NotFound(_)) => errors.add(
                "parent",
                format!("Invalid pk \"{parent_id}\" - object does not exist."),
            ),
            Err(e) => return Err(e.into()),
        }
    }

    let content = match content {
        Some(content) if errors.is_empty() => content,
        _ => return Err(errors.into()),
    };

    let comment = ctx
        .store
        .create_comment(NewComment {
            post_id: post.id,
            author_id: user.id,
            content,
            parent_id: submission.parent,
            created_at: chrono::Utc::now().naive_utc(),
        })
        .await?;

    tracing::info!(
        comment = comment.id,
        post = post.id,
        parent = ?comment.parent_id,
        "Comment created"
    );

    Ok((
        StatusCode::CREATED,
        Json(CommentView::new(comment, user.username)),
    ))
}

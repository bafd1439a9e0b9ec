use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;

use crate::{
    App,
    error::{AppError, FieldErrors},
    identity::AuthUser,
    models::post::{FeedPost, NewPost},
};

use super::clean_content;

#[derive(Deserialize)]
pub struct PostSubmission {
    #[serde(default)]
    content: Option<String>,
}

impl PostSubmission {
    fn validate(self) -> Result<String, FieldErrors> {
        let mut errors = FieldErrors::new();
        let content = clean_content(self.content, "content", &mut errors);

        match content {
            Some(content) => Ok(content),
            None => Err(errors),
        }
    }
}

#[axum::debug_handler(state = App)]
pub async fn create_post(
    State(ctx): State<App>,
    AuthUser(user): AuthUser,
    crate::json::Json(submission): crate::json::Json<PostSubmission>,
) -> Result<(StatusCode, Json<FeedPost>), AppError> {
    let content = submission.validate()?;

    let post = ctx.store.create_post(NewPost::new(user.id, content)).await?;

    tracing::info!(post = post.id, author = user.id, "Post created");

    Ok((
        StatusCode::CREATED,
        Json(FeedPost {
            id: post.id,
            author: user.username,
            content: post.content,
            created_at: post.created_at,
            like_count: 0,
        }),
    ))
}

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use serde::Serialize;

use crate::{
    App,
    error::AppError,
    identity::AuthUser,
    models::{
        karma::{KarmaTotal, KarmaTransaction},
        like::{Like, LikeView},
    },
};

use super::{leaderboard::get_leaderboard, like_comment, like_post};

pub fn route() -> Router<App> {
    Router::<App>::new()
        .route("/leaderboard/", get(handle_leaderboard))
        .route("/posts/{id}/like/", post(handle_like_post))
        .route("/comments/{id}/like/", post(handle_like_comment))
}

async fn handle_leaderboard(State(ctx): State<App>) -> Result<Json<Vec<KarmaTotal>>, AppError> {
    let board = get_leaderboard(
        ctx.store.as_ref(),
        chrono::Utc::now().naive_utc(),
        ctx.config.leaderboard.window,
        ctx.config.leaderboard.limit,
    )
    .await?;

    Ok(Json(board))
}

#[derive(Serialize)]
pub struct LikeResponse {
    like: LikeView,
    karma: KarmaTransaction,
}

impl LikeResponse {
    fn new(like: Like, karma: KarmaTransaction) -> Result<Self, AppError> {
        Ok(LikeResponse {
            like: LikeView::try_from(like)?,
            karma,
        })
    }
}

#[axum::debug_handler(state = App)]
async fn handle_like_post(
    State(ctx): State<App>,
    Path(id): Path<i32>,
    AuthUser(user): AuthUser,
) -> Result<(StatusCode, Json<LikeResponse>), AppError> {
    let post = ctx.store.post(id).await?;
    let (like, karma) = like_post(ctx.store.as_ref(), &user, &post).await?;

    Ok((StatusCode::CREATED, Json(LikeResponse::new(like, karma)?)))
}

#[axum::debug_handler(state = App)]
async fn handle_like_comment(
    State(ctx): State<App>,
    Path(id): Path<i32>,
    AuthUser(user): AuthUser,
) -> Result<(StatusCode, Json<LikeResponse>), AppError> {
    let comment = ctx.store.comment(id).await?;
    let (like, karma) = like_comment(ctx.store.as_ref(), &user, &comment).await?;

    Ok((StatusCode::CREATED, Json(LikeResponse::new(like, karma)?)))
}

use axum::{Json, Router, extract::State, routing::get};

use crate::{App, error::AppError, identity::AuthUser, models::post::FeedPost};

use super::{
    comment::{create::create_comment, get::get_comments},
    create::create_post,
};

pub fn route() -> Router<App> {
    Router::<App>::new()
        .route("/feed/", get(get_feed))
        .route("/posts/", get(get_posts).post(create_post))
        .route(
            "/posts/{id}/comments/",
            get(get_comments).post(create_comment),
        )
}

async fn get_feed(State(ctx): State<App>) -> Result<Json<Vec<FeedPost>>, AppError> {
    Ok(Json(ctx.store.feed().await?))
}

// Same listing as the public feed, for signed-in clients.
async fn get_posts(
    State(ctx): State<App>,
    AuthUser(_): AuthUser,
) -> Result<Json<Vec<FeedPost>>, AppError> {
    Ok(Json(ctx.store.feed().await?))
}

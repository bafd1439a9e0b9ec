use axum::{
    Json,
    extract::{Path, State},
};

use crate::{App, error::AppError};

use super::tree::{CommentNode, build_comment_tree};

pub async fn get_comments(
    State(ctx): State<App>,
    Path(post_id): Path<i32>,
) -> Result<Json<Vec<CommentNode>>, AppError> {
    // 404 for unknown posts instead of an empty thread
    let post = ctx.store.post(post_id).await?;

    let comments = ctx.store.post_comments(post.id).await?;

    Ok(Json(build_comment_tree(comments)))
}

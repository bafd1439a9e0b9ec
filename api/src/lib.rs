use std::sync::Arc;

use axum::{
    Json, Router,
    http::{HeaderValue, Method, header},
    routing::get,
};
use serde_json::{Value, json};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

pub mod config;
pub mod error;
pub mod identity;
pub mod json;
pub mod karma;
pub mod models;
pub mod posts;
pub mod schema;
pub mod store;

use config::{Env, ServerConfig};
use store::Store;

#[derive(Clone)]
pub struct App {
    pub store: Arc<dyn Store>,
    pub config: Arc<ServerConfig>,
}

impl App {
    pub fn new(store: Arc<dyn Store>, config: ServerConfig) -> Self {
        App {
            store,
            config: Arc::new(config),
        }
    }
}

/// The full HTTP surface, with request tracing and CORS applied.
pub fn router(app: App) -> Router {
    let cors = cors_layer(&app.config);

    Router::new()
        .route("/", get(home))
        .nest(
            "/api",
            posts::routes::route().merge(karma::routes::route()),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app)
}

fn cors_layer(config: &ServerConfig) -> CorsLayer {
    if config.cors_allowed_origins.is_empty() {
        return match config.env {
            Env::Dev => CorsLayer::permissive(),
            Env::Staging | Env::Production => CorsLayer::new(),
        };
    }

    let origins: Vec<HeaderValue> = config
        .cors_allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(origin) => Some(origin),
            Err(error) => {
                tracing::warn!(%error, origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}

async fn home() -> Json<Value> {
    Json(json!({
        "message": "Community feed API is running",
        "endpoints": {
            "feed": "/api/feed/",
            "posts": "/api/posts/",
            "leaderboard": "/api/leaderboard/",
            "comments": "/api/posts/{id}/comments/",
            "like_post": "/api/posts/{id}/like/",
            "like_comment": "/api/comments/{id}/like/",
        }
    }))
}

use axum::http::{HeaderMap, StatusCode, header::AUTHORIZATION, request::Parts};

use crate::{
    App,
    error::{ApiRequestError, AppError},
    models::user::User,
};

pub const COOKIE_NAME: &str = "auth_token";

#[derive(thiserror::Error, Debug)]
pub enum AuthenticationError {
    #[error(
        "Authentication credentials were not provided. Send the `{COOKIE_NAME}` cookie \
         or an `Authorization: Bearer` header."
    )]
    NoCredentials,

    #[error(
        "Unauthorized, please check if you're logged in. This could be due to an \
         expired session or a token that has become invalid."
    )]
    Unauthorized,
}

impl ApiRequestError for AuthenticationError {
    fn status_code(&self) -> StatusCode {
        match self {
            AuthenticationError::NoCredentials => StatusCode::UNAUTHORIZED,
            AuthenticationError::Unauthorized => StatusCode::UNAUTHORIZED,
        }
    }
}

/// Candidate session tokens, the auth cookie first and then a bearer header
/// for non-browser clients.
fn session_tokens(headers: &HeaderMap) -> Vec<String> {
    let jar = axum_extra::extract::cookie::CookieJar::from_headers(headers);
    let cookie = jar.get(COOKIE_NAME).map(|c| c.value().to_owned());

    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|t| t.trim().to_owned())
        .filter(|t| !t.is_empty());

    let mut tokens: Vec<String> = cookie.into_iter().chain(bearer).collect();
    tokens.dedup();
    tokens
}

pub struct MaybeAuthUser(pub Result<User, AuthenticationError>);

impl axum::extract::FromRequestParts<App> for MaybeAuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &App) -> Result<Self, Self::Rejection> {
        let tokens = session_tokens(&parts.headers);
        if tokens.is_empty() {
            return Ok(MaybeAuthUser(Err(AuthenticationError::NoCredentials)));
        }

        // a stale cookie must not shadow a valid bearer token
        let now = chrono::Utc::now().naive_utc();
        for token in &tokens {
            if let Some(user) = state.store.user_by_session_token(token, now).await? {
                return Ok(MaybeAuthUser(Ok(user)));
            }
        }

        tracing::debug!("Rejected unknown or expired session token");
        Ok(MaybeAuthUser(Err(AuthenticationError::Unauthorized)))
    }
}

pub struct AuthUser(pub User);

impl axum::extract::FromRequestParts<App> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &App) -> Result<Self, Self::Rejection> {
        let MaybeAuthUser(auth_user) = MaybeAuthUser::from_request_parts(parts, state).await?;

        Ok(AuthUser(auth_user?))
    }
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn cookie_token_comes_before_bearer_token() {
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::COOKIE,
            HeaderValue::from_static("theme=dark; auth_token=from-cookie"),
        );
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer from-header"));

        assert_eq!(session_tokens(&headers), vec!["from-cookie", "from-header"]);
    }

    #[test]
    fn same_token_in_both_places_is_tried_once() {
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::COOKIE,
            HeaderValue::from_static("auth_token=abc123"),
        );
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc123"));

        assert_eq!(session_tokens(&headers), vec!["abc123"]);
    }

    #[test]
    fn token_is_read_from_bearer_header() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc123"));
        assert_eq!(session_tokens(&headers), vec!["abc123"]);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc123"));
        assert!(session_tokens(&headers).is_empty());

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer   "));
        assert!(session_tokens(&headers).is_empty());
    }
}

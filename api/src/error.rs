use std::collections::{BTreeMap, HashMap};

use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use serde_json::Value;

use crate::store::StoreError;

/// Errors that know which HTTP status they should be reported with.
pub trait ApiRequestError: std::error::Error {
    fn status_code(&self) -> StatusCode;
}

#[derive(Debug)]
pub enum ServerError {
    Store(StoreError),
}

impl Serialize for ServerError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::ser::Serializer,
    {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(1))?;
        match self {
            ServerError::Store(e) => map.serialize_entry("message", &e.to_string())?,
        }
        map.end()
    }
}

/// Per-field validation messages, rendered as `{"field": ["message", ..]}`.
#[derive(Serialize, Debug, Default, Clone, PartialEq)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<&'static str, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &'static str, msg: impl Into<String>) {
        self.0.entry(field).or_default().push(msg.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }
}

pub enum AppError {
    ServerError {
        error: ServerError,

        #[cfg(debug_assertions)]
        backtrace: Option<backtrace::Backtrace>,
    },
    Request {
        status: StatusCode,
        msg: String,
    },
    Validation(FieldErrors),
    Unhandled(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    code: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    msg: Option<String>,

    #[cfg(debug_assertions)]
    #[serde(skip_serializing_if = "Option::is_none")]
    debug_info: Option<HashMap<&'static str, Value>>,
}

fn error_code(status: StatusCode) -> &'static str {
    match status {
        StatusCode::BAD_REQUEST => "BAD_REQUEST",
        StatusCode::UNAUTHORIZED => "UNAUTHORIZED",
        StatusCode::FORBIDDEN => "FORBIDDEN",
        StatusCode::NOT_FOUND => "NOT_FOUND",
        StatusCode::CONFLICT => "CONFLICT",
        _ => "ERR",
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status_code, error_response) = match self {
            AppError::Validation(errors) => {
                return (StatusCode::BAD_REQUEST, Json(errors)).into_response();
            }
            AppError::ServerError {
                error,
                #[cfg(debug_assertions)]
                backtrace,
            } => {
                tracing::error!(?error, "Request failed with a server error");

                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    #[cfg(debug_assertions)]
                    ErrorResponse {
                        code: "SERVER_ERR".into(),
                        msg: Some("Internal server error".into()),
                        debug_info: Some(HashMap::from([
                            (
                                "backtrace",
                                serde_json::to_value(
                                    backtrace.as_ref().map(filter_backtrace).unwrap_or_default(),
                                )
                                .unwrap_or_default(),
                            ),
                            ("error", serde_json::to_value(&error).unwrap_or_default()),
                        ])),
                    },
                    #[cfg(not(debug_assertions))]
                    ErrorResponse {
                        code: "SERVER_ERR".into(),
                        msg: Some("Internal server error".into()),
                    },
                )
            }
            AppError::Request { status, msg } => (
                status,
                ErrorResponse {
                    code: error_code(status).into(),
                    msg: Some(msg),
                    #[cfg(debug_assertions)]
                    debug_info: None,
                },
            ),
            AppError::Unhandled(e) => {
                tracing::warn!(error = %e, "Unhandled error");

                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse {
                        code: "ERR".into(),
                        msg: Some(e),
                        #[cfg(debug_assertions)]
                        debug_info: None,
                    },
                )
            }
        };

        (status_code, Json(error_response)).into_response()
    }
}

impl AppError {
    fn server(error: ServerError) -> Self {
        AppError::ServerError {
            error,

            #[cfg(debug_assertions)]
            backtrace: Some(backtrace::Backtrace::new()),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(_) => AppError::Request {
                status: StatusCode::NOT_FOUND,
                msg: e.to_string(),
            },
            StoreError::Constraint(_) => AppError::Request {
                status: StatusCode::CONFLICT,
                msg: e.to_string(),
            },
            e => AppError::server(ServerError::Store(e)),
        }
    }
}

impl From<crate::identity::AuthenticationError> for AppError {
    fn from(e: crate::identity::AuthenticationError) -> Self {
        AppError::Request {
            status: e.status_code(),
            msg: e.to_string(),
        }
    }
}

impl From<FieldErrors> for AppError {
    fn from(e: FieldErrors) -> Self {
        AppError::Validation(e)
    }
}

impl From<&'static str> for AppError {
    fn from(e: &'static str) -> Self {
        AppError::Unhandled(e.into())
    }
}

impl<M: Into<String>> From<(M, StatusCode)> for AppError {
    fn from((msg, status): (M, StatusCode)) -> Self {
        AppError::Request {
            status,
            msg: msg.into(),
        }
    }
}

#[derive(Serialize, Debug)]
struct FrameInfo {
    name: String,
    loc: String,
}

fn filter_backtrace(backtrace: &backtrace::Backtrace) -> Vec<FrameInfo> {
    const MODULE_PREFIX: &str = concat!(env!("CARGO_CRATE_NAME"), "::");
    let mut frames_info: Vec<FrameInfo> = Vec::new();

    for frame in backtrace.frames() {
        for symbol in frame.symbols() {
            if let (Some(name), Some(filename), Some(lineno)) = (
                symbol.name().map(|n| n.to_string()),
                symbol.filename().map(|f| f.to_owned()),
                symbol.lineno(),
            ) {
                if name.contains(MODULE_PREFIX) {
                    frames_info.push(FrameInfo {
                        name,
                        loc: format!("{}:{}", filename.display(), lineno),
                    });
                }
            }
        }
    }

    frames_info
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_errors_collect_messages_per_field() {
        let mut errors = FieldErrors::new();
        assert!(errors.is_empty());

        errors.add("content", "This field is required.");
        errors.add("content", "Another problem.");
        errors.add("parent", "Invalid parent.");

        assert_eq!(errors.get("content").map(|m| m.len()), Some(2));
        assert_eq!(
            serde_json::to_value(&errors).unwrap(),
            serde_json::json!({
                "content": ["This field is required.", "Another problem."],
                "parent": ["Invalid parent."],
            })
        );
    }

    #[test]
    fn store_errors_map_to_status_codes() {
        let not_found = AppError::from(StoreError::NotFound("post")).into_response();
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);

        let conflict =
            AppError::from(StoreError::Constraint("user 9 does not exist".into())).into_response();
        assert_eq!(conflict.status(), StatusCode::CONFLICT);

        let pool = AppError::from(StoreError::Pool("timed out".into())).into_response();
        assert_eq!(pool.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn validation_errors_are_bad_requests() {
        let mut errors = FieldErrors::new();
        errors.add("content", "This field may not be blank.");
        let res = AppError::from(errors).into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
}

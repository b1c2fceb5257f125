use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::error;

use crate::pages;

/// Request-scoped failures. Nothing here is fatal to the process.
///
/// `Validation`, `Conflict` and `Auth` are recovered by the handler that
/// raised them (the form is redisplayed with the message and a 200); they
/// only reach `IntoResponse` if a handler lets one through.
#[derive(Debug, Error)]
pub enum PageError {
    #[error("{0}")]
    Validation(String),

    /// Duplicate username on registration.
    #[error("{0}")]
    Conflict(String),

    /// Bad credentials on login.
    #[error("{0}")]
    Auth(String),

    #[error("{0}")]
    NotFound(String),

    #[error("You can only modify your own posts.")]
    Forbidden,

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        match self {
            PageError::NotFound(msg) => {
                (StatusCode::NOT_FOUND, pages::error_page("404 Not Found", &msg)).into_response()
            }
            PageError::Forbidden => (
                StatusCode::FORBIDDEN,
                pages::error_page("403 Forbidden", &self.to_string()),
            )
                .into_response(),
            PageError::Internal(err) => {
                error!("Internal error serving request: {:#}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    pages::error_page("500 Internal Server Error", "Something went wrong."),
                )
                    .into_response()
            }
            PageError::Validation(msg) | PageError::Conflict(msg) | PageError::Auth(msg) => {
                (StatusCode::BAD_REQUEST, pages::error_page("400 Bad Request", &msg))
                    .into_response()
            }
        }
    }
}

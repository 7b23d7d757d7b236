use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use tax_core::RepositoryError;
use thiserror::Error;
use tracing::error;

use crate::views;

pub type WebResult<T> = Result<T, WebError>;

/// Failures surfaced by request handlers.
#[derive(Debug, Error)]
pub enum WebError {
    #[error("not found")]
    NotFound,

    #[error("storage error: {0}")]
    Storage(#[from] RepositoryError),
}

impl WebError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound | Self::Storage(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
            Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status == StatusCode::NOT_FOUND {
            return (status, Html(views::not_found_page())).into_response();
        }

        error!(error = %self, "request failed");
        (status, Html(views::error_page())).into_response()
    }
}

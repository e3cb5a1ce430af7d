//! Handler error type and its single mapping onto HTTP responses.

use crate::http;
use crate::logger;
use crate::store::StoreError;
use crate::view::RenderError;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Method, Response, StatusCode};
use thiserror::Error;

pub type HandlerResult = Result<Response<Full<Bytes>>, HandlerError>;

#[derive(Debug, Error)]
pub enum HandlerError {
    /// The id in the path does not name a stored article.
    #[error("article not found")]
    NotFound,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Render(#[from] RenderError),
}

impl HandlerError {
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::NotFound | Self::Store(StoreError::NotFound(_)) => StatusCode::NOT_FOUND,
            Self::Store(_) | Self::Render(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Not-found is routine and stays quiet; anything else is logged with
    /// the request that hit it and answered 500.
    pub fn into_response(self, method: &Method, path: &str) -> Response<Full<Bytes>> {
        if self.status() == StatusCode::NOT_FOUND {
            logger::log_debug(&format!("[Handler] {method} {path}: {self}"));
            return http::build_404_response();
        }

        logger::log_error(&format!("{method} {path} failed: {self}"));
        http::build_500_response()
    }
}

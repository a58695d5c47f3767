use std::path::PathBuf;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

pub type Result<T> = std::result::Result<T, BrowseError>;

/// Errors surfaced to a caller of the lister or page service.
///
/// Malformed file names and sidecars are not errors: they are logged and
/// replaced by defaults where they are read.
#[derive(Debug, thiserror::Error)]
pub enum BrowseError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("IO error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl BrowseError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        BrowseError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            BrowseError::NotFound(_) => StatusCode::NOT_FOUND,
            BrowseError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            BrowseError::Io { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for BrowseError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            log::error!("{self}");
        } else {
            log::debug!("Rejected request: {self}");
        }
        (status, self.to_string()).into_response()
    }
}

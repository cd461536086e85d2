//! Typed errors and HTTP mapping.

use crate::response;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing reference: {kind} '{name}' in resource '{resource}'")]
    MissingReference {
        resource: String,
        kind: &'static str,
        name: String,
    },
    #[error("invalid identifier '{0}'")]
    InvalidIdentifier(String),
    #[error("duplicate route path: {0}")]
    DuplicatePath(String),
    #[error("config load: {0}")]
    Load(String),
    #[error("validation: {0}")]
    Validation(String),
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database: {0}")]
    Db(#[from] sqlx::Error),
    #[error("{0}")]
    Backend(String),
}

#[derive(Error, Debug)]
pub enum HashError {
    #[error("bcrypt: {0}")]
    Bcrypt(#[from] bcrypt::BcryptError),
    #[error("hash task: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Request failure. The display text is the client-facing envelope message.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    /// Failure with an explicit status and a short machine-side cause for `serverMessage`.
    #[error("{message}")]
    Rejected {
        status: StatusCode,
        message: String,
        cause: String,
    },
    #[error("{message}")]
    Store {
        message: String,
        #[source]
        source: StoreError,
    },
    #[error("{message}")]
    Internal { message: String, cause: String },
}

impl AppError {
    pub fn store(message: impl Into<String>, source: StoreError) -> Self {
        AppError::Store {
            message: message.into(),
            source,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Rejected { status, .. } => *status,
            AppError::Store { .. } | AppError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Detail reported as `serverMessage`.
    pub fn cause(&self) -> Option<String> {
        match self {
            AppError::Validation(_) | AppError::NotFound(_) => None,
            AppError::Rejected { cause, .. } | AppError::Internal { cause, .. } => Some(cause.clone()),
            AppError::Store { source, .. } => Some(source.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let cause = self.cause();
        response::error(self.to_string(), cause, status).into_response()
    }
}

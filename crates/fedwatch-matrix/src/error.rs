//! Error types for the Matrix client-server API client.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MatrixError {
    /// Transport failure talking to the homeserver.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The homeserver answered with a non-2xx status.
    #[error("Matrix homeserver returned {status} ({errcode}): {message}")]
    Homeserver { status: u16, errcode: String, message: String },

    /// A JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Login succeeded at HTTP level but no usable session came back.
    #[error("Login rejected: {0}")]
    Login(String),
}

pub type Result<T> = std::result::Result<T, MatrixError>;

// src/error.rs
use thiserror::Error;
use warp::reject::Reject;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{entity} already exists: {key}")]
    Conflict { entity: &'static str, key: String },

    #[error("{0} not found")]
    NotFound(String),

    #[error("database error: {0}")]
    Backend(String),

    #[error("invalid data: {0}")]
    InvalidData(String),
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("invalid subject in token: {0}")]
    Subject(String),

    #[error("user {0} no longer exists")]
    UnknownUser(String),

    #[error("invalid username or password")]
    BadCredentials,

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("{field}: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("the two password fields didn't match")]
    PasswordMismatch,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value `{value}` for {name}: {reason}")]
    Invalid {
        name: String,
        value: String,
        reason: String,
    },
}

/// Rejection raised by handlers and filters, turned into a response by
/// [`crate::api::handle_rejection`].
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("authentication required for {next}")]
    Unauthenticated { next: String },

    #[error("not found")]
    NotFound,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Auth(#[from] AuthError),
}

impl Reject for ApiError {}

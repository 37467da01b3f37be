use askama::Template;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Data tidak ditemukan")]
    NotFound,

    #[error("Silakan login terlebih dahulu")]
    Unauthorized,

    #[error("Halaman ini khusus admin")]
    Forbidden,

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("Password hashing failed")]
    PasswordHash,

    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        AppError::BadRequest(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        AppError::Conflict(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Config(_)
            | AppError::Database(_)
            | AppError::Storage(_)
            | AppError::PasswordHash
            | AppError::Template(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show to a member. Internal failures stay in the logs.
    pub fn public_message(&self) -> String {
        if self.status().is_server_error() {
            return "Terjadi kesalahan pada server, coba lagi nanti".to_string();
        }
        self.to_string()
    }

    fn log(&self) {
        if self.status().is_server_error() {
            error!("request failed: {}", self);
        }
    }
}

#[derive(Template)]
#[template(path = "error.html")]
struct ErrorTemplate {
    status: u16,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.log();
        let status = self.status();
        let template = ErrorTemplate {
            status: status.as_u16(),
            message: self.public_message(),
        };
        match template.render() {
            Ok(body) => (status, Html(body)).into_response(),
            Err(_) => (status, self.public_message()).into_response(),
        }
    }
}

/// JSON flavour of [`AppError`] for the `/api` routes.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        ApiError(err)
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        ApiError(AppError::Database(err))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.0.log();
        let status = self.0.status();
        (
            status,
            Json(serde_json::json!({ "error": self.0.public_message() })),
        )
            .into_response()
    }
}

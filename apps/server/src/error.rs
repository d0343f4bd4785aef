use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use skyvestments_storage_json::StorageError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Storage(#[from] StorageError),
    #[error("{0}")]
    InvalidBody(#[from] JsonRejection),
    #[error("Not Found")]
    NotFound,
    #[error("{0}")]
    Anyhow(#[from] anyhow::Error),
}

/// JSON error payload: `{ "code": 422, "message": "..." }`.
#[derive(Serialize)]
struct ErrorBody {
    code: u16,
    message: String,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Storage(_) | ApiError::Anyhow(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::InvalidBody(rejection) => rejection.status(),
            ApiError::NotFound => StatusCode::NOT_FOUND,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ApiError::InvalidBody(rejection) => rejection.body_text(),
            other => other.to_string(),
        };
        if status.is_server_error() {
            tracing::error!("Request failed: {}", message);
        }
        (
            status,
            Json(ErrorBody {
                code: status.as_u16(),
                message,
            }),
        )
            .into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

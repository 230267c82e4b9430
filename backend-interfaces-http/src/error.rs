use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use backend_application::AppError;
use backend_domain::{EconomyError, ErrorKind};

#[derive(Debug)]
pub enum HttpError {
    Unauthorized,
    BadRequest(String),
    /// A business rule refused the operation.
    Rejected {
        status: StatusCode,
        code: &'static str,
        message: String,
    },
    Internal,
}

pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::InvalidState | ErrorKind::Conflict => StatusCode::CONFLICT,
        ErrorKind::InsufficientResource => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::EmptyInput => StatusCode::BAD_REQUEST,
        ErrorKind::Persistence => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<EconomyError> for HttpError {
    fn from(value: EconomyError) -> Self {
        match value.kind() {
            ErrorKind::Persistence => HttpError::Internal,
            kind => HttpError::Rejected {
                status: status_for(kind),
                code: value.code(),
                message: value.to_string(),
            },
        }
    }
}

impl From<AppError> for HttpError {
    fn from(value: AppError) -> Self {
        match value {
            AppError::Unauthorized => HttpError::Unauthorized,
            AppError::BadRequest(msg) => HttpError::BadRequest(msg),
            AppError::Economy(err) => HttpError::from(err),
            AppError::Internal(_) => HttpError::Internal,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    code: &'static str,
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            HttpError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                "unauthorized".to_string(),
            ),
            HttpError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                "bad_request",
                format!("bad request: {}", msg),
            ),
            HttpError::Rejected {
                status,
                code,
                message,
            } => (status, code, message),
            // Details were logged where the failure was surfaced.
            HttpError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "internal error".to_string(),
            ),
        };
        (
            status,
            Json(ErrorBody {
                error: message,
                code,
            }),
        )
            .into_response()
    }
}

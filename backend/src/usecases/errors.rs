use axum::http::StatusCode;
use shuttle::domain::value_objects::enums::booking_statuses::BookingStatus;
use thiserror::Error;

pub type UseCaseResult<T> = Result<T, BookingError>;

#[derive(Debug, Error)]
pub enum BookingError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("booking is {actual}, expected {expected}")]
    InvalidState {
        expected: BookingStatus,
        actual: BookingStatus,
    },

    #[error("booking hold has expired")]
    Expired,

    #[error("{0}")]
    Validation(String),

    #[error("invalid credentials")]
    Unauthorized,

    #[error("insufficient role")]
    Forbidden,

    #[error("internal server error")]
    Internal(#[from] anyhow::Error),
}

impl BookingError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            BookingError::NotFound(_) => StatusCode::NOT_FOUND,
            BookingError::Conflict(_) | BookingError::InvalidState { .. } => StatusCode::CONFLICT,
            BookingError::Expired => StatusCode::GONE,
            BookingError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            BookingError::Unauthorized => StatusCode::UNAUTHORIZED,
            BookingError::Forbidden => StatusCode::FORBIDDEN,
            BookingError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub mod auth;
pub mod bookings;
pub mod catalog;
pub mod schedules;
pub mod staff_bookings;
pub mod users;

use axum::{
    body::Body,
    http::header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    response::{IntoResponse, Response},
};

/// Serves `body` as a download named `file_name`.
pub(crate) fn attachment(content_type: &str, file_name: &str, body: impl Into<Body>) -> Response {
    (
        [
            (CONTENT_TYPE, content_type.to_string()),
            (
                CONTENT_DISPOSITION,
                format!("attachment; filename=\"{file_name}\""),
            ),
        ],
        body.into(),
    )
        .into_response()
}

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::{IntoResponse, Response},
    routing::post,
};
use serde::Serialize;
use tracing::{error, info};
use uuid::Uuid;

use crate::{background_worker::booking_reaper, usecases::expire_bookings::ExpireBookingsUseCase};

// Run example
//   curl -X POST "http://localhost:$SERVER_PORT_WORKER/internal/v1/reaper/run" \
//     -H "Authorization: Bearer $INTERNAL_REAPER_TOKEN"

#[derive(Clone)]
pub struct ReaperRouteState {
    internal_token: Option<Arc<str>>,
    usecase: Arc<ExpireBookingsUseCase>,
}

pub fn routes(internal_token: Option<String>, usecase: Arc<ExpireBookingsUseCase>) -> Router {
    Router::new()
        .route("/run", post(run_reaper))
        .with_state(ReaperRouteState {
            internal_token: internal_token.map(Arc::from),
            usecase,
        })
}

#[derive(Debug, Serialize)]
pub struct RunReaperResponse {
    pub expired: usize,
    pub released_seats: usize,
    pub expired_booking_ids: Vec<Uuid>,
    pub released_seat_ids: Vec<Uuid>,
}

pub async fn run_reaper(State(state): State<ReaperRouteState>, headers: HeaderMap) -> Response {
    let expected_token = match state.internal_token.as_deref() {
        Some(token) => token,
        None => {
            return (
                StatusCode::SERVICE_UNAVAILABLE,
                "reaper token is not configured",
            )
                .into_response();
        }
    };

    if let Err(status) = authorize_bearer(&headers, expected_token) {
        return (status, "unauthorized").into_response();
    }

    match booking_reaper::drain(&state.usecase).await {
        Ok(report) => {
            info!(
                expired = report.expired_booking_ids.len(),
                "reaper router: manual run finished"
            );
            Json(RunReaperResponse {
                expired: report.expired_booking_ids.len(),
                released_seats: report.released_seat_ids.len(),
                expired_booking_ids: report.expired_booking_ids,
                released_seat_ids: report.released_seat_ids,
            })
            .into_response()
        }
        Err(err) => {
            error!(error = ?err, "reaper router: run failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "reaper run failed").into_response()
        }
    }
}

fn authorize_bearer(headers: &HeaderMap, expected_token: &str) -> Result<(), StatusCode> {
    let token = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(StatusCode::UNAUTHORIZED)?;

    if token == expected_token {
        Ok(())
    } else {
        Err(StatusCode::UNAUTHORIZED)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request};
    use shuttle::domain::{
        repositories::booking_expiry::MockBookingExpiryRepository,
        value_objects::bookings::ReapReport,
    };
    use tower::ServiceExt;

    fn app(token: Option<&str>, repo: MockBookingExpiryRepository) -> Router {
        let usecase = Arc::new(ExpireBookingsUseCase::new(Arc::new(repo), 500));
        routes(token.map(str::to_string), usecase)
    }

    fn run_request(auth: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method("POST").uri("/run");
        if let Some(auth) = auth {
            builder = builder.header(AUTHORIZATION, auth);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn unconfigured_token_disables_the_endpoint() {
        let response = app(None, MockBookingExpiryRepository::new())
            .oneshot(run_request(Some("Bearer anything")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn wrong_or_missing_token_is_unauthorized() {
        for auth in [None, Some("Bearer nope"), Some("secret")] {
            let response = app(Some("secret"), MockBookingExpiryRepository::new())
                .oneshot(run_request(auth))
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "auth: {auth:?}");
        }
    }

    #[tokio::test]
    async fn authorized_run_returns_the_report() {
        let booking_id = Uuid::new_v4();
        let mut repo = MockBookingExpiryRepository::new();
        repo.expect_expire_elapsed_holds().times(1).returning(move |_, _| {
            Box::pin(async move {
                Ok(ReapReport {
                    expired_booking_ids: vec![booking_id],
                    released_seat_ids: vec![Uuid::new_v4(), Uuid::new_v4()],
                })
            })
        });

        let response = app(Some("secret"), repo)
            .oneshot(run_request(Some("Bearer secret")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["expired"], 1);
        assert_eq!(json["released_seats"], 2);
        assert_eq!(json["expired_booking_ids"][0], booking_id.to_string());
    }

    #[tokio::test]
    async fn failed_run_is_a_server_error() {
        let mut repo = MockBookingExpiryRepository::new();
        repo.expect_expire_elapsed_holds()
            .returning(|_, _| Box::pin(async { Err(anyhow::anyhow!("connection reset")) }));

        let response = app(Some("secret"), repo)
            .oneshot(run_request(Some("Bearer secret")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}

use crate::{
    axum_http::{default_routers, routers},
    config::config_model::DotEnvyConfig,
    usecases::expire_bookings::ExpireBookingsUseCase,
};
use anyhow::Result;
use axum::{
    Router,
    http::{
        Method,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    routing::get,
};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower_http::{
    cors::CorsLayer, limit::RequestBodyLimitLayer, timeout::TimeoutLayer, trace::TraceLayer,
};
use tracing::{error, info};

pub async fn start(config: Arc<DotEnvyConfig>, usecase: Arc<ExpireBookingsUseCase>) -> Result<()> {
    let app = build_router(&config, usecase)?;

    let addr = SocketAddr::from(([0, 0, 0, 0], config.worker_server.port));
    let listener = TcpListener::bind(addr).await?;
    info!("Worker HTTP server running on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

pub fn build_router(config: &DotEnvyConfig, usecase: Arc<ExpireBookingsUseCase>) -> Result<Router> {
    let allowed_origins = vec![
        "http://localhost".parse()?,
        "http://127.0.0.1".parse()?,
        "http://localhost:3000".parse()?,
        "http://127.0.0.1:3000".parse()?,
    ];

    Ok(Router::new()
        .fallback(default_routers::not_found)
        .nest(
            "/internal/v1/reaper",
            routers::reaper::routes(config.reaper.internal_token.clone(), usecase),
        )
        .route("/health-check", get(default_routers::health_check))
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.worker_server.timeout,
        )))
        .layer(RequestBodyLimitLayer::new(
            (config.worker_server.body_limit * 1024 * 1024).try_into()?,
        ))
        .layer(
            CorsLayer::new()
                .allow_methods([Method::GET, Method::POST])
                .allow_headers([AUTHORIZATION, CONTENT_TYPE])
                .allow_origin(allowed_origins),
        )
        .layer(TraceLayer::new_for_http()))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = ?err, "Failed to install CTRL+C signal handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                error!(error = ?err, "Failed to install SIGTERM signal handler");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received ctrl+C signal"),
        _ = terminate => info!("Received terminate signal"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::config_model::{Database, Reaper, WorkerServer};
    use axum::{body::Body, http::Request, http::StatusCode};
    use shuttle::domain::repositories::booking_expiry::MockBookingExpiryRepository;
    use tower::ServiceExt;

    fn config() -> DotEnvyConfig {
        DotEnvyConfig {
            worker_server: WorkerServer {
                port: 0,
                timeout: 30,
                body_limit: 1,
            },
            database: Database {
                url: "postgres://unused".to_string(),
            },
            reaper: Reaper {
                interval_secs: 60,
                batch_limit: 500,
                internal_token: Some("secret".to_string()),
            },
        }
    }

    fn router() -> Router {
        let usecase = Arc::new(ExpireBookingsUseCase::new(
            Arc::new(MockBookingExpiryRepository::new()),
            500,
        ));
        build_router(&config(), usecase).unwrap()
    }

    #[tokio::test]
    async fn health_check_answers_ok() {
        let response = router()
            .oneshot(Request::get("/health-check").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"OK");
    }

    #[tokio::test]
    async fn reaper_endpoint_is_mounted_under_internal_prefix() {
        let response = router()
            .oneshot(
                Request::post("/internal/v1/reaper/run")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn unknown_paths_fall_through_to_not_found() {
        let response = router()
            .oneshot(Request::get("/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}

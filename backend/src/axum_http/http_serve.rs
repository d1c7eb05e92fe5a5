use std::{net::SocketAddr, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use axum::{
    Extension, Router,
    http::{
        Method,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    routing::get,
};
use chrono::FixedOffset;
use shuttle::{
    domain::repositories::storage::ObjectStorage,
    infra::{
        db::{
            postgres::postgres_connection::PgPoolSquad,
            repositories::{
                bookings::BookingPostgres, catalog::CatalogPostgres, payments::PaymentPostgres,
                seat_ledger::SeatLedgerPostgres, settlement::SettlementPostgres,
                users::UserPostgres,
            },
        },
        receipts::text_receipt::TextReceiptRenderer,
        storages::{local_disk::LocalDiskStorage, s3::S3ObjectStorage},
    },
};
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{error, info};

use crate::{
    auth::JwtKeys,
    axum_http::{
        default_routers,
        routers::{self, bookings::BookingRouteState, staff_bookings::StaffRouteState},
    },
    config::config_model::{DotEnvyConfig, Storage},
    usecases::{
        bookings::{BookingPolicy, BookingsUseCase},
        catalog::CatalogUseCase,
        payment_proofs::PaymentProofUseCase,
        receipts::ReceiptUseCase,
        iam::IamUseCase,
        seats::SeatLedgerUseCase,
        settlement::SettlementUseCase,
    },
};

pub async fn start(config: Arc<DotEnvyConfig>, db_pool: Arc<PgPoolSquad>) -> Result<()> {
    let app = build_router(&config, db_pool).await?;

    let addr = SocketAddr::from(([0, 0, 0, 0], config.backend_server.port));
    let listener = TcpListener::bind(addr).await?;

    info!("Server is running on port {}", config.backend_server.port);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

pub async fn build_router(config: &DotEnvyConfig, db_pool: Arc<PgPoolSquad>) -> Result<Router> {
    let jwt_keys = Arc::new(JwtKeys::new(
        &config.auth.jwt_secret,
        config.auth.ttl_minutes,
    ));
    let storage = build_storage(&config.storage).await?;

    let user_repository = Arc::new(UserPostgres::new(Arc::clone(&db_pool)));
    let catalog_repository = Arc::new(CatalogPostgres::new(Arc::clone(&db_pool)));
    let seat_ledger_repository = Arc::new(SeatLedgerPostgres::new(Arc::clone(&db_pool)));
    let booking_repository = Arc::new(BookingPostgres::new(Arc::clone(&db_pool)));
    let payment_repository = Arc::new(PaymentPostgres::new(Arc::clone(&db_pool)));
    let settlement_repository = Arc::new(SettlementPostgres::new(Arc::clone(&db_pool)));

    let iam = Arc::new(IamUseCase::new(
        Arc::clone(&user_repository),
        Arc::clone(&jwt_keys),
    ));
    if let Some(seed) = &config.auth.admin_seed {
        if iam.ensure_admin(&seed.email, &seed.password).await? {
            info!("Seed admin account has been created");
        }
    }

    let search_offset = FixedOffset::east_opt(config.catalog.utc_offset_hours * 3600)
        .context("CATALOG_UTC_OFFSET_HOURS is out of range")?;
    let catalog = Arc::new(CatalogUseCase::new(
        Arc::clone(&catalog_repository),
        Arc::clone(&seat_ledger_repository),
        search_offset,
    ));
    let seats = Arc::new(SeatLedgerUseCase::new(
        Arc::clone(&catalog_repository),
        Arc::clone(&seat_ledger_repository),
    ));

    let bookings = Arc::new(BookingsUseCase::new(
        Arc::clone(&booking_repository),
        Arc::clone(&catalog_repository),
        Arc::clone(&user_repository),
        BookingPolicy {
            hold: chrono::Duration::minutes(config.booking.hold_minutes),
            max_passengers: config.booking.max_passengers,
        },
    ));
    let payments = Arc::new(PaymentProofUseCase::new(
        Arc::clone(&booking_repository),
        Arc::clone(&payment_repository),
        storage,
    ));
    let receipts = Arc::new(ReceiptUseCase::new(
        Arc::clone(&booking_repository),
        Arc::new(TextReceiptRenderer::new()),
    ));
    let settlement = Arc::new(SettlementUseCase::new(settlement_repository));

    let app = Router::new()
        .fallback(default_routers::not_found)
        .nest(
            "/api/v1/auth",
            routers::auth::routes(Arc::clone(&iam)),
        )
        .nest("/api/v1/admin/users", routers::users::routes(iam))
        .nest(
            "/api/v1/routes",
            routers::catalog::public_routes(Arc::clone(&catalog)),
        )
        .nest(
            "/api/v1/admin",
            routers::catalog::admin_routes(Arc::clone(&catalog)),
        )
        .nest(
            "/api/v1/schedules",
            routers::schedules::routes(Arc::clone(&catalog), seats),
        )
        .nest(
            "/api/v1/bookings",
            routers::bookings::routes(BookingRouteState {
                bookings: Arc::clone(&bookings),
                payments: Arc::clone(&payments),
                receipts,
            }),
        )
        .nest(
            "/api/v1/staff/bookings",
            routers::staff_bookings::routes(StaffRouteState {
                bookings,
                payments,
                settlement,
            }),
        )
        .route("/api/v1/health-check", get(default_routers::health_check))
        .layer(Extension(jwt_keys))
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.backend_server.timeout,
        )))
        .layer(RequestBodyLimitLayer::new(
            (config.backend_server.body_limit * 1024 * 1024).try_into()?,
        ))
        .layer(
            CorsLayer::new()
                .allow_methods([Method::GET, Method::POST, Method::PUT])
                .allow_headers([AUTHORIZATION, CONTENT_TYPE])
                .allow_origin(Any),
        )
        .layer(TraceLayer::new_for_http());

    Ok(app)
}

async fn build_storage(storage: &Storage) -> Result<Arc<dyn ObjectStorage + Send + Sync>> {
    match storage {
        Storage::Local { root } => {
            info!(%root, "storage: using local disk");
            Ok(Arc::new(LocalDiskStorage::new(root.clone())))
        }
        Storage::S3(s3) => {
            info!(bucket = %s3.bucket, endpoint = %s3.endpoint, "storage: using s3");
            Ok(Arc::new(S3ObjectStorage::new(s3.clone()).await?))
        }
    }
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

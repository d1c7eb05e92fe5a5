use anyhow::Result;
use shuttle::domain::repositories::booking_expiry::BookingExpiryRepository;
use shuttle::infra::db::{
    postgres::postgres_connection, repositories::booking_expiry::BookingExpiryPostgres,
};
use std::{sync::Arc, time::Duration};
use tracing::{error, info};
use worker::{
    axum_http, background_worker::booking_reaper, config,
    usecases::expire_bookings::ExpireBookingsUseCase,
};

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        error!("Worker exited with error: {:#}", error);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    dotenvy::dotenv().ok();
    shuttle::observability::init_observability("worker")?;

    let dotenvy_env = Arc::new(config::config_loader::load()?);
    info!("ENV has been loaded");

    let postgres_pool = postgres_connection::establish_connection(&dotenvy_env.database.url)?;
    info!("Postgres connection has been established");

    let expiry_repository: Arc<dyn BookingExpiryRepository + Send + Sync> =
        Arc::new(BookingExpiryPostgres::new(Arc::new(postgres_pool)));

    let expire_bookings_usecase = Arc::new(ExpireBookingsUseCase::new(
        expiry_repository,
        dotenvy_env.reaper.batch_limit,
    ));

    let reaper_loop = tokio::spawn(booking_reaper::run_booking_reaper_loop(
        Arc::clone(&expire_bookings_usecase),
        Duration::from_secs(dotenvy_env.reaper.interval_secs),
    ));

    if dotenvy_env.reaper.internal_token.is_none() {
        info!("INTERNAL_REAPER_TOKEN is not set; manual reaper endpoint is disabled");
    }

    let server_config = Arc::clone(&dotenvy_env);
    let internal_server = tokio::spawn(async move {
        axum_http::http_serve::start(server_config, expire_bookings_usecase).await
    });

    tokio::select! {
        result = reaper_loop => result??,
        result = internal_server => result??,
    };
    Ok(())
}

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::Utc;
use shuttle::{
    domain::value_objects::schedules::{CreateRouteModel, CreateScheduleModel},
    infra::db::repositories::{catalog::CatalogPostgres, seat_ledger::SeatLedgerPostgres},
};

use crate::{
    auth::AuthUser,
    usecases::{catalog::CatalogUseCase, errors::UseCaseResult},
};

pub type Catalog = CatalogUseCase<CatalogPostgres, SeatLedgerPostgres>;

/// `GET /api/v1/routes`.
pub fn public_routes(usecase: Arc<Catalog>) -> Router {
    Router::new()
        .route("/", get(list_routes))
        .with_state(usecase)
}

/// Catalog writes under `/api/v1/admin`; admin role only.
pub fn admin_routes(usecase: Arc<Catalog>) -> Router {
    Router::new()
        .route("/routes", post(create_route))
        .route("/schedules", post(create_schedule))
        .with_state(usecase)
}

pub async fn list_routes(State(usecase): State<Arc<Catalog>>) -> UseCaseResult<impl IntoResponse> {
    Ok(Json(usecase.list_routes().await?))
}

pub async fn create_route(
    State(usecase): State<Arc<Catalog>>,
    auth: AuthUser,
    Json(model): Json<CreateRouteModel>,
) -> UseCaseResult<impl IntoResponse> {
    auth.require_admin()?;
    let route = usecase.create_route(model).await?;
    Ok((StatusCode::CREATED, Json(route)))
}

pub async fn create_schedule(
    State(usecase): State<Arc<Catalog>>,
    auth: AuthUser,
    Json(model): Json<CreateScheduleModel>,
) -> UseCaseResult<impl IntoResponse> {
    auth.require_admin()?;
    let schedule = usecase.create_schedule(model, Utc::now()).await?;
    Ok((StatusCode::CREATED, Json(schedule)))
}

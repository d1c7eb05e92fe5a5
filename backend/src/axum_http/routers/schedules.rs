use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::get,
};
use chrono::Utc;
use shuttle::{
    domain::value_objects::{pagination::PaginationQuery, schedules::ScheduleSearchQuery},
    infra::db::repositories::{catalog::CatalogPostgres, seat_ledger::SeatLedgerPostgres},
};
use uuid::Uuid;

use crate::{
    axum_http::routers::catalog::Catalog,
    usecases::{errors::UseCaseResult, seats::SeatLedgerUseCase},
};

#[derive(Clone)]
pub struct ScheduleRouteState {
    catalog: Arc<Catalog>,
    seats: Arc<SeatLedgerUseCase<CatalogPostgres, SeatLedgerPostgres>>,
}

pub fn routes(
    catalog: Arc<Catalog>,
    seats: Arc<SeatLedgerUseCase<CatalogPostgres, SeatLedgerPostgres>>,
) -> Router {
    Router::new()
        .route("/", get(list_schedules))
        .route("/search", get(search_schedules))
        .route("/:schedule_id", get(get_schedule))
        .route("/:schedule_id/seats", get(available_seats))
        .with_state(ScheduleRouteState { catalog, seats })
}

pub async fn list_schedules(
    State(state): State<ScheduleRouteState>,
    Query(pagination): Query<PaginationQuery>,
) -> UseCaseResult<impl IntoResponse> {
    Ok(Json(state.catalog.list_schedules(pagination).await?))
}

pub async fn search_schedules(
    State(state): State<ScheduleRouteState>,
    Query(query): Query<ScheduleSearchQuery>,
) -> UseCaseResult<impl IntoResponse> {
    Ok(Json(state.catalog.search_schedules(query, Utc::now()).await?))
}

pub async fn get_schedule(
    State(state): State<ScheduleRouteState>,
    Path(schedule_id): Path<Uuid>,
) -> UseCaseResult<impl IntoResponse> {
    Ok(Json(state.catalog.get_schedule(schedule_id).await?))
}

pub async fn available_seats(
    State(state): State<ScheduleRouteState>,
    Path(schedule_id): Path<Uuid>,
) -> UseCaseResult<impl IntoResponse> {
    Ok(Json(state.seats.available_seats(schedule_id).await?))
}

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::{get, put},
};
use chrono::Utc;
use shuttle::{
    domain::value_objects::bookings::{BookingListQuery, UpdateBookingStatusModel},
    infra::db::repositories::settlement::SettlementPostgres,
};
use tracing::info;
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    axum_http::routers::{
        attachment,
        bookings::{Bookings, PaymentProofs},
    },
    usecases::{errors::UseCaseResult, settlement::SettlementUseCase},
};

#[derive(Clone)]
pub struct StaffRouteState {
    pub bookings: Arc<Bookings>,
    pub payments: Arc<PaymentProofs>,
    pub settlement: Arc<SettlementUseCase<SettlementPostgres>>,
}

/// Staff and admin only.
pub fn routes(state: StaffRouteState) -> Router {
    Router::new()
        .route("/", get(list_bookings))
        .route("/:booking_id", get(get_booking))
        .route("/:booking_id/status", put(update_status))
        .route("/:booking_id/payment/proof", get(download_proof))
        .with_state(state)
}

pub async fn list_bookings(
    State(state): State<StaffRouteState>,
    auth: AuthUser,
    Query(query): Query<BookingListQuery>,
) -> UseCaseResult<impl IntoResponse> {
    auth.require_staff()?;
    Ok(Json(state.bookings.list_all_bookings(query).await?))
}

pub async fn get_booking(
    State(state): State<StaffRouteState>,
    auth: AuthUser,
    Path(booking_id): Path<Uuid>,
) -> UseCaseResult<impl IntoResponse> {
    auth.require_staff()?;
    Ok(Json(state.bookings.get_booking(booking_id, None).await?))
}

pub async fn update_status(
    State(state): State<StaffRouteState>,
    auth: AuthUser,
    Path(booking_id): Path<Uuid>,
    Json(model): Json<UpdateBookingStatusModel>,
) -> UseCaseResult<impl IntoResponse> {
    auth.require_staff()?;
    info!(staff_id = %auth.user_id, %booking_id, requested = %model.status, "staff_bookings: status update received");

    let result = state
        .settlement
        .update_status(auth.user_id, booking_id, model, Utc::now())
        .await?;
    Ok(Json(result))
}

pub async fn download_proof(
    State(state): State<StaffRouteState>,
    auth: AuthUser,
    Path(booking_id): Path<Uuid>,
) -> UseCaseResult<impl IntoResponse> {
    auth.require_staff()?;
    let proof = state.payments.download_proof(booking_id).await?;
    Ok(attachment(&proof.content_type, &proof.file_name, proof.bytes))
}

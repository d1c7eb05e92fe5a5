use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use bytes::Bytes;
use chrono::Utc;
use shuttle::{
    domain::{
        repositories::storage::ObjectStorage,
        value_objects::{
            bookings::{BookingListQuery, CreateBookingModel},
            payments::MAX_PROOF_BYTES,
        },
    },
    infra::{
        db::repositories::{
            bookings::BookingPostgres, catalog::CatalogPostgres, payments::PaymentPostgres,
            users::UserPostgres,
        },
        receipts::text_receipt::TextReceiptRenderer,
    },
};
use tracing::info;
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    axum_http::routers::attachment,
    usecases::{
        bookings::BookingsUseCase,
        errors::{BookingError, UseCaseResult},
        payment_proofs::{PaymentProofUseCase, ProofUpload},
        receipts::ReceiptUseCase,
    },
};

pub type Bookings = BookingsUseCase<BookingPostgres, CatalogPostgres, UserPostgres>;
pub type PaymentProofs =
    PaymentProofUseCase<BookingPostgres, PaymentPostgres, dyn ObjectStorage + Send + Sync>;
pub type Receipts = ReceiptUseCase<BookingPostgres, TextReceiptRenderer>;

/// Multipart framing on top of the proof itself.
const PAYMENT_FORM_OVERHEAD: usize = 64 * 1024;

#[derive(Clone)]
pub struct BookingRouteState {
    pub bookings: Arc<Bookings>,
    pub payments: Arc<PaymentProofs>,
    pub receipts: Arc<Receipts>,
}

pub fn routes(state: BookingRouteState) -> Router {
    Router::new()
        .route("/", post(create_booking).get(list_bookings))
        .route("/:booking_id", get(get_booking))
        .route(
            "/:booking_id/payment",
            post(upload_payment_proof)
                .layer(DefaultBodyLimit::max(MAX_PROOF_BYTES + PAYMENT_FORM_OVERHEAD)),
        )
        .route("/:booking_id/receipt", get(download_receipt))
        .with_state(state)
}

pub async fn create_booking(
    State(state): State<BookingRouteState>,
    AuthUser { user_id, .. }: AuthUser,
    Json(model): Json<CreateBookingModel>,
) -> UseCaseResult<impl IntoResponse> {
    info!(%user_id, schedule_id = %model.schedule_id, "bookings: create request received");
    let created = state
        .bookings
        .create_booking(user_id, model, Utc::now())
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn list_bookings(
    State(state): State<BookingRouteState>,
    AuthUser { user_id, .. }: AuthUser,
    Query(query): Query<BookingListQuery>,
) -> UseCaseResult<impl IntoResponse> {
    Ok(Json(state.bookings.list_user_bookings(user_id, query).await?))
}

pub async fn get_booking(
    State(state): State<BookingRouteState>,
    AuthUser { user_id, .. }: AuthUser,
    Path(booking_id): Path<Uuid>,
) -> UseCaseResult<impl IntoResponse> {
    Ok(Json(state.bookings.get_booking(booking_id, Some(user_id)).await?))
}

pub async fn upload_payment_proof(
    State(state): State<BookingRouteState>,
    AuthUser { user_id, .. }: AuthUser,
    Path(booking_id): Path<Uuid>,
    mut multipart: Multipart,
) -> UseCaseResult<impl IntoResponse> {
    let mut payment_method: Option<String> = None;
    let mut proof: Option<(String, Bytes)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| BookingError::Validation(format!("multipart error: {err}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "payment_method" => {
                let text = field
                    .text()
                    .await
                    .map_err(|err| BookingError::Validation(format!("payment_method: {err}")))?;
                payment_method = Some(text);
            }
            "proof_image" => {
                let content_type = field
                    .content_type()
                    .filter(|ct| !ct.is_empty() && *ct != "application/octet-stream")
                    .map(str::to_string)
                    .or_else(|| {
                        field
                            .file_name()
                            .and_then(|file_name| mime_guess::from_path(file_name).first())
                            .map(|mime| mime.essence_str().to_string())
                    })
                    .unwrap_or_default();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|err| BookingError::Validation(format!("proof_image: {err}")))?;
                proof = Some((content_type, bytes));
            }
            _ => {}
        }
    }

    let payment_method = payment_method
        .ok_or_else(|| BookingError::Validation("payment_method is required".to_string()))?;
    let (content_type, bytes) =
        proof.ok_or_else(|| BookingError::Validation("proof_image is required".to_string()))?;

    info!(%user_id, %booking_id, bytes = bytes.len(), "bookings: payment proof received");
    let payment = state
        .payments
        .submit_proof(
            user_id,
            booking_id,
            ProofUpload {
                payment_method,
                content_type,
                bytes,
            },
            Utc::now(),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(payment)))
}

pub async fn download_receipt(
    State(state): State<BookingRouteState>,
    AuthUser { user_id, .. }: AuthUser,
    Path(booking_id): Path<Uuid>,
) -> UseCaseResult<impl IntoResponse> {
    let document = state
        .receipts
        .render_receipt(user_id, booking_id, Utc::now())
        .await?;

    Ok(attachment(
        &document.content_type,
        &document.file_name,
        document.bytes,
    ))
}

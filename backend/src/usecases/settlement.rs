use std::sync::Arc;

use chrono::{DateTime, Utc};
use shuttle::domain::{
    repositories::settlement::SettlementRepository,
    value_objects::{
        bookings::{
            SettlementDecision, SettlementOutcome, SettlementResultModel, UpdateBookingStatusModel,
        },
        enums::booking_statuses::BookingStatus,
    },
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::usecases::errors::{BookingError, UseCaseResult};

pub struct SettlementUseCase<S>
where
    S: SettlementRepository + Send + Sync + 'static,
{
    settlement_repository: Arc<S>,
}

impl<S> SettlementUseCase<S>
where
    S: SettlementRepository + Send + Sync + 'static,
{
    pub fn new(settlement_repository: Arc<S>) -> Self {
        Self {
            settlement_repository,
        }
    }

    pub async fn update_status(
        &self,
        staff_id: Uuid,
        booking_id: Uuid,
        model: UpdateBookingStatusModel,
        now: DateTime<Utc>,
    ) -> UseCaseResult<SettlementResultModel> {
        let decision = SettlementDecision::from_requested(model.status).ok_or_else(|| {
            BookingError::Validation("status must be either success or rejected".to_string())
        })?;

        match self
            .settlement_repository
            .settle(booking_id, decision, now)
            .await?
        {
            SettlementOutcome::Settled {
                booking,
                released_seat_ids,
            } => {
                info!(
                    %booking_id,
                    %staff_id,
                    status = %booking.status,
                    released = released_seat_ids.len(),
                    "settlement: booking settled"
                );
                Ok(SettlementResultModel {
                    booking_id: booking.id,
                    status: booking.status.parse()?,
                    released_seat_ids,
                    updated_at: booking.updated_at,
                })
            }
            SettlementOutcome::BookingNotFound => {
                Err(BookingError::NotFound("booking".to_string()))
            }
            SettlementOutcome::NotEligible { actual } => {
                warn!(%booking_id, %staff_id, %actual, "settlement: booking not awaiting verification");
                Err(BookingError::InvalidState {
                    expected: BookingStatus::WaitingVerification,
                    actual,
                })
            }
        }
    }
}

use std::sync::Arc;

use chrono::{DateTime, Utc};
use shuttle::domain::{
    repositories::{bookings::BookingRepository, receipts::ReceiptRenderer},
    value_objects::{
        enums::booking_statuses::BookingStatus,
        receipts::{BookingReceipt, RenderedDocument},
    },
};
use tracing::info;
use uuid::Uuid;

use crate::usecases::errors::{BookingError, UseCaseResult};

pub struct ReceiptUseCase<B, R>
where
    B: BookingRepository + Send + Sync + 'static,
    R: ReceiptRenderer + Send + Sync + 'static,
{
    booking_repository: Arc<B>,
    renderer: Arc<R>,
}

impl<B, R> ReceiptUseCase<B, R>
where
    B: BookingRepository + Send + Sync + 'static,
    R: ReceiptRenderer + Send + Sync + 'static,
{
    pub fn new(booking_repository: Arc<B>, renderer: Arc<R>) -> Self {
        Self {
            booking_repository,
            renderer,
        }
    }

    /// Only settled (`success`) bookings get a receipt.
    pub async fn render_receipt(
        &self,
        user_id: Uuid,
        booking_id: Uuid,
        now: DateTime<Utc>,
    ) -> UseCaseResult<RenderedDocument> {
        let aggregate = self
            .booking_repository
            .find_booking(booking_id, Some(user_id))
            .await?
            .ok_or_else(|| BookingError::NotFound("booking".to_string()))?;

        let status: BookingStatus = aggregate.booking.status.parse()?;
        if status != BookingStatus::Success {
            return Err(BookingError::InvalidState {
                expected: BookingStatus::Success,
                actual: status,
            });
        }

        let receipt = BookingReceipt::from_aggregate(&aggregate, now)?;
        let document = self.renderer.render(&receipt)?;

        info!(%booking_id, %user_id, bytes = document.bytes.len(), "receipts: receipt rendered");
        Ok(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usecases::fixtures;
    use chrono::Duration;
    use shuttle::domain::repositories::{
        bookings::MockBookingRepository, receipts::MockReceiptRenderer,
    };

    fn bookings_returning(
        aggregate: shuttle::domain::value_objects::bookings::BookingAggregate,
    ) -> MockBookingRepository {
        let mut bookings = MockBookingRepository::new();
        bookings.expect_find_booking().returning(move |_, _| {
            let aggregate = aggregate.clone();
            Box::pin(async move { Ok(Some(aggregate)) })
        });
        bookings
    }

    #[tokio::test]
    async fn renders_receipt_for_settled_booking() {
        let user_id = Uuid::new_v4();
        let mut aggregate = fixtures::aggregate(user_id, BookingStatus::Success, Duration::minutes(-5));
        aggregate.payment = Some(fixtures::payment(
            aggregate.booking.id,
            "success",
            Some(Utc::now()),
        ));
        let booking_id = aggregate.booking.id;

        let mut renderer = MockReceiptRenderer::new();
        renderer
            .expect_render()
            .withf(move |receipt| receipt.booking_id == booking_id && receipt.lines.len() == 1)
            .returning(|receipt| {
                Ok(RenderedDocument {
                    bytes: b"receipt".to_vec(),
                    content_type: "text/plain; charset=utf-8".to_string(),
                    file_name: format!("receipt_{}.txt", receipt.booking_id),
                })
            });

        let document = ReceiptUseCase::new(Arc::new(bookings_returning(aggregate)), Arc::new(renderer))
            .render_receipt(user_id, booking_id, Utc::now())
            .await
            .unwrap();

        assert_eq!(document.file_name, format!("receipt_{booking_id}.txt"));
    }

    #[tokio::test]
    async fn unsettled_booking_has_no_receipt() {
        let user_id = Uuid::new_v4();
        let aggregate = fixtures::aggregate(
            user_id,
            BookingStatus::WaitingVerification,
            Duration::minutes(5),
        );
        let booking_id = aggregate.booking.id;

        let result = ReceiptUseCase::new(
            Arc::new(bookings_returning(aggregate)),
            Arc::new(MockReceiptRenderer::new()),
        )
        .render_receipt(user_id, booking_id, Utc::now())
        .await;

        assert!(matches!(
            result,
            Err(BookingError::InvalidState {
                expected: BookingStatus::Success,
                actual: BookingStatus::WaitingVerification
            })
        ));
    }
}

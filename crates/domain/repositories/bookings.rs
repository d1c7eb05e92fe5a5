use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::value_objects::bookings::{
    BookingAggregate, BookingListFilter, BookingSummaryRow, NewReservation, ReservationOutcome,
};

#[async_trait]
#[automock]
pub trait BookingRepository {
    /// Claims every requested seat and creates the pending booking, or changes nothing.
    async fn reserve_seats(&self, reservation: NewReservation) -> Result<ReservationOutcome>;

    /// `owner_id` restricts the lookup to bookings of that user.
    async fn find_booking(
        &self,
        booking_id: Uuid,
        owner_id: Option<Uuid>,
    ) -> Result<Option<BookingAggregate>>;

    async fn list_bookings(&self, filter: BookingListFilter)
    -> Result<(Vec<BookingSummaryRow>, i64)>;
}

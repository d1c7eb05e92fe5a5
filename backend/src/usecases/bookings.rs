use std::{collections::HashSet, sync::Arc};

use chrono::{DateTime, Duration, Utc};
use shuttle::domain::{
    repositories::{
        bookings::BookingRepository, catalog::CatalogRepository, users::UserRepository,
    },
    value_objects::{
        bookings::{
            BookingCreatedModel, BookingDetailModel, BookingListFilter, BookingListQuery,
            BookingSummaryModel, CreateBookingModel, NewReservation, PassengerSeatModel,
            ReservationOutcome,
        },
        pagination::{Paginated, PaginationQuery},
    },
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::usecases::errors::{BookingError, UseCaseResult};

pub const MAX_PASSENGER_NAME_LEN: usize = 100;

#[derive(Debug, Clone, Copy)]
pub struct BookingPolicy {
    pub hold: Duration,
    pub max_passengers: usize,
}

pub struct BookingsUseCase<B, C, U>
where
    B: BookingRepository + Send + Sync + 'static,
    C: CatalogRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
{
    booking_repository: Arc<B>,
    catalog_repository: Arc<C>,
    user_repository: Arc<U>,
    policy: BookingPolicy,
}

impl<B, C, U> BookingsUseCase<B, C, U>
where
    B: BookingRepository + Send + Sync + 'static,
    C: CatalogRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
{
    pub fn new(
        booking_repository: Arc<B>,
        catalog_repository: Arc<C>,
        user_repository: Arc<U>,
        policy: BookingPolicy,
    ) -> Self {
        Self {
            booking_repository,
            catalog_repository,
            user_repository,
            policy,
        }
    }

    /// Claims every requested seat for a new pending booking or fails without side effects.
    pub async fn create_booking(
        &self,
        user_id: Uuid,
        model: CreateBookingModel,
        now: DateTime<Utc>,
    ) -> UseCaseResult<BookingCreatedModel> {
        let passengers = self.validate_passengers(model.passengers)?;

        if self.user_repository.find_by_id(user_id).await?.is_none() {
            return Err(BookingError::NotFound("user".to_string()));
        }

        let (schedule, _) = self
            .catalog_repository
            .find_schedule(model.schedule_id)
            .await?
            .ok_or_else(|| BookingError::NotFound("schedule".to_string()))?;
        if schedule.departure_time <= now {
            return Err(BookingError::Validation(
                "schedule has already departed".to_string(),
            ));
        }

        let reservation = NewReservation {
            user_id,
            schedule_id: schedule.id,
            price_minor: schedule.price_minor,
            passengers,
            booked_at: now,
            expires_at: now + self.policy.hold,
        };
        if reservation.payment_amount_minor().is_none() {
            return Err(BookingError::Validation(
                "payment amount is out of range".to_string(),
            ));
        }
        let seat_ids = reservation.seat_ids();

        match self.booking_repository.reserve_seats(reservation).await? {
            ReservationOutcome::Reserved(booking) => {
                info!(
                    booking_id = %booking.id,
                    %user_id,
                    schedule_id = %booking.schedule_id,
                    seats = seat_ids.len(),
                    "bookings: seats reserved"
                );
                Ok(BookingCreatedModel {
                    id: booking.id,
                    schedule_id: booking.schedule_id,
                    status: booking.status.parse()?,
                    booking_time: booking.booking_time,
                    expires_at: booking.expires_at,
                    payment_amount_minor: booking.payment_amount_minor,
                    seat_ids,
                })
            }
            ReservationOutcome::SeatsOutsideSchedule(foreign) => {
                warn!(%user_id, schedule_id = %schedule.id, seats = ?foreign, "bookings: seats outside schedule");
                Err(BookingError::Validation(format!(
                    "seats do not belong to this schedule: {}",
                    join_ids(&foreign)
                )))
            }
            ReservationOutcome::SeatsUnavailable(taken) => {
                warn!(%user_id, schedule_id = %schedule.id, seats = ?taken, "bookings: seat conflict");
                Err(BookingError::Conflict(format!(
                    "seats are no longer available: {}",
                    join_ids(&taken)
                )))
            }
        }
    }

    pub async fn list_user_bookings(
        &self,
        user_id: Uuid,
        query: BookingListQuery,
    ) -> UseCaseResult<Paginated<BookingSummaryModel>> {
        self.list(Some(user_id), query).await
    }

    pub async fn list_all_bookings(
        &self,
        query: BookingListQuery,
    ) -> UseCaseResult<Paginated<BookingSummaryModel>> {
        self.list(None, query).await
    }

    /// `owner_id` of `None` is the staff view.
    pub async fn get_booking(
        &self,
        booking_id: Uuid,
        owner_id: Option<Uuid>,
    ) -> UseCaseResult<BookingDetailModel> {
        let aggregate = self
            .booking_repository
            .find_booking(booking_id, owner_id)
            .await?
            .ok_or_else(|| BookingError::NotFound("booking".to_string()))?;

        Ok(BookingDetailModel::try_from_aggregate(aggregate)?)
    }

    async fn list(
        &self,
        user_id: Option<Uuid>,
        query: BookingListQuery,
    ) -> UseCaseResult<Paginated<BookingSummaryModel>> {
        let page = PaginationQuery {
            page: query.page,
            limit: query.limit,
        }
        .normalize();

        let (rows, total) = self
            .booking_repository
            .list_bookings(BookingListFilter {
                user_id,
                status: query.status,
                page,
            })
            .await?;

        let results = rows
            .into_iter()
            .map(BookingSummaryModel::try_from_row)
            .collect::<anyhow::Result<Vec<_>>>()?;

        Ok(Paginated::new(results, total, page))
    }

    fn validate_passengers(
        &self,
        passengers: Vec<PassengerSeatModel>,
    ) -> UseCaseResult<Vec<PassengerSeatModel>> {
        if passengers.is_empty() || passengers.len() > self.policy.max_passengers {
            return Err(BookingError::Validation(format!(
                "a booking needs between 1 and {} passengers",
                self.policy.max_passengers
            )));
        }

        let mut seen = HashSet::with_capacity(passengers.len());
        let mut normalized = Vec::with_capacity(passengers.len());
        for passenger in passengers {
            let name = passenger.passenger_name.trim();
            if name.is_empty() || name.chars().count() > MAX_PASSENGER_NAME_LEN {
                return Err(BookingError::Validation(format!(
                    "passenger_name must be 1 to {MAX_PASSENGER_NAME_LEN} characters"
                )));
            }
            if !seen.insert(passenger.seat_id) {
                return Err(BookingError::Conflict(format!(
                    "seat {} is requested more than once",
                    passenger.seat_id
                )));
            }
            normalized.push(PassengerSeatModel {
                seat_id: passenger.seat_id,
                passenger_name: name.to_string(),
            });
        }

        Ok(normalized)
    }
}

fn join_ids(ids: &[Uuid]) -> String {
    ids.iter()
        .map(Uuid::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

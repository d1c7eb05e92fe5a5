use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    entities::{
        booking_lines::BookingLineEntity, bookings::BookingEntity, payments::PaymentEntity,
        routes::RouteEntity, schedules::ScheduleEntity, seats::SeatEntity,
    },
    value_objects::{
        enums::booking_statuses::{BookingEvent, BookingStatus},
        pagination::PageRequest,
        payments::PaymentModel,
    },
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PassengerSeatModel {
    pub seat_id: Uuid,
    pub passenger_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBookingModel {
    pub schedule_id: Uuid,
    pub passengers: Vec<PassengerSeatModel>,
}

/// Everything the reservation transaction needs, already validated outside of storage.
#[derive(Debug, Clone, PartialEq)]
pub struct NewReservation {
    pub user_id: Uuid,
    pub schedule_id: Uuid,
    pub price_minor: i64,
    pub passengers: Vec<PassengerSeatModel>,
    pub booked_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl NewReservation {
    pub fn seat_ids(&self) -> Vec<Uuid> {
        self.passengers.iter().map(|p| p.seat_id).collect()
    }

    /// `None` when the total does not fit in an `i64`.
    pub fn payment_amount_minor(&self) -> Option<i64> {
        i64::try_from(self.passengers.len())
            .ok()
            .and_then(|count| self.price_minor.checked_mul(count))
    }
}

#[derive(Debug, Clone)]
pub enum ReservationOutcome {
    Reserved(BookingEntity),
    /// Seats that do not exist or belong to another schedule.
    SeatsOutsideSchedule(Vec<Uuid>),
    /// Seats already held by an active booking line or flagged as booked.
    SeatsUnavailable(Vec<Uuid>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettlementDecision {
    Accept,
    Reject,
}

impl SettlementDecision {
    pub fn from_requested(status: BookingStatus) -> Option<Self> {
        match status {
            BookingStatus::Success => Some(SettlementDecision::Accept),
            BookingStatus::Rejected => Some(SettlementDecision::Reject),
            _ => None,
        }
    }

    pub fn event(&self) -> BookingEvent {
        match self {
            SettlementDecision::Accept => BookingEvent::StaffAccepted,
            SettlementDecision::Reject => BookingEvent::StaffRejected,
        }
    }
}

#[derive(Debug, Clone)]
pub enum SettlementOutcome {
    Settled {
        booking: BookingEntity,
        released_seat_ids: Vec<Uuid>,
    },
    BookingNotFound,
    NotEligible {
        actual: BookingStatus,
    },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ReapReport {
    pub expired_booking_ids: Vec<Uuid>,
    pub released_seat_ids: Vec<Uuid>,
}

impl ReapReport {
    pub fn is_empty(&self) -> bool {
        self.expired_booking_ids.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookingListFilter {
    pub user_id: Option<Uuid>,
    pub status: Option<BookingStatus>,
    pub page: PageRequest,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BookingListQuery {
    pub status: Option<BookingStatus>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateBookingStatusModel {
    pub status: BookingStatus,
}

#[derive(Debug, Clone)]
pub struct BookingSummaryRow {
    pub booking: BookingEntity,
    pub schedule: ScheduleEntity,
    pub route: RouteEntity,
    pub passenger_count: i64,
}

/// A booking with its schedule, route, every line it ever had and its payment.
#[derive(Debug, Clone)]
pub struct BookingAggregate {
    pub booking: BookingEntity,
    pub schedule: ScheduleEntity,
    pub route: RouteEntity,
    pub lines: Vec<(BookingLineEntity, SeatEntity)>,
    pub payment: Option<PaymentEntity>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookingCreatedModel {
    pub id: Uuid,
    pub schedule_id: Uuid,
    pub status: BookingStatus,
    pub booking_time: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub payment_amount_minor: i64,
    pub seat_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookingSummaryModel {
    pub id: Uuid,
    pub user_id: Uuid,
    pub status: BookingStatus,
    pub booking_time: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub payment_amount_minor: i64,
    pub origin_city: String,
    pub destination_city: String,
    pub departure_time: DateTime<Utc>,
    pub passenger_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookingLineModel {
    pub id: Uuid,
    pub seat_id: Uuid,
    pub seat_number: String,
    pub passenger_name: String,
    pub price_minor: i64,
    pub retired: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookingScheduleModel {
    pub id: Uuid,
    pub origin_city: String,
    pub destination_city: String,
    pub departure_time: DateTime<Utc>,
    pub arrival_time: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookingDetailModel {
    pub id: Uuid,
    pub user_id: Uuid,
    pub status: BookingStatus,
    pub booking_time: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub payment_amount_minor: i64,
    pub schedule: BookingScheduleModel,
    pub passengers: Vec<BookingLineModel>,
    pub payment: Option<PaymentModel>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SettlementResultModel {
    pub booking_id: Uuid,
    pub status: BookingStatus,
    pub released_seat_ids: Vec<Uuid>,
    pub updated_at: DateTime<Utc>,
}

impl BookingSummaryModel {
    pub fn try_from_row(row: BookingSummaryRow) -> anyhow::Result<Self> {
        Ok(Self {
            id: row.booking.id,
            user_id: row.booking.user_id,
            status: row.booking.status.parse()?,
            booking_time: row.booking.booking_time,
            expires_at: row.booking.expires_at,
            payment_amount_minor: row.booking.payment_amount_minor,
            origin_city: row.route.origin_city,
            destination_city: row.route.destination_city,
            departure_time: row.schedule.departure_time,
            passenger_count: row.passenger_count,
        })
    }
}

impl BookingDetailModel {
    pub fn try_from_aggregate(aggregate: BookingAggregate) -> anyhow::Result<Self> {
        let payment = aggregate.payment.map(PaymentModel::try_from).transpose()?;

        Ok(Self {
            id: aggregate.booking.id,
            user_id: aggregate.booking.user_id,
            status: aggregate.booking.status.parse()?,
            booking_time: aggregate.booking.booking_time,
            expires_at: aggregate.booking.expires_at,
            payment_amount_minor: aggregate.booking.payment_amount_minor,
            schedule: BookingScheduleModel {
                id: aggregate.schedule.id,
                origin_city: aggregate.route.origin_city,
                destination_city: aggregate.route.destination_city,
                departure_time: aggregate.schedule.departure_time,
                arrival_time: aggregate.schedule.arrival_time,
            },
            passengers: aggregate
                .lines
                .into_iter()
                .map(|(line, seat)| BookingLineModel {
                    id: line.id,
                    seat_id: seat.id,
                    seat_number: seat.seat_number,
                    passenger_name: line.passenger_name,
                    price_minor: line.price_minor,
                    retired: line.retired_at.is_some(),
                })
                .collect(),
            payment,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payment_amount_is_price_times_passengers() {
        let now = Utc::now();
        let reservation = NewReservation {
            user_id: Uuid::new_v4(),
            schedule_id: Uuid::new_v4(),
            price_minor: 125_000,
            passengers: (0..3)
                .map(|i| PassengerSeatModel {
                    seat_id: Uuid::new_v4(),
                    passenger_name: format!("P{i}"),
                })
                .collect(),
            booked_at: now,
            expires_at: now,
        };

        assert_eq!(reservation.payment_amount_minor(), Some(375_000));
        assert_eq!(reservation.seat_ids().len(), 3);
    }

    #[test]
    fn payment_amount_overflow_is_none() {
        let now = Utc::now();
        let reservation = NewReservation {
            user_id: Uuid::new_v4(),
            schedule_id: Uuid::new_v4(),
            price_minor: i64::MAX / 2 + 1,
            passengers: (0..2)
                .map(|i| PassengerSeatModel {
                    seat_id: Uuid::new_v4(),
                    passenger_name: format!("P{i}"),
                })
                .collect(),
            booked_at: now,
            expires_at: now,
        };

        assert_eq!(reservation.payment_amount_minor(), None);
    }

    #[test]
    fn only_success_and_rejected_are_settlement_decisions() {
        assert_eq!(
            SettlementDecision::from_requested(BookingStatus::Success),
            Some(SettlementDecision::Accept)
        );
        assert_eq!(
            SettlementDecision::from_requested(BookingStatus::Rejected),
            Some(SettlementDecision::Reject)
        );
        for other in [
            BookingStatus::Pending,
            BookingStatus::WaitingVerification,
            BookingStatus::Expired,
            BookingStatus::Cancelled,
        ] {
            assert_eq!(SettlementDecision::from_requested(other), None);
        }
        assert_eq!(
            SettlementDecision::Reject.event(),
            BookingEvent::StaffRejected
        );
    }
}

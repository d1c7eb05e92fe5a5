use chrono::{DateTime, Duration, Utc};
use shuttle::domain::{
    entities::{
        booking_lines::BookingLineEntity, bookings::BookingEntity, payments::PaymentEntity,
        routes::RouteEntity, schedules::ScheduleEntity, seats::SeatEntity, users::UserEntity,
    },
    value_objects::{bookings::BookingAggregate, enums::booking_statuses::BookingStatus},
};
use uuid::Uuid;

pub fn user(user_id: Uuid) -> UserEntity {
    let now = Utc::now();
    UserEntity {
        id: user_id,
        email: "rider@example.com".to_string(),
        password_hash: "hash".to_string(),
        role: "user".to_string(),
        first_name: "Budi".to_string(),
        last_name: "Santoso".to_string(),
        phone_number: None,
        created_at: now,
        updated_at: now,
    }
}

pub fn route() -> RouteEntity {
    let now = Utc::now();
    RouteEntity {
        id: Uuid::new_v4(),
        origin_city: "Jakarta".to_string(),
        destination_city: "Bandung".to_string(),
        created_at: now,
        updated_at: now,
    }
}

pub fn schedule(route_id: Uuid, departure_time: DateTime<Utc>) -> ScheduleEntity {
    ScheduleEntity {
        id: Uuid::new_v4(),
        route_id,
        departure_time,
        arrival_time: departure_time + Duration::hours(3),
        price_minor: 150_000,
        total_seats: 8,
        created_at: departure_time - Duration::days(7),
        updated_at: departure_time - Duration::days(7),
    }
}

pub fn seat(schedule_id: Uuid, seat_number: &str, is_booked: bool) -> SeatEntity {
    let now = Utc::now();
    SeatEntity {
        id: Uuid::new_v4(),
        schedule_id,
        seat_number: seat_number.to_string(),
        is_booked,
        created_at: now,
        updated_at: now,
    }
}

pub fn booking(
    user_id: Uuid,
    schedule_id: Uuid,
    status: BookingStatus,
    expires_at: DateTime<Utc>,
) -> BookingEntity {
    BookingEntity {
        id: Uuid::new_v4(),
        user_id,
        schedule_id,
        booking_time: expires_at - Duration::minutes(30),
        status: status.to_string(),
        expires_at,
        payment_amount_minor: 150_000,
        created_at: expires_at - Duration::minutes(30),
        updated_at: expires_at - Duration::minutes(30),
    }
}

pub fn payment(booking_id: Uuid, status: &str, payment_date: Option<DateTime<Utc>>) -> PaymentEntity {
    let now = Utc::now();
    PaymentEntity {
        id: Uuid::new_v4(),
        booking_id,
        payment_method: "bank_transfer".to_string(),
        payment_status: status.to_string(),
        payment_date,
        proof_image_locator: format!("payments/payment_{booking_id}_1700000000.png"),
        created_at: now,
        updated_at: now,
    }
}

/// One passenger on seat A1. `expires_at` is relative to now.
pub fn aggregate(user_id: Uuid, status: BookingStatus, expires_in: Duration) -> BookingAggregate {
    let route = route();
    let schedule = schedule(route.id, Utc::now() + Duration::days(1));
    let booking = booking(user_id, schedule.id, status, Utc::now() + expires_in);
    let seat = seat(schedule.id, "A1", status.is_active());
    let line = BookingLineEntity {
        id: Uuid::new_v4(),
        booking_id: booking.id,
        seat_id: seat.id,
        passenger_name: "Budi Santoso".to_string(),
        price_minor: 150_000,
        created_at: booking.booking_time,
        retired_at: (!status.is_active()).then_some(booking.updated_at),
    };

    BookingAggregate {
        booking,
        schedule,
        route,
        lines: vec![(line, seat)],
        payment: None,
    }
}

use chrono::{DateTime, Utc};
use diesel::{PgConnection, QueryResult, RunQueryDsl, prelude::*, result::Error as DieselError, update};
use uuid::Uuid;

use crate::{
    domain::value_objects::enums::booking_statuses::BookingStatus,
    infra::db::postgres::schema::{booking_lines, seats},
};

/// Retires the active lines of the given bookings and frees their seats.
/// Must run inside the transaction that moves the bookings to a releasing status.
pub(crate) fn release_booking_seats(
    tx: &mut PgConnection,
    booking_ids: &[Uuid],
    released_at: DateTime<Utc>,
) -> QueryResult<Vec<Uuid>> {
    let seat_ids = update(booking_lines::table)
        .filter(booking_lines::booking_id.eq_any(booking_ids))
        .filter(booking_lines::retired_at.is_null())
        .set(booking_lines::retired_at.eq(Some(released_at)))
        .returning(booking_lines::seat_id)
        .get_results::<Uuid>(tx)?;

    if !seat_ids.is_empty() {
        update(seats::table)
            .filter(seats::id.eq_any(&seat_ids))
            .set((
                seats::is_booked.eq(false),
                seats::updated_at.eq(released_at),
            ))
            .execute(tx)?;
    }

    Ok(seat_ids)
}

pub(crate) fn parse_status(raw: &str) -> QueryResult<BookingStatus> {
    raw.parse::<BookingStatus>()
        .map_err(|err| DieselError::DeserializationError(err.into()))
}

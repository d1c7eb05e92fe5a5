use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use diesel::{
    Connection, PgConnection, QueryResult, RunQueryDsl,
    dsl::count_star,
    insert_into,
    prelude::*,
    result::{DatabaseErrorKind, Error as DieselError},
    update,
};
use std::sync::Arc;
use tokio::task;
use tracing::warn;
use uuid::Uuid;

use crate::{
    domain::{
        entities::{
            booking_lines::{BookingLineEntity, InsertBookingLineEntity},
            bookings::{BookingEntity, InsertBookingEntity},
            payments::PaymentEntity,
            routes::RouteEntity,
            schedules::ScheduleEntity,
            seats::SeatEntity,
        },
        repositories::bookings::BookingRepository,
        value_objects::{
            bookings::{
                BookingAggregate, BookingListFilter, BookingSummaryRow, NewReservation,
                ReservationOutcome,
            },
            enums::booking_statuses::BookingStatus,
        },
    },
    infra::db::postgres::{
        postgres_connection::PgPoolSquad,
        schema::{booking_lines, bookings, payments, routes, schedules, seats},
    },
};

pub struct BookingPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl BookingPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl BookingRepository for BookingPostgres {
    async fn reserve_seats(&self, reservation: NewReservation) -> Result<ReservationOutcome> {
        let db_pool = Arc::clone(&self.db_pool);

        Ok(task::spawn_blocking(move || -> Result<ReservationOutcome> {
            let mut conn = db_pool.get()?;

            let result = conn.transaction::<ReservationOutcome, DieselError, _>(|tx| {
                claim_seats(tx, &reservation)
            });

            match result {
                Ok(outcome) => Ok(outcome),
                // A concurrent reservation committed an active line for one of our seats first.
                Err(DieselError::DatabaseError(
                    kind @ (DatabaseErrorKind::UniqueViolation
                    | DatabaseErrorKind::SerializationFailure),
                    info,
                )) => {
                    warn!(
                        schedule_id = %reservation.schedule_id,
                        user_id = %reservation.user_id,
                        kind = ?kind,
                        db_error = %info.message(),
                        "bookings: reservation lost a race on its seats"
                    );
                    Ok(ReservationOutcome::SeatsUnavailable(reservation.seat_ids()))
                }
                Err(err) => Err(err.into()),
            }
        })
        .await??)
    }

    async fn find_booking(
        &self,
        booking_id: Uuid,
        owner_id: Option<Uuid>,
    ) -> Result<Option<BookingAggregate>> {
        let db_pool = Arc::clone(&self.db_pool);

        Ok(task::spawn_blocking(move || -> Result<Option<BookingAggregate>> {
            let mut conn = db_pool.get()?;

            let mut query = bookings::table
                .inner_join(schedules::table.inner_join(routes::table))
                .filter(bookings::id.eq(booking_id))
                .select((
                    BookingEntity::as_select(),
                    ScheduleEntity::as_select(),
                    RouteEntity::as_select(),
                ))
                .into_boxed();

            if let Some(owner_id) = owner_id {
                query = query.filter(bookings::user_id.eq(owner_id));
            }

            let Some((booking, schedule, route)) = query
                .first::<(BookingEntity, ScheduleEntity, RouteEntity)>(&mut conn)
                .optional()?
            else {
                return Ok(None);
            };

            let lines = booking_lines::table
                .inner_join(seats::table)
                .filter(booking_lines::booking_id.eq(booking.id))
                .order((seats::seat_number.asc(), booking_lines::created_at.asc()))
                .select((BookingLineEntity::as_select(), SeatEntity::as_select()))
                .load::<(BookingLineEntity, SeatEntity)>(&mut conn)?;

            let payment = payments::table
                .filter(payments::booking_id.eq(booking.id))
                .select(PaymentEntity::as_select())
                .first::<PaymentEntity>(&mut conn)
                .optional()?;

            Ok(Some(BookingAggregate {
                booking,
                schedule,
                route,
                lines,
                payment,
            }))
        })
        .await??)
    }

    async fn list_bookings(
        &self,
        filter: BookingListFilter,
    ) -> Result<(Vec<BookingSummaryRow>, i64)> {
        let db_pool = Arc::clone(&self.db_pool);

        Ok(task::spawn_blocking(move || -> Result<(Vec<BookingSummaryRow>, i64)> {
            let mut conn = db_pool.get()?;

            let mut count_query = bookings::table.select(count_star()).into_boxed();
            let mut query = bookings::table
                .inner_join(schedules::table.inner_join(routes::table))
                .select((
                    BookingEntity::as_select(),
                    ScheduleEntity::as_select(),
                    RouteEntity::as_select(),
                ))
                .into_boxed();

            if let Some(user_id) = filter.user_id {
                count_query = count_query.filter(bookings::user_id.eq(user_id));
                query = query.filter(bookings::user_id.eq(user_id));
            }
            if let Some(status) = filter.status {
                count_query = count_query.filter(bookings::status.eq(status.to_string()));
                query = query.filter(bookings::status.eq(status.to_string()));
            }

            let total = count_query.first::<i64>(&mut conn)?;
            let rows = query
                .order((bookings::created_at.desc(), bookings::id.asc()))
                .limit(filter.page.limit)
                .offset(filter.page.offset())
                .load::<(BookingEntity, ScheduleEntity, RouteEntity)>(&mut conn)?;

            let booking_ids: Vec<Uuid> = rows.iter().map(|(booking, _, _)| booking.id).collect();
            let passenger_counts: HashMap<Uuid, i64> = booking_lines::table
                .filter(booking_lines::booking_id.eq_any(&booking_ids))
                .group_by(booking_lines::booking_id)
                .select((booking_lines::booking_id, count_star()))
                .load::<(Uuid, i64)>(&mut conn)?
                .into_iter()
                .collect();

            let summaries = rows
                .into_iter()
                .map(|(booking, schedule, route)| BookingSummaryRow {
                    passenger_count: passenger_counts.get(&booking.id).copied().unwrap_or(0),
                    booking,
                    schedule,
                    route,
                })
                .collect();

            Ok((summaries, total))
        })
        .await??)
    }
}

fn claim_seats(tx: &mut PgConnection, reservation: &NewReservation) -> QueryResult<ReservationOutcome> {
    let mut seat_ids = reservation.seat_ids();
    seat_ids.sort();

    // Ascending id order keeps overlapping reservations from deadlocking on each other.
    let locked = seats::table
        .filter(seats::id.eq_any(&seat_ids))
        .order(seats::id.asc())
        .select(SeatEntity::as_select())
        .for_update()
        .load::<SeatEntity>(tx)?;

    let outside: Vec<Uuid> = seat_ids
        .iter()
        .copied()
        .filter(|seat_id| {
            !locked
                .iter()
                .any(|seat| seat.id == *seat_id && seat.schedule_id == reservation.schedule_id)
        })
        .collect();
    if !outside.is_empty() {
        return Ok(ReservationOutcome::SeatsOutsideSchedule(outside));
    }

    let held_by_active_lines = booking_lines::table
        .inner_join(bookings::table)
        .filter(booking_lines::seat_id.eq_any(&seat_ids))
        .filter(booking_lines::retired_at.is_null())
        .filter(bookings::status.eq_any(BookingStatus::active_statuses()))
        .select(booking_lines::seat_id)
        .load::<Uuid>(tx)?;

    let unavailable: Vec<Uuid> = locked
        .iter()
        .filter(|seat| seat.is_booked || held_by_active_lines.contains(&seat.id))
        .map(|seat| seat.id)
        .collect();
    if !unavailable.is_empty() {
        return Ok(ReservationOutcome::SeatsUnavailable(unavailable));
    }

    let Some(payment_amount_minor) = reservation.payment_amount_minor() else {
        return Err(DieselError::QueryBuilderError(
            "payment amount is out of range".into(),
        ));
    };

    let booking = insert_into(bookings::table)
        .values(&InsertBookingEntity {
            user_id: reservation.user_id,
            schedule_id: reservation.schedule_id,
            booking_time: reservation.booked_at,
            status: BookingStatus::Pending.to_string(),
            expires_at: reservation.expires_at,
            payment_amount_minor,
            created_at: reservation.booked_at,
            updated_at: reservation.booked_at,
        })
        .returning(BookingEntity::as_returning())
        .get_result::<BookingEntity>(tx)?;

    let lines: Vec<InsertBookingLineEntity> = reservation
        .passengers
        .iter()
        .map(|passenger| InsertBookingLineEntity {
            booking_id: booking.id,
            seat_id: passenger.seat_id,
            passenger_name: passenger.passenger_name.clone(),
            price_minor: reservation.price_minor,
            created_at: reservation.booked_at,
        })
        .collect();
    insert_into(booking_lines::table).values(&lines).execute(tx)?;

    update(seats::table)
        .filter(seats::id.eq_any(&seat_ids))
        .set((
            seats::is_booked.eq(true),
            seats::updated_at.eq(reservation.booked_at),
        ))
        .execute(tx)?;

    Ok(ReservationOutcome::Reserved(booking))
}

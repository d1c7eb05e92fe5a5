use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::{Connection, RunQueryDsl, prelude::*, result::Error as DieselError, update};
use std::sync::Arc;
use tokio::task;
use uuid::Uuid;

use super::booking_ledger::release_booking_seats;
use crate::{
    domain::{
        repositories::booking_expiry::BookingExpiryRepository,
        value_objects::{
            bookings::ReapReport,
            enums::booking_statuses::{BookingEvent, BookingStatus},
        },
    },
    infra::db::postgres::{postgres_connection::PgPoolSquad, schema::bookings},
};

pub struct BookingExpiryPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl BookingExpiryPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl BookingExpiryRepository for BookingExpiryPostgres {
    async fn expire_elapsed_holds(
        &self,
        now: DateTime<Utc>,
        batch_limit: i64,
    ) -> Result<ReapReport> {
        let db_pool = Arc::clone(&self.db_pool);
        let pending = BookingStatus::Pending;
        let expired = pending.transition(BookingEvent::HoldElapsed)?;

        Ok(task::spawn_blocking(move || -> Result<ReapReport> {
            let mut conn = db_pool.get()?;

            let report = conn.transaction::<ReapReport, DieselError, _>(|tx| {
                // SKIP LOCKED: rows held by a proof upload or another reaper are left for later.
                let booking_ids = bookings::table
                    .filter(bookings::status.eq(pending.to_string()))
                    .filter(bookings::expires_at.le(now))
                    .order(bookings::expires_at.asc())
                    .limit(batch_limit)
                    .select(bookings::id)
                    .for_update()
                    .skip_locked()
                    .load::<Uuid>(tx)?;

                if booking_ids.is_empty() {
                    return Ok(ReapReport::default());
                }

                update(bookings::table)
                    .filter(bookings::id.eq_any(&booking_ids))
                    .set((
                        bookings::status.eq(expired.to_string()),
                        bookings::updated_at.eq(now),
                    ))
                    .execute(tx)?;

                let released_seat_ids = release_booking_seats(tx, &booking_ids, now)?;

                Ok(ReapReport {
                    expired_booking_ids: booking_ids,
                    released_seat_ids,
                })
            })?;

            Ok(report)
        })
        .await??)
    }
}

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::{Connection, RunQueryDsl, prelude::*, result::Error as DieselError, update};
use std::sync::Arc;
use tokio::task;
use uuid::Uuid;

use super::booking_ledger::{parse_status, release_booking_seats};
use crate::{
    domain::{
        entities::bookings::BookingEntity,
        repositories::settlement::SettlementRepository,
        value_objects::{
            bookings::{SettlementDecision, SettlementOutcome},
            enums::payment_statuses::PaymentStatus,
        },
    },
    infra::db::postgres::{
        postgres_connection::PgPoolSquad,
        schema::{bookings, payments},
    },
};

pub struct SettlementPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl SettlementPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl SettlementRepository for SettlementPostgres {
    async fn settle(
        &self,
        booking_id: Uuid,
        decision: SettlementDecision,
        decided_at: DateTime<Utc>,
    ) -> Result<SettlementOutcome> {
        let db_pool = Arc::clone(&self.db_pool);

        Ok(task::spawn_blocking(move || -> Result<SettlementOutcome> {
            let mut conn = db_pool.get()?;

            let outcome = conn.transaction::<SettlementOutcome, DieselError, _>(|tx| {
                let Some(booking) = bookings::table
                    .find(booking_id)
                    .select(BookingEntity::as_select())
                    .for_update()
                    .first::<BookingEntity>(tx)
                    .optional()?
                else {
                    return Ok(SettlementOutcome::BookingNotFound);
                };

                let current = parse_status(&booking.status)?;
                let Ok(next) = current.transition(decision.event()) else {
                    return Ok(SettlementOutcome::NotEligible { actual: current });
                };

                let booking = update(bookings::table)
                    .filter(bookings::id.eq(booking_id))
                    .set((
                        bookings::status.eq(next.to_string()),
                        bookings::updated_at.eq(decided_at),
                    ))
                    .returning(BookingEntity::as_returning())
                    .get_result::<BookingEntity>(tx)?;

                let released_seat_ids = match decision {
                    SettlementDecision::Accept => {
                        update(payments::table)
                            .filter(payments::booking_id.eq(booking_id))
                            .set((
                                payments::payment_status.eq(PaymentStatus::Success.to_string()),
                                payments::payment_date.eq(Some(decided_at)),
                                payments::updated_at.eq(decided_at),
                            ))
                            .execute(tx)?;
                        Vec::new()
                    }
                    SettlementDecision::Reject => {
                        update(payments::table)
                            .filter(payments::booking_id.eq(booking_id))
                            .set((
                                payments::payment_status.eq(PaymentStatus::Failed.to_string()),
                                payments::updated_at.eq(decided_at),
                            ))
                            .execute(tx)?;
                        release_booking_seats(tx, &[booking_id], decided_at)?
                    }
                };

                Ok(SettlementOutcome::Settled {
                    booking,
                    released_seat_ids,
                })
            })?;

            Ok(outcome)
        })
        .await??)
    }
}

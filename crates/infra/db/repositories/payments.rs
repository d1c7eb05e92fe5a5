use anyhow::Result;
use async_trait::async_trait;
use diesel::{
    Connection, RunQueryDsl,
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

use super::booking_ledger::parse_status;
use crate::{
    domain::{
        entities::{
            bookings::BookingEntity,
            payments::{InsertPaymentEntity, PaymentEntity},
        },
        repositories::payments::PaymentRepository,
        value_objects::{
            enums::{booking_statuses::BookingEvent, payment_statuses::PaymentStatus},
            payments::{ProofOutcome, ProofSubmission},
        },
    },
    infra::db::postgres::{
        postgres_connection::PgPoolSquad,
        schema::{bookings, payments},
    },
};

pub struct PaymentPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl PaymentPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl PaymentRepository for PaymentPostgres {
    async fn find_by_booking_id(&self, booking_id: Uuid) -> Result<Option<PaymentEntity>> {
        let db_pool = Arc::clone(&self.db_pool);

        Ok(task::spawn_blocking(move || -> Result<Option<PaymentEntity>> {
            let mut conn = db_pool.get()?;

            let payment = payments::table
                .filter(payments::booking_id.eq(booking_id))
                .select(PaymentEntity::as_select())
                .first::<PaymentEntity>(&mut conn)
                .optional()?;

            Ok(payment)
        })
        .await??)
    }

    async fn submit_proof(&self, submission: ProofSubmission) -> Result<ProofOutcome> {
        let db_pool = Arc::clone(&self.db_pool);

        Ok(task::spawn_blocking(move || -> Result<ProofOutcome> {
            let mut conn = db_pool.get()?;

            let result = conn.transaction::<ProofOutcome, DieselError, _>(|tx| {
                let Some(booking) = bookings::table
                    .filter(bookings::id.eq(submission.booking_id))
                    .filter(bookings::user_id.eq(submission.user_id))
                    .select(BookingEntity::as_select())
                    .for_update()
                    .first::<BookingEntity>(tx)
                    .optional()?
                else {
                    return Ok(ProofOutcome::BookingNotFound);
                };

                // Checked before the status: the first upload is what moved it away from pending.
                let existing = payments::table
                    .filter(payments::booking_id.eq(booking.id))
                    .select(count_star())
                    .first::<i64>(tx)?;
                if existing > 0 {
                    return Ok(ProofOutcome::PaymentExists);
                }

                let current = parse_status(&booking.status)?;
                let Ok(next) = current.transition(BookingEvent::ProofUploaded) else {
                    return Ok(ProofOutcome::NotEligible { actual: current });
                };

                if booking.expires_at <= submission.submitted_at {
                    return Ok(ProofOutcome::HoldExpired);
                }

                let payment = insert_into(payments::table)
                    .values(&InsertPaymentEntity {
                        booking_id: booking.id,
                        payment_method: submission.payment_method.clone(),
                        payment_status: PaymentStatus::Pending.to_string(),
                        proof_image_locator: submission.proof_image_locator.clone(),
                    })
                    .returning(PaymentEntity::as_returning())
                    .get_result::<PaymentEntity>(tx)?;

                update(bookings::table)
                    .filter(bookings::id.eq(booking.id))
                    .set((
                        bookings::status.eq(next.to_string()),
                        bookings::updated_at.eq(submission.submitted_at),
                    ))
                    .execute(tx)?;

                Ok(ProofOutcome::Submitted(payment))
            });

            match result {
                Ok(outcome) => Ok(outcome),
                Err(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info)) => {
                    warn!(
                        booking_id = %submission.booking_id,
                        db_error = %info.message(),
                        "payments: concurrent proof upload already recorded a payment"
                    );
                    Ok(ProofOutcome::PaymentExists)
                }
                Err(err) => Err(err.into()),
            }
        })
        .await??)
    }
}

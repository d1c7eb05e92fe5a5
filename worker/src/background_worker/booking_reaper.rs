use anyhow::Result;
use chrono::Utc;
use shuttle::domain::value_objects::bookings::ReapReport;
use std::{sync::Arc, time::Duration};
use tracing::{error, info};

use crate::usecases::expire_bookings::ExpireBookingsUseCase;

pub async fn run_booking_reaper_loop(
    usecase: Arc<ExpireBookingsUseCase>,
    interval: Duration,
) -> Result<()> {
    info!(
        interval_secs = interval.as_secs(),
        batch_limit = usecase.batch_limit(),
        "booking_reaper: loop started"
    );

    loop {
        match drain(&usecase).await {
            Ok(report) if !report.is_empty() => info!(
                expired = report.expired_booking_ids.len(),
                released_seats = report.released_seat_ids.len(),
                "booking_reaper: sweep finished"
            ),
            Ok(_) => {}
            // Retried on the next tick.
            Err(e) => error!(error = ?e, "booking_reaper: sweep failed"),
        }

        tokio::time::sleep(interval).await;
    }
}

/// Runs batches back to back until one comes back short, folding them into one report.
pub async fn drain(usecase: &ExpireBookingsUseCase) -> Result<ReapReport> {
    let mut total = ReapReport::default();

    loop {
        let report = usecase.run(Utc::now()).await?;
        let full = usecase.is_full_batch(&report);

        total.expired_booking_ids.extend(report.expired_booking_ids);
        total.released_seat_ids.extend(report.released_seat_ids);

        if !full {
            return Ok(total);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shuttle::domain::repositories::booking_expiry::MockBookingExpiryRepository;
    use uuid::Uuid;

    fn batch(bookings: usize) -> ReapReport {
        ReapReport {
            expired_booking_ids: (0..bookings).map(|_| Uuid::new_v4()).collect(),
            released_seat_ids: (0..bookings * 2).map(|_| Uuid::new_v4()).collect(),
        }
    }

    #[tokio::test]
    async fn drain_repeats_while_batches_are_full() {
        let mut repo = MockBookingExpiryRepository::new();
        let mut seq = mockall::Sequence::new();
        repo.expect_expire_elapsed_holds()
            .times(2)
            .in_sequence(&mut seq)
            .returning(|_, _| Box::pin(async { Ok(batch(3)) }));
        repo.expect_expire_elapsed_holds()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Box::pin(async { Ok(batch(1)) }));

        let usecase = ExpireBookingsUseCase::new(Arc::new(repo), 3);
        let report = drain(&usecase).await.unwrap();

        assert_eq!(report.expired_booking_ids.len(), 7);
        assert_eq!(report.released_seat_ids.len(), 14);
    }

    #[tokio::test]
    async fn drain_stops_on_an_empty_batch() {
        let mut repo = MockBookingExpiryRepository::new();
        repo.expect_expire_elapsed_holds()
            .times(1)
            .returning(|_, _| Box::pin(async { Ok(ReapReport::default()) }));

        let usecase = ExpireBookingsUseCase::new(Arc::new(repo), 500);

        assert!(drain(&usecase).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn drain_surfaces_a_failed_batch() {
        let mut repo = MockBookingExpiryRepository::new();
        let mut seq = mockall::Sequence::new();
        repo.expect_expire_elapsed_holds()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Box::pin(async { Ok(batch(2)) }));
        repo.expect_expire_elapsed_holds()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Box::pin(async { Err(anyhow::anyhow!("deadlock detected")) }));

        let usecase = ExpireBookingsUseCase::new(Arc::new(repo), 2);

        assert!(drain(&usecase).await.is_err());
    }
}

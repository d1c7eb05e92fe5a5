use anyhow::Result;
use chrono::{DateTime, Utc};
use shuttle::domain::{
    repositories::booking_expiry::BookingExpiryRepository,
    value_objects::bookings::ReapReport,
};
use std::sync::Arc;
use tracing::info;

pub struct ExpireBookingsUseCase {
    repository: Arc<dyn BookingExpiryRepository + Send + Sync>,
    batch_limit: i64,
}

impl ExpireBookingsUseCase {
    pub fn new(repository: Arc<dyn BookingExpiryRepository + Send + Sync>, batch_limit: i64) -> Self {
        Self {
            repository,
            batch_limit: batch_limit.max(1),
        }
    }

    pub fn batch_limit(&self) -> i64 {
        self.batch_limit
    }

    /// Expires one batch of lapsed holds. A report with `batch_limit` bookings means more may
    /// be waiting.
    pub async fn run(&self, now: DateTime<Utc>) -> Result<ReapReport> {
        let report = self
            .repository
            .expire_elapsed_holds(now, self.batch_limit)
            .await?;

        if !report.is_empty() {
            info!(
                expired = report.expired_booking_ids.len(),
                released_seats = report.released_seat_ids.len(),
                "expire_bookings: holds reclaimed"
            );
        }

        Ok(report)
    }

    pub fn is_full_batch(&self, report: &ReapReport) -> bool {
        report.expired_booking_ids.len() as i64 >= self.batch_limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use mockall::predicate::eq;
    use shuttle::domain::repositories::booking_expiry::MockBookingExpiryRepository;
    use uuid::Uuid;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 8, 31, 0).unwrap()
    }

    #[tokio::test]
    async fn passes_clock_and_batch_limit_through() {
        let booking_id = Uuid::new_v4();
        let seat_id = Uuid::new_v4();

        let mut repo = MockBookingExpiryRepository::new();
        repo.expect_expire_elapsed_holds()
            .with(eq(now()), eq(50))
            .times(1)
            .returning(move |_, _| {
                Box::pin(async move {
                    Ok(ReapReport {
                        expired_booking_ids: vec![booking_id],
                        released_seat_ids: vec![seat_id],
                    })
                })
            });

        let usecase = ExpireBookingsUseCase::new(Arc::new(repo), 50);
        let report = usecase.run(now()).await.unwrap();

        assert_eq!(report.expired_booking_ids, vec![booking_id]);
        assert_eq!(report.released_seat_ids, vec![seat_id]);
        assert!(!usecase.is_full_batch(&report));
    }

    #[tokio::test]
    async fn nothing_to_reap_is_an_empty_report() {
        let mut repo = MockBookingExpiryRepository::new();
        repo.expect_expire_elapsed_holds()
            .returning(|_, _| Box::pin(async { Ok(ReapReport::default()) }));

        let usecase = ExpireBookingsUseCase::new(Arc::new(repo), 500);
        let report = usecase.run(now()).await.unwrap();

        assert!(report.is_empty());
        assert!(!usecase.is_full_batch(&report));
    }

    #[tokio::test]
    async fn repository_errors_propagate() {
        let mut repo = MockBookingExpiryRepository::new();
        repo.expect_expire_elapsed_holds()
            .returning(|_, _| Box::pin(async { Err(anyhow::anyhow!("could not serialize access")) }));

        let usecase = ExpireBookingsUseCase::new(Arc::new(repo), 500);

        assert!(usecase.run(now()).await.is_err());
    }

    #[test]
    fn full_batch_signals_more_work() {
        let repo = MockBookingExpiryRepository::new();
        let usecase = ExpireBookingsUseCase::new(Arc::new(repo), 2);
        let report = ReapReport {
            expired_booking_ids: vec![Uuid::new_v4(), Uuid::new_v4()],
            released_seat_ids: vec![Uuid::new_v4()],
        };

        assert!(usecase.is_full_batch(&report));
    }

    #[test]
    fn batch_limit_is_at_least_one() {
        let usecase = ExpireBookingsUseCase::new(Arc::new(MockBookingExpiryRepository::new()), 0);
        assert_eq!(usecase.batch_limit(), 1);
    }
}

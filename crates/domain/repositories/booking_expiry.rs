use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::automock;

use crate::domain::value_objects::bookings::ReapReport;

#[async_trait]
#[automock]
pub trait BookingExpiryRepository {
    /// Expires up to `batch_limit` pending bookings whose hold ended at or before `now`
    /// and releases their seats, all in one transaction.
    async fn expire_elapsed_holds(&self, now: DateTime<Utc>, batch_limit: i64)
    -> Result<ReapReport>;
}

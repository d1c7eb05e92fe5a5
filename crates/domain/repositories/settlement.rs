use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::automock;
use uuid::Uuid;

use crate::domain::value_objects::bookings::{SettlementDecision, SettlementOutcome};

#[async_trait]
#[automock]
pub trait SettlementRepository {
    async fn settle(
        &self,
        booking_id: Uuid,
        decision: SettlementDecision,
        decided_at: DateTime<Utc>,
    ) -> Result<SettlementOutcome>;
}

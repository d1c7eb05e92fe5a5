use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::seats::SeatEntity;

#[async_trait]
#[automock]
pub trait SeatLedgerRepository {
    /// Latest committed seat rows of a schedule, ordered by label.
    async fn list_seats(&self, schedule_id: Uuid) -> Result<Vec<SeatEntity>>;

    /// Free seat count per schedule. Schedules without free seats map to 0.
    async fn count_free_seats(&self, schedule_ids: Vec<Uuid>) -> Result<HashMap<Uuid, i64>>;
}

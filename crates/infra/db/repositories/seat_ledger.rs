use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use diesel::{RunQueryDsl, dsl::count_star, prelude::*};
use std::sync::Arc;
use tokio::task;
use uuid::Uuid;

use crate::{
    domain::{entities::seats::SeatEntity, repositories::seat_ledger::SeatLedgerRepository},
    infra::db::postgres::{postgres_connection::PgPoolSquad, retry::with_read_retry, schema::seats},
};

pub struct SeatLedgerPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl SeatLedgerPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl SeatLedgerRepository for SeatLedgerPostgres {
    async fn list_seats(&self, schedule_id: Uuid) -> Result<Vec<SeatEntity>> {
        let db_pool = Arc::clone(&self.db_pool);

        Ok(task::spawn_blocking(move || -> Result<Vec<SeatEntity>> {
            with_read_retry("seat_ledger.list_seats", || {
                let mut conn = db_pool.get()?;

                let rows = seats::table
                    .filter(seats::schedule_id.eq(schedule_id))
                    .order((seats::created_at.asc(), seats::seat_number.asc()))
                    .select(SeatEntity::as_select())
                    .load::<SeatEntity>(&mut conn)?;

                Ok(rows)
            })
        })
        .await??)
    }

    async fn count_free_seats(&self, schedule_ids: Vec<Uuid>) -> Result<HashMap<Uuid, i64>> {
        if schedule_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let db_pool = Arc::clone(&self.db_pool);

        Ok(task::spawn_blocking(move || -> Result<HashMap<Uuid, i64>> {
            with_read_retry("seat_ledger.count_free_seats", || {
                let mut conn = db_pool.get()?;

                let counted = seats::table
                    .filter(seats::schedule_id.eq_any(&schedule_ids))
                    .filter(seats::is_booked.eq(false))
                    .group_by(seats::schedule_id)
                    .select((seats::schedule_id, count_star()))
                    .load::<(Uuid, i64)>(&mut conn)?;

                let mut free: HashMap<Uuid, i64> =
                    schedule_ids.iter().map(|id| (*id, 0)).collect();
                free.extend(counted);

                Ok(free)
            })
        })
        .await??)
    }
}

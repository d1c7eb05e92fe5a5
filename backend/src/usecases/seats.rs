use std::sync::Arc;

use shuttle::domain::{
    repositories::{catalog::CatalogRepository, seat_ledger::SeatLedgerRepository},
    value_objects::seats::SeatAvailabilityModel,
};
use tracing::debug;
use uuid::Uuid;

use crate::usecases::errors::{BookingError, UseCaseResult};

pub struct SeatLedgerUseCase<C, L>
where
    C: CatalogRepository + Send + Sync + 'static,
    L: SeatLedgerRepository + Send + Sync + 'static,
{
    catalog_repository: Arc<C>,
    seat_ledger_repository: Arc<L>,
}

impl<C, L> SeatLedgerUseCase<C, L>
where
    C: CatalogRepository + Send + Sync + 'static,
    L: SeatLedgerRepository + Send + Sync + 'static,
{
    pub fn new(catalog_repository: Arc<C>, seat_ledger_repository: Arc<L>) -> Self {
        Self {
            catalog_repository,
            seat_ledger_repository,
        }
    }

    pub async fn available_seats(&self, schedule_id: Uuid) -> UseCaseResult<SeatAvailabilityModel> {
        if self
            .catalog_repository
            .find_schedule(schedule_id)
            .await?
            .is_none()
        {
            return Err(BookingError::NotFound("schedule".to_string()));
        }

        let seats = self.seat_ledger_repository.list_seats(schedule_id).await?;
        debug!(%schedule_id, seats = seats.len(), "seats: ledger loaded");

        Ok(SeatAvailabilityModel::from_ledger(schedule_id, seats))
    }
}

use std::{collections::HashMap, sync::Arc};

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Utc};
use shuttle::domain::{
    entities::{
        routes::{InsertRouteEntity, RouteEntity},
        schedules::{InsertScheduleEntity, ScheduleEntity},
    },
    repositories::{catalog::CatalogRepository, seat_ledger::SeatLedgerRepository},
    value_objects::{
        pagination::{Paginated, PaginationQuery},
        schedules::{
            CreateRouteModel, CreateScheduleModel, MAX_PRICE_MINOR, RouteModel, ScheduleFilter,
            ScheduleModel, ScheduleSearchQuery,
        },
        seats::{MAX_SEATS_PER_SCHEDULE, seat_labels},
    },
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::usecases::errors::{BookingError, UseCaseResult};

pub struct CatalogUseCase<C, L>
where
    C: CatalogRepository + Send + Sync + 'static,
    L: SeatLedgerRepository + Send + Sync + 'static,
{
    catalog_repository: Arc<C>,
    seat_ledger_repository: Arc<L>,
    search_offset: FixedOffset,
}

impl<C, L> CatalogUseCase<C, L>
where
    C: CatalogRepository + Send + Sync + 'static,
    L: SeatLedgerRepository + Send + Sync + 'static,
{
    pub fn new(
        catalog_repository: Arc<C>,
        seat_ledger_repository: Arc<L>,
        search_offset: FixedOffset,
    ) -> Self {
        Self {
            catalog_repository,
            seat_ledger_repository,
            search_offset,
        }
    }

    pub async fn create_route(&self, model: CreateRouteModel) -> UseCaseResult<RouteModel> {
        let origin_city = model.origin_city.trim().to_string();
        let destination_city = model.destination_city.trim().to_string();
        if origin_city.is_empty() || destination_city.is_empty() {
            return Err(BookingError::Validation(
                "origin_city and destination_city are required".to_string(),
            ));
        }
        if origin_city.eq_ignore_ascii_case(&destination_city) {
            return Err(BookingError::Validation(
                "origin_city and destination_city must differ".to_string(),
            ));
        }

        let route = self
            .catalog_repository
            .create_route(InsertRouteEntity {
                origin_city,
                destination_city,
            })
            .await?
            .ok_or_else(|| BookingError::Conflict("route already exists".to_string()))?;

        info!(route_id = %route.id, "catalog: route created");
        Ok(RouteModel::from(route))
    }

    pub async fn list_routes(&self) -> UseCaseResult<Vec<RouteModel>> {
        let routes = self.catalog_repository.list_routes().await?;
        Ok(routes.into_iter().map(RouteModel::from).collect())
    }

    pub async fn create_schedule(
        &self,
        model: CreateScheduleModel,
        now: DateTime<Utc>,
    ) -> UseCaseResult<ScheduleModel> {
        if !(1..=MAX_PRICE_MINOR).contains(&model.price_minor) {
            return Err(BookingError::Validation(format!(
                "price_minor must be between 1 and {MAX_PRICE_MINOR}"
            )));
        }
        if !(1..=MAX_SEATS_PER_SCHEDULE).contains(&model.total_seats) {
            return Err(BookingError::Validation(format!(
                "total_seats must be between 1 and {MAX_SEATS_PER_SCHEDULE}"
            )));
        }
        if model.departure_time <= now {
            return Err(BookingError::Validation(
                "departure_time must be in the future".to_string(),
            ));
        }
        if model.arrival_time <= model.departure_time {
            return Err(BookingError::Validation(
                "arrival_time must be after departure_time".to_string(),
            ));
        }

        let route = self
            .catalog_repository
            .find_route(model.route_id)
            .await?
            .ok_or_else(|| BookingError::NotFound("route".to_string()))?;

        let schedule = self
            .catalog_repository
            .create_schedule(
                InsertScheduleEntity {
                    route_id: route.id,
                    departure_time: model.departure_time,
                    arrival_time: model.arrival_time,
                    price_minor: model.price_minor,
                    total_seats: model.total_seats,
                },
                seat_labels(model.total_seats as usize),
            )
            .await?;

        info!(
            schedule_id = %schedule.id,
            route_id = %route.id,
            total_seats = schedule.total_seats,
            "catalog: schedule created"
        );
        let free_seats = i64::from(schedule.total_seats);
        Ok(ScheduleModel::new(schedule, route, free_seats))
    }

    pub async fn list_schedules(
        &self,
        pagination: PaginationQuery,
    ) -> UseCaseResult<Paginated<ScheduleModel>> {
        let page = pagination.normalize();
        let (rows, total) = self
            .catalog_repository
            .list_schedules(ScheduleFilter::default(), page)
            .await?;

        Ok(Paginated::new(self.with_availability(rows).await?, total, page))
    }

    /// Future departures with at least one free seat.
    pub async fn search_schedules(
        &self,
        query: ScheduleSearchQuery,
        now: DateTime<Utc>,
    ) -> UseCaseResult<Paginated<ScheduleModel>> {
        let page = PaginationQuery {
            page: query.page,
            limit: query.limit,
        }
        .normalize();

        let (departs_from, departs_before) = match query.date {
            Some(date) => {
                let (start, end) = self.day_window(date)?;
                (start.max(now), Some(end))
            }
            None => (now, None),
        };

        let filter = ScheduleFilter {
            origin: non_blank(query.origin),
            destination: non_blank(query.destination),
            departs_from: Some(departs_from),
            departs_before,
            only_with_free_seats: true,
        };

        let (rows, total) = self.catalog_repository.list_schedules(filter, page).await?;
        Ok(Paginated::new(self.with_availability(rows).await?, total, page))
    }

    pub async fn get_schedule(&self, schedule_id: Uuid) -> UseCaseResult<ScheduleModel> {
        let (schedule, route) = self
            .catalog_repository
            .find_schedule(schedule_id)
            .await?
            .ok_or_else(|| {
                warn!(%schedule_id, "catalog: schedule not found");
                BookingError::NotFound("schedule".to_string())
            })?;

        let mut models = self.with_availability(vec![(schedule, route)]).await?;
        models
            .pop()
            .ok_or_else(|| BookingError::NotFound("schedule".to_string()))
    }

    async fn with_availability(
        &self,
        rows: Vec<(ScheduleEntity, RouteEntity)>,
    ) -> UseCaseResult<Vec<ScheduleModel>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids = rows.iter().map(|(schedule, _)| schedule.id).collect();
        let free: HashMap<Uuid, i64> = self.seat_ledger_repository.count_free_seats(ids).await?;

        Ok(rows
            .into_iter()
            .map(|(schedule, route)| {
                let free_seats = free.get(&schedule.id).copied().unwrap_or_default();
                ScheduleModel::new(schedule, route, free_seats)
            })
            .collect())
    }

    fn day_window(&self, date: NaiveDate) -> UseCaseResult<(DateTime<Utc>, DateTime<Utc>)> {
        let start = date
            .and_hms_opt(0, 0, 0)
            .and_then(|midnight| midnight.and_local_timezone(self.search_offset).single())
            .ok_or_else(|| BookingError::Validation("date is invalid".to_string()))?
            .with_timezone(&Utc);

        Ok((start, start + Duration::days(1)))
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

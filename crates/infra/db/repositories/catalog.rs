use anyhow::Result;
use async_trait::async_trait;
use diesel::{
    Connection, RunQueryDsl,
    dsl::{InnerJoin, IntoBoxed, count_star},
    insert_into,
    pg::Pg,
    prelude::*,
    result::Error as DieselError,
};
use std::sync::Arc;
use tokio::task;
use uuid::Uuid;

use crate::{
    domain::{
        entities::{
            routes::{InsertRouteEntity, RouteEntity},
            schedules::{InsertScheduleEntity, ScheduleEntity},
            seats::InsertSeatEntity,
        },
        repositories::catalog::CatalogRepository,
        value_objects::{pagination::PageRequest, schedules::ScheduleFilter},
    },
    infra::db::postgres::{
        postgres_connection::PgPoolSquad,
        retry::with_read_retry,
        schema::{routes, schedules, seats},
    },
};

type ScheduleRows = IntoBoxed<'static, InnerJoin<schedules::table, routes::table>, Pg>;

const HAS_FREE_SEAT_SQL: &str = "EXISTS (SELECT 1 FROM seats free_seats \
     WHERE free_seats.schedule_id = schedules.id AND free_seats.is_booked = false)";

pub struct CatalogPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl CatalogPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl CatalogRepository for CatalogPostgres {
    async fn create_route(&self, route: InsertRouteEntity) -> Result<Option<RouteEntity>> {
        let db_pool = Arc::clone(&self.db_pool);

        Ok(task::spawn_blocking(move || -> Result<Option<RouteEntity>> {
            let mut conn = db_pool.get()?;

            let created = insert_into(routes::table)
                .values(&route)
                .on_conflict_do_nothing()
                .returning(RouteEntity::as_returning())
                .get_result::<RouteEntity>(&mut conn)
                .optional()?;

            Ok(created)
        })
        .await??)
    }

    async fn list_routes(&self) -> Result<Vec<RouteEntity>> {
        let db_pool = Arc::clone(&self.db_pool);

        Ok(task::spawn_blocking(move || -> Result<Vec<RouteEntity>> {
            let mut conn = db_pool.get()?;

            let rows = routes::table
                .order((routes::origin_city.asc(), routes::destination_city.asc()))
                .select(RouteEntity::as_select())
                .load::<RouteEntity>(&mut conn)?;

            Ok(rows)
        })
        .await??)
    }

    async fn find_route(&self, route_id: Uuid) -> Result<Option<RouteEntity>> {
        let db_pool = Arc::clone(&self.db_pool);

        Ok(task::spawn_blocking(move || -> Result<Option<RouteEntity>> {
            let mut conn = db_pool.get()?;

            let route = routes::table
                .find(route_id)
                .select(RouteEntity::as_select())
                .first::<RouteEntity>(&mut conn)
                .optional()?;

            Ok(route)
        })
        .await??)
    }

    async fn create_schedule(
        &self,
        schedule: InsertScheduleEntity,
        seat_labels: Vec<String>,
    ) -> Result<ScheduleEntity> {
        let db_pool = Arc::clone(&self.db_pool);

        Ok(task::spawn_blocking(move || -> Result<ScheduleEntity> {
            let mut conn = db_pool.get()?;

            let created = conn.transaction::<ScheduleEntity, DieselError, _>(|tx| {
                let created = insert_into(schedules::table)
                    .values(&schedule)
                    .returning(ScheduleEntity::as_returning())
                    .get_result::<ScheduleEntity>(tx)?;

                let seat_rows: Vec<InsertSeatEntity> = seat_labels
                    .iter()
                    .map(|label| InsertSeatEntity {
                        schedule_id: created.id,
                        seat_number: label.clone(),
                        is_booked: false,
                    })
                    .collect();
                insert_into(seats::table).values(&seat_rows).execute(tx)?;

                Ok(created)
            })?;

            Ok(created)
        })
        .await??)
    }

    async fn find_schedule(
        &self,
        schedule_id: Uuid,
    ) -> Result<Option<(ScheduleEntity, RouteEntity)>> {
        let db_pool = Arc::clone(&self.db_pool);

        Ok(task::spawn_blocking(move || -> Result<Option<(ScheduleEntity, RouteEntity)>> {
            let mut conn = db_pool.get()?;

            let row = schedules::table
                .inner_join(routes::table)
                .filter(schedules::id.eq(schedule_id))
                .select((ScheduleEntity::as_select(), RouteEntity::as_select()))
                .first::<(ScheduleEntity, RouteEntity)>(&mut conn)
                .optional()?;

            Ok(row)
        })
        .await??)
    }

    async fn list_schedules(
        &self,
        filter: ScheduleFilter,
        page: PageRequest,
    ) -> Result<(Vec<(ScheduleEntity, RouteEntity)>, i64)> {
        let db_pool = Arc::clone(&self.db_pool);

        Ok(task::spawn_blocking(
            move || -> Result<(Vec<(ScheduleEntity, RouteEntity)>, i64)> {
                with_read_retry("catalog.list_schedules", || {
                    let mut conn = db_pool.get()?;

                    let total = filtered_schedules(&filter)
                        .select(count_star())
                        .first::<i64>(&mut conn)?;

                    let rows = filtered_schedules(&filter)
                        .select((ScheduleEntity::as_select(), RouteEntity::as_select()))
                        .order((schedules::departure_time.asc(), schedules::id.asc()))
                        .limit(page.limit)
                        .offset(page.offset())
                        .load::<(ScheduleEntity, RouteEntity)>(&mut conn)?;

                    Ok((rows, total))
                })
            },
        )
        .await??)
    }
}

fn filtered_schedules(filter: &ScheduleFilter) -> ScheduleRows {
    let mut query = schedules::table.inner_join(routes::table).into_boxed();

    if let Some(origin) = filter.origin.as_deref() {
        query = query.filter(routes::origin_city.ilike(contains_pattern(origin)));
    }
    if let Some(destination) = filter.destination.as_deref() {
        query = query.filter(routes::destination_city.ilike(contains_pattern(destination)));
    }
    if let Some(from) = filter.departs_from {
        query = query.filter(schedules::departure_time.ge(from));
    }
    if let Some(before) = filter.departs_before {
        query = query.filter(schedules::departure_time.lt(before));
    }
    if filter.only_with_free_seats {
        query = query.filter(diesel::dsl::sql::<diesel::sql_types::Bool>(HAS_FREE_SEAT_SQL));
    }

    query
}

/// `%term%` with LIKE wildcards in the term escaped.
fn contains_pattern(term: &str) -> String {
    let escaped = term
        .trim()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

#[cfg(test)]
mod tests {
    use super::contains_pattern;

    #[test]
    fn search_terms_are_escaped_for_ilike() {
        assert_eq!(contains_pattern(" Jakarta "), "%Jakarta%");
        assert_eq!(contains_pattern("50%_off"), "%50\\%\\_off%");
    }
}

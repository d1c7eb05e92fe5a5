use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::{
    entities::{
        routes::{InsertRouteEntity, RouteEntity},
        schedules::{InsertScheduleEntity, ScheduleEntity},
    },
    value_objects::{pagination::PageRequest, schedules::ScheduleFilter},
};

#[async_trait]
#[automock]
pub trait CatalogRepository {
    /// Returns `None` when the origin/destination pair already exists.
    async fn create_route(&self, route: InsertRouteEntity) -> Result<Option<RouteEntity>>;
    async fn list_routes(&self) -> Result<Vec<RouteEntity>>;
    async fn find_route(&self, route_id: Uuid) -> Result<Option<RouteEntity>>;

    /// Inserts the schedule and one free seat per label in a single transaction.
    async fn create_schedule(
        &self,
        schedule: InsertScheduleEntity,
        seat_labels: Vec<String>,
    ) -> Result<ScheduleEntity>;
    async fn find_schedule(&self, schedule_id: Uuid)
    -> Result<Option<(ScheduleEntity, RouteEntity)>>;
    async fn list_schedules(
        &self,
        filter: ScheduleFilter,
        page: PageRequest,
    ) -> Result<(Vec<(ScheduleEntity, RouteEntity)>, i64)>;
}

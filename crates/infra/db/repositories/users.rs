use anyhow::Result;
use async_trait::async_trait;
use diesel::{RunQueryDsl, insert_into, prelude::*};
use std::sync::Arc;
use tokio::task;
use uuid::Uuid;

use crate::{
    domain::{
        entities::users::{InsertUserEntity, UserEntity},
        repositories::users::UserRepository,
    },
    infra::db::postgres::{postgres_connection::PgPoolSquad, schema::users},
};

pub struct UserPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl UserPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl UserRepository for UserPostgres {
    async fn create(&self, user: InsertUserEntity) -> Result<Option<UserEntity>> {
        let db_pool = Arc::clone(&self.db_pool);

        Ok(task::spawn_blocking(move || -> Result<Option<UserEntity>> {
            let mut conn = db_pool.get()?;

            let created = insert_into(users::table)
                .values(&user)
                .on_conflict_do_nothing()
                .returning(UserEntity::as_returning())
                .get_result::<UserEntity>(&mut conn)
                .optional()?;

            Ok(created)
        })
        .await??)
    }

    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<UserEntity>> {
        let db_pool = Arc::clone(&self.db_pool);

        Ok(task::spawn_blocking(move || -> Result<Option<UserEntity>> {
            let mut conn = db_pool.get()?;

            let user = users::table
                .find(user_id)
                .select(UserEntity::as_select())
                .first::<UserEntity>(&mut conn)
                .optional()?;

            Ok(user)
        })
        .await??)
    }

    async fn find_by_email(&self, email: String) -> Result<Option<UserEntity>> {
        let db_pool = Arc::clone(&self.db_pool);

        Ok(task::spawn_blocking(move || -> Result<Option<UserEntity>> {
            let mut conn = db_pool.get()?;

            let user = users::table
                .filter(users::email.eq(email))
                .select(UserEntity::as_select())
                .first::<UserEntity>(&mut conn)
                .optional()?;

            Ok(user)
        })
        .await??)
    }
}

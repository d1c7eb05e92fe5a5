use std::sync::Arc;

use axum::{Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::post};
use shuttle::domain::{repositories::users::UserRepository, value_objects::iam::CreateUserModel};
use tracing::info;

use crate::{
    auth::AuthUser,
    usecases::{errors::UseCaseResult, iam::IamUseCase},
};

/// Account management under `/api/v1/admin/users`; admin role only.
pub fn routes<U>(usecase: Arc<IamUseCase<U>>) -> Router
where
    U: UserRepository + Send + Sync + 'static,
{
    Router::new()
        .route("/", post(create_user::<U>))
        .with_state(usecase)
}

pub async fn create_user<U>(
    State(usecase): State<Arc<IamUseCase<U>>>,
    auth: AuthUser,
    Json(model): Json<CreateUserModel>,
) -> UseCaseResult<impl IntoResponse>
where
    U: UserRepository + Send + Sync + 'static,
{
    auth.require_admin()?;
    info!(admin_id = %auth.user_id, role = %model.role, "users: account creation requested");
    let user = usecase.create_user(model).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

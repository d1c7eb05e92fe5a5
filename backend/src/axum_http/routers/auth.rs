use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::Utc;
use shuttle::domain::{
    repositories::users::UserRepository,
    value_objects::iam::{LoginModel, RegisterUserModel},
};
use tracing::info;

use crate::{
    auth::AuthUser,
    usecases::{errors::UseCaseResult, iam::IamUseCase},
};

pub fn routes<U>(usecase: Arc<IamUseCase<U>>) -> Router
where
    U: UserRepository + Send + Sync + 'static,
{
    Router::new()
        .route("/register", post(register::<U>))
        .route("/login", post(login::<U>))
        .route("/me", get(me::<U>))
        .with_state(usecase)
}

pub async fn register<U>(
    State(usecase): State<Arc<IamUseCase<U>>>,
    Json(model): Json<RegisterUserModel>,
) -> UseCaseResult<impl IntoResponse>
where
    U: UserRepository + Send + Sync + 'static,
{
    let user = usecase.register(model).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn login<U>(
    State(usecase): State<Arc<IamUseCase<U>>>,
    Json(model): Json<LoginModel>,
) -> UseCaseResult<impl IntoResponse>
where
    U: UserRepository + Send + Sync + 'static,
{
    let token = usecase.login(model, Utc::now()).await?;
    Ok(Json(token))
}

pub async fn me<U>(
    State(usecase): State<Arc<IamUseCase<U>>>,
    AuthUser { user_id, .. }: AuthUser,
) -> UseCaseResult<impl IntoResponse>
where
    U: UserRepository + Send + Sync + 'static,
{
    info!(%user_id, "auth: profile request received");
    let user = usecase.me(user_id).await?;
    Ok(Json(user))
}

use std::sync::Arc;

use anyhow::Context;
use chrono::{DateTime, Utc};
use shuttle::domain::{
    entities::users::InsertUserEntity,
    repositories::users::UserRepository,
    value_objects::{
        enums::user_roles::UserRole,
        iam::{
            AccessTokenModel, CreateUserModel, LoginModel, MIN_PASSWORD_LEN, RegisterUserModel,
            UserModel,
        },
    },
};
use tokio::task;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    auth::{JwtKeys, hash_password, verify_password},
    usecases::errors::{BookingError, UseCaseResult},
};

pub struct IamUseCase<U>
where
    U: UserRepository + Send + Sync + 'static,
{
    user_repository: Arc<U>,
    jwt_keys: Arc<JwtKeys>,
}

impl<U> IamUseCase<U>
where
    U: UserRepository + Send + Sync + 'static,
{
    pub fn new(user_repository: Arc<U>, jwt_keys: Arc<JwtKeys>) -> Self {
        Self {
            user_repository,
            jwt_keys,
        }
    }

    /// Self-service sign-up; always a `user` account.
    pub async fn register(&self, model: RegisterUserModel) -> UseCaseResult<UserModel> {
        let user = self.create_account(model, UserRole::User).await?;
        info!(user_id = %user.id, "iam: user registered");
        Ok(user)
    }

    /// Admin-created account. Only `user` and `staff` can be granted here.
    pub async fn create_user(&self, model: CreateUserModel) -> UseCaseResult<UserModel> {
        if model.role == UserRole::Admin {
            return Err(BookingError::Validation(
                "role must be user or staff".to_string(),
            ));
        }
        let role = model.role;
        let user = self
            .create_account(
                RegisterUserModel {
                    email: model.email,
                    password: model.password,
                    first_name: model.first_name,
                    last_name: model.last_name,
                    phone_number: model.phone_number,
                },
                role,
            )
            .await?;
        info!(user_id = %user.id, role = %role, "iam: account created by admin");
        Ok(user)
    }

    /// Creates the bootstrap admin unless an account with that email exists.
    /// Returns whether an account was created. An existing account is left as is.
    pub async fn ensure_admin(&self, email: &str, password: &str) -> UseCaseResult<bool> {
        let normalized = normalize_email(email)?;
        if let Some(existing) = self.user_repository.find_by_email(normalized).await? {
            if existing.role != UserRole::Admin.as_str() {
                warn!(
                    user_id = %existing.id,
                    role = %existing.role,
                    "iam: seed admin email belongs to a non-admin account"
                );
            }
            return Ok(false);
        }

        let admin = self
            .create_account(
                RegisterUserModel {
                    email: email.to_string(),
                    password: password.to_string(),
                    first_name: "Admin".to_string(),
                    last_name: "User".to_string(),
                    phone_number: None,
                },
                UserRole::Admin,
            )
            .await?;
        info!(user_id = %admin.id, "iam: seed admin created");
        Ok(true)
    }

    async fn create_account(
        &self,
        model: RegisterUserModel,
        role: UserRole,
    ) -> UseCaseResult<UserModel> {
        let email = normalize_email(&model.email)?;
        let first_name = required_field("first_name", &model.first_name)?;
        let last_name = required_field("last_name", &model.last_name)?;
        if model.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(BookingError::Validation(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }

        let password = model.password;
        let password_hash = task::spawn_blocking(move || hash_password(&password))
            .await
            .context("password hashing task failed")??;

        let created = self
            .user_repository
            .create(InsertUserEntity {
                email: email.clone(),
                password_hash,
                role: role.to_string(),
                first_name,
                last_name,
                phone_number: model
                    .phone_number
                    .map(|phone| phone.trim().to_string())
                    .filter(|phone| !phone.is_empty()),
            })
            .await?;

        let Some(user) = created else {
            warn!(%email, "iam: email already registered");
            return Err(BookingError::Conflict(
                "email is already registered".to_string(),
            ));
        };

        Ok(UserModel::try_from(user)?)
    }

    pub async fn login(
        &self,
        model: LoginModel,
        now: DateTime<Utc>,
    ) -> UseCaseResult<AccessTokenModel> {
        let email = model.email.trim().to_lowercase();
        let user = self
            .user_repository
            .find_by_email(email)
            .await?
            .ok_or(BookingError::Unauthorized)?;

        let password = model.password;
        let hash = user.password_hash.clone();
        let verified = task::spawn_blocking(move || verify_password(&password, &hash))
            .await
            .context("password verification task failed")?;
        if !verified {
            warn!(user_id = %user.id, "iam: wrong password");
            return Err(BookingError::Unauthorized);
        }

        let user = UserModel::try_from(user)?;
        let (access_token, expires_at) = self.jwt_keys.issue(user.id, user.role, now)?;

        info!(user_id = %user.id, "iam: access token issued");
        Ok(AccessTokenModel {
            access_token,
            token_type: "Bearer".to_string(),
            expires_at,
            user,
        })
    }

    pub async fn me(&self, user_id: Uuid) -> UseCaseResult<UserModel> {
        let user = self
            .user_repository
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| BookingError::NotFound("user".to_string()))?;

        Ok(UserModel::try_from(user)?)
    }
}

fn normalize_email(raw: &str) -> UseCaseResult<String> {
    let email = raw.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(email),
        _ => Err(BookingError::Validation("email is invalid".to_string())),
    }
}

fn required_field(name: &str, value: &str) -> UseCaseResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(BookingError::Validation(format!("{name} is required")));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usecases::fixtures;
    use mockall::predicate::eq;
    use shuttle::domain::repositories::users::MockUserRepository;

    fn keys() -> Arc<JwtKeys> {
        Arc::new(JwtKeys::new("iam-test-secret", 60))
    }

    fn register_model(email: &str, password: &str) -> RegisterUserModel {
        RegisterUserModel {
            email: email.to_string(),
            password: password.to_string(),
            first_name: " Budi ".to_string(),
            last_name: "Santoso".to_string(),
            phone_number: Some("  ".to_string()),
        }
    }

    #[tokio::test]
    async fn register_normalizes_email_and_hashes_password() {
        let mut user_repo = MockUserRepository::new();
        user_repo
            .expect_create()
            .withf(|insert| {
                insert.email == "rider@example.com"
                    && insert.password_hash.starts_with("$argon2")
                    && insert.first_name == "Budi"
                    && insert.role == "user"
                    && insert.phone_number.is_none()
            })
            .returning(|insert| {
                let mut user = fixtures::user(Uuid::new_v4());
                user.email = insert.email;
                Box::pin(async move { Ok(Some(user)) })
            });

        let usecase = IamUseCase::new(Arc::new(user_repo), keys());
        let user = usecase
            .register(register_model("  Rider@Example.com ", "long-enough"))
            .await
            .unwrap();

        assert_eq!(user.email, "rider@example.com");
        assert_eq!(user.role, UserRole::User);
    }

    #[tokio::test]
    async fn register_duplicate_email_conflicts() {
        let mut user_repo = MockUserRepository::new();
        user_repo
            .expect_create()
            .returning(|_| Box::pin(async { Ok(None) }));

        let usecase = IamUseCase::new(Arc::new(user_repo), keys());
        let result = usecase
            .register(register_model("rider@example.com", "long-enough"))
            .await;

        assert!(matches!(result, Err(BookingError::Conflict(_))));
    }

    #[tokio::test]
    async fn register_rejects_short_password_without_touching_storage() {
        let user_repo = MockUserRepository::new();
        let usecase = IamUseCase::new(Arc::new(user_repo), keys());

        let short = usecase
            .register(register_model("rider@example.com", "short"))
            .await;
        let bad_email = usecase
            .register(register_model("not-an-email", "long-enough"))
            .await;

        assert!(matches!(short, Err(BookingError::Validation(_))));
        assert!(matches!(bad_email, Err(BookingError::Validation(_))));
    }

    #[tokio::test]
    async fn login_issues_token_for_matching_password() {
        let user_id = Uuid::new_v4();
        let mut user = fixtures::user(user_id);
        user.role = "staff".to_string();
        user.password_hash = hash_password("long-enough").unwrap();

        let mut user_repo = MockUserRepository::new();
        user_repo
            .expect_find_by_email()
            .with(eq("rider@example.com".to_string()))
            .returning(move |_| {
                let user = user.clone();
                Box::pin(async move { Ok(Some(user)) })
            });

        let keys = keys();
        let usecase = IamUseCase::new(Arc::new(user_repo), Arc::clone(&keys));
        let token = usecase
            .login(
                LoginModel {
                    email: "RIDER@example.com".to_string(),
                    password: "long-enough".to_string(),
                },
                Utc::now(),
            )
            .await
            .unwrap();

        let claims = keys.validate(&token.access_token).unwrap();
        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.role, "staff");
        assert_eq!(token.token_type, "Bearer");
    }

    #[tokio::test]
    async fn login_does_not_reveal_which_credential_was_wrong() {
        let mut user = fixtures::user(Uuid::new_v4());
        user.password_hash = hash_password("long-enough").unwrap();

        let mut user_repo = MockUserRepository::new();
        user_repo
            .expect_find_by_email()
            .returning(move |email| {
                let found = (email == "rider@example.com").then(|| user.clone());
                Box::pin(async move { Ok(found) })
            });

        let usecase = IamUseCase::new(Arc::new(user_repo), keys());
        for (email, password) in [
            ("rider@example.com", "wrong-password"),
            ("nobody@example.com", "long-enough"),
        ] {
            let result = usecase
                .login(
                    LoginModel {
                        email: email.to_string(),
                        password: password.to_string(),
                    },
                    Utc::now(),
                )
                .await;
            assert!(matches!(result, Err(BookingError::Unauthorized)), "{email}");
        }
    }

    fn staff_model(role: UserRole) -> CreateUserModel {
        CreateUserModel {
            email: "Driver@Example.com".to_string(),
            password: "long-enough".to_string(),
            first_name: "Siti".to_string(),
            last_name: "Rahma".to_string(),
            phone_number: None,
            role,
        }
    }

    #[tokio::test]
    async fn admin_can_create_staff_accounts() {
        let mut user_repo = MockUserRepository::new();
        user_repo
            .expect_create()
            .withf(|insert| insert.email == "driver@example.com" && insert.role == "staff")
            .times(1)
            .returning(|insert| {
                let mut user = fixtures::user(Uuid::new_v4());
                user.email = insert.email;
                user.role = insert.role;
                Box::pin(async move { Ok(Some(user)) })
            });

        let usecase = IamUseCase::new(Arc::new(user_repo), keys());
        let user = usecase
            .create_user(staff_model(UserRole::Staff))
            .await
            .unwrap();

        assert_eq!(user.role, UserRole::Staff);
        assert_eq!(user.email, "driver@example.com");
    }

    #[tokio::test]
    async fn admin_role_cannot_be_granted_through_user_management() {
        let usecase = IamUseCase::new(Arc::new(MockUserRepository::new()), keys());

        let result = usecase.create_user(staff_model(UserRole::Admin)).await;

        assert!(matches!(result, Err(BookingError::Validation(_))));
    }

    #[test]
    fn created_user_defaults_to_rider_role() {
        let model: CreateUserModel = serde_json::from_value(serde_json::json!({
            "email": "rider@example.com",
            "password": "long-enough",
            "first_name": "Budi",
            "last_name": "Santoso"
        }))
        .unwrap();

        assert_eq!(model.role, UserRole::User);
    }

    #[tokio::test]
    async fn seed_admin_is_created_when_absent() {
        let mut user_repo = MockUserRepository::new();
        user_repo
            .expect_find_by_email()
            .with(eq("root@example.com".to_string()))
            .returning(|_| Box::pin(async { Ok(None) }));
        user_repo
            .expect_create()
            .withf(|insert| {
                insert.email == "root@example.com"
                    && insert.role == "admin"
                    && insert.password_hash.starts_with("$argon2")
            })
            .times(1)
            .returning(|insert| {
                let mut user = fixtures::user(Uuid::new_v4());
                user.email = insert.email;
                user.role = insert.role;
                Box::pin(async move { Ok(Some(user)) })
            });

        let usecase = IamUseCase::new(Arc::new(user_repo), keys());
        let created = usecase
            .ensure_admin(" Root@Example.com", "long-enough")
            .await
            .unwrap();

        assert!(created);
    }

    #[tokio::test]
    async fn seed_admin_leaves_an_existing_account_alone() {
        let mut user_repo = MockUserRepository::new();
        user_repo.expect_find_by_email().returning(|email| {
            let mut user = fixtures::user(Uuid::new_v4());
            user.email = email;
            user.role = "admin".to_string();
            Box::pin(async move { Ok(Some(user)) })
        });
        user_repo.expect_create().never();

        let usecase = IamUseCase::new(Arc::new(user_repo), keys());
        let created = usecase
            .ensure_admin("root@example.com", "long-enough")
            .await
            .unwrap();

        assert!(!created);
    }
}

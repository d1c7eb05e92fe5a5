use std::sync::Arc;

use anyhow::{Result, anyhow};
use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{
    Extension, RequestPartsExt, async_trait,
    extract::FromRequestParts,
    http::request::Parts,
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use shuttle::domain::value_objects::enums::user_roles::UserRole;
use tracing::warn;
use uuid::Uuid;

use crate::usecases::errors::{BookingError, UseCaseResult};

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub role: String,
    pub exp: usize,
    pub iat: usize,
}

/// HS256 signing material shared by the login use case and the `AuthUser` extractor.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl JwtKeys {
    pub fn new(secret: &str, ttl_minutes: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::minutes(ttl_minutes),
        }
    }

    pub fn issue(
        &self,
        user_id: Uuid,
        role: UserRole,
        now: DateTime<Utc>,
    ) -> Result<(String, DateTime<Utc>)> {
        let expires_at = now + self.ttl;
        let claims = Claims {
            sub: user_id.to_string(),
            role: role.to_string(),
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|err| anyhow!("failed to sign access token: {err}"))?;

        Ok((token, expires_at))
    }

    pub fn validate(&self, token: &str) -> Result<Claims> {
        let validation = Validation::new(Algorithm::HS256);
        let token_data = decode::<Claims>(token, &self.decoding, &validation)
            .map_err(|err| anyhow!("JWT validation failed: {err}"))?;

        Ok(token_data.claims)
    }
}

pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|err| anyhow!("failed to hash password: {err}"))?;
    Ok(hash.to_string())
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub role: UserRole,
}

impl AuthUser {
    pub fn require_staff(&self) -> UseCaseResult<()> {
        if self.role.can_settle_bookings() {
            Ok(())
        } else {
            warn!(user_id = %self.user_id, role = %self.role, "auth: staff role required");
            Err(BookingError::Forbidden)
        }
    }

    pub fn require_admin(&self) -> UseCaseResult<()> {
        if self.role.can_manage_catalog() {
            Ok(())
        } else {
            warn!(user_id = %self.user_id, role = %self.role, "auth: admin role required");
            Err(BookingError::Forbidden)
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = BookingError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|_| BookingError::Unauthorized)?;

        let Extension(keys) = parts
            .extract::<Extension<Arc<JwtKeys>>>()
            .await
            .map_err(|_| BookingError::Internal(anyhow!("JWT keys are not installed")))?;

        let claims = keys.validate(bearer.token()).map_err(|err| {
            warn!(error = %err, "auth: rejected bearer token");
            BookingError::Unauthorized
        })?;

        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| BookingError::Unauthorized)?;
        let role = claims
            .role
            .parse::<UserRole>()
            .map_err(|_| BookingError::Unauthorized)?;

        Ok(AuthUser { user_id, role })
    }
}

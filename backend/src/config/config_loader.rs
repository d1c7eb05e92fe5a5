use std::{fmt::Display, str::FromStr};

use anyhow::{Context, Result, anyhow, bail};

use super::config_model::{
    AdminSeed, Auth, BackendServer, Booking, Catalog, Database, DotEnvyConfig, Storage,
};
use shuttle::infra::storages::s3::S3Config;

pub fn load() -> Result<DotEnvyConfig> {
    dotenvy::dotenv().ok();

    let backend_server = BackendServer {
        port: required("SERVER_PORT_BACKEND")?,
        body_limit: required("SERVER_BODY_LIMIT")?,
        timeout: required("SERVER_TIMEOUT")?,
    };

    let database = Database {
        url: std::env::var("DATABASE_URL").context("DATABASE_URL is invalid")?,
    };

    let auth = Auth {
        jwt_secret: std::env::var("JWT_SECRET").context("JWT_SECRET is invalid")?,
        ttl_minutes: optional("JWT_TTL_MINUTES", 1440)?,
        admin_seed: load_admin_seed()?,
    };

    let booking = Booking {
        hold_minutes: optional("BOOKING_HOLD_MINUTES", 30)?,
        max_passengers: optional("BOOKING_MAX_PASSENGERS", 10)?,
    };
    if booking.hold_minutes <= 0 {
        bail!("BOOKING_HOLD_MINUTES must be positive");
    }
    if booking.max_passengers == 0 {
        bail!("BOOKING_MAX_PASSENGERS must be positive");
    }

    let catalog = Catalog {
        utc_offset_hours: optional("CATALOG_UTC_OFFSET_HOURS", 7)?,
    };

    Ok(DotEnvyConfig {
        backend_server,
        database,
        auth,
        booking,
        catalog,
        storage: load_storage()?,
    })
}

fn load_admin_seed() -> Result<Option<AdminSeed>> {
    let email = std::env::var("ADMIN_EMAIL").ok().filter(|v| !v.trim().is_empty());
    let password = std::env::var("ADMIN_PASSWORD").ok().filter(|v| !v.is_empty());

    match (email, password) {
        (Some(email), Some(password)) => Ok(Some(AdminSeed { email, password })),
        (None, None) => Ok(None),
        _ => bail!("ADMIN_EMAIL and ADMIN_PASSWORD must be set together"),
    }
}

fn load_storage() -> Result<Storage> {
    let backend = std::env::var("STORAGE_BACKEND").unwrap_or_else(|_| "local".to_string());

    match backend.trim().to_ascii_lowercase().as_str() {
        "local" => Ok(Storage::Local {
            root: std::env::var("STORAGE_LOCAL_ROOT").unwrap_or_else(|_| "uploads".to_string()),
        }),
        "s3" => Ok(Storage::S3(S3Config {
            endpoint: std::env::var("STORAGE_S3_ENDPOINT")
                .context("STORAGE_S3_ENDPOINT is invalid")?,
            region: std::env::var("STORAGE_S3_REGION").unwrap_or_else(|_| "us-east-1".to_string()),
            bucket: std::env::var("STORAGE_S3_BUCKET").context("STORAGE_S3_BUCKET is invalid")?,
            access_key: std::env::var("STORAGE_S3_ACCESS_KEY_ID")
                .context("STORAGE_S3_ACCESS_KEY_ID is invalid")?,
            secret_key: std::env::var("STORAGE_S3_SECRET_ACCESS_KEY")
                .context("STORAGE_S3_SECRET_ACCESS_KEY is invalid")?,
            key_prefix: std::env::var("STORAGE_S3_KEY_PREFIX").unwrap_or_default(),
            force_path_style: true,
            connect_timeout_secs: 10,
            read_timeout_secs: 60,
        })),
        other => Err(anyhow!("STORAGE_BACKEND is invalid: {other}")),
    }
}

fn required<T>(key: &str) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    let raw = std::env::var(key).with_context(|| format!("{key} is invalid"))?;
    raw.trim()
        .parse()
        .map_err(|err| anyhow!("{key} is invalid: {err}"))
}

fn optional<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match std::env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|err| anyhow!("{key} is invalid: {err}")),
        _ => Ok(default),
    }
}

use std::{fmt::Display, str::FromStr};

use anyhow::{Context, Result, anyhow, bail};

use super::config_model::{Database, DotEnvyConfig, Reaper, WorkerServer};

pub fn load() -> Result<DotEnvyConfig> {
    dotenvy::dotenv().ok();

    let worker_server = WorkerServer {
        port: required("SERVER_PORT_WORKER")?,
        body_limit: required("SERVER_BODY_LIMIT")?,
        timeout: required("SERVER_TIMEOUT")?,
    };

    let database = Database {
        url: std::env::var("DATABASE_URL").context("DATABASE_URL is invalid")?,
    };

    let reaper = Reaper {
        interval_secs: optional("REAPER_INTERVAL_SECS", 60)?,
        batch_limit: optional("REAPER_BATCH_LIMIT", 500)?,
        internal_token: std::env::var("INTERNAL_REAPER_TOKEN").ok().and_then(|v| {
            let trimmed = v.trim().to_string();
            (!trimmed.is_empty()).then_some(trimmed)
        }),
    };
    if reaper.interval_secs == 0 {
        bail!("REAPER_INTERVAL_SECS must be positive");
    }
    if reaper.batch_limit <= 0 {
        bail!("REAPER_BATCH_LIMIT must be positive");
    }

    Ok(DotEnvyConfig {
        worker_server,
        database,
        reaper,
    })
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

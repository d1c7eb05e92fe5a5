use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_config::{BehaviorVersion, timeout::TimeoutConfig};
use aws_credential_types::Credentials;
use aws_sdk_s3::{
    Client,
    config::{Region, StalledStreamProtectionConfig},
    error::{ProvideErrorMetadata, SdkError},
    primitives::ByteStream,
};
use bytes::Bytes;
use http::Uri;
use std::str::FromStr;

use crate::domain::repositories::storage::ObjectStorage;

#[derive(Debug, Clone)]
pub struct S3Config {
    pub endpoint: String,
    pub region: String,
    pub bucket: String,
    pub access_key: String,
    pub secret_key: String,
    pub key_prefix: String,
    pub force_path_style: bool,
    pub connect_timeout_secs: u64,
    pub read_timeout_secs: u64,
}

pub async fn build_s3_client(config: &S3Config) -> Result<Client> {
    let endpoint = format!("{}/", config.endpoint.trim_end_matches('/'));
    Uri::from_str(&endpoint).context("invalid s3 endpoint URL")?;

    let credentials = Credentials::new(
        config.access_key.clone(),
        config.secret_key.clone(),
        None,
        None,
        "s3-compatible",
    );

    let region = Region::new(config.region.clone());
    let shared_config = aws_config::defaults(BehaviorVersion::latest())
        .region(region.clone())
        .credentials_provider(credentials)
        .timeout_config(
            TimeoutConfig::builder()
                .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
                .read_timeout(Duration::from_secs(config.read_timeout_secs))
                .build(),
        )
        .load()
        .await;

    let s3_config = aws_sdk_s3::config::Builder::from(&shared_config)
        .endpoint_url(endpoint)
        .force_path_style(config.force_path_style)
        .region(region)
        .stalled_stream_protection(StalledStreamProtectionConfig::disabled())
        .build();

    Ok(Client::from_conf(s3_config))
}

/// Payment proofs in an S3-compatible bucket. Locators are object keys.
pub struct S3ObjectStorage {
    client: Client,
    bucket: String,
    prefix: String,
}

impl S3ObjectStorage {
    pub async fn new(config: S3Config) -> Result<Self> {
        let client = build_s3_client(&config)
            .await
            .context("failed to build s3 client")?;

        Ok(Self {
            client,
            bucket: config.bucket,
            prefix: normalize_prefix(&config.key_prefix),
        })
    }
}

#[async_trait]
impl ObjectStorage for S3ObjectStorage {
    async fn put_object(&self, key: String, bytes: Bytes, content_type: String) -> Result<String> {
        let object_key = format!("{}{}", self.prefix, key.trim_start_matches('/'));

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&object_key)
            .body(ByteStream::from(bytes))
            .content_type(content_type)
            .send()
            .await
            .map_err(|err| describe_sdk_error("upload", err, &self.bucket, &object_key))?;

        Ok(object_key)
    }

    async fn get_object(&self, locator: String) -> Result<Option<Bytes>> {
        let output = match self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(&locator)
            .send()
            .await
        {
            Ok(output) => output,
            Err(err)
                if err
                    .as_service_error()
                    .is_some_and(|service_err| service_err.is_no_such_key()) =>
            {
                return Ok(None);
            }
            Err(err) => return Err(describe_sdk_error("download", err, &self.bucket, &locator)),
        };

        let body = output
            .body
            .collect()
            .await
            .with_context(|| format!("failed to read s3 object body [key={locator}]"))?;

        Ok(Some(body.into_bytes()))
    }

    async fn delete_object(&self, locator: String) -> Result<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(&locator)
            .send()
            .await
            .map_err(|err| describe_sdk_error("delete", err, &self.bucket, &locator))?;

        Ok(())
    }
}

fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("{}/", trimmed)
    }
}

fn describe_sdk_error<E>(action: &str, err: SdkError<E>, bucket: &str, object_key: &str) -> anyhow::Error
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
{
    if let SdkError::ServiceError(service_err) = &err {
        let status = service_err.raw().status().as_u16();
        let code = service_err.err().code().unwrap_or("unknown");
        let message = service_err.err().message().unwrap_or_default();

        let mut detail = format!("s3 {action} failed (status {status}, code {code})");
        if !message.is_empty() {
            detail.push_str(&format!(": {message}"));
        }
        detail.push_str(&format!(" [bucket={bucket}, key={object_key}]"));

        return anyhow::anyhow!(detail);
    }

    anyhow::Error::new(err).context(format!("s3 {action} failed [bucket={bucket}, key={object_key}]"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_is_normalized_to_a_single_trailing_slash() {
        assert_eq!(normalize_prefix("/proofs/"), "proofs/");
        assert_eq!(normalize_prefix("proofs"), "proofs/");
        assert_eq!(normalize_prefix("//"), "");
    }

    fn config_from_env() -> Option<S3Config> {
        dotenvy::dotenv().ok();
        Some(S3Config {
            endpoint: std::env::var("STORAGE_S3_ENDPOINT").ok()?,
            region: std::env::var("STORAGE_S3_REGION").unwrap_or_else(|_| "us-east-1".into()),
            bucket: std::env::var("STORAGE_S3_BUCKET").ok()?,
            access_key: std::env::var("STORAGE_S3_ACCESS_KEY_ID").ok()?,
            secret_key: std::env::var("STORAGE_S3_SECRET_ACCESS_KEY").ok()?,
            key_prefix: "integration-tests".to_string(),
            force_path_style: true,
            connect_timeout_secs: 10,
            read_timeout_secs: 60,
        })
    }

    #[tokio::test]
    #[ignore = "requires STORAGE_S3_* credentials"]
    async fn stores_reads_and_deletes_a_proof() -> Result<()> {
        let config = config_from_env().context("STORAGE_S3_* env vars are not set")?;
        let storage = S3ObjectStorage::new(config).await?;

        let locator = storage
            .put_object(
                format!("payments/test_{}.png", uuid::Uuid::new_v4()),
                Bytes::from_static(b"\x89PNG test"),
                "image/png".to_string(),
            )
            .await?;
        assert!(locator.starts_with("integration-tests/payments/"));

        let stored = storage.get_object(locator.clone()).await?;
        assert_eq!(stored.as_deref(), Some(&b"\x89PNG test"[..]));

        storage.delete_object(locator.clone()).await?;
        assert!(storage.get_object(locator).await?.is_none());
        Ok(())
    }
}

use std::{
    io::ErrorKind,
    path::{Component, Path, PathBuf},
};

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;

use crate::domain::repositories::storage::ObjectStorage;

/// Payment proofs on the local filesystem. Locators are keys relative to `root`.
pub struct LocalDiskStorage {
    root: PathBuf,
}

impl LocalDiskStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, locator: &str) -> Result<PathBuf> {
        let relative = Path::new(locator.trim_start_matches('/'));
        let is_plain = relative
            .components()
            .all(|component| matches!(component, Component::Normal(_)));
        if locator.trim().is_empty() || !is_plain {
            bail!("invalid storage locator: {locator}");
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl ObjectStorage for LocalDiskStorage {
    async fn put_object(&self, key: String, bytes: Bytes, _content_type: String) -> Result<String> {
        let path = self.resolve(&key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("failed to create directory {}", parent.display()))?;
        }

        fs::write(&path, &bytes)
            .await
            .with_context(|| format!("failed to write {}", path.display()))?;

        Ok(key.trim_start_matches('/').to_string())
    }

    async fn get_object(&self, locator: String) -> Result<Option<Bytes>> {
        let path = self.resolve(&locator)?;
        match fs::read(&path).await {
            Ok(content) => Ok(Some(Bytes::from(content))),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err).with_context(|| format!("failed to read {}", path.display())),
        }
    }

    async fn delete_object(&self, locator: String) -> Result<()> {
        let path = self.resolve(&locator)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err).with_context(|| format!("failed to delete {}", path.display())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_root() -> PathBuf {
        std::env::temp_dir().join(format!("shuttle-storage-{}", uuid::Uuid::new_v4()))
    }

    #[tokio::test]
    async fn round_trips_and_deletes_objects() -> Result<()> {
        let root = temp_root();
        let storage = LocalDiskStorage::new(&root);

        let locator = storage
            .put_object(
                "payments/payment_1.png".to_string(),
                Bytes::from_static(b"png-bytes"),
                "image/png".to_string(),
            )
            .await?;
        assert_eq!(locator, "payments/payment_1.png");
        assert_eq!(
            storage.get_object(locator.clone()).await?,
            Some(Bytes::from_static(b"png-bytes"))
        );

        storage.delete_object(locator.clone()).await?;
        assert_eq!(storage.get_object(locator.clone()).await?, None);
        storage.delete_object(locator).await?;

        fs::remove_dir_all(root).await.ok();
        Ok(())
    }

    #[tokio::test]
    async fn rejects_locators_escaping_the_root() {
        let storage = LocalDiskStorage::new(temp_root());
        assert!(storage.get_object("../etc/passwd".to_string()).await.is_err());
        assert!(storage.get_object("payments/../../x".to_string()).await.is_err());
        assert!(storage.get_object(String::new()).await.is_err());
    }
}

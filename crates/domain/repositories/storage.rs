use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use mockall::automock;

#[async_trait]
#[automock]
pub trait ObjectStorage {
    /// Persists the bytes under `key` and returns the locator to read them back.
    async fn put_object(&self, key: String, bytes: Bytes, content_type: String) -> Result<String>;
    async fn get_object(&self, locator: String) -> Result<Option<Bytes>>;
    async fn delete_object(&self, locator: String) -> Result<()>;
}

//! Thin wrapper over an S3-compatible bucket.
//!
//! One client per [`ObjectStorage`], built lazily on first use and reused
//! afterwards. Every operation logs a failure with the bucket and key and
//! then hands the error back to the caller.

use bytes::Bytes;
use futures::{StreamExt, TryStreamExt};
use object_store::aws::AmazonS3Builder;
use object_store::path::Path;
use object_store::{
    Attribute, Attributes, ObjectMeta, ObjectStore, PutOptions, PutPayload, PutResult,
};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, error};

use crate::error::Result;

/// Largest page S3 returns from a single list request.
pub const DEFAULT_PAGE_SIZE: usize = 1000;

// Connection settings for one bucket
#[derive(Debug, Clone, Deserialize)]
pub struct S3Config {
    pub region: String,
    pub bucket: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    // S3-compatible endpoint (MinIO etc.); plain http is allowed when set
    #[serde(default)]
    pub endpoint: Option<String>,
}

/// A fetched object: body plus the metadata the store returned with it.
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub key: String,
    pub body: Bytes,
    pub meta: ObjectMeta,
    pub content_type: Option<String>,
}

impl StoredObject {
    /// Body as UTF-8 text, if it is valid UTF-8.
    pub fn text(&self) -> Option<&str> {
        std::str::from_utf8(&self.body).ok()
    }
}

/// One page of a listing.
#[derive(Debug, Clone)]
pub struct ObjectPage {
    pub objects: Vec<ObjectMeta>,
    /// Pass back as `marker` to fetch the next page; `None` on the last page.
    pub next_marker: Option<String>,
}

pub struct ObjectStorage {
    config: S3Config,
    client: OnceCell<Arc<dyn ObjectStore>>,
    page_size: usize,
}

impl ObjectStorage {
    pub fn new(config: S3Config) -> Self {
        Self {
            config,
            client: OnceCell::new(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Use an already-built store instead of connecting to S3.
    pub fn with_store(config: S3Config, store: Arc<dyn ObjectStore>) -> Self {
        Self {
            config,
            client: OnceCell::new_with(Some(store)),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn config(&self) -> &S3Config {
        &self.config
    }

    async fn client(&self) -> Result<&Arc<dyn ObjectStore>> {
        self.client
            .get_or_try_init(|| async move {
                let store: Arc<dyn ObjectStore> = build_client(&self.config)?;
                debug!(bucket = %self.config.bucket, region = %self.config.region, "S3 client created");
                Ok(store)
            })
            .await
    }

    /// Upload `data` under `key`, tagging it with `content_type` when given.
    pub async fn put_object(
        &self,
        data: impl Into<Bytes>,
        key: &str,
        content_type: Option<&str>,
    ) -> Result<PutResult> {
        let result: Result<PutResult> = async {
            let client = self.client().await?;

            let mut attributes = Attributes::new();
            if let Some(content_type) = content_type {
                attributes.insert(Attribute::ContentType, content_type.to_string().into());
            }
            let opts = PutOptions {
                attributes,
                ..Default::default()
            };

            let payload = PutPayload::from(data.into());
            Ok(client.put_opts(&Path::from(key), payload, opts).await?)
        }
        .await;

        if let Err(e) = &result {
            error!(bucket = %self.config.bucket, key, error = %e, "Could not upload object");
        }
        result
    }

    pub async fn get_object(&self, key: &str) -> Result<StoredObject> {
        let result: Result<StoredObject> = async {
            let client = self.client().await?;
            let response = client.get(&Path::from(key)).await?;

            let content_type = response
                .attributes
                .get(&Attribute::ContentType)
                .map(|v| v.to_string());
            let meta = response.meta.clone();
            let body = response.bytes().await?;

            Ok(StoredObject {
                key: key.to_string(),
                body,
                meta,
                content_type,
            })
        }
        .await;

        if let Err(e) = &result {
            error!(bucket = %self.config.bucket, key, error = %e, "Could not get object");
        }
        result
    }

    /// List objects under `prefix`, starting strictly after `marker`.
    ///
    /// The prefix is matched on whole path segments: `logs` matches
    /// `logs/a.json` but not `logs-old/a.json`. An empty prefix lists the
    /// whole bucket.
    pub async fn list_objects(&self, prefix: &str, marker: Option<&str>) -> Result<ObjectPage> {
        let result: Result<ObjectPage> = async {
            let client = self.client().await?;
            let prefix = (!prefix.is_empty()).then(|| Path::from(prefix));

            let stream = match marker {
                Some(marker) => client.list_with_offset(prefix.as_ref(), &Path::from(marker)),
                None => client.list(prefix.as_ref()),
            };
            // one extra item tells us whether another page exists
            let mut objects: Vec<ObjectMeta> =
                stream.take(self.page_size + 1).try_collect().await?;

            let next_marker = if objects.len() > self.page_size {
                objects.truncate(self.page_size);
                objects.last().map(|meta| meta.location.to_string())
            } else {
                None
            };

            Ok(ObjectPage {
                objects,
                next_marker,
            })
        }
        .await;

        if let Err(e) = &result {
            error!(bucket = %self.config.bucket, prefix, ?marker, error = %e, "Could not list objects");
        }
        result
    }

    pub async fn delete_object(&self, key: &str) -> Result<()> {
        let result: Result<()> = async {
            let client = self.client().await?;
            client.delete(&Path::from(key)).await?;
            Ok(())
        }
        .await;

        if let Err(e) = &result {
            error!(bucket = %self.config.bucket, key, error = %e, "Could not delete object");
        }
        result
    }
}

fn build_client(config: &S3Config) -> Result<Arc<dyn ObjectStore>> {
    let mut builder = AmazonS3Builder::new()
        .with_region(&config.region)
        .with_bucket_name(&config.bucket)
        .with_access_key_id(&config.access_key_id)
        .with_secret_access_key(&config.secret_access_key);

    if let Some(endpoint) = &config.endpoint {
        builder = builder.with_endpoint(endpoint).with_allow_http(true);
    }

    Ok(Arc::new(builder.build()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use object_store::memory::InMemory;

    fn test_config() -> S3Config {
        S3Config {
            region: "us-east-1".into(),
            bucket: "test-bucket".into(),
            access_key_id: "test".into(),
            secret_access_key: "test".into(),
            endpoint: None,
        }
    }

    fn storage() -> ObjectStorage {
        ObjectStorage::with_store(test_config(), Arc::new(InMemory::new()))
    }

    #[tokio::test]
    async fn put_then_get_keeps_body_and_content_type() {
        let storage = storage();

        storage
            .put_object("{\"a\":1}", "data/a.json", Some("application/json"))
            .await
            .unwrap();
        let object = storage.get_object("data/a.json").await.unwrap();

        assert_eq!(object.text(), Some("{\"a\":1}"));
        assert_eq!(object.content_type.as_deref(), Some("application/json"));
        assert_eq!(object.meta.location.as_ref(), "data/a.json");
    }

    #[tokio::test]
    async fn put_accepts_binary_without_content_type() {
        let storage = storage();

        storage
            .put_object(vec![0u8, 159, 146, 150], "bin/blob", None)
            .await
            .unwrap();
        let object = storage.get_object("bin/blob").await.unwrap();

        assert_eq!(&object.body[..], &[0u8, 159, 146, 150]);
        assert_eq!(object.text(), None);
        assert_eq!(object.content_type, None);
    }

    #[tokio::test]
    async fn get_missing_object_propagates_error() {
        let storage = storage();
        let result = storage.get_object("nope").await;

        assert!(matches!(
            result,
            Err(crate::Error::ObjectStore(object_store::Error::NotFound { .. }))
        ));
    }

    #[tokio::test]
    async fn list_pages_through_prefix_with_markers() {
        let storage = storage().with_page_size(2);
        for key in ["logs/1", "logs/2", "logs/3", "other/1"] {
            storage.put_object("x", key, None).await.unwrap();
        }

        let first = storage.list_objects("logs", None).await.unwrap();
        let keys: Vec<_> = first.objects.iter().map(|m| m.location.to_string()).collect();
        assert_eq!(keys, vec!["logs/1", "logs/2"]);
        assert_eq!(first.next_marker.as_deref(), Some("logs/2"));

        let second = storage
            .list_objects("logs", first.next_marker.as_deref())
            .await
            .unwrap();
        let keys: Vec<_> = second.objects.iter().map(|m| m.location.to_string()).collect();
        assert_eq!(keys, vec!["logs/3"]);
        assert_eq!(second.next_marker, None);
    }

    #[tokio::test]
    async fn empty_prefix_lists_whole_bucket() {
        let storage = storage();
        storage.put_object("x", "a/1", None).await.unwrap();
        storage.put_object("x", "b/1", None).await.unwrap();

        let page = storage.list_objects("", None).await.unwrap();
        assert_eq!(page.objects.len(), 2);
        assert_eq!(page.next_marker, None);
    }

    #[tokio::test]
    async fn delete_removes_object() {
        let storage = storage();
        storage.put_object("x", "gone", None).await.unwrap();

        storage.delete_object("gone").await.unwrap();
        assert!(storage.get_object("gone").await.is_err());
    }

    #[test]
    fn config_deserializes_without_endpoint() {
        let config: S3Config = serde_json::from_str(
            r#"{"region":"eu-west-1","bucket":"b","access_key_id":"k","secret_access_key":"s"}"#,
        )
        .unwrap();

        assert_eq!(config.region, "eu-west-1");
        assert!(config.endpoint.is_none());
    }

    #[tokio::test]
    async fn client_is_built_lazily_and_reused() {
        let storage = ObjectStorage::new(test_config());
        assert!(storage.client.get().is_none());

        let first = Arc::clone(storage.client().await.unwrap());
        let second = Arc::clone(storage.client().await.unwrap());
        assert!(Arc::ptr_eq(&first, &second));
    }
}

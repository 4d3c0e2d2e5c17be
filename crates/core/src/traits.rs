//! ObjectStorageClient trait definition
//!
//! The adapter talks to the storage service only through this trait, so the
//! SDK-backed client can be swapped for a mock in tests.

use std::collections::BTreeMap;
use std::pin::Pin;

use async_trait::async_trait;
use serde::Serialize;
use tokio::io::AsyncRead;

use crate::error::Result;
use crate::listing::{parse_timestamp, RawListing};
use crate::path::encode_key;
use crate::visibility::{CannedAcl, Grant};

/// Detached byte stream of an object's contents
pub type ObjectStream = Pin<Box<dyn AsyncRead + Send>>;

/// Extra parameters for an upload
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PutOptions {
    /// Content-Type header
    pub content_type: Option<String>,

    /// Canned ACL sent with the upload
    pub acl: Option<CannedAcl>,

    /// Additional request headers
    pub headers: BTreeMap<String, String>,
}

/// Headers returned by a HEAD probe, keyed by lower-cased name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ObjectMetadata {
    headers: BTreeMap<String, String>,
}

impl ObjectMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a header, replacing any previous value
    pub fn insert(&mut self, name: &str, value: impl Into<String>) {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
    }

    /// Builder-style [`insert`](Self::insert)
    pub fn with(mut self, name: &str, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    /// Look a header up case-insensitively
    pub fn get(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Object size from `Content-Length`
    pub fn content_length(&self) -> Option<u64> {
        self.get("content-length")?.trim().parse().ok()
    }

    /// MIME type from `Content-Type`
    pub fn content_type(&self) -> Option<&str> {
        self.get("content-type")
    }

    /// Unix timestamp from `Last-Modified`
    pub fn last_modified(&self) -> Option<i64> {
        parse_timestamp(self.get("last-modified")?)
    }
}

/// Fully-qualified locator of a copy source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopySource {
    /// Full bucket name including the app id suffix
    pub bucket: String,
    pub region: String,
    /// Physical key of the source object
    pub key: String,
}

impl CopySource {
    pub fn new(bucket: impl Into<String>, region: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            region: region.into(),
            key: key.into(),
        }
    }

    /// `<bucket>.cos.<region>.myqcloud.com/<key>`, as the copy-source header expects
    pub fn locator(&self) -> String {
        format!(
            "{}.cos.{}.myqcloud.com/{}",
            self.bucket,
            self.region,
            encode_key(&self.key)
        )
    }

    /// `<bucket>/<key>`, for S3-compatible servers addressed path-style
    pub fn path_style(&self) -> String {
        format!("{}/{}", self.bucket, encode_key(&self.key))
    }
}

/// Per-key result of a batch delete
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchDeleteOutcome {
    pub deleted: Vec<String>,
    pub failed: Vec<String>,
}

impl BatchDeleteOutcome {
    /// Whether every requested key was removed
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Capability interface over the object storage service
///
/// Keys passed to these methods are physical keys; path virtualization happens
/// in the adapter.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStorageClient: Send + Sync {
    /// Upload an object
    async fn put_object(&self, key: &str, body: Vec<u8>, options: PutOptions) -> Result<()>;

    /// Fetch an object's full contents
    async fn get_object(&self, key: &str) -> Result<Vec<u8>>;

    /// Fetch an object as a byte stream
    async fn get_object_stream(&self, key: &str) -> Result<ObjectStream>;

    /// Probe an object's headers
    async fn head_object(&self, key: &str) -> Result<ObjectMetadata>;

    /// Delete a single object
    async fn delete_object(&self, key: &str) -> Result<()>;

    /// Delete several objects in one request
    async fn delete_objects(&self, keys: Vec<String>) -> Result<BatchDeleteOutcome>;

    /// List one page of objects under a prefix; an empty delimiter lists deeply
    async fn list_objects(&self, prefix: &str, delimiter: &str) -> Result<RawListing>;

    /// Server-side copy
    async fn copy_object(&self, source: &CopySource, dest_key: &str) -> Result<()>;

    /// Read an object's ACL grants
    async fn get_object_acl(&self, key: &str) -> Result<Vec<Grant>>;

    /// Replace an object's ACL with a canned one
    async fn put_object_acl(&self, key: &str, acl: CannedAcl) -> Result<()>;

    /// Non-expiring browsable URL
    fn object_url(&self, key: &str, scheme: &str) -> Result<String>;

    /// URL signed until `expires_at`
    async fn presigned_url(
        &self,
        key: &str,
        expires_at: jiff::Timestamp,
        scheme: &str,
    ) -> Result<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_case_insensitive() {
        let meta = ObjectMetadata::new()
            .with("Content-Length", "42")
            .with("Content-Type", "text/plain")
            .with("Last-Modified", "Wed, 21 Oct 2015 07:28:00 GMT");

        assert_eq!(meta.get("content-type"), Some("text/plain"));
        assert_eq!(meta.content_length(), Some(42));
        assert_eq!(meta.content_type(), Some("text/plain"));
        assert_eq!(meta.last_modified(), Some(1_445_412_480));
    }

    #[test]
    fn test_metadata_missing_headers() {
        let meta = ObjectMetadata::new().with("ETag", "\"abc\"");
        assert!(!meta.is_empty());
        assert_eq!(meta.content_length(), None);
        assert_eq!(meta.content_type(), None);
        assert_eq!(meta.last_modified(), None);
    }

    #[test]
    fn test_copy_source_locator() {
        let source = CopySource::new("photos-1250000000", "ap-guangzhou", "root/a b/c.txt");
        assert_eq!(
            source.locator(),
            "photos-1250000000.cos.ap-guangzhou.myqcloud.com/root/a%20b/c.txt"
        );
        assert_eq!(source.path_style(), "photos-1250000000/root/a%20b/c.txt");
    }

    #[test]
    fn test_batch_outcome() {
        let outcome = BatchDeleteOutcome {
            deleted: vec!["a".into()],
            failed: vec![],
        };
        assert!(outcome.is_complete());
    }
}

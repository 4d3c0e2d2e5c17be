//! Filesystem-style adapter over a COS bucket
//!
//! [`CosAdapter`] resolves logical paths to physical keys, forwards each
//! operation to an [`ObjectStorageClient`] and shapes the response. Failures are
//! returned as typed errors; `NotFound` is kept distinct from transport errors.

use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use futures::TryStreamExt;
use serde::Serialize;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::listing::{normalize, FileEntry, ListingPage};
use crate::path::PathPrefixer;
use crate::traits::{
    BatchDeleteOutcome, CopySource, ObjectMetadata, ObjectStorageClient, ObjectStream, PutOptions,
};
use crate::urls::{Clock, Expiration, SystemClock, UrlBuilder};
use crate::visibility::{from_grants, to_acl, Visibility};

/// Lifetime of the signed URL used for CDN-fronted reads
const CDN_READ_EXPIRATION: &str = "+5 minutes";

/// Fallback content type when none is given and none can be guessed
const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Options for uploads and directory markers
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteOptions {
    /// Visibility applied with the upload
    pub visibility: Option<Visibility>,

    /// Explicit content type; guessed from the extension when absent
    pub content_type: Option<String>,

    /// Extra request headers
    pub headers: BTreeMap<String, String>,
}

impl WriteOptions {
    pub fn with_visibility(visibility: Visibility) -> Self {
        Self {
            visibility: Some(visibility),
            ..Default::default()
        }
    }
}

/// Result of a successful upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WriteDescriptor {
    /// Physical key the object was stored under
    pub path: String,
    #[serde(skip)]
    pub contents: Vec<u8>,
    pub mimetype: String,
    pub size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility: Option<Visibility>,
}

/// Filesystem-style adapter over an object storage client
pub struct CosAdapter {
    config: Config,
    prefixer: PathPrefixer,
    urls: UrlBuilder,
    client: Arc<dyn ObjectStorageClient>,
    http: OnceLock<reqwest::Client>,
}

impl std::fmt::Debug for CosAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CosAdapter")
            .field("bucket", &self.config.full_bucket())
            .field("region", &self.config.region)
            .field("prefix", &self.prefixer.prefix())
            .finish_non_exhaustive()
    }
}

impl CosAdapter {
    /// Create an adapter around an already-built client
    pub fn new(config: Config, client: Arc<dyn ObjectStorageClient>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            prefixer: PathPrefixer::new(config.prefix.as_deref()),
            urls: UrlBuilder::new(&config, Arc::new(SystemClock)),
            client,
            http: OnceLock::new(),
            config,
        })
    }

    /// Replace the clock used to resolve relative expirations
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.urls = UrlBuilder::new(&self.config, clock);
        self
    }

    /// Replace the object storage client
    pub fn with_client(mut self, client: Arc<dyn ObjectStorageClient>) -> Self {
        self.client = client;
        self
    }

    /// Use a preconfigured HTTP client for CDN-fronted reads
    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = OnceLock::from(http);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn client(&self) -> &dyn ObjectStorageClient {
        self.client.as_ref()
    }

    pub fn prefixer(&self) -> &PathPrefixer {
        &self.prefixer
    }

    /// Upload `contents` to `path`
    pub async fn write(
        &self,
        path: &str,
        contents: impl Into<Vec<u8>>,
        options: WriteOptions,
    ) -> Result<WriteDescriptor> {
        let key = self.prefixer.apply(path);
        let contents = contents.into();
        let mimetype = options
            .content_type
            .clone()
            .or_else(|| mime_guess::from_path(path).first_raw().map(str::to_string))
            .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());

        let put = PutOptions {
            content_type: Some(mimetype.clone()),
            acl: options.visibility.map(to_acl),
            headers: options.headers,
        };

        tracing::debug!(key = %key, size = contents.len(), "put object");
        let result = self.client.put_object(&key, contents.clone(), put).await;
        logged("write", &key, result)?;

        Ok(WriteDescriptor {
            size: contents.len() as u64,
            path: key,
            contents,
            mimetype,
            visibility: options.visibility,
        })
    }

    /// Upload everything `reader` yields; the stream is drained before the upload starts
    pub async fn write_stream<R>(
        &self,
        path: &str,
        mut reader: R,
        options: WriteOptions,
    ) -> Result<WriteDescriptor>
    where
        R: AsyncRead + Unpin + Send,
    {
        let mut contents = Vec::new();
        reader.read_to_end(&mut contents).await?;
        self.write(path, contents, options).await
    }

    /// Overwrite `path`; same as [`write`](Self::write)
    pub async fn update(
        &self,
        path: &str,
        contents: impl Into<Vec<u8>>,
        options: WriteOptions,
    ) -> Result<WriteDescriptor> {
        self.write(path, contents, options).await
    }

    /// Overwrite `path` from a stream; same as [`write_stream`](Self::write_stream)
    pub async fn update_stream<R>(
        &self,
        path: &str,
        reader: R,
        options: WriteOptions,
    ) -> Result<WriteDescriptor>
    where
        R: AsyncRead + Unpin + Send,
    {
        self.write_stream(path, reader, options).await
    }

    /// Fetch the full contents of `path`
    pub async fn read(&self, path: &str) -> Result<Vec<u8>> {
        if self.config.read_from_cdn {
            let response = self.fetch_signed(path).await?;
            let bytes = response
                .bytes()
                .await
                .map_err(|e| Error::Transport(e.to_string()))?;
            return Ok(bytes.to_vec());
        }

        let key = self.prefixer.apply(path);
        logged("read", &key, self.client.get_object(&key).await)
    }

    /// Fetch `path` as a byte stream
    pub async fn read_stream(&self, path: &str) -> Result<ObjectStream> {
        if self.config.read_from_cdn {
            let response = self.fetch_signed(path).await?;
            let stream = response.bytes_stream().map_err(std::io::Error::other);
            return Ok(Box::pin(tokio_util::io::StreamReader::new(stream)));
        }

        let key = self.prefixer.apply(path);
        logged("read_stream", &key, self.client.get_object_stream(&key).await)
    }

    /// Server-side copy of `path` to `new_path`
    pub async fn copy(&self, path: &str, new_path: &str) -> Result<()> {
        let source = CopySource::new(
            self.config.full_bucket(),
            self.config.region.clone(),
            self.prefixer.apply(path),
        );
        let dest = self.prefixer.apply(new_path);

        tracing::debug!(source = %source.key, dest = %dest, "copy object");
        logged("copy", &dest, self.client.copy_object(&source, &dest).await)
    }

    /// Copy `path` to `new_path`, then delete `path`
    ///
    /// A failed delete after a successful copy is reported as
    /// [`Error::PartialRename`]; both objects exist at that point.
    pub async fn rename(&self, path: &str, new_path: &str) -> Result<()> {
        self.copy(path, new_path).await?;

        self.delete(path).await.map_err(|e| Error::PartialRename {
            from: path.to_string(),
            to: new_path.to_string(),
            reason: e.to_string(),
        })
    }

    /// Delete a single object
    pub async fn delete(&self, path: &str) -> Result<()> {
        let key = self.prefixer.apply(path);
        logged("delete", &key, self.client.delete_object(&key).await)
    }

    /// Delete every object directly under `dirname`
    ///
    /// Only one level is listed; nested virtual directories are left alone.
    pub async fn delete_dir(&self, dirname: &str) -> Result<BatchDeleteOutcome> {
        if dirname.trim_matches('/').is_empty() {
            return Err(Error::InvalidPath(
                "refusing to delete the root directory".into(),
            ));
        }

        let prefix = self.prefixer.directory(dirname);
        let listing = logged(
            "delete_dir",
            &prefix,
            self.client.list_objects(&prefix, "/").await,
        )?;

        let keys: Vec<String> = listing
            .contents
            .into_vec()
            .into_iter()
            .map(|object| object.key)
            .filter(|key| !key.is_empty())
            .collect();

        if keys.is_empty() {
            tracing::debug!(prefix = %prefix, "nothing to delete");
            return Ok(BatchDeleteOutcome::default());
        }

        tracing::debug!(prefix = %prefix, count = keys.len(), "batch delete");
        let outcome = logged(
            "delete_dir",
            &prefix,
            self.client.delete_objects(keys).await,
        )?;

        if outcome.is_complete() {
            Ok(outcome)
        } else {
            tracing::warn!(prefix = %prefix, failed = ?outcome.failed, "batch delete incomplete");
            Err(Error::PartialBatchFailure {
                deleted: outcome.deleted,
                failed: outcome.failed,
            })
        }
    }

    /// Create a zero-byte directory marker at `dirname/`
    pub async fn create_dir(&self, dirname: &str, options: WriteOptions) -> Result<()> {
        if dirname.trim_matches('/').is_empty() {
            return Err(Error::InvalidPath("directory name cannot be empty".into()));
        }

        let key = self.prefixer.directory(dirname);
        let put = PutOptions {
            content_type: options.content_type,
            acl: options.visibility.map(to_acl),
            headers: options.headers,
        };
        logged(
            "create_dir",
            &key,
            self.client.put_object(&key, Vec::new(), put).await,
        )
    }

    /// Probe the object's headers
    pub async fn get_metadata(&self, path: &str) -> Result<ObjectMetadata> {
        let key = self.prefixer.apply(path);
        logged("get_metadata", &key, self.client.head_object(&key).await)
    }

    /// Size in bytes, `None` when the service did not report one
    pub async fn get_size(&self, path: &str) -> Result<Option<u64>> {
        Ok(self.get_metadata(path).await?.content_length())
    }

    /// MIME type, `None` when the service did not report one
    pub async fn get_mimetype(&self, path: &str) -> Result<Option<String>> {
        Ok(self
            .get_metadata(path)
            .await?
            .content_type()
            .map(str::to_string))
    }

    /// Last-modified Unix timestamp, `None` when the service did not report one
    pub async fn get_timestamp(&self, path: &str) -> Result<Option<i64>> {
        Ok(self.get_metadata(path).await?.last_modified())
    }

    /// Whether `path` exists
    pub async fn has(&self, path: &str) -> Result<bool> {
        match self.get_metadata(path).await {
            Ok(meta) => Ok(!meta.is_empty()),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Visibility derived from the object's ACL grants
    pub async fn get_visibility(&self, path: &str) -> Result<Visibility> {
        let key = self.prefixer.apply(path);
        let grants = logged("get_visibility", &key, self.client.get_object_acl(&key).await)?;
        Ok(from_grants(&grants))
    }

    /// Replace the object's ACL with the one `visibility` maps to
    pub async fn set_visibility(&self, path: &str, visibility: Visibility) -> Result<()> {
        let key = self.prefixer.apply(path);
        logged(
            "set_visibility",
            &key,
            self.client.put_object_acl(&key, to_acl(visibility)).await,
        )
    }

    /// Entries under `directory`, one level deep unless `recursive`
    pub async fn list_contents(&self, directory: &str, recursive: bool) -> Result<Vec<FileEntry>> {
        Ok(self.list_page(directory, recursive).await?.entries)
    }

    /// Like [`list_contents`](Self::list_contents), also returning the subdirectories
    pub async fn list_page(&self, directory: &str, recursive: bool) -> Result<ListingPage> {
        let prefix = self.prefixer.directory(directory);
        let delimiter = if recursive { "" } else { "/" };

        tracing::debug!(prefix = %prefix, recursive, "list objects");
        let raw = logged(
            "list_contents",
            &prefix,
            self.client.list_objects(&prefix, delimiter).await,
        )?;
        Ok(normalize(raw, &self.prefixer))
    }

    /// Default URL for `path`: CDN, signed or public per configuration
    pub async fn get_url(&self, path: &str) -> Result<String> {
        self.urls.url(self.client.as_ref(), path).await
    }

    /// URL for `path` signed until `expiration`
    pub async fn get_signed_url(
        &self,
        path: &str,
        expiration: impl Into<Expiration>,
    ) -> Result<String> {
        self.urls
            .signed_url(self.client.as_ref(), path, expiration.into())
            .await
    }

    fn http(&self) -> Result<&reqwest::Client> {
        if let Some(http) = self.http.get() {
            return Ok(http);
        }

        let mut builder = reqwest::Client::builder();
        if let Some(secs) = self.config.timeout {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http = builder
            .build()
            .map_err(|e| Error::Transport(e.to_string()))?;
        Ok(self.http.get_or_init(|| http))
    }

    /// GET `path` through a short-lived signed URL
    async fn fetch_signed(&self, path: &str) -> Result<reqwest::Response> {
        let url = self.get_signed_url(path, CDN_READ_EXPIRATION).await?;
        let response = self
            .http()?
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::Transport(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(Error::NotFound(self.prefixer.apply(path)));
        }
        response
            .error_for_status()
            .map_err(|e| Error::Transport(e.to_string()))
    }
}

/// Log a failed operation; missing objects are expected and stay at debug
fn logged<T>(operation: &'static str, key: &str, result: Result<T>) -> Result<T> {
    if let Err(e) = &result {
        if e.is_not_found() {
            tracing::debug!(operation, key, "object not found");
        } else {
            tracing::warn!(operation, key, error = %e, "operation failed");
        }
    }
    result
}

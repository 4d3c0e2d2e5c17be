//! COS client implementation
//!
//! Wraps aws-sdk-s3 pointed at the COS S3-compatible endpoint and implements
//! the ObjectStorageClient trait from cosfs-core.

use std::collections::BTreeMap;
use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use aws_sdk_s3::config::http::HttpResponse;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{Delete, ObjectCannedAcl, ObjectIdentifier, StorageClass};
use aws_smithy_types::date_time::Format;
use url::Url;

use cosfs_core::path::encode_key;
use cosfs_core::{
    BatchDeleteOutcome, CannedAcl, Config, CopySource, Error, Grant, ObjectMetadata,
    ObjectStorageClient, ObjectStream, PutOptions, RawListing, RawObject, RawPrefix, Result,
};

/// Prefix of user-defined metadata headers
const META_HEADER_PREFIX: &str = "x-cos-meta-";

/// COS client wrapper
pub struct CosClient {
    inner: aws_sdk_s3::Client,
    bucket: String,
    region: String,
    endpoint: Option<String>,
}

impl std::fmt::Debug for CosClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CosClient")
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl CosClient {
    /// Create a new client from an adapter configuration
    pub async fn new(config: &Config) -> Result<Self> {
        config.validate()?;

        let credentials = aws_credential_types::Credentials::new(
            config.credentials.secret_id.clone(),
            config.credentials.secret_key.clone(),
            config.credentials.token.clone(),
            None, // expiry
            "cosfs-static-credentials",
        );

        let endpoint = config
            .endpoint
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .map(|e| e.trim_end_matches('/').to_string());
        let endpoint_url = endpoint
            .clone()
            .unwrap_or_else(|| format!("https://cos.{}.myqcloud.com", config.region));

        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .credentials_provider(credentials)
            .region(aws_config::Region::new(config.region.clone()))
            .endpoint_url(&endpoint_url);

        if let Some(secs) = config.timeout {
            loader = loader.timeout_config(
                aws_config::timeout::TimeoutConfig::builder()
                    .operation_timeout(Duration::from_secs(secs))
                    .build(),
            );
        }

        let sdk_config = loader.load().await;

        // COS hosts buckets as subdomains; custom endpoints are assumed path-style
        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(endpoint.is_some())
            .build();

        tracing::debug!(endpoint = %endpoint_url, bucket = %config.full_bucket(), "cos client ready");

        Ok(Self {
            inner: aws_sdk_s3::Client::from_conf(s3_config),
            bucket: config.full_bucket(),
            region: config.region.clone(),
            endpoint,
        })
    }

    /// Full bucket name requests are sent to
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    fn copy_source(&self, source: &CopySource) -> String {
        if self.endpoint.is_some() {
            source.path_style()
        } else {
            source.locator()
        }
    }
}

/// Turn an SDK error into `NotFound` or `Transport`
fn classify<E>(err: SdkError<E, HttpResponse>, key: &str) -> Error
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
{
    let not_found = matches!(err.code(), Some("NoSuchKey" | "NotFound"))
        || err
            .raw_response()
            .is_some_and(|response| response.status().as_u16() == 404);

    if not_found {
        Error::NotFound(key.to_string())
    } else {
        Error::Transport(DisplayErrorContext(err).to_string())
    }
}

fn http_date(value: &aws_smithy_types::DateTime) -> Option<String> {
    value.fmt(Format::HttpDate).ok()
}

fn apply_scheme(url: &str, scheme: &str) -> Result<String> {
    let mut url = Url::parse(url)?;
    url.set_scheme(scheme)
        .map_err(|()| Error::Config(format!("unsupported scheme \"{scheme}\"")))?;
    Ok(url.to_string())
}

#[async_trait]
impl ObjectStorageClient for CosClient {
    async fn put_object(&self, key: &str, body: Vec<u8>, options: PutOptions) -> Result<()> {
        let mut request = self
            .inner
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(body));

        if let Some(ct) = &options.content_type {
            request = request.content_type(ct);
        }

        if let Some(acl) = options.acl {
            request = request.acl(ObjectCannedAcl::from(acl.as_str()));
        }

        let mut extra = BTreeMap::new();
        for (name, value) in options.headers {
            let lower = name.to_ascii_lowercase();
            request = match lower.as_str() {
                "cache-control" => request.cache_control(value),
                "content-disposition" => request.content_disposition(value),
                "content-encoding" => request.content_encoding(value),
                "content-language" => request.content_language(value),
                "content-type" => request.content_type(value),
                "x-cos-storage-class" => request.storage_class(StorageClass::from(value.as_str())),
                _ => match lower.strip_prefix(META_HEADER_PREFIX) {
                    Some(meta) => request.metadata(meta, value),
                    None => {
                        extra.insert(lower.clone(), value);
                        request
                    }
                },
            };
        }

        let result = if extra.is_empty() {
            request.send().await
        } else {
            request
                .customize()
                .mutate_request(move |req| {
                    for (name, value) in &extra {
                        if let Err(e) = req.headers_mut().try_insert(name.clone(), value.clone()) {
                            tracing::warn!(header = %name, error = %e, "skipping invalid header");
                        }
                    }
                })
                .send()
                .await
        };

        result.map_err(|e| classify(e, key))?;
        Ok(())
    }

    async fn get_object(&self, key: &str) -> Result<Vec<u8>> {
        let response = self
            .inner
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| classify(e, key))?;

        let data = response
            .body
            .collect()
            .await
            .map_err(|e| Error::Transport(e.to_string()))?
            .into_bytes()
            .to_vec();

        Ok(data)
    }

    async fn get_object_stream(&self, key: &str) -> Result<ObjectStream> {
        let response = self
            .inner
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| classify(e, key))?;

        Ok(Box::pin(response.body.into_async_read()))
    }

    async fn head_object(&self, key: &str) -> Result<ObjectMetadata> {
        let response = self
            .inner
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| classify(e, key))?;

        let mut meta = ObjectMetadata::new();

        if let Some(length) = response.content_length() {
            meta.insert("content-length", length.to_string());
        }
        if let Some(ct) = response.content_type() {
            meta.insert("content-type", ct);
        }
        if let Some(modified) = response.last_modified().and_then(http_date) {
            meta.insert("last-modified", modified);
        }
        if let Some(etag) = response.e_tag() {
            meta.insert("etag", etag);
        }
        if let Some(cc) = response.cache_control() {
            meta.insert("cache-control", cc);
        }
        if let Some(ce) = response.content_encoding() {
            meta.insert("content-encoding", ce);
        }
        if let Some(cd) = response.content_disposition() {
            meta.insert("content-disposition", cd);
        }
        if let Some(sc) = response.storage_class() {
            meta.insert("x-cos-storage-class", sc.as_str());
        }
        if let Some(user) = response.metadata() {
            for (name, value) in user {
                meta.insert(&format!("{META_HEADER_PREFIX}{name}"), value);
            }
        }

        Ok(meta)
    }

    async fn delete_object(&self, key: &str) -> Result<()> {
        self.inner
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| classify(e, key))?;

        Ok(())
    }

    async fn delete_objects(&self, keys: Vec<String>) -> Result<BatchDeleteOutcome> {
        if keys.is_empty() {
            return Ok(BatchDeleteOutcome::default());
        }

        let objects = keys
            .iter()
            .map(|k| ObjectIdentifier::builder().key(k).build())
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| Error::InvalidPath(e.to_string()))?;

        let delete = Delete::builder()
            .set_objects(Some(objects))
            .build()
            .map_err(|e| Error::InvalidPath(e.to_string()))?;

        let response = self
            .inner
            .delete_objects()
            .bucket(&self.bucket)
            .delete(delete)
            .send()
            .await
            .map_err(|e| classify(e, &self.bucket))?;

        let deleted: Vec<String> = response
            .deleted()
            .iter()
            .filter_map(|d| d.key().map(str::to_string))
            .collect();

        let failed: Vec<String> = response
            .errors()
            .iter()
            .filter_map(|e| e.key().map(str::to_string))
            .collect();

        if !failed.is_empty() {
            tracing::warn!("Failed to delete some objects: {:?}", failed);
        }

        Ok(BatchDeleteOutcome { deleted, failed })
    }

    async fn list_objects(&self, prefix: &str, delimiter: &str) -> Result<RawListing> {
        let mut request = self.inner.list_objects().bucket(&self.bucket);

        if !prefix.is_empty() {
            request = request.prefix(prefix);
        }

        // No delimiter lists every key below the prefix
        if !delimiter.is_empty() {
            request = request.delimiter(delimiter);
        }

        let response = request.send().await.map_err(|e| classify(e, prefix))?;

        let common_prefixes: Vec<RawPrefix> = response
            .common_prefixes()
            .iter()
            .filter_map(|p| p.prefix())
            .map(|p| RawPrefix {
                prefix: p.to_string(),
            })
            .collect();

        let contents: Vec<RawObject> = response
            .contents()
            .iter()
            .map(|object| RawObject {
                key: object.key().unwrap_or_default().to_string(),
                size: object.size().and_then(|s| u64::try_from(s).ok()),
                last_modified: object
                    .last_modified()
                    .and_then(|d| d.fmt(Format::DateTime).ok()),
            })
            .collect();

        Ok(RawListing {
            common_prefixes: common_prefixes.into(),
            contents: contents.into(),
            is_truncated: response.is_truncated().unwrap_or(false),
        })
    }

    async fn copy_object(&self, source: &CopySource, dest_key: &str) -> Result<()> {
        self.inner
            .copy_object()
            .copy_source(self.copy_source(source))
            .bucket(&self.bucket)
            .key(dest_key)
            .send()
            .await
            .map_err(|e| classify(e, &source.key))?;

        Ok(())
    }

    async fn get_object_acl(&self, key: &str) -> Result<Vec<Grant>> {
        let response = self
            .inner
            .get_object_acl()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| classify(e, key))?;

        let grants = response
            .grants()
            .iter()
            .map(|grant| Grant {
                permission: grant
                    .permission()
                    .map(|p| p.as_str().to_string())
                    .unwrap_or_default(),
                grantee_uri: grant.grantee().and_then(|g| g.uri()).map(str::to_string),
                grantee_id: grant.grantee().and_then(|g| g.id()).map(str::to_string),
            })
            .collect();

        Ok(grants)
    }

    async fn put_object_acl(&self, key: &str, acl: CannedAcl) -> Result<()> {
        self.inner
            .put_object_acl()
            .bucket(&self.bucket)
            .key(key)
            .acl(ObjectCannedAcl::from(acl.as_str()))
            .send()
            .await
            .map_err(|e| classify(e, key))?;

        Ok(())
    }

    fn object_url(&self, key: &str, scheme: &str) -> Result<String> {
        let base = match &self.endpoint {
            Some(endpoint) => format!("{endpoint}/{}", self.bucket),
            None => format!("https://{}.cos.{}.myqcloud.com", self.bucket, self.region),
        };
        apply_scheme(&format!("{base}/{}", encode_key(key)), scheme)
    }

    async fn presigned_url(
        &self,
        key: &str,
        expires_at: jiff::Timestamp,
        scheme: &str,
    ) -> Result<String> {
        let now = jiff::Timestamp::now();
        let secs = expires_at.duration_since(now).as_secs();
        if secs <= 0 {
            return Err(Error::InvalidExpiration(format!(
                "{expires_at} is not in the future"
            )));
        }

        let presigning = PresigningConfig::builder()
            .start_time(SystemTime::from(now))
            .expires_in(Duration::from_secs(secs.unsigned_abs()))
            .build()
            .map_err(|e| Error::InvalidExpiration(e.to_string()))?;

        let request = self
            .inner
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(presigning)
            .await
            .map_err(|e| classify(e, key))?;

        apply_scheme(request.uri(), scheme)
    }
}

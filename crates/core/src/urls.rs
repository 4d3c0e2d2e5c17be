//! Object URL construction
//!
//! Public URLs either point at the CDN host or are built by the client.
//! Signed URLs are always signed by the client; with a CDN configured the
//! signed path and query are re-hosted under the CDN. Path-style URLs from an
//! endpoint override lose their leading bucket segment on the way, so both
//! kinds of CDN URL address the same key.

use std::fmt;
use std::sync::Arc;

use jiff::tz::TimeZone;
use jiff::{Span, Timestamp};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::path::PathPrefixer;
use crate::traits::ObjectStorageClient;

/// Source of the current time
pub trait Clock: Send + Sync + fmt::Debug {
    fn now(&self) -> Timestamp;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}

/// Clock frozen at one instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub Timestamp);

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        self.0
    }
}

/// When a signed URL stops being valid
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expiration {
    /// Absolute instant
    At(Timestamp),
    /// Unix seconds
    Epoch(i64),
    /// Date/time string (`2026-10-18T12:00:00Z`, an HTTP date, `2026-10-18 12:00`)
    /// or relative offset (`+60 minutes`, `+5 min`, `-1 hour`)
    Text(String),
}

impl From<Timestamp> for Expiration {
    fn from(ts: Timestamp) -> Self {
        Expiration::At(ts)
    }
}

impl From<i64> for Expiration {
    fn from(epoch: i64) -> Self {
        Expiration::Epoch(epoch)
    }
}

impl From<&str> for Expiration {
    fn from(text: &str) -> Self {
        Expiration::Text(text.to_string())
    }
}

impl From<String> for Expiration {
    fn from(text: String) -> Self {
        Expiration::Text(text)
    }
}

impl Expiration {
    /// Resolve to an absolute instant relative to `now`
    pub fn resolve(&self, now: Timestamp) -> Result<Timestamp> {
        match self {
            Expiration::At(ts) => Ok(*ts),
            Expiration::Epoch(epoch) => from_epoch(*epoch),
            Expiration::Text(text) => resolve_text(text.trim(), now),
        }
    }
}

fn from_epoch(epoch: i64) -> Result<Timestamp> {
    Timestamp::from_second(epoch).map_err(|e| Error::InvalidExpiration(e.to_string()))
}

fn resolve_text(text: &str, now: Timestamp) -> Result<Timestamp> {
    if text.is_empty() {
        return Err(Error::InvalidExpiration("empty expiration".into()));
    }

    if let Ok(epoch) = text.parse::<i64>() {
        return from_epoch(epoch);
    }

    if let Some(rest) = text.strip_prefix('+') {
        return offset(now, rest, false);
    }
    if let Some(rest) = text.strip_prefix('-') {
        return offset(now, rest, true);
    }

    parse_absolute(text).or_else(|_| offset(now, text, false))
}

fn offset(now: Timestamp, span: &str, negative: bool) -> Result<Timestamp> {
    let span: Span = span
        .trim()
        .parse()
        .map_err(|e| Error::InvalidExpiration(format!("\"{span}\": {e}")))?;
    let span = if negative { span.negate() } else { span };

    now.to_zoned(TimeZone::UTC)
        .checked_add(span)
        .map(|zoned| zoned.timestamp())
        .map_err(|e| Error::InvalidExpiration(e.to_string()))
}

fn parse_absolute(text: &str) -> Result<Timestamp> {
    if let Ok(ts) = text.parse::<Timestamp>() {
        return Ok(ts);
    }
    if let Ok(zoned) = jiff::fmt::rfc2822::parse(text) {
        return Ok(zoned.timestamp());
    }
    if let Ok(dt) = text.parse::<jiff::civil::DateTime>() {
        if let Ok(zoned) = dt.to_zoned(TimeZone::UTC) {
            return Ok(zoned.timestamp());
        }
    }
    if let Ok(date) = text.parse::<jiff::civil::Date>() {
        if let Ok(zoned) = date.to_zoned(TimeZone::UTC) {
            return Ok(zoned.timestamp());
        }
    }

    Err(Error::InvalidExpiration(format!(
        "\"{text}\" is neither a date/time nor an offset"
    )))
}

/// Builds public and signed object URLs
#[derive(Debug, Clone)]
pub struct UrlBuilder {
    prefixer: PathPrefixer,
    cdn: Option<String>,
    scheme: String,
    signed_by_default: bool,
    default_expiration: String,
    path_style_bucket: Option<String>,
    clock: Arc<dyn Clock>,
}

impl UrlBuilder {
    pub fn new(config: &Config, clock: Arc<dyn Clock>) -> Self {
        Self {
            prefixer: PathPrefixer::new(config.prefix.as_deref()),
            cdn: config
                .cdn_host()
                .map(|cdn| cdn.trim_end_matches('/').to_string()),
            scheme: config.scheme.clone(),
            signed_by_default: config.signed_url,
            default_expiration: config.signed_url_expires.clone(),
            path_style_bucket: config.path_style().then(|| config.full_bucket()),
            clock,
        }
    }

    /// Non-expiring URL for a logical path
    ///
    /// With a CDN host the storage endpoint is bypassed entirely.
    pub fn public_url(&self, client: &dyn ObjectStorageClient, path: &str) -> Result<String> {
        let key = self.prefixer.apply(path);
        match &self.cdn {
            Some(cdn) => Ok(format!("{cdn}/{}", key.trim_start_matches('/'))),
            None => client.object_url(&key, &self.scheme),
        }
    }

    /// URL signed until `expiration`, re-hosted under the CDN when one is set
    pub async fn signed_url(
        &self,
        client: &dyn ObjectStorageClient,
        path: &str,
        expiration: Expiration,
    ) -> Result<String> {
        let now = self.clock.now();
        let expires_at = expiration.resolve(now)?;
        if expires_at <= now {
            return Err(Error::InvalidExpiration(format!(
                "{expires_at} is not in the future"
            )));
        }

        let key = self.prefixer.apply(path);
        let signed = client.presigned_url(&key, expires_at, &self.scheme).await?;
        tracing::debug!(key = %key, %expires_at, "signed object url");

        match &self.cdn {
            Some(cdn) => rehost(cdn, &signed, self.path_style_bucket.as_deref()),
            None => Ok(signed),
        }
    }

    /// The default URL: CDN, else signed when configured, else public
    pub async fn url(&self, client: &dyn ObjectStorageClient, path: &str) -> Result<String> {
        if self.cdn.is_none() && self.signed_by_default {
            let expiration = Expiration::Text(self.default_expiration.clone());
            return self.signed_url(client, path, expiration).await;
        }
        self.public_url(client, path)
    }
}

/// Move a signed URL's decoded path and its query under the CDN host
fn rehost(cdn: &str, signed: &str, bucket: Option<&str>) -> Result<String> {
    let url = ::url::Url::parse(signed)?;
    let path = urlencoding::decode(url.path())
        .map_err(|e| Error::InvalidResponse(format!("signed url path: {e}")))?;
    let mut path = path.trim_start_matches('/');
    if let Some(rest) = bucket.and_then(|b| path.strip_prefix(b)) {
        if let Some(key) = rest.strip_prefix('/') {
            path = key;
        }
    }

    Ok(match url.query() {
        Some(query) if !query.is_empty() => format!("{cdn}/{path}?{query}"),
        _ => format!("{cdn}/{path}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::MockObjectStorageClient;

    const NOW: i64 = 1_767_225_600; // 2026-01-01T00:00:00Z

    fn now() -> Timestamp {
        Timestamp::from_second(NOW).unwrap()
    }

    fn builder(config: &Config) -> UrlBuilder {
        UrlBuilder::new(config, Arc::new(FixedClock(now())))
    }

    fn signing_client() -> MockObjectStorageClient {
        let mut client = MockObjectStorageClient::new();
        client
            .expect_presigned_url()
            .returning(|key: &str, expires_at: Timestamp, scheme: &str| {
                Ok(format!(
                    "{scheme}://photos-1250000000.cos.ap-guangzhou.myqcloud.com/{}?q-key-time={NOW};{}&q-signature=abc",
                    crate::path::encode_key(key),
                    expires_at.as_second()
                ))
            });
        client
    }

    fn config() -> Config {
        let mut config = Config::new("photos");
        config.prefix = Some("root".into());
        config
    }

    #[test]
    fn test_expiration_relative() {
        let resolved = Expiration::from("+60 minutes").resolve(now()).unwrap();
        assert_eq!(resolved.as_second(), NOW + 3600);

        let resolved = Expiration::from("+5 min").resolve(now()).unwrap();
        assert_eq!(resolved.as_second(), NOW + 300);

        let resolved = Expiration::from("+1 day").resolve(now()).unwrap();
        assert_eq!(resolved.as_second(), NOW + 86_400);

        let resolved = Expiration::from("-1 hour").resolve(now()).unwrap();
        assert_eq!(resolved.as_second(), NOW - 3600);
    }

    #[test]
    fn test_expiration_absolute_and_epoch() {
        let expected = NOW + 7200;
        for input in [
            Expiration::from("2026-01-01T02:00:00Z"),
            Expiration::from("Thu, 01 Jan 2026 02:00:00 GMT"),
            Expiration::from("2026-01-01 02:00:00"),
            Expiration::from(expected.to_string()),
            Expiration::from(expected),
            Expiration::from(Timestamp::from_second(expected).unwrap()),
        ] {
            assert_eq!(input.resolve(now()).unwrap().as_second(), expected, "{input:?}");
        }

        let midnight = Expiration::from("2026-01-02").resolve(now()).unwrap();
        assert_eq!(midnight.as_second(), NOW + 86_400);
    }

    #[test]
    fn test_expiration_invalid() {
        assert!(Expiration::from("").resolve(now()).is_err());
        assert!(Expiration::from("whenever").resolve(now()).is_err());
        assert!(Expiration::from("+soon").resolve(now()).is_err());
    }

    #[test]
    fn test_public_url_through_cdn() {
        let mut config = config();
        config.cdn = Some("https://cdn.example.com".into());
        let client = MockObjectStorageClient::new();

        let url = builder(&config).public_url(&client, "x.png").unwrap();
        assert_eq!(url, "https://cdn.example.com/root/x.png");

        config.cdn = Some("https://cdn.example.com/".into());
        let url = builder(&config).public_url(&client, "/x.png").unwrap();
        assert_eq!(url, "https://cdn.example.com/root/x.png");
    }

    #[test]
    fn test_public_url_from_client() {
        let mut config = config();
        config.scheme = "https".into();
        let mut client = MockObjectStorageClient::new();
        client
            .expect_object_url()
            .withf(|key: &str, scheme: &str| key == "root/x.png" && scheme == "https")
            .times(1)
            .returning(|key: &str, scheme: &str| Ok(format!("{scheme}://bucket.example/{key}")));

        let url = builder(&config).public_url(&client, "x.png").unwrap();
        assert_eq!(url, "https://bucket.example/root/x.png");
    }

    #[tokio::test]
    async fn test_relative_and_epoch_signatures_match() {
        let config = config();
        let client = signing_client();
        let builder = builder(&config);

        let relative = builder
            .signed_url(&client, "a.txt", "+60 minutes".into())
            .await
            .unwrap();
        let epoch = builder
            .signed_url(&client, "a.txt", (NOW + 3600).into())
            .await
            .unwrap();

        assert_eq!(relative, epoch);
        assert!(relative.contains(&format!(";{}", NOW + 3600)));
    }

    #[tokio::test]
    async fn test_signed_url_rehosted_under_cdn() {
        let mut config = config();
        config.cdn = Some("https://cdn.example.com/".into());
        let client = signing_client();

        let url = builder(&config)
            .signed_url(&client, "我的 文件.txt", "+60 minutes".into())
            .await
            .unwrap();

        assert_eq!(
            url,
            format!(
                "https://cdn.example.com/root/我的 文件.txt?q-key-time={NOW};{}&q-signature=abc",
                NOW + 3600
            )
        );
    }

    #[tokio::test]
    async fn test_path_style_signed_url_matches_public_cdn_url() {
        let mut config = config();
        config.app_id = Some("1250000000".into());
        config.endpoint = Some("http://127.0.0.1:9000".into());
        config.cdn = Some("https://cdn.example.com".into());

        let mut client = MockObjectStorageClient::new();
        client
            .expect_presigned_url()
            .returning(|key: &str, _: Timestamp, _: &str| {
                Ok(format!(
                    "http://127.0.0.1:9000/photos-1250000000/{key}?X-Amz-Signature=abc"
                ))
            });

        let builder = builder(&config);
        let signed = builder
            .signed_url(&client, "x.png", "+60 minutes".into())
            .await
            .unwrap();
        let public = builder.public_url(&client, "x.png").unwrap();

        assert_eq!(signed, "https://cdn.example.com/root/x.png?X-Amz-Signature=abc");
        assert!(signed.starts_with(&public));
    }

    #[test]
    fn test_rehost_keeps_lookalike_bucket_segment() {
        let url = rehost(
            "https://cdn.example.com",
            "http://127.0.0.1:9000/photos-1250000000x/a.txt",
            Some("photos-1250000000"),
        )
        .unwrap();
        assert_eq!(url, "https://cdn.example.com/photos-1250000000x/a.txt");
    }

    #[tokio::test]
    async fn test_signed_url_rejects_past_expiry() {
        let config = config();
        let client = MockObjectStorageClient::new();

        let err = builder(&config)
            .signed_url(&client, "a.txt", "-5 minutes".into())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidExpiration(_)));
    }

    #[tokio::test]
    async fn test_default_url_selection() {
        let mut config = config();
        config.signed_url = true;
        let client = signing_client();
        let url = builder(&config).url(&client, "a.txt").await.unwrap();
        assert!(url.contains("q-signature"));

        config.cdn = Some("https://cdn.example.com".into());
        let url = builder(&config).url(&client, "a.txt").await.unwrap();
        assert_eq!(url, "https://cdn.example.com/root/a.txt");
    }
}

//! Listing normalization
//!
//! Listing responses come from an XML-to-structure conversion that flattens a
//! collection holding exactly one element into a bare object, and that may
//! render numbers as strings or leave fields out entirely. Those shapes are
//! resolved here, at the deserialization boundary, so the rest of the crate
//! only ever sees `Vec<FileEntry>`.

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Error, Result};
use crate::path::{split_key, PathPrefixer};

/// A collection that may arrive as a list, a single flattened element, or null
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OneOrMany<T>(pub Vec<T>);

impl<T> OneOrMany<T> {
    pub fn into_vec(self) -> Vec<T> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<T> Default for OneOrMany<T> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

impl<T> From<Vec<T>> for OneOrMany<T> {
    fn from(items: Vec<T>) -> Self {
        Self(items)
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for OneOrMany<T> {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Shape<U> {
            Many(Vec<U>),
            One(U),
        }

        Ok(match Option::<Shape<T>>::deserialize(deserializer)? {
            None => Self::default(),
            Some(Shape::Many(items)) => Self(items),
            Some(Shape::One(item)) => Self(vec![item]),
        })
    }
}

/// Scalar as produced by the XML conversion
#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Bool(bool),
    Int(u64),
    Float(f64),
    Text(String),
}

fn lenient_u64<'de, D>(deserializer: D) -> std::result::Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Scalar>::deserialize(deserializer)? {
        Some(Scalar::Int(n)) => Some(n),
        Some(Scalar::Float(f)) if f >= 0.0 => Some(f as u64),
        Some(Scalar::Text(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

fn lenient_bool<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Scalar>::deserialize(deserializer)? {
        Some(Scalar::Bool(b)) => b,
        Some(Scalar::Int(n)) => n != 0,
        Some(Scalar::Text(s)) => s.trim().eq_ignore_ascii_case("true"),
        _ => false,
    })
}

/// One `CommonPrefixes` entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RawPrefix {
    #[serde(rename = "Prefix", alias = "prefix", default)]
    pub prefix: String,
}

/// One `Contents` entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RawObject {
    #[serde(rename = "Key", alias = "key", default)]
    pub key: String,

    #[serde(
        rename = "Size",
        alias = "size",
        default,
        deserialize_with = "lenient_u64"
    )]
    pub size: Option<u64>,

    #[serde(rename = "LastModified", alias = "last_modified", default)]
    pub last_modified: Option<String>,
}

/// One page of a bucket listing, as returned by the service
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RawListing {
    #[serde(rename = "CommonPrefixes", alias = "common_prefixes", default)]
    pub common_prefixes: OneOrMany<RawPrefix>,

    #[serde(rename = "Contents", alias = "contents", default)]
    pub contents: OneOrMany<RawObject>,

    #[serde(
        rename = "IsTruncated",
        alias = "is_truncated",
        default,
        deserialize_with = "lenient_bool"
    )]
    pub is_truncated: bool,
}

impl RawListing {
    /// Interpret a converted listing document
    pub fn from_json(value: serde_json::Value) -> Result<Self> {
        serde_json::from_value(value).map_err(|e| Error::InvalidResponse(e.to_string()))
    }
}

/// Kind of a listed entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    File,
    Dir,
}

/// Uniform description of a listed or probed object
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileEntry {
    #[serde(rename = "type")]
    pub entry_type: EntryType,
    /// Logical path (root prefix removed)
    pub path: String,
    pub size: u64,
    pub dirname: String,
    pub basename: String,
    pub filename: String,
    pub extension: String,
    /// Unix timestamp of the last modification, 0 when unknown
    pub timestamp: i64,
}

impl FileEntry {
    /// Build an entry from a physical key
    ///
    /// Keys ending in `/` are directory markers and always report size 0.
    pub fn from_key(key: &str, size: u64, timestamp: i64, prefixer: &PathPrefixer) -> Self {
        let entry_type = if key.ends_with('/') {
            EntryType::Dir
        } else {
            EntryType::File
        };
        let path = prefixer.remove(key);
        let parts = split_key(&path);

        Self {
            entry_type,
            size: if entry_type == EntryType::Dir { 0 } else { size },
            dirname: parts.dirname.to_string(),
            basename: parts.basename.to_string(),
            filename: parts.filename.to_string(),
            extension: parts.extension.to_string(),
            timestamp,
            path,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.entry_type == EntryType::Dir
    }
}

/// Normalized view of one listing call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ListingPage {
    /// Synthesized directories first, then objects
    pub entries: Vec<FileEntry>,
    /// Logical paths of the virtual subdirectories
    pub common_prefixes: Vec<String>,
}

/// Parse an RFC 3339 or RFC 2822 (HTTP date) string into a Unix timestamp
pub(crate) fn parse_timestamp(value: &str) -> Option<i64> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(ts) = value.parse::<jiff::Timestamp>() {
        return Some(ts.as_second());
    }

    jiff::fmt::rfc2822::parse(value)
        .ok()
        .map(|zoned| zoned.timestamp().as_second())
}

/// Turn a raw listing into file entries with logical paths
pub fn normalize(raw: RawListing, prefixer: &PathPrefixer) -> ListingPage {
    if raw.is_truncated {
        tracing::warn!(
            returned = raw.contents.len(),
            "listing truncated, only the first page is returned"
        );
    }

    let mut common_prefixes = Vec::with_capacity(raw.common_prefixes.len());
    let mut entries = Vec::with_capacity(raw.common_prefixes.len() + raw.contents.len());

    for RawPrefix { prefix } in raw.common_prefixes.into_vec() {
        let dir_key = if prefix.ends_with('/') {
            prefix
        } else {
            format!("{prefix}/")
        };
        let entry = FileEntry::from_key(&dir_key, 0, 0, prefixer);
        if is_empty_entry(&entry) {
            continue;
        }
        common_prefixes.push(entry.path.clone());
        entries.push(entry);
    }

    for object in raw.contents.into_vec() {
        let timestamp = object
            .last_modified
            .as_deref()
            .and_then(parse_timestamp)
            .unwrap_or(0);
        let entry = FileEntry::from_key(&object.key, object.size.unwrap_or(0), timestamp, prefixer);
        if is_empty_entry(&entry) {
            continue;
        }
        entries.push(entry);
    }

    ListingPage {
        entries,
        common_prefixes,
    }
}

/// Entries whose logical path is empty: blank keys and the root marker itself
fn is_empty_entry(entry: &FileEntry) -> bool {
    entry.path.trim_matches('/').is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn no_prefix() -> PathPrefixer {
        PathPrefixer::new(None)
    }

    fn shape(entries: &[FileEntry]) -> Vec<(EntryType, &str, u64, i64)> {
        entries
            .iter()
            .map(|e| (e.entry_type, e.path.as_str(), e.size, e.timestamp))
            .collect()
    }

    #[test]
    fn test_single_element_is_coerced_to_list() {
        let single = RawListing::from_json(json!({
            "Contents": {"Key": "a.txt", "Size": "3", "LastModified": "2019-05-13T09:43:21.000Z"},
            "CommonPrefixes": {"Prefix": "photos/"}
        }))
        .unwrap();
        let many = RawListing::from_json(json!({
            "Contents": [{"Key": "a.txt", "Size": 3, "LastModified": "2019-05-13T09:43:21.000Z"}],
            "CommonPrefixes": [{"Prefix": "photos/"}]
        }))
        .unwrap();

        assert_eq!(single, many);

        let single = normalize(single, &no_prefix());
        let many = normalize(many, &no_prefix());
        assert_eq!(single, many);
        assert_eq!(
            shape(&single.entries),
            vec![
                (EntryType::Dir, "photos/", 0, 0),
                (EntryType::File, "a.txt", 3, 1_557_740_601),
            ]
        );
    }

    #[test]
    fn test_collections_are_coerced_independently() {
        let raw = RawListing::from_json(json!({
            "Contents": [{"Key": "a.txt"}, {"Key": "b.txt"}],
            "CommonPrefixes": {"Prefix": "only/"}
        }))
        .unwrap();
        assert_eq!(raw.contents.len(), 2);
        assert_eq!(raw.common_prefixes.len(), 1);
    }

    #[test]
    fn test_missing_and_null_collections() {
        let raw = RawListing::from_json(json!({"Contents": null})).unwrap();
        assert!(normalize(raw, &no_prefix()).entries.is_empty());

        let raw = RawListing::from_json(json!({})).unwrap();
        assert_eq!(normalize(raw, &no_prefix()), ListingPage::default());
    }

    #[test]
    fn test_missing_fields_default_to_zero() {
        let raw = RawListing::from_json(json!({"Contents": {"Key": "notes.md"}})).unwrap();
        let page = normalize(raw, &no_prefix());
        let entry = &page.entries[0];
        assert_eq!(entry.size, 0);
        assert_eq!(entry.timestamp, 0);
        assert_eq!(entry.extension, "md");
    }

    #[test]
    fn test_unparseable_values_default_to_zero() {
        let raw = RawListing::from_json(json!({
            "Contents": {"Key": "x.bin", "Size": "lots", "LastModified": "yesterday"}
        }))
        .unwrap();
        let entry = &normalize(raw, &no_prefix()).entries[0];
        assert_eq!(entry.size, 0);
        assert_eq!(entry.timestamp, 0);
    }

    #[test]
    fn test_directory_markers() {
        let raw = RawListing::from_json(json!({
            "Contents": [
                {"Key": "docs/", "Size": "0"},
                {"Key": "docs/readme", "Size": "10"},
                {"Key": "odd/", "Size": "7"}
            ]
        }))
        .unwrap();
        let page = normalize(raw, &no_prefix());

        for entry in &page.entries {
            if entry.path.ends_with('/') {
                assert_eq!(entry.entry_type, EntryType::Dir);
                assert_eq!(entry.size, 0);
            } else {
                assert_eq!(entry.entry_type, EntryType::File);
            }
        }
        assert_eq!(page.entries[2].size, 0);
    }

    #[test]
    fn test_path_components() {
        let raw = RawListing::from_json(json!({
            "Contents": [{"Key": "a/b/photo.jpeg", "Size": 5}, {"Key": "top.txt", "Size": 1}]
        }))
        .unwrap();
        let page = normalize(raw, &no_prefix());

        let nested = &page.entries[0];
        assert_eq!(nested.dirname, "a/b");
        assert_eq!(nested.basename, "photo.jpeg");
        assert_eq!(nested.filename, "photo");
        assert_eq!(nested.extension, "jpeg");

        let top = &page.entries[1];
        assert_eq!(top.dirname, "");
    }

    #[test]
    fn test_prefix_is_removed_and_root_marker_dropped() {
        let prefixer = PathPrefixer::new(Some("root"));
        let raw = RawListing::from_json(json!({
            "CommonPrefixes": [{"Prefix": "root/sub/"}],
            "Contents": [
                {"Key": "root/"},
                {"Key": ""},
                {"Key": "root/a/b.txt", "Size": 2}
            ]
        }))
        .unwrap();
        let page = normalize(raw, &prefixer);

        assert_eq!(page.common_prefixes, vec!["sub/".to_string()]);
        assert_eq!(
            shape(&page.entries),
            vec![(EntryType::Dir, "sub/", 0, 0), (EntryType::File, "a/b.txt", 2, 0)]
        );
        assert_eq!(page.entries[1].dirname, "a");
    }

    #[test]
    fn test_is_truncated_variants() {
        let raw = RawListing::from_json(json!({"IsTruncated": "true"})).unwrap();
        assert!(raw.is_truncated);
        let raw = RawListing::from_json(json!({"IsTruncated": false})).unwrap();
        assert!(!raw.is_truncated);
    }

    #[test]
    fn test_parse_timestamp_formats() {
        assert_eq!(parse_timestamp("2019-05-13T09:43:21.000Z"), Some(1_557_740_601));
        assert_eq!(parse_timestamp("Mon, 13 May 2019 09:43:21 GMT"), Some(1_557_740_601));
        assert_eq!(parse_timestamp(""), None);
        assert_eq!(parse_timestamp("not a date"), None);
    }

    #[test]
    fn test_entry_serializes_type_field() {
        let entry = FileEntry::from_key("a/", 0, 0, &no_prefix());
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["type"], "dir");
        assert_eq!(value["basename"], "a");
    }
}

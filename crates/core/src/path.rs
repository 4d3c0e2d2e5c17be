//! Path virtualization and key splitting
//!
//! Logical paths are what callers pass to the adapter. Physical keys are what
//! the bucket stores: the logical path placed under the configured root prefix.

/// Maps logical paths onto physical keys under a root prefix
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathPrefixer {
    /// Normalized prefix: empty, or without a leading `/` and with exactly one trailing `/`
    prefix: String,
}

impl PathPrefixer {
    /// Create a prefixer; `None`, empty and `/` all mean "no prefix"
    pub fn new(prefix: Option<&str>) -> Self {
        let trimmed = prefix.unwrap_or_default().trim_matches('/');
        let prefix = if trimmed.is_empty() {
            String::new()
        } else {
            format!("{trimmed}/")
        };
        Self { prefix }
    }

    /// The normalized prefix (empty when none is configured)
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Resolve a logical path to its physical key
    ///
    /// Exactly one `/` separates the prefix from the path, whatever separators
    /// the caller supplied. Without a prefix this is the identity.
    pub fn apply(&self, path: &str) -> String {
        if self.prefix.is_empty() {
            return path.to_string();
        }
        format!("{}{}", self.prefix, path.trim_start_matches('/'))
    }

    /// Recover the logical path from a physical key
    ///
    /// Keys outside the prefix are returned unchanged.
    pub fn remove(&self, key: &str) -> String {
        key.strip_prefix(self.prefix.as_str())
            .unwrap_or(key)
            .to_string()
    }

    /// Listing prefix for a logical directory: its key with one trailing `/`
    ///
    /// The root directory maps to the bare prefix.
    pub fn directory(&self, dir: &str) -> String {
        let dir = dir.trim_end_matches('/');
        if dir.is_empty() {
            self.prefix.clone()
        } else {
            format!("{}/", self.apply(dir))
        }
    }
}

/// Percent-encode each segment of a key, keeping `/` separators
pub fn encode_key(key: &str) -> String {
    key.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Components of an object key
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParts<'a> {
    /// Everything before the last `/`, empty when there is none
    pub dirname: &'a str,
    /// Last component
    pub basename: &'a str,
    /// Last component without its extension
    pub filename: &'a str,
    /// Text after the last `.` of the basename, empty when there is none
    pub extension: &'a str,
}

/// Split a key into its components, ignoring a trailing `/`
///
/// Dot-files such as `.env` have no extension.
pub fn split_key(key: &str) -> PathParts<'_> {
    let trimmed = key.trim_end_matches('/');
    let (dirname, basename) = trimmed.rsplit_once('/').unwrap_or(("", trimmed));
    let (filename, extension) = match basename.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, ext),
        _ => (basename, ""),
    };

    PathParts {
        dirname,
        basename,
        filename,
        extension,
    }
}

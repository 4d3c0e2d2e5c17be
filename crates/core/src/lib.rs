//! cosfs-core: filesystem-style access to Tencent Cloud COS buckets
//!
//! This crate provides:
//! - Configuration loading and validation
//! - Logical path to physical key mapping under a root prefix
//! - Listing normalization into file and directory entries
//! - Visibility mapping onto object ACLs
//! - Public, CDN and signed URL construction
//! - [`CosAdapter`], the filesystem operations over an [`ObjectStorageClient`]
//!
//! The crate does not depend on any storage SDK; the wire client lives in
//! `cosfs-cos` and tests drive the adapter through a mock client.

pub mod adapter;
pub mod config;
pub mod error;
pub mod listing;
pub mod path;
pub mod traits;
pub mod urls;
pub mod visibility;

pub use adapter::{CosAdapter, WriteDescriptor, WriteOptions};
pub use config::{Config, ConfigManager, Credentials};
pub use error::{Error, Result};
pub use listing::{EntryType, FileEntry, ListingPage, RawListing, RawObject, RawPrefix};
pub use path::PathPrefixer;
pub use traits::{
    BatchDeleteOutcome, CopySource, ObjectMetadata, ObjectStorageClient, ObjectStream, PutOptions,
};
pub use urls::{Clock, Expiration, FixedClock, SystemClock, UrlBuilder};
pub use visibility::{CannedAcl, Grant, Visibility};

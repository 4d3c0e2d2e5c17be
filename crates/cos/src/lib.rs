//! cosfs-cos: COS client for cosfs
//!
//! This crate provides the implementation of the ObjectStorageClient trait
//! using the aws-sdk-s3 crate against the COS S3-compatible API. It is the
//! only crate that directly depends on the AWS SDK.

use std::sync::Arc;

use cosfs_core::{Config, CosAdapter, Result};

pub mod client;

pub use client::CosClient;

/// Build an adapter backed by a [`CosClient`] for `config`
pub async fn connect(config: Config) -> Result<CosAdapter> {
    let client = CosClient::new(&config).await?;
    CosAdapter::new(config, Arc::new(client))
}

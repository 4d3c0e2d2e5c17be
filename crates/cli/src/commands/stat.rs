//! stat command - Show file metadata
//!
//! Displays the headers reported for a file, and optionally its visibility.

use clap::Args;
use cosfs_core::{CosAdapter, ObjectMetadata, Visibility};
use serde::Serialize;

use super::human_size;
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// Show file metadata
#[derive(Args, Debug)]
pub struct StatArgs {
    /// File path
    pub path: String,

    /// Also look up the file's visibility (one extra request)
    #[arg(long)]
    pub visibility: bool,
}

#[derive(Debug, Serialize)]
struct StatOutput {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_modified: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    size_bytes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    size_human: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    etag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    content_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    storage_class: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    visibility: Option<Visibility>,
    metadata: ObjectMetadata,
}

impl StatOutput {
    fn new(name: &str, metadata: ObjectMetadata) -> Self {
        let size_bytes = metadata.content_length();
        Self {
            name: name.to_string(),
            last_modified: metadata
                .last_modified()
                .and_then(|secs| jiff::Timestamp::from_second(secs).ok())
                .map(|t| t.to_string()),
            size_human: size_bytes.map(human_size),
            size_bytes,
            etag: metadata
                .get("etag")
                .map(|e| e.trim_matches('"').to_string()),
            content_type: metadata.content_type().map(str::to_string),
            storage_class: metadata.get("x-cos-storage-class").map(str::to_string),
            visibility: None,
            metadata,
        }
    }
}

/// Execute the stat command
pub async fn execute(args: StatArgs, adapter: &CosAdapter, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let metadata = match adapter.get_metadata(&args.path).await {
        Ok(metadata) => metadata,
        Err(e) => return formatter.fail(&format!("Failed to stat {}", args.path), &e),
    };

    let mut info = StatOutput::new(&args.path, metadata);
    if args.visibility {
        match adapter.get_visibility(&args.path).await {
            Ok(visibility) => info.visibility = Some(visibility),
            Err(e) => return formatter.fail("Failed to read visibility", &e),
        }
    }

    if formatter.is_json() {
        formatter.json(&info);
        return ExitCode::Success;
    }

    formatter.println(&format!("Name      : {}", info.name));
    if let Some(modified) = &info.last_modified {
        formatter.println(&format!("Date      : {modified}"));
    }
    if let (Some(size), Some(human)) = (info.size_bytes, &info.size_human) {
        formatter.println(&format!("Size      : {human} ({size} bytes)"));
    }
    if let Some(etag) = &info.etag {
        formatter.println(&format!("ETag      : {etag}"));
    }
    if let Some(ct) = &info.content_type {
        formatter.println(&format!("Type      : {ct}"));
    }
    if let Some(sc) = &info.storage_class {
        formatter.println(&format!("Class     : {sc}"));
    }
    if let Some(visibility) = info.visibility {
        formatter.println(&format!("Visibility: {visibility}"));
    }

    ExitCode::Success
}

//! put command - Upload a file
//!
//! Uploads a local file, or stdin when the source is `-`.

use std::collections::BTreeMap;
use std::path::Path;

use clap::Args;
use cosfs_core::{CosAdapter, Visibility, WriteDescriptor, WriteOptions};
use serde::Serialize;

use super::human_size;
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// Upload a local file (or stdin) to a path
#[derive(Args, Debug)]
pub struct PutArgs {
    /// Local file, or `-` for stdin
    pub source: String,

    /// Destination path; a trailing `/` keeps the source file name
    pub target: String,

    /// Make the file publicly readable
    #[arg(long, conflicts_with = "private")]
    pub public: bool,

    /// Make the file private
    #[arg(long)]
    pub private: bool,

    /// Content type (guessed from the target extension by default)
    #[arg(long)]
    pub content_type: Option<String>,

    /// Extra request header, as NAME=VALUE (repeatable)
    #[arg(long = "header", value_name = "NAME=VALUE", value_parser = parse_header)]
    pub headers: Vec<(String, String)>,
}

#[derive(Debug, Serialize)]
struct PutOutput {
    status: &'static str,
    source: String,
    #[serde(flatten)]
    descriptor: WriteDescriptor,
    size_human: String,
}

/// Execute the put command
pub async fn execute(args: PutArgs, adapter: &CosAdapter, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let target = resolve_target(&args.source, &args.target);
    let options = WriteOptions {
        visibility: visibility_flag(args.public, args.private),
        content_type: args.content_type.clone(),
        headers: args.headers.iter().cloned().collect::<BTreeMap<_, _>>(),
    };

    let result = if args.source == "-" {
        adapter
            .write_stream(&target, tokio::io::stdin(), options)
            .await
    } else {
        let file = match tokio::fs::File::open(&args.source).await {
            Ok(file) => file,
            Err(e) => {
                formatter.error(&format!("Failed to open {}: {e}", args.source));
                return ExitCode::UsageError;
            }
        };
        adapter.write_stream(&target, file, options).await
    };

    match result {
        Ok(descriptor) => {
            if formatter.is_json() {
                let output = PutOutput {
                    status: "success",
                    source: args.source,
                    size_human: human_size(descriptor.size),
                    descriptor,
                };
                formatter.json(&output);
            } else {
                formatter.println(&format!(
                    "{} -> {} ({}, {})",
                    args.source,
                    descriptor.path,
                    human_size(descriptor.size),
                    descriptor.mimetype
                ));
            }
            ExitCode::Success
        }
        Err(e) => formatter.fail(&format!("Failed to upload {}", args.source), &e),
    }
}

/// Destination path, appending the source file name to a directory target
fn resolve_target(source: &str, target: &str) -> String {
    if !target.is_empty() && !target.ends_with('/') {
        return target.to_string();
    }
    let name = Path::new(source)
        .file_name()
        .filter(|_| source != "-")
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "stdin".to_string());
    format!("{target}{name}")
}

fn visibility_flag(public: bool, private: bool) -> Option<Visibility> {
    match (public, private) {
        (true, _) => Some(Visibility::Public),
        (_, true) => Some(Visibility::Private),
        _ => None,
    }
}

fn parse_header(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(format!("expected NAME=VALUE, got '{raw}'")),
    }
}

//! url command - Print a URL for a file
//!
//! Without `--expires` the configured default is used: the CDN URL, a signed
//! URL when signing is enabled, or the plain object URL.

use clap::Args;
use cosfs_core::CosAdapter;

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// Print a public, CDN or signed URL for a file
#[derive(Args, Debug)]
pub struct UrlArgs {
    /// File path
    pub path: String,

    /// Sign the URL until this time: `+30 minutes`, a Unix timestamp or a date
    #[arg(short, long)]
    pub expires: Option<String>,
}

/// Execute the url command
pub async fn execute(args: UrlArgs, adapter: &CosAdapter, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let result = match &args.expires {
        Some(expires) => adapter.get_signed_url(&args.path, expires.as_str()).await,
        None => adapter.get_url(&args.path).await,
    };

    match result {
        Ok(url) => {
            if formatter.is_json() {
                formatter.json(&serde_json::json!({
                    "path": args.path,
                    "url": url,
                }));
            } else {
                formatter.println(&url);
            }
            ExitCode::Success
        }
        Err(e) => formatter.fail(&format!("Failed to build URL for {}", args.path), &e),
    }
}

//! cat command - Display file contents
//!
//! Streams the entire content of a file to stdout.

use clap::Args;
use cosfs_core::CosAdapter;
use tokio::io::AsyncWriteExt;

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// Display file contents
#[derive(Args, Debug)]
pub struct CatArgs {
    /// File path
    pub path: String,
}

/// Execute the cat command
pub async fn execute(args: CatArgs, adapter: &CosAdapter, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let mut stream = match adapter.read_stream(&args.path).await {
        Ok(stream) => stream,
        Err(e) => return formatter.fail(&format!("Failed to read {}", args.path), &e),
    };

    // Write directly to stdout (not through formatter to preserve binary data)
    let mut stdout = tokio::io::stdout();
    let copied = tokio::io::copy(&mut stream, &mut stdout).await;
    if let Err(e) = copied.and(stdout.flush().await) {
        formatter.error(&format!("Failed to write to stdout: {e}"));
        return ExitCode::GeneralError;
    }

    ExitCode::Success
}

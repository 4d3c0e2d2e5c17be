//! ls command - List files and directories
//!
//! Lists one level below a directory, or every key below it with `--recursive`.

use clap::Args;
use cosfs_core::{CosAdapter, FileEntry};
use serde::Serialize;

use super::human_size;
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// List files and directories
#[derive(Args, Debug)]
pub struct LsArgs {
    /// Directory to list (defaults to the root)
    #[arg(default_value = "")]
    pub path: String,

    /// List recursively
    #[arg(short, long)]
    pub recursive: bool,

    /// Summarize output (show totals only)
    #[arg(long)]
    pub summarize: bool,
}

/// Output structure for ls command (JSON format)
#[derive(Debug, Serialize)]
struct LsOutput {
    items: Vec<FileEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<Summary>,
}

#[derive(Debug, Serialize)]
struct Summary {
    total_files: usize,
    total_dirs: usize,
    total_size_bytes: u64,
    total_size_human: String,
}

impl Summary {
    fn of(entries: &[FileEntry]) -> Self {
        let total_dirs = entries.iter().filter(|e| e.is_dir()).count();
        let total_size_bytes = entries.iter().map(|e| e.size).sum();
        Self {
            total_files: entries.len() - total_dirs,
            total_dirs,
            total_size_bytes,
            total_size_human: human_size(total_size_bytes),
        }
    }
}

/// Execute the ls command
pub async fn execute(args: LsArgs, adapter: &CosAdapter, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let entries = match adapter.list_contents(&args.path, args.recursive).await {
        Ok(entries) => entries,
        Err(e) => return formatter.fail("Failed to list contents", &e),
    };

    if formatter.is_json() {
        let output = LsOutput {
            summary: args.summarize.then(|| Summary::of(&entries)),
            items: entries,
        };
        formatter.json(&output);
        return ExitCode::Success;
    }

    if !args.summarize {
        for entry in &entries {
            formatter.println(&format_entry(entry));
        }
    }

    if args.summarize {
        let summary = Summary::of(&entries);
        formatter.println(&format!(
            "Total: {} files, {} directories, {}",
            summary.total_files, summary.total_dirs, summary.total_size_human
        ));
    }

    ExitCode::Success
}

/// One listing line: `[date] size path`
fn format_entry(entry: &FileEntry) -> String {
    let date = jiff::Timestamp::from_second(entry.timestamp)
        .ok()
        .filter(|_| entry.timestamp > 0)
        .map(|t| t.strftime("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| " ".repeat(19));

    if entry.is_dir() {
        format!("[{date}] {:>9} {}", "DIR", entry.path)
    } else {
        format!("[{date}] {:>9} {}", human_size(entry.size), entry.path)
    }
}

//! visibility command - Show or change file visibility

use clap::Subcommand;
use cosfs_core::{CosAdapter, Visibility};

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

#[derive(Subcommand, Debug)]
pub enum VisibilityCommands {
    /// Print whether a file is public or private
    Get {
        /// File path
        path: String,
    },

    /// Make a file public or private
    Set {
        /// File path
        path: String,

        /// `public` or `private`
        visibility: Visibility,
    },
}

/// Execute a visibility subcommand
pub async fn execute(
    cmd: VisibilityCommands,
    adapter: &CosAdapter,
    output_config: OutputConfig,
) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let (path, result) = match cmd {
        VisibilityCommands::Get { path } => {
            let result = adapter.get_visibility(&path).await;
            (path, result)
        }
        VisibilityCommands::Set { path, visibility } => {
            let result = adapter
                .set_visibility(&path, visibility)
                .await
                .map(|()| visibility);
            (path, result)
        }
    };

    match result {
        Ok(visibility) => {
            if formatter.is_json() {
                formatter.json(&serde_json::json!({
                    "path": path,
                    "visibility": visibility,
                }));
            } else {
                formatter.println(&format!("{path}: {visibility}"));
            }
            ExitCode::Success
        }
        Err(e) => formatter.fail(&format!("Visibility of {path}"), &e),
    }
}

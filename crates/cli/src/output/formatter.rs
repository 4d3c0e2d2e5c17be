//! Output formatter for human-readable and JSON output
//!
//! Results go to stdout; errors go to stderr in both modes. In JSON mode
//! stdout carries exactly one document per command.

use serde::Serialize;

use super::OutputConfig;
use crate::exit_code::ExitCode;

/// Formatter for CLI output
#[derive(Debug, Clone)]
pub struct Formatter {
    json: bool,
    quiet: bool,
    color: bool,
}

impl Formatter {
    pub fn new(config: OutputConfig) -> Self {
        Self {
            color: !config.no_color && !config.json,
            json: config.json,
            quiet: config.quiet,
        }
    }

    pub fn is_json(&self) -> bool {
        self.json
    }

    /// Confirmation line for a completed change; silent in JSON and quiet mode
    pub fn success(&self, message: &str) {
        if self.quiet || self.json {
            return;
        }
        println!("{}", self.mark('✓', 32, message));
    }

    /// Report a failure that has no adapter error behind it
    ///
    /// Errors are always printed, even in quiet mode.
    pub fn error(&self, message: &str) {
        eprintln!("{}", self.render_error(message, None));
    }

    /// Report an adapter error under `context` and return its exit code
    pub fn fail(&self, context: &str, err: &cosfs_core::Error) -> ExitCode {
        let code = ExitCode::from(err);
        eprintln!("{}", self.render_error(&format!("{context}: {err}"), Some(code)));
        code
    }

    /// Print a serialized result; not silenced by quiet mode
    pub fn json<T: Serialize>(&self, value: &T) {
        match serde_json::to_string_pretty(value) {
            Ok(json) => println!("{json}"),
            Err(e) => eprintln!("Error serializing output: {e}"),
        }
    }

    /// Print a line of text (respects quiet mode)
    pub fn println(&self, message: &str) {
        if !self.quiet {
            println!("{message}");
        }
    }

    fn render_error(&self, message: &str, code: Option<ExitCode>) -> String {
        if !self.json {
            return self.mark('✗', 31, message);
        }

        let mut error = serde_json::json!({ "error": message });
        if let Some(code) = code {
            error["exit_code"] = code.as_i32().into();
        }
        serde_json::to_string_pretty(&error).unwrap_or_else(|_| message.to_string())
    }

    fn mark(&self, symbol: char, color: u8, message: &str) -> String {
        if self.color {
            format!("\x1b[{color}m{symbol}\x1b[0m {message}")
        } else {
            format!("{symbol} {message}")
        }
    }
}

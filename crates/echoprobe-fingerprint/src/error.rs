// SPDX-License-Identifier: GPL-3.0-or-later

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, FingerprintError>;

#[derive(Debug, Error)]
pub enum FingerprintError {
    #[error("required tool `{tool}` was not found; install it or set its path in the configuration")]
    ToolNotFound { tool: String },

    #[error("`{tool}` exited with {}: {stderr}", exit_description(.code))]
    ToolFailed {
        tool: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("Malformed fingerprint output: {0}")]
    MalformedOutput(String),

    #[error("Failed to read cached fingerprint {}: {source}", .path.display())]
    Cache {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn exit_description(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {}", code),
        None => "no status (terminated by signal)".to_string(),
    }
}

impl FingerprintError {
    /// Whether the failure comes from a missing external program rather than bad input.
    pub fn is_tool_missing(&self) -> bool {
        matches!(self, FingerprintError::ToolNotFound { .. })
    }
}

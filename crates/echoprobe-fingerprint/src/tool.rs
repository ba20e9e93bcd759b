// SPDX-License-Identifier: GPL-3.0-or-later

//! Invocation of external command-line tools.

use std::ffi::OsStr;
use std::io::ErrorKind;
use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, trace};

use crate::{FingerprintError, Result};

/// Run `program` with `args` to completion and return its standard output.
///
/// A program that cannot be spawned because it does not exist is reported as
/// [`FingerprintError::ToolNotFound`]; a non-zero exit as
/// [`FingerprintError::ToolFailed`] carrying the captured stderr. The child is
/// killed if the returned future is dropped.
pub async fn run<I, S>(program: &str, args: I) -> Result<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut command = Command::new(program);
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    trace!(target: "fingerprint", "spawning {:?}", command);

    let output = command.output().await.map_err(|e| {
        if e.kind() == ErrorKind::NotFound {
            FingerprintError::ToolNotFound {
                tool: program.to_string(),
            }
        } else {
            FingerprintError::Io(e)
        }
    })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        debug!(
            target: "fingerprint",
            tool = program,
            code = ?output.status.code(),
            "external tool failed"
        );
        return Err(FingerprintError::ToolFailed {
            tool: program.to_string(),
            code: output.status.code(),
            stderr,
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

// SPDX-License-Identifier: GPL-3.0-or-later

use async_trait::async_trait;

use crate::{Fingerprint, Result};

/// Anything that can turn an input identifier into a fingerprint.
///
/// Implementations must be safe to call concurrently; every call is
/// independent and yields a fresh capture for live inputs.
#[async_trait]
pub trait FingerprintSource: Send + Sync {
    /// Fingerprint at most `sample_seconds` of audio from `identifier`
    /// (a file path or stream URL).
    async fn fetch(&self, identifier: &str, sample_seconds: u32) -> Result<Fingerprint>;
}

// SPDX-License-Identifier: GPL-3.0-or-later

//! Fingerprint acquisition through the Chromaprint `fpcalc` utility.

use async_trait::async_trait;
use tracing::{debug, info, instrument};

use crate::transcode::{is_stream_manifest, Transcoder};
use crate::{cache, tool, Fingerprint, FingerprintSource, Result};

/// [`FingerprintSource`] backed by `fpcalc -raw`.
///
/// Lookup order for an identifier:
/// 1. `<identifier>.fpcalc` cache file, when caching is enabled
/// 2. FFmpeg clip extraction, for streaming manifests
/// 3. `fpcalc` on the file, URL, or extracted clip
#[derive(Debug, Clone)]
pub struct FpcalcSource {
    fpcalc_path: String,
    transcoder: Transcoder,
    use_cache: bool,
}

impl FpcalcSource {
    /// Create a source that finds `fpcalc` and `ffmpeg` on `PATH` and reads caches.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Create a builder for custom tool paths.
    pub fn builder() -> FpcalcSourceBuilder {
        FpcalcSourceBuilder::new()
    }

    async fn run_fpcalc(&self, input: &str, sample_seconds: u32) -> Result<Fingerprint> {
        let length = sample_seconds.to_string();
        let stdout = tool::run(&self.fpcalc_path, ["-raw", "-length", length.as_str(), input]).await?;
        Fingerprint::parse_fpcalc_output(&stdout)
    }
}

impl Default for FpcalcSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FingerprintSource for FpcalcSource {
    #[instrument(skip(self), fields(fpcalc = %self.fpcalc_path))]
    async fn fetch(&self, identifier: &str, sample_seconds: u32) -> Result<Fingerprint> {
        if self.use_cache {
            if let Some(fingerprint) = cache::load(identifier).await? {
                return Ok(fingerprint);
            }
        }

        info!(
            target: "fingerprint",
            "Calculating fingerprint by fpcalc for {} (sample time: {}s)", identifier, sample_seconds
        );

        let fingerprint = if is_stream_manifest(identifier) {
            let clip = self.transcoder.extract_clip(identifier, sample_seconds).await?;
            let clip_path = clip.path().to_string_lossy().into_owned();
            // `clip` stays alive until fpcalc has finished reading it.
            let result = self.run_fpcalc(&clip_path, sample_seconds).await;
            drop(clip);
            result?
        } else {
            self.run_fpcalc(identifier, sample_seconds).await?
        };

        debug!(target: "fingerprint", codes = fingerprint.len(), "fingerprint calculated");
        Ok(fingerprint)
    }
}

/// Builder for [`FpcalcSource`].
#[derive(Debug)]
pub struct FpcalcSourceBuilder {
    fpcalc_path: String,
    ffmpeg_path: String,
    use_cache: bool,
}

impl FpcalcSourceBuilder {
    pub fn new() -> Self {
        Self {
            fpcalc_path: "fpcalc".to_string(),
            ffmpeg_path: "ffmpeg".to_string(),
            use_cache: true,
        }
    }

    /// Path or name of the `fpcalc` executable.
    pub fn fpcalc_path(mut self, path: impl Into<String>) -> Self {
        self.fpcalc_path = path.into();
        self
    }

    /// Path or name of the `ffmpeg` executable.
    pub fn ffmpeg_path(mut self, path: impl Into<String>) -> Self {
        self.ffmpeg_path = path.into();
        self
    }

    /// Whether `<identifier>.fpcalc` cache files are consulted.
    pub fn use_cache(mut self, use_cache: bool) -> Self {
        self.use_cache = use_cache;
        self
    }

    pub fn build(self) -> FpcalcSource {
        FpcalcSource {
            fpcalc_path: self.fpcalc_path,
            transcoder: Transcoder::new(self.ffmpeg_path),
            use_cache: self.use_cache,
        }
    }
}

impl Default for FpcalcSourceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// SPDX-License-Identifier: GPL-3.0-or-later

//! Clip extraction from streaming manifests with FFmpeg.
//!
//! `fpcalc` cannot follow HLS or DASH manifests, so a fixed-length mono PCM
//! clip is captured into a temporary WAV file first. The clip is owned by a
//! [`NamedTempFile`] and deleted when it is dropped, whichever way the caller
//! exits.

use std::ffi::OsString;

use tempfile::NamedTempFile;
use tracing::{debug, instrument};

use crate::{tool, Result};

const MANIFEST_EXTENSIONS: [&str; 2] = [".m3u8", ".mpd"];

/// Whether `identifier` names an HLS/DASH manifest rather than a plain file.
///
/// Query strings and fragments are ignored, so signed playlist URLs such as
/// `https://cdn.example/live.m3u8?token=abc` are recognised.
pub fn is_stream_manifest(identifier: &str) -> bool {
    let path = identifier
        .split(['?', '#'])
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();
    MANIFEST_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}

/// FFmpeg front-end producing temporary audio clips.
#[derive(Debug, Clone)]
pub struct Transcoder {
    ffmpeg_path: String,
}

impl Transcoder {
    pub fn new(ffmpeg_path: impl Into<String>) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
        }
    }

    pub fn ffmpeg_path(&self) -> &str {
        &self.ffmpeg_path
    }

    /// Capture `sample_seconds` of mono 16-bit PCM audio from `identifier`.
    ///
    /// # Errors
    ///
    /// Fails if the temporary file cannot be created or FFmpeg is missing or
    /// exits with an error. The temporary file is removed in every case.
    #[instrument(skip(self), fields(ffmpeg = %self.ffmpeg_path))]
    pub async fn extract_clip(&self, identifier: &str, sample_seconds: u32) -> Result<NamedTempFile> {
        let clip = tempfile::Builder::new()
            .prefix("echoprobe-")
            .suffix(".wav")
            .tempfile()?;

        debug!(target: "fingerprint", clip = %clip.path().display(), "extracting stream clip");

        let duration = sample_seconds.to_string();
        let mut args: Vec<OsString> = ["-nostdin", "-hide_banner", "-loglevel", "error", "-y", "-i"]
            .into_iter()
            .map(OsString::from)
            .collect();
        args.push(identifier.into());
        args.extend(
            ["-t", duration.as_str(), "-vn", "-ac", "1", "-acodec", "pcm_s16le", "-f", "wav"]
                .into_iter()
                .map(OsString::from),
        );
        args.push(clip.path().into());

        // `clip` is dropped (and deleted) here if FFmpeg fails.
        tool::run(&self.ffmpeg_path, args).await?;

        Ok(clip)
    }
}

impl Default for Transcoder {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_detection() {
        assert!(is_stream_manifest("https://example.com/live/playlist.m3u8"));
        assert!(is_stream_manifest("https://example.com/live/PLAYLIST.M3U8?token=abc"));
        assert!(is_stream_manifest("http://example.com/dash/manifest.mpd#t=10"));
        assert!(is_stream_manifest("/srv/recordings/index.m3u8"));
    }

    #[test]
    fn test_plain_inputs_are_not_manifests() {
        assert!(!is_stream_manifest("song.flac"));
        assert!(!is_stream_manifest("http://example.com/radio.mp3"));
        assert!(!is_stream_manifest("https://example.com/get?file=a.m3u8.mp3"));
    }

    #[test]
    fn test_default_transcoder_uses_path_lookup() {
        assert_eq!(Transcoder::default().ffmpeg_path(), "ffmpeg");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_extract_clip_missing_ffmpeg() {
        let transcoder = Transcoder::new("/nonexistent/ffmpeg");
        let err = transcoder
            .extract_clip("https://example.com/live.m3u8", 10)
            .await
            .unwrap_err();
        assert!(err.is_tool_missing());
    }
}

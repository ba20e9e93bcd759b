// SPDX-License-Identifier: GPL-3.0-or-later

//! Precomputed fingerprints stored next to their input as `<input>.fpcalc`.
//!
//! A cache file holds the verbatim output of `fpcalc -raw`. The cache is
//! read-only: this crate never writes one.

use std::io::ErrorKind;
use std::path::PathBuf;

use tracing::{debug, info};

use crate::{Fingerprint, FingerprintError, Result};

const CACHE_EXTENSION: &str = "fpcalc";

/// Cache file path for an input identifier.
pub fn cache_path(identifier: &str) -> PathBuf {
    PathBuf::from(format!("{}.{}", identifier, CACHE_EXTENSION))
}

/// Load the cached fingerprint for `identifier`, if a cache file exists.
///
/// Returns `Ok(None)` when there is no cache file. A cache file that exists
/// but cannot be read or parsed is an error, not a miss.
pub async fn load(identifier: &str) -> Result<Option<Fingerprint>> {
    let path = cache_path(identifier);

    let contents = match tokio::fs::read_to_string(&path).await {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(target: "fingerprint", path = %path.display(), "no cached fingerprint");
            return Ok(None);
        }
        Err(source) => return Err(FingerprintError::Cache { path, source }),
    };

    info!(target: "fingerprint", "Found precalculated fingerprint for {}", identifier);
    Fingerprint::parse_fpcalc_output(&contents).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_path_appends_extension() {
        assert_eq!(cache_path("music/song.flac"), PathBuf::from("music/song.flac.fpcalc"));
    }

    #[tokio::test]
    async fn test_load_missing_cache_is_a_miss() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("absent.mp3");
        let result = load(input.to_str().unwrap()).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_load_cached_fingerprint() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("song.flac");
        let input = input.to_str().unwrap();
        std::fs::write(cache_path(input), "DURATION=60\nFINGERPRINT=10,20,30\n").unwrap();

        let fp = load(input).await.unwrap().expect("cache hit");
        assert_eq!(fp.codes(), &[10, 20, 30]);
    }

    #[tokio::test]
    async fn test_load_malformed_cache_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("song.flac");
        let input = input.to_str().unwrap();
        std::fs::write(cache_path(input), "garbage").unwrap();

        let err = load(input).await.unwrap_err();
        assert!(matches!(err, FingerprintError::MalformedOutput(_)));
    }

    #[tokio::test]
    async fn test_load_unreadable_cache_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("song.flac");
        let input = input.to_str().unwrap();
        // A directory where the cache file should be cannot be read as text.
        std::fs::create_dir(cache_path(input)).unwrap();

        let err = load(input).await.unwrap_err();
        assert!(matches!(err, FingerprintError::Cache { .. }));
    }
}

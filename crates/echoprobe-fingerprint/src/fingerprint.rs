// SPDX-License-Identifier: GPL-3.0-or-later

use serde::{Deserialize, Serialize};

use crate::{FingerprintError, Result};

/// Marker preceding the raw code list in `fpcalc -raw` output.
const FINGERPRINT_MARKER: &str = "FINGERPRINT=";

/// Raw Chromaprint fingerprint.
///
/// One 32-bit code per short slice of audio, in temporal order. The codes are
/// opaque: only their bit patterns are compared.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct Fingerprint(Vec<u32>);

impl Fingerprint {
    pub fn new(codes: Vec<u32>) -> Self {
        Self(codes)
    }

    pub fn codes(&self) -> &[u32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Parse the textual output of `fpcalc -raw` (or a cached copy of it).
    ///
    /// Everything after the `FINGERPRINT=` marker up to the end of that line
    /// must be a non-empty, comma-separated list of integers. Codes printed
    /// as signed values (`fpcalc -signed`) keep their bit pattern.
    ///
    /// # Errors
    ///
    /// Returns [`FingerprintError::MalformedOutput`] if the marker is absent,
    /// the list is empty, or any element is not an integer.
    pub fn parse_fpcalc_output(output: &str) -> Result<Self> {
        let start = output.find(FINGERPRINT_MARKER).ok_or_else(|| {
            FingerprintError::MalformedOutput(format!("`{}` not found", FINGERPRINT_MARKER))
        })?;

        let list = output[start + FINGERPRINT_MARKER.len()..]
            .lines()
            .next()
            .unwrap_or_default()
            .trim();

        if list.is_empty() {
            return Err(FingerprintError::MalformedOutput(
                "fingerprint list is empty".to_string(),
            ));
        }

        list.split(',')
            .map(|item| parse_code(item.trim()))
            .collect::<Result<Vec<_>>>()
            .map(Self)
    }
}

fn parse_code(item: &str) -> Result<u32> {
    item.parse::<u32>()
        .or_else(|_| item.parse::<i32>().map(|signed| signed as u32))
        .map_err(|_| {
            FingerprintError::MalformedOutput(format!("`{}` is not a 32-bit integer", item))
        })
}

impl From<Vec<u32>> for Fingerprint {
    fn from(codes: Vec<u32>) -> Self {
        Self(codes)
    }
}

impl AsRef<[u32]> for Fingerprint {
    fn as_ref(&self) -> &[u32] {
        &self.0
    }
}

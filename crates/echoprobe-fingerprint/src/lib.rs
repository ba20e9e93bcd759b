// SPDX-License-Identifier: GPL-3.0-or-later

//! Acquisition of Chromaprint fingerprints for files and live streams.
//!
//! This crate provides:
//! - The [`Fingerprint`] sequence type and the parser for `fpcalc -raw` output
//! - The [`FingerprintSource`] seam used by the comparison engine
//! - [`FpcalcSource`], which reads `.fpcalc` cache files, runs `fpcalc`, and
//!   transcodes streaming manifests with `ffmpeg` before fingerprinting

pub mod cache;
pub mod error;
pub mod fingerprint;
pub mod fpcalc;
pub mod source;
pub mod tool;
pub mod transcode;

pub use error::{FingerprintError, Result};
pub use fingerprint::Fingerprint;
pub use fpcalc::{FpcalcSource, FpcalcSourceBuilder};
pub use source::FingerprintSource;
pub use transcode::{is_stream_manifest, Transcoder};

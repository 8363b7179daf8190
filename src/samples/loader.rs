// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

//! Sample loading and caching for sample banks.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, error, info, warn};

use super::decode::decode_file;
use super::error::SampleError;
use super::Sample;
use crate::util;

/// File extensions the loader will attempt to decode.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["wav", "mp3", "ogg", "flac"];

/// Manages loading and caching of sample data.
pub struct SampleLoader {
    /// Cache of loaded samples by file path.
    cache: HashMap<PathBuf, Sample>,
    /// Target sample rate for transcoding (matches audio output).
    target_sample_rate: u32,
}

impl SampleLoader {
    /// Creates a new sample loader.
    pub fn new(target_sample_rate: u32) -> Self {
        Self {
            cache: HashMap::new(),
            target_sample_rate,
        }
    }

    /// Loads a sample from a file into memory.
    /// Returns a cached version if already loaded.
    pub fn load(&mut self, path: &Path) -> Result<Sample, SampleError> {
        if let Some(sample) = self.cache.get(path) {
            debug!(path = ?path, "Using cached sample");
            return Ok(sample.clone());
        }

        let decoded = decode_file(path)?;
        let channel_count = decoded.channel_count;

        let (samples, sample_rate) = if decoded.sample_rate != self.target_sample_rate {
            debug!(
                source_rate = decoded.sample_rate,
                target_rate = self.target_sample_rate,
                "Transcoding sample"
            );
            (
                transcode_samples(
                    &decoded.samples,
                    channel_count,
                    decoded.sample_rate,
                    self.target_sample_rate,
                ),
                self.target_sample_rate,
            )
        } else {
            (decoded.samples, decoded.sample_rate)
        };

        let sample = Sample::new(
            util::filename_display(path),
            samples,
            channel_count,
            sample_rate,
        );

        debug!(
            path = ?path,
            channels = channel_count,
            sample_rate,
            duration_ms = sample.duration().as_millis(),
            memory_kb = sample.memory_size() / 1024,
            "Sample loaded"
        );

        self.cache.insert(path.to_path_buf(), sample.clone());
        Ok(sample)
    }

    /// Loads every supported file in the given directory, ordered by file name. Unsupported
    /// and undecodable files are skipped and a missing directory produces an empty bank, so
    /// this never fails.
    pub fn load_directory(&mut self, dir: &Path) -> Vec<Sample> {
        if !dir.is_dir() {
            warn!(path = ?dir, "Directory not found");
            return Vec::new();
        }

        let mut paths: Vec<PathBuf> = match fs::read_dir(dir) {
            Ok(entries) => entries
                .filter_map(|entry| match entry {
                    Ok(entry) => Some(entry.path()),
                    Err(e) => {
                        warn!(path = ?dir, err = %e, "Unable to read directory entry");
                        None
                    }
                })
                .filter(|path| path.is_file())
                .collect(),
            Err(e) => {
                error!(path = ?dir, err = %e, "Unable to read directory");
                return Vec::new();
            }
        };
        paths.sort();

        let mut samples = Vec::new();
        for path in paths {
            if !is_supported(&path) {
                warn!(
                    file = util::filename_display(&path),
                    "Skipping unsupported file format"
                );
                continue;
            }

            match self.load(&path) {
                Ok(sample) => samples.push(sample),
                Err(e) => error!(path = ?path, err = %e, "Failed to load sample"),
            }
        }

        info!(path = ?dir, count = samples.len(), "Loaded samples");
        samples
    }

    /// Returns the total memory used by cached samples.
    pub fn total_memory_usage(&self) -> usize {
        self.cache.values().map(|s| s.memory_size()).sum()
    }
}

impl std::fmt::Debug for SampleLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SampleLoader")
            .field("cached_samples", &self.cache.len())
            .field("target_sample_rate", &self.target_sample_rate)
            .field("total_memory_kb", &(self.total_memory_usage() / 1024))
            .finish()
    }
}

/// Returns true if the path has one of the supported extensions.
fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            SUPPORTED_EXTENSIONS
                .iter()
                .any(|supported| ext.eq_ignore_ascii_case(supported))
        })
}

/// Transcodes samples from one sample rate to another using linear interpolation.
/// Cues are short and loaded once, so this is sufficient.
fn transcode_samples(
    samples: &[f32],
    channel_count: u16,
    source_rate: u32,
    target_rate: u32,
) -> Vec<f32> {
    let ratio = target_rate as f64 / source_rate as f64;
    let channels = channel_count as usize;
    let source_frames = samples.len() / channels;
    let target_frames = (source_frames as f64 * ratio).ceil() as usize;

    let mut output = Vec::with_capacity(target_frames * channels);

    for target_frame in 0..target_frames {
        let source_pos = target_frame as f64 / ratio;
        let source_frame = source_pos.floor() as usize;
        let frac = source_pos.fract() as f32;

        for channel in 0..channels {
            let idx0 = source_frame * channels + channel;
            let idx1 = (source_frame + 1) * channels + channel;

            let s0 = samples.get(idx0).copied().unwrap_or(0.0);
            let s1 = samples.get(idx1).copied().unwrap_or(s0);

            output.push(s0 + (s1 - s0) * frac);
        }
    }

    output
}

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

//! The sample store.
//!
//! Each group owns a bank of samples loaded from a directory at startup. Samples are
//! decoded fully into memory so that triggering one never touches the disk.

mod decode;
mod error;
mod loader;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

pub use error::SampleError;
pub use loader::{SampleLoader, SUPPORTED_EXTENSIONS};

/// A decoded, in-memory sound. Cloning is cheap: the audio data is shared.
#[derive(Clone)]
pub struct Sample {
    /// The file name the sample was loaded from.
    name: String,
    /// Interleaved f32 sample data.
    data: Arc<Vec<f32>>,
    /// Number of channels in the data.
    channel_count: u16,
    /// Sample rate of the data.
    sample_rate: u32,
}

impl Sample {
    /// Creates a new sample from interleaved data.
    pub fn new(name: &str, data: Vec<f32>, channel_count: u16, sample_rate: u32) -> Sample {
        Sample {
            name: name.to_string(),
            data: Arc::new(data),
            channel_count: channel_count.max(1),
            sample_rate,
        }
    }

    /// Creates a silent mono sample of the given duration.
    #[cfg(test)]
    pub fn silence(name: &str, duration: Duration) -> Sample {
        const RATE: u32 = 1000;
        let frames = (duration.as_secs_f64() * RATE as f64).round() as usize;
        Sample::new(name, vec![0.0; frames], 1, RATE)
    }

    /// The name of the sample.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The interleaved audio data.
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// The number of channels.
    pub fn channel_count(&self) -> u16 {
        self.channel_count
    }

    /// The sample rate.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// The number of frames (samples per channel).
    pub fn frames(&self) -> usize {
        self.data.len() / self.channel_count as usize
    }

    /// How long the sample plays for.
    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.frames() as f64 / self.sample_rate as f64)
    }

    /// The memory used by the audio data in bytes.
    pub fn memory_size(&self) -> usize {
        self.data.len() * std::mem::size_of::<f32>()
    }
}

impl fmt::Display for Sample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (Channels={}, Duration={})",
            self.name,
            self.channel_count,
            crate::util::duration_minutes_seconds(self.duration())
        )
    }
}

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
use serde::Deserialize;

const DEFAULT_SAMPLE_RATE: u32 = 44100;
const DEFAULT_MIXER_CHANNELS: usize = 8;
const DEFAULT_OUTPUT_CHANNELS: u16 = 2;

/// A YAML representation of the audio configuration.
#[derive(Deserialize, Clone, Debug)]
pub struct Audio {
    /// The audio device. Names starting with "mock" select the mock engine.
    device: String,

    /// Target sample rate in Hz (default: 44100).
    sample_rate: Option<u32>,

    /// The number of mixer channels available to groups (default: 8).
    mixer_channels: Option<usize>,

    /// The number of device output channels to render (default: 2).
    output_channels: Option<u16>,
}

impl Audio {
    /// New will create a new Audio configuration.
    pub fn new(device: &str) -> Audio {
        Audio {
            device: device.to_string(),
            sample_rate: None,
            mixer_channels: None,
            output_channels: None,
        }
    }

    /// Returns the device from the configuration.
    pub fn device(&self) -> &str {
        &self.device
    }

    /// Returns the target sample rate (default: 44100).
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate.unwrap_or(DEFAULT_SAMPLE_RATE)
    }

    /// Returns the number of mixer channels (default: 8).
    pub fn mixer_channels(&self) -> usize {
        self.mixer_channels.unwrap_or(DEFAULT_MIXER_CHANNELS)
    }

    /// Returns the number of device output channels (default: 2, at least 1).
    pub fn output_channels(&self) -> u16 {
        self.output_channels.unwrap_or(DEFAULT_OUTPUT_CHANNELS).max(1)
    }
}

// Copyright (C) 2025 Michael Wilson <mike@mdwn.dev>
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
use std::{error::Error, fmt, sync::Arc};

use crate::config;
use crate::samples::Sample;

pub mod cpal;
pub mod mixer;
pub mod mock;

/// A mixing engine with a fixed number of output channels.
pub trait Engine: fmt::Display + Send + Sync {
    /// The number of channels this engine exposes.
    fn channel_count(&self) -> usize;

    /// The sample rate samples should be loaded at.
    fn sample_rate(&self) -> u32;

    /// Gets the channel with the given index, if it exists.
    fn channel(&self, index: usize) -> Option<Arc<dyn Output>>;
}

/// One channel of a mixing engine. A channel plays at most one sound at a time.
pub trait Output: Send + Sync {
    /// Sets the channel volume. Values are clamped to 0.0-1.0.
    fn set_volume(&self, volume: f32);

    /// Gets the channel volume.
    fn volume(&self) -> f32;

    /// Plays the sample, replacing anything currently playing on this channel.
    fn play(&self, sample: &Sample, looping: bool);

    /// Stops whatever is playing on this channel.
    fn stop(&self);

    /// Returns true if a sound is currently playing on this channel.
    fn is_busy(&self) -> bool;
}

/// Lists devices known to cpal.
pub fn list_devices() -> Result<Vec<Box<dyn fmt::Display>>, Box<dyn Error>> {
    cpal::list_devices()
}

/// Gets an engine for the given audio configuration.
pub fn get_engine(config: &config::Audio) -> Result<Arc<dyn Engine>, Box<dyn Error>> {
    let device = config.device();
    if device.starts_with("mock") {
        return Ok(Arc::new(mock::Engine::new(device, config.mixer_channels())));
    };

    Ok(Arc::new(cpal::Engine::get(config)?))
}

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
use std::{
    fmt,
    sync::Arc,
    time::{Duration, Instant},
};

use parking_lot::Mutex;
use tracing::info;

use crate::audio::Output;
use crate::samples::Sample;

/// A sound the mock lane was asked to play.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Played {
    /// The sample name.
    pub sample: String,
    /// Whether it was looped.
    pub looping: bool,
}

struct Playing {
    played: Played,
    started: Instant,
    duration: Duration,
}

#[derive(Default)]
struct LaneState {
    playing: Option<Playing>,
    volume: f32,
    history: Vec<Played>,
    stops: usize,
}

/// A mock channel. Doesn't render anything, but is busy for as long as the sample would
/// have played (forever, when looping).
pub struct Lane {
    index: usize,
    state: Mutex<LaneState>,
}

impl Lane {
    fn new(index: usize) -> Lane {
        Lane {
            index,
            state: Mutex::new(LaneState {
                volume: 1.0,
                ..Default::default()
            }),
        }
    }

    /// The sound currently playing, if any.
    pub fn now_playing(&self) -> Option<Played> {
        let state = self.state.lock();
        state
            .playing
            .as_ref()
            .filter(|playing| Self::still_playing(playing))
            .map(|playing| playing.played.clone())
    }

    /// Everything this lane has been asked to play, oldest first.
    pub fn history(&self) -> Vec<Played> {
        self.state.lock().history.clone()
    }

    /// The number of times this lane has been stopped.
    pub fn stops(&self) -> usize {
        self.state.lock().stops
    }

    fn still_playing(playing: &Playing) -> bool {
        playing.played.looping || playing.started.elapsed() < playing.duration
    }
}

impl Output for Lane {
    fn set_volume(&self, volume: f32) {
        self.state.lock().volume = volume.clamp(0.0, 1.0);
    }

    fn volume(&self) -> f32 {
        self.state.lock().volume
    }

    fn play(&self, sample: &Sample, looping: bool) {
        info!(
            channel = self.index,
            sample = sample.name(),
            looping,
            "Playing sample (mock)."
        );
        let played = Played {
            sample: sample.name().to_string(),
            looping,
        };
        let mut state = self.state.lock();
        state.history.push(played.clone());
        state.playing = Some(Playing {
            played,
            started: Instant::now(),
            duration: sample.duration(),
        });
    }

    fn stop(&self) {
        let mut state = self.state.lock();
        state.playing = None;
        state.stops += 1;
    }

    fn is_busy(&self) -> bool {
        self.state
            .lock()
            .playing
            .as_ref()
            .is_some_and(Self::still_playing)
    }
}

/// A mock engine. Doesn't actually play anything.
pub struct Engine {
    name: String,
    lanes: Vec<Arc<Lane>>,
}

impl Engine {
    /// Creates a mock engine with the given number of channels.
    pub fn new(name: &str, channel_count: usize) -> Engine {
        Engine {
            name: name.to_string(),
            lanes: (0..channel_count).map(|i| Arc::new(Lane::new(i))).collect(),
        }
    }

    /// Gets the concrete mock lane, for inspection.
    pub fn lane(&self, index: usize) -> Option<Arc<Lane>> {
        self.lanes.get(index).cloned()
    }
}

impl super::Engine for Engine {
    fn channel_count(&self) -> usize {
        self.lanes.len()
    }

    fn sample_rate(&self) -> u32 {
        44100
    }

    fn channel(&self, index: usize) -> Option<Arc<dyn Output>> {
        self.lanes.get(index).map(|lane| {
            let output: Arc<dyn Output> = lane.clone();
            output
        })
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (Mock)", self.name)
    }
}

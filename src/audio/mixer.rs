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
// Core audio mixing logic that can be used by both CPAL and test implementations
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::audio::Output;
use crate::samples::Sample;

/// A sound being rendered on a lane.
struct Voice {
    sample: Sample,
    /// The next frame to render.
    position: usize,
    looping: bool,
}

impl Voice {
    /// Renders into the interleaved output. Returns true once a one-shot voice has ended.
    fn render(&mut self, output: &mut [f32], output_channels: usize, volume: f32) -> bool {
        let frames = self.sample.frames();
        if frames == 0 {
            return true;
        }
        let source_channels = self.sample.channel_count() as usize;
        let data = self.sample.data();

        for out_frame in output.chunks_exact_mut(output_channels) {
            if self.position >= frames {
                if self.looping {
                    self.position = 0;
                } else {
                    return true;
                }
            }

            let base = self.position * source_channels;
            for (channel, out) in out_frame.iter_mut().enumerate() {
                // Mono fans out to every output, otherwise wrap the source channels.
                *out += data[base + channel % source_channels] * volume;
            }
            self.position += 1;
        }

        !self.looping && self.position >= frames
    }
}

/// A single mixer channel. Holds at most one voice.
pub struct Lane {
    voice: Mutex<Option<Voice>>,
    /// The lane volume, stored as f32 bits.
    volume: AtomicU32,
    busy: AtomicBool,
}

impl Lane {
    fn new() -> Lane {
        Lane {
            voice: Mutex::new(None),
            volume: AtomicU32::new(1.0f32.to_bits()),
            busy: AtomicBool::new(false),
        }
    }

    /// Mixes this lane into the interleaved output buffer.
    fn mix_into(&self, output: &mut [f32], output_channels: usize) {
        let volume = f32::from_bits(self.volume.load(Ordering::Relaxed));
        let mut voice_guard = self.voice.lock();
        let finished = match voice_guard.as_mut() {
            Some(voice) => voice.render(output, output_channels, volume),
            None => return,
        };

        if finished {
            *voice_guard = None;
            self.busy.store(false, Ordering::Release);
        }
    }
}

impl Output for Lane {
    fn set_volume(&self, volume: f32) {
        self.volume
            .store(volume.clamp(0.0, 1.0).to_bits(), Ordering::Relaxed);
    }

    fn volume(&self) -> f32 {
        f32::from_bits(self.volume.load(Ordering::Relaxed))
    }

    fn play(&self, sample: &Sample, looping: bool) {
        let mut voice = self.voice.lock();
        let empty = sample.frames() == 0;
        *voice = if empty {
            None
        } else {
            Some(Voice {
                sample: sample.clone(),
                position: 0,
                looping,
            })
        };
        self.busy.store(!empty, Ordering::Release);
    }

    fn stop(&self) {
        let mut voice = self.voice.lock();
        *voice = None;
        self.busy.store(false, Ordering::Release);
    }

    fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

/// Core audio mixing logic that's independent of any audio backend.
#[derive(Clone)]
pub struct Mixer {
    lanes: Vec<Arc<Lane>>,
    /// Number of interleaved output channels rendered.
    output_channels: u16,
}

impl Mixer {
    /// Creates a new mixer with the given number of lanes.
    pub fn new(lane_count: usize, output_channels: u16) -> Mixer {
        Mixer {
            lanes: (0..lane_count).map(|_| Arc::new(Lane::new())).collect(),
            output_channels: output_channels.max(1),
        }
    }

    /// Gets the lane with the given index.
    pub fn lane(&self, index: usize) -> Option<Arc<Lane>> {
        self.lanes.get(index).cloned()
    }

    /// The number of lanes.
    pub fn lane_count(&self) -> usize {
        self.lanes.len()
    }

    /// The number of output channels.
    pub fn output_channels(&self) -> u16 {
        self.output_channels
    }

    /// Renders all lanes into the given interleaved buffer, overwriting its contents.
    pub fn process_into(&self, output: &mut [f32]) {
        output.fill(0.0);
        for lane in self.lanes.iter() {
            lane.mix_into(output, self.output_channels as usize);
        }
        for sample in output.iter_mut() {
            *sample = sample.clamp(-1.0, 1.0);
        }
    }

    /// Renders the given number of frames into a new buffer.
    #[cfg(test)]
    pub fn process_frames(&self, num_frames: usize) -> Vec<f32> {
        let mut frames = vec![0.0f32; num_frames * self.output_channels as usize];
        self.process_into(&mut frames);
        frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_mixing() {
        let mixer = Mixer::new(2, 2);
        let lane = mixer.lane(0).unwrap();
        lane.play(&Sample::new("mono", vec![0.5, 0.8], 1, 44100), false);
        assert!(lane.is_busy());

        let frames = mixer.process_frames(2);

        // Mono fans out to both outputs.
        assert_eq!(frames, vec![0.5, 0.5, 0.8, 0.8]);
        assert!(!lane.is_busy());
    }

    #[test]
    fn test_multiple_lane_mixing() {
        let mixer = Mixer::new(2, 2);
        mixer
            .lane(0)
            .unwrap()
            .play(&Sample::new("a", vec![0.5, 0.3], 2, 44100), false);
        mixer
            .lane(1)
            .unwrap()
            .play(&Sample::new("b", vec![0.2, 0.1], 2, 44100), false);

        let frame = mixer.process_frames(1);

        assert_eq!(frame.len(), 2);
        assert!((frame[0] - 0.7).abs() < 1e-6);
        assert!((frame[1] - 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_volume_applied() {
        let mixer = Mixer::new(1, 1);
        let lane = mixer.lane(0).unwrap();
        lane.set_volume(0.5);
        lane.play(&Sample::new("a", vec![0.8], 1, 44100), false);

        assert_eq!(mixer.process_frames(1), vec![0.4]);
        assert_eq!(lane.volume(), 0.5);

        lane.set_volume(3.0);
        assert_eq!(lane.volume(), 1.0);
    }

    #[test]
    fn test_one_shot_ends() {
        let mixer = Mixer::new(1, 1);
        let lane = mixer.lane(0).unwrap();
        lane.play(&Sample::new("a", vec![0.1, 0.2, 0.3], 1, 44100), false);

        let frames = mixer.process_frames(5);

        assert_eq!(frames, vec![0.1, 0.2, 0.3, 0.0, 0.0]);
        assert!(!lane.is_busy());
    }

    #[test]
    fn test_one_shot_ends_on_buffer_boundary() {
        let mixer = Mixer::new(1, 1);
        let lane = mixer.lane(0).unwrap();
        lane.play(&Sample::new("a", vec![0.1, 0.2], 1, 44100), false);

        mixer.process_frames(2);
        assert!(!lane.is_busy());
    }

    #[test]
    fn test_looping_wraps() {
        let mixer = Mixer::new(1, 1);
        let lane = mixer.lane(0).unwrap();
        lane.play(&Sample::new("a", vec![0.1, 0.2], 1, 44100), true);

        let frames = mixer.process_frames(5);

        assert_eq!(frames, vec![0.1, 0.2, 0.1, 0.2, 0.1]);
        assert!(lane.is_busy());

        lane.stop();
        assert!(!lane.is_busy());
        assert_eq!(mixer.process_frames(1), vec![0.0]);
    }

    #[test]
    fn test_play_replaces_voice() {
        let mixer = Mixer::new(1, 1);
        let lane = mixer.lane(0).unwrap();
        lane.play(&Sample::new("a", vec![0.1; 10], 1, 44100), false);
        lane.play(&Sample::new("b", vec![0.3; 10], 1, 44100), false);

        assert_eq!(mixer.process_frames(1), vec![0.3]);
    }

    #[test]
    fn test_empty_sample_never_busy() {
        let mixer = Mixer::new(1, 1);
        let lane = mixer.lane(0).unwrap();
        lane.play(&Sample::new("empty", vec![], 1, 44100), true);
        assert!(!lane.is_busy());
    }

    #[test]
    fn test_output_clamped() {
        let mixer = Mixer::new(2, 1);
        mixer
            .lane(0)
            .unwrap()
            .play(&Sample::new("a", vec![0.9], 1, 44100), false);
        mixer
            .lane(1)
            .unwrap()
            .play(&Sample::new("b", vec![0.9], 1, 44100), false);

        assert_eq!(mixer.process_frames(1), vec![1.0]);
    }
}

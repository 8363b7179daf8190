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

//! A mixer channel shared by one or more groups.
//!
//! Only one group can own a channel's sound at a time. The channel tracks which group that
//! is and a generation counter that advances on every play and stop, so that a playback
//! monitor can tell whether the sound it was watching is still the current one. All
//! ownership changes and their notifications happen under a single lock, which keeps a
//! displaced group's OFF ahead of the new group's ON.

use std::{
    fmt,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use parking_lot::Mutex;
use tracing::info;

use crate::audio::Output;
use crate::notifier::{Mode, Notifier};
use crate::samples::Sample;

static MEMBER_ID_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// A group's identity on a channel.
#[derive(Clone)]
pub struct Member {
    id: usize,
    name: Arc<str>,
    notifier: Option<Arc<dyn Notifier>>,
}

impl Member {
    /// Creates a member with a process-unique ID.
    pub fn new(name: &str, notifier: Option<Arc<dyn Notifier>>) -> Member {
        Member {
            id: MEMBER_ID_COUNTER.fetch_add(1, Ordering::Relaxed),
            name: name.into(),
            notifier,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// True if this member announces its transitions.
    pub fn has_notifier(&self) -> bool {
        self.notifier.is_some()
    }

    fn announce(&self, mode: Mode) {
        info!(group = %self.name, mode = %mode, "Group mode changed");
        if let Some(notifier) = &self.notifier {
            notifier.notify(mode);
        }
    }
}

impl fmt::Debug for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Member")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("notifier", &self.notifier.is_some())
            .finish()
    }
}

#[derive(Default)]
struct State {
    generation: u64,
    active: Option<Member>,
}

/// A single output channel.
pub struct Channel {
    index: usize,
    output: Arc<dyn Output>,
    state: Mutex<State>,
}

impl Channel {
    /// Wraps the engine output with the given index.
    pub fn new(index: usize, output: Arc<dyn Output>) -> Channel {
        Channel {
            index,
            output,
            state: Mutex::new(State::default()),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn set_volume(&self, volume: f32) {
        self.output.set_volume(volume);
    }

    pub fn volume(&self) -> f32 {
        self.output.volume()
    }

    /// True while the channel is producing sound.
    pub fn is_busy(&self) -> bool {
        self.output.is_busy()
    }

    /// The current playback generation.
    pub fn generation(&self) -> u64 {
        self.state.lock().generation
    }

    /// The ID of the member that currently owns this channel, if any.
    pub fn active_member(&self) -> Option<usize> {
        self.state.lock().active.as_ref().map(Member::id)
    }

    /// Starts the sample for the given member, replacing whatever was playing. A different
    /// member that still owns the channel is retired first, then the member announces ON.
    /// Every accepted start announces ON, including a retrigger by the current owner.
    /// Returns the new generation.
    pub fn start(&self, member: &Member, sample: &Sample, looping: bool) -> u64 {
        let mut state = self.state.lock();

        if self.output.is_busy() {
            self.output.stop();
        }

        if let Some(previous) = state.active.take() {
            if previous.id != member.id {
                previous.announce(Mode::Off);
            }
        }
        member.announce(Mode::On);

        self.output.play(sample, looping);
        state.generation += 1;
        state.active = Some(member.clone());

        info!(
            channel = self.index,
            group = member.name(),
            sample = sample.name(),
            looping,
            generation = state.generation,
            "Started sample"
        );
        state.generation
    }

    /// Stops the channel and retires its owner. Returns the ID of the member that was
    /// retired, if any.
    pub fn stop(&self) -> Option<usize> {
        let mut state = self.state.lock();
        self.output.stop();
        state.generation += 1;

        let retired = state.active.take();
        if let Some(member) = &retired {
            member.announce(Mode::Off);
        }
        retired.map(|member| member.id)
    }

    /// Called when a monitored sound has ended. Retires the member only if the generation
    /// is still current, the member still owns the channel and the output is idle.
    /// Returns true if the member was retired.
    pub fn complete(&self, member_id: usize, generation: u64) -> bool {
        let mut state = self.state.lock();
        if state.generation != generation || self.output.is_busy() {
            return false;
        }
        match state.active.take() {
            Some(member) if member.id == member_id => {
                member.announce(Mode::Off);
                true
            }
            other => {
                state.active = other;
                false
            }
        }
    }
}

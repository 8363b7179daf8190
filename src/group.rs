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
use std::{fmt, sync::Arc, time::Instant};

use tracing::debug;

use crate::channel::{Channel, Member};
use crate::command::{Action, CommandError};
use crate::monitor::Monitor;
use crate::notifier::Notifier;
use crate::samples::Sample;
use crate::util::percent_to_gain;

mod gate;

pub use gate::Gate;

/// What a group did with a command.
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    /// The channel volume was set to the given gain.
    Volume(f32),
    /// A track was started.
    Started { index: usize, looping: bool },
    /// The start was dropped by the cooldown.
    Debounced,
    /// The channel was stopped.
    Stopped,
}

/// A named bank of samples bound to a channel.
pub struct Group {
    member: Member,
    channel: Arc<Channel>,
    samples: Vec<Sample>,
    gate: Arc<Gate>,
    monitor: Monitor,
}

impl Group {
    /// Creates a group. The gate may be shared with other groups on the same channel.
    pub fn new(
        name: &str,
        channel: Arc<Channel>,
        samples: Vec<Sample>,
        gate: Arc<Gate>,
        notifier: Option<Arc<dyn Notifier>>,
        monitor: Monitor,
    ) -> Group {
        Group {
            member: Member::new(&name.to_lowercase(), notifier),
            channel,
            samples,
            gate,
            monitor,
        }
    }

    /// The lower-cased group name.
    pub fn name(&self) -> &str {
        self.member.name()
    }

    pub fn channel(&self) -> &Arc<Channel> {
        &self.channel
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn gate(&self) -> &Arc<Gate> {
        &self.gate
    }

    pub fn has_notifier(&self) -> bool {
        self.member.has_notifier()
    }

    /// True while this group owns its channel's sound.
    pub fn is_active(&self) -> bool {
        self.channel.active_member() == Some(self.member.id())
    }

    /// The channel volume.
    pub fn volume(&self) -> f32 {
        self.channel.volume()
    }

    /// Carries out the given action. Volume and stop always go through; starts are subject
    /// to the cooldown.
    pub fn process_command(&self, action: Action) -> Result<Outcome, CommandError> {
        match action {
            Action::Volume(percent) => {
                let gain = percent_to_gain(percent);
                self.channel.set_volume(gain);
                Ok(Outcome::Volume(gain))
            }
            Action::Play(index) => self.start(index, false),
            Action::Loop(index) => self.start(index, true),
            Action::Stop => {
                self.channel.stop();
                Ok(Outcome::Stopped)
            }
        }
    }

    fn start(&self, index: i64, looping: bool) -> Result<Outcome, CommandError> {
        // Range check first so a bad index neither stops the channel nor uses the cooldown.
        let (position, sample) = usize::try_from(index)
            .ok()
            .and_then(|position| self.samples.get(position).map(|sample| (position, sample)))
            .ok_or_else(|| CommandError::TrackOutOfRange {
                group: self.name().to_string(),
                index,
                available: self.samples.len(),
            })?;

        if !self.gate.try_accept(Instant::now()) {
            debug!(group = self.name(), index, "Start rejected by cooldown");
            return Ok(Outcome::Debounced);
        }

        let generation = self.channel.start(&self.member, sample, looping);
        self.monitor
            .watch(self.channel.clone(), self.member.id(), generation);

        Ok(Outcome::Started {
            index: position,
            looping,
        })
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Group {} (Channel={}, Samples={}, Cooldown={:?}, Notify={}):",
            self.name(),
            self.channel.index(),
            self.samples.len(),
            self.gate.interval(),
            self.has_notifier(),
        )?;
        for (index, sample) in self.samples.iter().enumerate() {
            writeln!(f, "  {}: {}", index, sample)?;
        }
        Ok(())
    }
}

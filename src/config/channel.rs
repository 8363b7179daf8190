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
use std::time::Duration;

use serde::Deserialize;

use super::{error::ConfigError, parse_duration};

const DEFAULT_VOLUME: i64 = 100;

/// Whether groups on a channel share one cooldown.
#[derive(Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CooldownScope {
    /// Every group has its own cooldown.
    #[default]
    Group,
    /// All groups on the channel share a cooldown.
    Channel,
}

/// A YAML representation of a mixer channel and the groups bound to it.
#[derive(Deserialize, Clone, Debug)]
pub struct Channel {
    /// The mixer channel index.
    channel: usize,

    /// The initial volume in percent (default: 100).
    volume: Option<i64>,

    /// Overrides the default cooldown for this channel's groups.
    cooldown: Option<String>,

    /// Whether the cooldown is per group or shared by the channel.
    cooldown_scope: Option<CooldownScope>,

    /// The groups bound to this channel.
    groups: Vec<Group>,
}

impl Channel {
    pub fn channel(&self) -> usize {
        self.channel
    }

    pub fn volume(&self) -> i64 {
        self.volume.unwrap_or(DEFAULT_VOLUME)
    }

    /// The cooldown for this channel, falling back to the given default.
    pub fn cooldown(&self, default: Duration) -> Result<Duration, ConfigError> {
        self.cooldown
            .as_deref()
            .map_or(Ok(default), parse_duration)
    }

    pub fn cooldown_scope(&self) -> CooldownScope {
        self.cooldown_scope.unwrap_or_default()
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }
}

/// A YAML representation of a group.
#[derive(Deserialize, Clone, Debug)]
pub struct Group {
    /// The name commands address the group by. Case insensitive.
    name: String,

    /// Whether the group sends mode notifications (default: false).
    notify: Option<bool>,

    /// The sample directory, relative to the sample root (default: the lower-cased name).
    directory: Option<String>,
}

impl Group {
    /// The lower-cased, trimmed group name.
    pub fn name(&self) -> String {
        self.name.trim().to_lowercase()
    }

    pub fn notify(&self) -> bool {
        self.notify.unwrap_or(false)
    }

    pub fn directory(&self) -> String {
        self.directory.clone().unwrap_or_else(|| self.name())
    }
}

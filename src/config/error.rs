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

/// Typed error for config load and validation failures. All of these are fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config load/parse error: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid duration '{value}': {reason}")]
    Duration { value: String, reason: String },

    #[error("invalid address '{value}': {reason}")]
    Address { value: String, reason: String },

    #[error("group '{0}' is defined more than once")]
    DuplicateGroup(String),

    #[error("channel {0} is defined more than once")]
    DuplicateChannel(usize),

    #[error("channel {channel} is out of range, the mixer has {available} channels")]
    ChannelOutOfRange { channel: usize, available: usize },

    #[error("group '{0}' wants notifications but no notifier address is configured")]
    MissingNotifier(String),

    #[error("channel {0} has a group with an empty name")]
    EmptyName(usize),

    #[error("audio engine error: {0}")]
    Audio(String),
}

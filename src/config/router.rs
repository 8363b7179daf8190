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
use std::{
    collections::HashSet,
    net::{SocketAddr, ToSocketAddrs},
    path::{Path, PathBuf},
    time::Duration,
};

use config::{Config, Environment, File};
use serde::Deserialize;

use super::{audio::Audio, channel::Channel, error::ConfigError, parse_duration};
use crate::monitor::DEFAULT_POLL_INTERVAL;

/// Environment variables with this prefix override file settings, e.g.
/// CUEROUTER_LISTEN or CUEROUTER_AUDIO__DEVICE.
pub const ENV_PREFIX: &str = "CUEROUTER";

const DEFAULT_COOLDOWN: Duration = Duration::from_millis(500);

/// The YAML configuration for the router.
#[derive(Deserialize, Clone, Debug)]
pub struct Router {
    /// The address commands are received on.
    listen: String,

    /// Where mode notifications are sent. Required if any group notifies.
    notifier: Option<String>,

    /// The sample root. Relative paths are resolved against the config file.
    samples: Option<String>,

    /// The default cooldown (default: 500ms).
    cooldown: Option<String>,

    /// How often playback monitors check their channel (default: 20ms).
    poll_interval: Option<String>,

    /// The audio configuration.
    audio: Audio,

    /// The channels and their groups.
    #[serde(default)]
    channels: Vec<Channel>,
}

impl Router {
    /// Parses the router configuration from a YAML file, applying environment overrides.
    pub fn deserialize(path: &Path) -> Result<Router, ConfigError> {
        Ok(Config::builder()
            .add_source(File::from(path))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize::<Router>()?)
    }

    /// The command socket address.
    pub fn listen(&self) -> Result<SocketAddr, ConfigError> {
        resolve_address(&self.listen)
    }

    /// The notification target, if configured.
    pub fn notifier(&self) -> Result<Option<SocketAddr>, ConfigError> {
        self.notifier.as_deref().map(resolve_address).transpose()
    }

    /// The sample root, resolved against the given base directory.
    pub fn samples(&self, base: &Path) -> PathBuf {
        let samples = Path::new(self.samples.as_deref().unwrap_or("."));
        if samples.is_absolute() {
            samples.to_path_buf()
        } else {
            base.join(samples)
        }
    }

    /// The default cooldown for channels that don't set one.
    pub fn cooldown(&self) -> Result<Duration, ConfigError> {
        self.cooldown
            .as_deref()
            .map_or(Ok(DEFAULT_COOLDOWN), parse_duration)
    }

    pub fn poll_interval(&self) -> Result<Duration, ConfigError> {
        self.poll_interval
            .as_deref()
            .map_or(Ok(DEFAULT_POLL_INTERVAL), parse_duration)
    }

    pub fn audio(&self) -> &Audio {
        &self.audio
    }

    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    /// Checks everything that can be checked without touching the network or audio devices.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.listen()?;
        let notifier = self.notifier()?;
        let default_cooldown = self.cooldown()?;
        self.poll_interval()?;

        let available = self.audio.mixer_channels();
        let mut channels = HashSet::new();
        let mut names = HashSet::new();
        for channel in self.channels.iter() {
            if channel.channel() >= available {
                return Err(ConfigError::ChannelOutOfRange {
                    channel: channel.channel(),
                    available,
                });
            }
            if !channels.insert(channel.channel()) {
                return Err(ConfigError::DuplicateChannel(channel.channel()));
            }
            channel.cooldown(default_cooldown)?;

            for group in channel.groups() {
                let name = group.name();
                if name.is_empty() {
                    return Err(ConfigError::EmptyName(channel.channel()));
                }
                if group.notify() && notifier.is_none() {
                    return Err(ConfigError::MissingNotifier(name));
                }
                if !names.insert(name.clone()) {
                    return Err(ConfigError::DuplicateGroup(name));
                }
            }
        }

        Ok(())
    }
}

/// Resolves an address, allowing host names.
fn resolve_address(value: &str) -> Result<SocketAddr, ConfigError> {
    if let Ok(addr) = value.parse::<SocketAddr>() {
        return Ok(addr);
    }

    let address_error = |reason: String| ConfigError::Address {
        value: value.to_string(),
        reason,
    };
    value
        .to_socket_addrs()
        .map_err(|e| address_error(e.to_string()))?
        .next()
        .ok_or_else(|| address_error("no addresses found".to_string()))
}

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
use std::{error::Error, path::Path, sync::Arc, time::Duration};

use duration_string::DurationString;
use tracing::info;

use crate::audio::Engine;
use crate::group::{self, Gate};
use crate::monitor::Monitor;
use crate::notifier::{Notifier, UdpNotifier};
use crate::samples::SampleLoader;
use crate::util::percent_to_gain;

mod audio;
mod channel;
mod error;
mod router;

pub use self::audio::Audio;
pub use self::channel::{Channel, CooldownScope, Group};
pub use self::error::ConfigError;
pub use self::router::{Router, ENV_PREFIX};

/// Parses a human duration such as "500ms" or "1s".
fn parse_duration(value: &str) -> Result<Duration, ConfigError> {
    DurationString::from_string(value.to_string())
        .map(Into::into)
        .map_err(|e| ConfigError::Duration {
            value: value.to_string(),
            reason: e.to_string(),
        })
}

/// Loads and validates the router configuration.
pub fn load(path: &Path) -> Result<Router, ConfigError> {
    let config = Router::deserialize(path)?;
    config.validate()?;
    Ok(config)
}

/// Builds every configured group on the given engine. Sample directories are resolved
/// against `base`, normally the directory holding the config file.
pub fn build_groups(
    config: &Router,
    base: &Path,
    engine: &dyn Engine,
    notifier: Option<Arc<dyn Notifier>>,
    monitor: Monitor,
) -> Result<Vec<Arc<group::Group>>, ConfigError> {
    let default_cooldown = config.cooldown()?;
    let samples_root = config.samples(base);
    let mut loader = SampleLoader::new(engine.sample_rate());

    let mut groups = Vec::new();
    for channel_config in config.channels() {
        let index = channel_config.channel();
        let output = engine
            .channel(index)
            .ok_or(ConfigError::ChannelOutOfRange {
                channel: index,
                available: engine.channel_count(),
            })?;
        let channel = Arc::new(crate::channel::Channel::new(index, output));
        channel.set_volume(percent_to_gain(channel_config.volume()));

        let cooldown = channel_config.cooldown(default_cooldown)?;
        let shared_gate = Arc::new(Gate::new(cooldown));

        for group_config in channel_config.groups() {
            let gate = match channel_config.cooldown_scope() {
                CooldownScope::Channel => shared_gate.clone(),
                CooldownScope::Group => Arc::new(Gate::new(cooldown)),
            };
            let notifier = if group_config.notify() {
                notifier.clone()
            } else {
                None
            };
            let samples = loader.load_directory(&samples_root.join(group_config.directory()));

            let group = group::Group::new(
                &group_config.name(),
                channel.clone(),
                samples,
                gate,
                notifier,
                monitor.clone(),
            );
            info!(
                group = group.name(),
                channel = index,
                samples = group.samples().len(),
                notify = group.has_notifier(),
                "Configured group"
            );
            groups.push(Arc::new(group));
        }
    }

    info!(
        groups = groups.len(),
        memory = loader.total_memory_usage(),
        "Sample banks loaded"
    );
    Ok(groups)
}

/// Builds the groups for a loaded config, creating the notifier and monitor they share.
pub async fn init_groups(
    config: &Router,
    base: &Path,
    engine: &dyn Engine,
) -> Result<Vec<Arc<group::Group>>, Box<dyn Error>> {
    let notifier: Option<Arc<dyn Notifier>> = match config.notifier()? {
        Some(target) => Some(Arc::new(UdpNotifier::bind(target).await?)),
        None => None,
    };
    let monitor = Monitor::new(config.poll_interval()?)?;

    Ok(build_groups(config, base, engine, notifier, monitor)?)
}

/// Initializes the router from the given config file: opens the audio engine, loads every
/// sample bank and binds the command socket.
pub async fn init_router(path: &Path) -> Result<crate::router::Router, Box<dyn Error>> {
    let config = load(path)?;
    let base = path.parent().unwrap_or(Path::new("."));

    let engine = crate::audio::get_engine(config.audio())
        .map_err(|e| ConfigError::Audio(e.to_string()))?;
    info!(engine = %engine, "Audio engine ready");

    let groups = init_groups(&config, base, engine.as_ref()).await?;
    Ok(crate::router::Router::bind(config.listen()?, groups).await?)
}

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
    error::Error,
    fmt,
    sync::{mpsc, Arc},
    thread,
};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use tracing::{error, info, span, Level};

use crate::audio::mixer::Mixer;
use crate::audio::Output;
use crate::config;

/// The device name that selects the host's default output device.
const DEFAULT_DEVICE: &str = "default";

/// Describes an output device found while listing.
struct DeviceInfo {
    name: String,
    max_channels: u16,
    host_id: cpal::HostId,
}

impl fmt::Display for DeviceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (Channels={}) ({})",
            self.name,
            self.max_channels,
            self.host_id.name()
        )
    }
}

/// A mixing engine that renders through a cpal output device.
pub struct Engine {
    /// The name of the device.
    name: String,
    /// The host ID of the device.
    host_id: cpal::HostId,
    /// The sample rate the stream runs at.
    sample_rate: u32,
    /// The mixer rendered by the output stream.
    mixer: Mixer,
    /// Handle to the output thread, which owns the stream and keeps it alive.
    _output_thread: thread::JoinHandle<()>,
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (Channels={}) ({})",
            self.name,
            self.mixer.lane_count(),
            self.host_id.name()
        )
    }
}

/// Lists the output devices of every available host.
pub fn list_devices() -> Result<Vec<Box<dyn fmt::Display>>, Box<dyn Error>> {
    // Suppress noisy output here.
    let _shh_stdout = shh::stdout()?;
    let _shh_stderr = shh::stderr()?;

    let mut devices: Vec<DeviceInfo> = Vec::new();
    for host_id in cpal::available_hosts() {
        let host_devices = match cpal::host_from_id(host_id)?.output_devices() {
            Ok(host_devices) => host_devices,
            Err(e) => {
                error!(
                    err = e.to_string(),
                    host = host_id.name(),
                    "Unable to list devices for host"
                );
                continue;
            }
        };

        for device in host_devices {
            let Ok(output_configs) = device.supported_output_configs() else {
                continue;
            };
            let max_channels = output_configs
                .map(|output_config| output_config.channels())
                .max()
                .unwrap_or(0);

            if max_channels > 0 {
                devices.push(DeviceInfo {
                    name: device.name()?,
                    max_channels,
                    host_id,
                });
            }
        }
    }

    devices.sort_by_key(|device| device.name.to_string());
    Ok(devices
        .into_iter()
        .map(|device| {
            let device: Box<dyn fmt::Display> = Box::new(device);
            device
        })
        .collect())
}

/// Finds the named output device across all hosts.
fn find_device(name: &str) -> Result<(cpal::HostId, cpal::Device), Box<dyn Error>> {
    let _shh_stdout = shh::stdout()?;
    let _shh_stderr = shh::stderr()?;

    if name == DEFAULT_DEVICE {
        let host = cpal::default_host();
        return match host.default_output_device() {
            Some(device) => Ok((host.id(), device)),
            None => Err("no default output device available".into()),
        };
    }

    for host_id in cpal::available_hosts() {
        let Ok(devices) = cpal::host_from_id(host_id)?.output_devices() else {
            continue;
        };
        for device in devices {
            if device.name().is_ok_and(|device_name| device_name.trim() == name) {
                return Ok((host_id, device));
            }
        }
    }

    Err(format!("no device found with name {}", name).into())
}

/// Creates an output callback that renders the mixer and converts to the device format.
fn create_callback<T>(
    mixer: Mixer,
) -> impl FnMut(&mut [T], &cpal::OutputCallbackInfo) + Send + 'static
where
    T: cpal::Sample + cpal::FromSample<f32>,
{
    let mut scratch: Vec<f32> = Vec::new();
    move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
        scratch.resize(data.len(), 0.0);
        mixer.process_into(&mut scratch);
        for (dst, &src) in data.iter_mut().zip(scratch.iter()) {
            *dst = T::from_sample(src);
        }
    }
}

/// Builds the output stream for the device's native sample format.
fn build_stream(
    device: &cpal::Device,
    stream_config: &cpal::StreamConfig,
    sample_format: cpal::SampleFormat,
    mixer: Mixer,
) -> Result<cpal::Stream, Box<dyn Error>> {
    let err_fn = |err: cpal::StreamError| error!(err = %err, "CPAL output stream error");
    let stream = match sample_format {
        cpal::SampleFormat::F32 => device.build_output_stream(
            stream_config,
            create_callback::<f32>(mixer),
            err_fn,
            None,
        )?,
        cpal::SampleFormat::I16 => device.build_output_stream(
            stream_config,
            create_callback::<i16>(mixer),
            err_fn,
            None,
        )?,
        cpal::SampleFormat::I32 => device.build_output_stream(
            stream_config,
            create_callback::<i32>(mixer),
            err_fn,
            None,
        )?,
        cpal::SampleFormat::U16 => device.build_output_stream(
            stream_config,
            create_callback::<u16>(mixer),
            err_fn,
            None,
        )?,
        other => return Err(format!("unsupported sample format {:?}", other).into()),
    };
    Ok(stream)
}

impl Engine {
    /// Opens the configured device and starts its output stream.
    pub fn get(config: &config::Audio) -> Result<Engine, Box<dyn Error>> {
        let span = span!(Level::INFO, "cpal engine");
        let _enter = span.enter();

        let (host_id, device) = find_device(config.device())?;
        let name = device.name()?;
        let sample_format = device.default_output_config()?.sample_format();
        let sample_rate = config.sample_rate();
        let mixer = Mixer::new(config.mixer_channels(), config.output_channels());

        let stream_config = cpal::StreamConfig {
            channels: mixer.output_channels(),
            sample_rate: cpal::SampleRate(sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        // cpal streams aren't Send, so the stream lives on its own thread for the lifetime
        // of the process.
        let (ready_tx, ready_rx) = mpsc::channel::<Result<(), String>>();
        let output_thread = {
            let mixer = mixer.clone();
            thread::spawn(move || {
                let stream = match build_stream(&device, &stream_config, sample_format, mixer) {
                    Ok(stream) => stream,
                    Err(e) => {
                        let _ = ready_tx.send(Err(e.to_string()));
                        return;
                    }
                };
                if let Err(e) = stream.play() {
                    let _ = ready_tx.send(Err(e.to_string()));
                    return;
                }
                let _ = ready_tx.send(Ok(()));

                loop {
                    thread::park();
                }
            })
        };

        ready_rx
            .recv()
            .map_err(|_| "output thread exited before starting the stream")??;

        info!(
            device = name,
            sample_rate,
            channels = mixer.lane_count(),
            "CPAL output stream started"
        );

        Ok(Engine {
            name,
            host_id,
            sample_rate,
            mixer,
            _output_thread: output_thread,
        })
    }
}

impl super::Engine for Engine {
    fn channel_count(&self) -> usize {
        self.mixer.lane_count()
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn channel(&self, index: usize) -> Option<Arc<dyn Output>> {
        self.mixer.lane(index).map(|lane| {
            let output: Arc<dyn Output> = lane;
            output
        })
    }
}

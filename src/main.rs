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
use std::error::Error;
use std::path::{Path, PathBuf};

use clap::{crate_version, Parser, Subcommand};
use tokio::net::UdpSocket;
use tracing::info;
use tracing_subscriber::EnvFilter;

use cuerouter::{audio, config};

const SYSTEMD_SERVICE: &str = r#"
[Unit]
Description=UDP audio cue router
After=network-online.target sound.target

[Service]
Type=simple
Restart=on-failure
EnvironmentFile=-/etc/default/cuerouter
ExecStart=/usr/local/bin/cuerouter start "$CUEROUTER_CONFIG"

[Install]
WantedBy=multi-user.target
Alias=cuerouter.service
"#;

#[derive(Parser)]
#[clap(
    author = "Michael Wilson",
    version = crate_version!(),
    about = "A UDP-addressable audio cue router."
)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start will start the router and run until interrupted.
    Start {
        /// The path to the router config.
        config_path: String,
    },
    /// Lists and verifies every group and its samples.
    Samples {
        /// The path to the router config.
        config_path: String,
    },
    /// Lists the available audio output devices.
    Devices {},
    /// Sends a single command datagram, e.g. `send 127.0.0.1:7070 dispatch,play,1`.
    Send {
        /// The router address.
        target: String,
        /// The command to send.
        message: String,
    },
    /// Prints a systemd service definition to stdout.
    Systemd {},
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Start { config_path } => {
            let router = config::init_router(&PathBuf::from(config_path)).await?;
            info!(addr = %router.local_addr()?, "Router started");

            tokio::select! {
                _ = router.receive_loop() => {}
                result = tokio::signal::ctrl_c() => {
                    result?;
                    info!("Interrupted, shutting down");
                }
            }
        }
        Commands::Samples { config_path } => {
            let path = PathBuf::from(&config_path);
            let router_config = config::load(&path)?;
            // Banks are verified without opening the real device.
            let engine = audio::mock::Engine::new(
                "verify",
                router_config.audio().mixer_channels(),
            );
            let base = path.parent().unwrap_or(Path::new("."));
            let groups = config::init_groups(&router_config, base, &engine).await?;

            if groups.is_empty() {
                println!("No groups found in {}.", config_path);
                return Ok(());
            }

            println!("Groups (count: {}):", groups.len());
            for group in groups {
                print!("{}", group);
            }
        }
        Commands::Devices {} => {
            let devices = audio::list_devices()?;

            if devices.is_empty() {
                println!("No devices found.");
                return Ok(());
            }

            println!("Devices:");
            for device in devices {
                println!("- {}", device);
            }
        }
        Commands::Send { target, message } => {
            let socket = UdpSocket::bind("0.0.0.0:0").await?;
            let sent = socket.send_to(message.as_bytes(), target.as_str()).await?;
            println!("Sent {} bytes to {}.", sent, target);
        }
        Commands::Systemd {} => {
            println!("{}", SYSTEMD_SERVICE)
        }
    }

    Ok(())
}

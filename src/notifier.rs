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

//! Mode notifications.
//!
//! Groups with a notifier announce when their sound starts and stops so that lighting,
//! displays and the like can follow along. Delivery is best effort.

use std::{fmt, io, net::SocketAddr};

use tokio::net::UdpSocket;
use tracing::{debug, warn};

#[cfg(test)]
pub mod mock;

/// The payload sent when a group starts producing sound.
pub const MODE_BUTTON_ON: &str = "MODE_BUTTON_ON";
/// The payload sent when a group stops producing sound.
pub const MODE_BUTTON_OFF: &str = "MODE_BUTTON_OFF";

/// A playback transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    On,
    Off,
}

impl Mode {
    /// The wire payload for this mode.
    pub fn payload(&self) -> &'static str {
        match self {
            Mode::On => MODE_BUTTON_ON,
            Mode::Off => MODE_BUTTON_OFF,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.payload())
    }
}

/// Announces mode transitions. Implementations must not block and must swallow their own
/// delivery errors.
pub trait Notifier: Send + Sync {
    fn notify(&self, mode: Mode);
}

/// Sends mode notifications as UDP datagrams to a fixed target.
pub struct UdpNotifier {
    socket: UdpSocket,
    target: SocketAddr,
}

impl UdpNotifier {
    /// Binds an ephemeral socket for sending to the given target.
    pub async fn bind(target: SocketAddr) -> io::Result<UdpNotifier> {
        let bind_addr: SocketAddr = if target.is_ipv4() {
            ([0, 0, 0, 0], 0).into()
        } else {
            ([0u16; 8], 0).into()
        };
        let socket = UdpSocket::bind(bind_addr).await?;
        // Allow broadcast targets.
        socket.set_broadcast(true)?;
        Ok(UdpNotifier { socket, target })
    }

    /// The target notifications are sent to.
    pub fn target(&self) -> SocketAddr {
        self.target
    }
}

impl Notifier for UdpNotifier {
    fn notify(&self, mode: Mode) {
        match self.socket.try_send_to(mode.payload().as_bytes(), self.target) {
            Ok(_) => debug!(addr = %self.target, mode = %mode, "Sent mode notification"),
            Err(e) => warn!(
                addr = %self.target,
                mode = %mode,
                err = %e,
                "Unable to send mode notification"
            ),
        }
    }
}

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
use std::{collections::HashMap, io, net::SocketAddr, sync::Arc};

use tokio::net::UdpSocket;
use tracing::{debug, error, info, span, warn, Instrument, Level};

use crate::command::{self, CommandError};
use crate::group::{Group, Outcome};

/// The largest datagram read from the command socket. Anything longer is truncated.
pub const MAX_DATAGRAM_SIZE: usize = 1024;

#[derive(Debug, thiserror::Error)]
pub enum RouterError {
    #[error("unable to bind command socket {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },
}

/// Receives commands over UDP and hands them to groups.
pub struct Router {
    socket: UdpSocket,
    groups: HashMap<String, Arc<Group>>,
}

impl Router {
    /// Binds the command socket.
    pub async fn bind(addr: SocketAddr, groups: Vec<Arc<Group>>) -> Result<Router, RouterError> {
        let socket = UdpSocket::bind(addr)
            .await
            .map_err(|source| RouterError::Bind { addr, source })?;

        Ok(Router {
            socket,
            groups: groups
                .into_iter()
                .map(|group| (group.name().to_string(), group))
                .collect(),
        })
    }

    /// The address the command socket is bound to.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Looks up a group by name, case insensitively.
    pub fn group(&self, name: &str) -> Option<&Arc<Group>> {
        self.groups.get(&name.to_lowercase())
    }

    /// All groups, sorted by name.
    pub fn groups(&self) -> Vec<&Arc<Group>> {
        let mut groups: Vec<&Arc<Group>> = self.groups.values().collect();
        groups.sort_by(|a, b| a.name().cmp(b.name()));
        groups
    }

    /// Handles a single datagram. Anything that can't be carried out is logged once and
    /// dropped.
    pub fn dispatch(&self, datagram: &[u8]) -> Result<Outcome, CommandError> {
        let result = command::parse(datagram).and_then(|command| {
            let group = self
                .groups
                .get(&command.group)
                .ok_or_else(|| CommandError::UnknownGroup(command.group.clone()))?;
            debug!(group = group.name(), action = %command.action, "Dispatching command");
            group.process_command(command.action)
        });

        match &result {
            Ok(Outcome::Debounced) => debug!("Command debounced"),
            Ok(outcome) => info!(outcome = ?outcome, "Command handled"),
            Err(e) => warn!(
                err = %e,
                message = %String::from_utf8_lossy(datagram).trim(),
                "Discarding command"
            ),
        }
        result
    }

    /// Receives and dispatches commands until the task is dropped. Receive errors are logged
    /// and the loop carries on.
    pub async fn receive_loop(&self) {
        let span = span!(Level::INFO, "router");
        async {
            info!(
                addr = ?self.socket.local_addr().ok(),
                groups = self.groups.len(),
                "Listening for commands"
            );

            let mut buf = [0u8; MAX_DATAGRAM_SIZE];
            loop {
                match self.socket.recv_from(&mut buf).await {
                    Ok((size, from)) => {
                        debug!(from = %from, size, "Received datagram");
                        let _ = self.dispatch(&buf[..size]);
                    }
                    Err(e) => error!(err = %e, "Error receiving command"),
                }
            }
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
mod test {
    use std::{error::Error, sync::Arc, time::Duration};

    use tokio::net::UdpSocket;

    use crate::audio::{mock, Engine};
    use crate::channel::Channel;
    use crate::command::CommandError;
    use crate::group::{Gate, Group, Outcome};
    use crate::monitor::Monitor;
    use crate::notifier::{mock::Recorder, Mode};
    use crate::samples::Sample;
    use crate::testutil::eventually_async;

    use super::{Router, RouterError};

    struct Installation {
        router: Router,
        lane: Arc<mock::Lane>,
        recorder: Recorder,
    }

    /// One "dispatch" group on channel 4 with three long samples and a 0.5s cooldown.
    async fn installation() -> Result<Installation, Box<dyn Error>> {
        let engine = mock::Engine::new("mock", 8);
        let channel = Arc::new(Channel::new(4, engine.channel(4).ok_or("no channel")?));
        let recorder = Recorder::new("dispatch");
        let samples = (0..3)
            .map(|i| Sample::silence(&format!("dispatch-{}", i), Duration::from_secs(10)))
            .collect();
        let group = Group::new(
            "Dispatch",
            channel,
            samples,
            Arc::new(Gate::new(Duration::from_millis(500))),
            Some(Arc::new(recorder.clone())),
            Monitor::new(Duration::from_millis(5))?,
        );
        let router = Router::bind("127.0.0.1:0".parse()?, vec![Arc::new(group)]).await?;
        Ok(Installation {
            router,
            lane: engine.lane(4).ok_or("no lane")?,
            recorder,
        })
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_dispatch_scenario() -> Result<(), Box<dyn Error>> {
        let Installation {
            router,
            lane,
            recorder,
        } = installation().await?;

        assert_eq!(
            router.dispatch(b"dispatch,play,1"),
            Ok(Outcome::Started {
                index: 1,
                looping: false
            })
        );
        assert_eq!(
            lane.now_playing().map(|played| played.sample),
            Some("dispatch-1".to_string())
        );
        assert_eq!(recorder.modes(), vec![Mode::On]);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(router.dispatch(b"dispatch,play,2"), Ok(Outcome::Debounced));
        assert_eq!(
            lane.now_playing().map(|played| played.sample),
            Some("dispatch-1".to_string())
        );

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(router.dispatch(b"dispatch,stop"), Ok(Outcome::Stopped));
        assert!(lane.now_playing().is_none());

        // Give the monitor time to notice; it must not send a second OFF.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(recorder.modes(), vec![Mode::On, Mode::Off]);
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_volume() -> Result<(), Box<dyn Error>> {
        let installation = installation().await?;
        assert_eq!(
            installation.router.dispatch(b"DISPATCH, volume, 50"),
            Ok(Outcome::Volume(0.5))
        );
        let group = installation.router.group("dispatch").ok_or("no group")?;
        assert_eq!(group.volume(), 0.5);
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_discarded_commands() -> Result<(), Box<dyn Error>> {
        let Installation {
            router,
            lane,
            recorder,
        } = installation().await?;

        assert_eq!(
            router.dispatch(b"archive,play"),
            Err(CommandError::FieldCount(2))
        );
        assert_eq!(
            router.dispatch(b"archive,play,1"),
            Err(CommandError::UnknownGroup("archive".to_string()))
        );
        assert_eq!(
            router.dispatch(b"dispatch,play,7"),
            Err(CommandError::TrackOutOfRange {
                group: "dispatch".to_string(),
                index: 7,
                available: 3
            })
        );
        assert!(lane.history().is_empty());
        assert!(recorder.modes().is_empty());
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_receive_loop() -> Result<(), Box<dyn Error>> {
        let Installation {
            router,
            lane,
            recorder,
        } = installation().await?;
        let addr = router.local_addr()?;
        let router = Arc::new(router);
        let task = {
            let router = router.clone();
            tokio::spawn(async move { router.receive_loop().await })
        };

        let sender = UdpSocket::bind("127.0.0.1:0").await?;
        sender.send_to(b"garbage", addr).await?;
        sender.send_to(b"dispatch,loop,0", addr).await?;

        eventually_async(
            || {
                let lane = lane.clone();
                async move { lane.now_playing().is_some_and(|played| played.looping) }
            },
            "Looping sample never started",
        )
        .await;
        assert_eq!(recorder.modes(), vec![Mode::On]);

        sender.send_to(b"dispatch,stop,0", addr).await?;
        eventually_async(
            || {
                let recorder = recorder.clone();
                async move { recorder.modes() == vec![Mode::On, Mode::Off] }
            },
            "Group never went inactive",
        )
        .await;

        task.abort();
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_bind_failure() -> Result<(), Box<dyn Error>> {
        let taken = UdpSocket::bind("127.0.0.1:0").await?;
        let addr = taken.local_addr()?;
        match Router::bind(addr, vec![]).await {
            Err(RouterError::Bind { addr: failed, .. }) => assert_eq!(failed, addr),
            Ok(_) => panic!("expected bind failure"),
        }
        Ok(())
    }
}

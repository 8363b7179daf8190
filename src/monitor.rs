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
use std::{sync::Arc, time::Duration};

use tokio::{runtime::Handle, task::JoinHandle};
use tracing::{debug, span, Instrument, Level};

use crate::channel::Channel;

/// The default interval between checks of a monitored channel.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Watches playbacks and retires their group once the sound ends.
///
/// Every playback gets its own task. A task exits as soon as its generation is superseded,
/// so a replaced sound never produces a notification.
#[derive(Clone, Debug)]
pub struct Monitor {
    handle: Handle,
    poll_interval: Duration,
}

impl Monitor {
    /// Creates a monitor that spawns onto the current tokio runtime.
    pub fn new(poll_interval: Duration) -> Result<Monitor, tokio::runtime::TryCurrentError> {
        Ok(Monitor::with_handle(Handle::try_current()?, poll_interval))
    }

    /// Creates a monitor that spawns onto the given runtime.
    pub fn with_handle(handle: Handle, poll_interval: Duration) -> Monitor {
        Monitor {
            handle,
            poll_interval,
        }
    }

    /// Watches the given playback on the channel.
    pub fn watch(&self, channel: Arc<Channel>, member_id: usize, generation: u64) -> JoinHandle<()> {
        let poll_interval = self.poll_interval;
        let span = span!(Level::DEBUG, "monitor", channel = channel.index(), generation);
        self.handle.spawn(
            async move {
                loop {
                    tokio::time::sleep(poll_interval).await;

                    if channel.generation() != generation {
                        debug!("Playback superseded");
                        return;
                    }
                    if !channel.is_busy() {
                        if channel.complete(member_id, generation) {
                            debug!("Playback finished");
                        }
                        return;
                    }
                }
            }
            .instrument(span),
        )
    }
}

#[cfg(test)]
mod test {
    use std::{sync::Arc, time::Duration};

    use crate::audio::{mock, Engine, Output};
    use crate::channel::{Channel, Member};
    use crate::notifier::{mock::Recorder, Mode};
    use crate::samples::Sample;
    use crate::testutil::eventually_async;

    use super::Monitor;

    fn setup() -> (Arc<Channel>, Arc<mock::Lane>, Member, Recorder) {
        let engine = mock::Engine::new("mock", 1);
        let channel = Arc::new(Channel::new(0, engine.channel(0).unwrap()));
        let recorder = Recorder::new("a");
        let member = Member::new("a", Some(Arc::new(recorder.clone())));
        (channel, engine.lane(0).unwrap(), member, recorder)
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_retires_when_sound_ends() {
        let (channel, _lane, member, recorder) = setup();
        let monitor = Monitor::new(Duration::from_millis(5)).unwrap();

        let sample = Sample::silence("short", Duration::from_millis(50));
        let generation = channel.start(&member, &sample, false);
        let task = monitor.watch(channel.clone(), member.id(), generation);

        eventually_async(
            || {
                let recorder = recorder.clone();
                async move { recorder.modes() == vec![Mode::On, Mode::Off] }
            },
            "Monitor never retired the group",
        )
        .await;
        task.await.unwrap();
        assert_eq!(channel.active_member(), None);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_superseded_monitor_is_silent() {
        let (channel, lane, member, recorder) = setup();
        let monitor = Monitor::new(Duration::from_millis(5)).unwrap();

        let sample = Sample::silence("long", Duration::from_secs(10));
        let first = channel.start(&member, &sample, false);
        let stale = monitor.watch(channel.clone(), member.id(), first);

        // Retrigger, then end the new sound by hand.
        let second = channel.start(&member, &sample, false);
        stale.await.unwrap();
        assert_eq!(recorder.modes(), vec![Mode::On, Mode::On]);

        lane.stop();
        monitor
            .watch(channel.clone(), member.id(), second)
            .await
            .unwrap();
        assert_eq!(recorder.modes(), vec![Mode::On, Mode::On, Mode::Off]);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_stopped_playback_exits() {
        let (channel, _lane, member, recorder) = setup();
        let monitor = Monitor::new(Duration::from_millis(5)).unwrap();

        let sample = Sample::silence("loop", Duration::from_millis(10));
        let generation = channel.start(&member, &sample, true);
        let task = monitor.watch(channel.clone(), member.id(), generation);
        channel.stop();

        task.await.unwrap();
        // ON from the start, OFF from the stop, nothing from the monitor.
        assert_eq!(recorder.modes(), vec![Mode::On, Mode::Off]);
    }

    #[test]
    fn test_requires_runtime() {
        assert!(Monitor::new(Duration::from_millis(5)).is_err());
    }
}

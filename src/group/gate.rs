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
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// A debounce gate. Accepts an event only if at least the cooldown interval has passed
/// since the last accepted one. Rejected events don't extend the cooldown.
#[derive(Debug)]
pub struct Gate {
    interval: Duration,
    last_accepted: Mutex<Option<Instant>>,
}

impl Gate {
    pub fn new(interval: Duration) -> Gate {
        Gate {
            interval,
            last_accepted: Mutex::new(None),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Attempts to pass the gate at the given time.
    pub fn try_accept(&self, now: Instant) -> bool {
        let mut last_accepted = self.last_accepted.lock();
        if Self::accepts(*last_accepted, now, self.interval) {
            *last_accepted = Some(now);
            true
        } else {
            false
        }
    }

    /// The gate rule on its own. The first event is always accepted.
    pub fn accepts(last_accepted: Option<Instant>, now: Instant, interval: Duration) -> bool {
        match last_accepted {
            Some(last) => now.saturating_duration_since(last) >= interval,
            None => true,
        }
    }
}

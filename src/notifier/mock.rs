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
use std::sync::Arc;

use parking_lot::Mutex;

use super::{Mode, Notifier};

/// A notifier that records what it was asked to send.
#[derive(Clone, Default)]
pub struct Recorder {
    label: String,
    log: Arc<Mutex<Vec<(String, Mode)>>>,
}

impl Recorder {
    /// Creates a recorder with its own log.
    pub fn new(label: &str) -> Recorder {
        Recorder {
            label: label.to_string(),
            log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Creates a recorder with a different label that writes to the same log, so ordering
    /// across groups can be checked.
    pub fn sibling(&self, label: &str) -> Recorder {
        Recorder {
            label: label.to_string(),
            log: self.log.clone(),
        }
    }

    /// Every notification in the shared log, as (label, mode).
    pub fn log(&self) -> Vec<(String, Mode)> {
        self.log.lock().clone()
    }

    /// The modes sent by this recorder.
    pub fn modes(&self) -> Vec<Mode> {
        self.log
            .lock()
            .iter()
            .filter(|(label, _)| *label == self.label)
            .map(|(_, mode)| *mode)
            .collect()
    }
}

impl Notifier for Recorder {
    fn notify(&self, mode: Mode) {
        self.log.lock().push((self.label.clone(), mode));
    }
}

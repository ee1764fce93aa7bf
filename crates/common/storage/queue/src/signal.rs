// Copyright 2025 Crrow
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Wake-up monitor between producers and the consumer.
//!
//! The monitor guards an epoch counter bumped after every append. A consumer
//! samples the epoch *before* it looks at the file; if it then finds nothing
//! to read it waits for the epoch to move past the sample. An append landing
//! between the sample and the wait changes the epoch, so the wake-up cannot
//! be lost.

use std::time::Instant;

use parking_lot::{Condvar, Mutex};

#[derive(Debug, Default)]
pub(crate) struct NotEmpty {
    epoch: Mutex<u64>,
    cond:  Condvar,
}

impl NotEmpty {
    pub(crate) fn epoch(&self) -> u64 { *self.epoch.lock() }

    /// Record an append and wake every waiter.
    pub(crate) fn notify(&self) {
        let mut epoch = self.epoch.lock();
        *epoch = epoch.wrapping_add(1);
        drop(epoch);
        self.cond.notify_all();
    }

    /// Block until the epoch differs from `seen`, or until `deadline`.
    ///
    /// Returns `false` if the deadline passed with no append.
    pub(crate) fn wait_past(&self, seen: u64, deadline: Option<Instant>) -> bool {
        let mut epoch = self.epoch.lock();
        while *epoch == seen {
            match deadline {
                Some(deadline) => {
                    if self.cond.wait_until(&mut epoch, deadline).timed_out() {
                        return *epoch != seen;
                    }
                }
                None => self.cond.wait(&mut epoch),
            }
        }
        true
    }
}

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

//! Write side of the queue.
//!
//! The [`Appender`] owns the single append handle of the queue. It:
//! - Encodes each message into one record and appends it to the write file
//! - Checks the file size after every record and rolls to the next file of
//!   the rotation chain once the [`RollStrategy`] says so
//!
//! ## Concurrency
//!
//! The appender is not shared directly; the [`Queue`](crate::Queue) keeps it
//! behind a mutex, so concurrent producers append whole records one at a
//! time and never interleave bytes.

use std::{
    fs::{File, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

use snafu::ResultExt;
use tracing::debug;

use crate::{
    Result, RollStrategy,
    error::{EncodeSnafu, MetadataSnafu, OpenFileSnafu, WriteSnafu},
    naming::RotationChain,
    record,
};

pub(crate) struct Appender {
    /// Normalized queue directory.
    dir:        PathBuf,
    chain:      RotationChain,
    roll:       RollStrategy,
    /// Append handle on the current write file.
    file:       File,
    /// Full path of the current write file.
    path:       PathBuf,
    /// Generation of the current write file in the rotation chain.
    generation: u64,
    /// Reused encode buffer.
    buf:        Vec<u8>,
}

impl Appender {
    /// Create the base file of the chain, truncating any previous content.
    pub(crate) fn create(dir: PathBuf, chain: RotationChain, roll: RollStrategy) -> Result<Self> {
        let path = dir.join(chain.name(0));
        let file = create_for_append(&path)?;
        Ok(Self {
            dir,
            chain,
            roll,
            file,
            path,
            generation: 0,
            buf: Vec::new(),
        })
    }

    pub(crate) const fn generation(&self) -> u64 { self.generation }

    #[cfg(test)]
    pub(crate) fn path(&self) -> &Path { &self.path }

    /// Append one record, rolling to the next file if the size threshold was
    /// reached.
    ///
    /// The record is written with a single `write_all`. Once this returns the
    /// bytes are in the file (not necessarily synced to the device).
    pub(crate) fn append(&mut self, message: &str) -> Result<()> {
        self.buf.clear();
        record::encode_into(message, &mut self.buf).context(EncodeSnafu)?;
        self.file
            .write_all(&self.buf)
            .context(WriteSnafu { path: &self.path })?;
        self.maybe_roll()
    }

    fn maybe_roll(&mut self) -> Result<()> {
        if !self.roll.is_enabled() {
            return Ok(());
        }

        let size = self
            .file
            .metadata()
            .context(MetadataSnafu { path: &self.path })?
            .len();
        if !self.roll.should_roll(size) {
            return Ok(());
        }

        // The old handle stays current until the new file is open, so a
        // failed roll can be retried by the next append.
        let generation = self.generation + 1;
        let path = self.dir.join(self.chain.name(generation));
        let file = create_for_append(&path)?;

        debug!(from = ?self.path, to = ?path, size, generation, "Rolled write file");

        self.file = file;
        self.path = path;
        self.generation = generation;
        Ok(())
    }
}

/// Open `path` for writing, creating it or truncating leftovers.
///
/// Only the appender writes through this handle, so its cursor always sits
/// at the end of the file.
fn create_for_append(path: &Path) -> Result<File> {
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
        .context(OpenFileSnafu { path })
}

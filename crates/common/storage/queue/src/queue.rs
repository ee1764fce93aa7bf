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

//! Main queue struct and lifecycle management.
//!
//! The [`Queue`] is the entry point of the library. It owns:
//! - The [`Appender`] behind a writer lock, shared by all producers
//! - The [`Tailer`] behind a reader lock, used by the single consumer
//! - The not-empty monitor connecting the two
//!
//! ## Usage
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use diskq_queue::Queue;
//!
//! # fn main() -> diskq_queue::Result<()> {
//! let mut queue = Queue::open("/tmp/spill", 24 << 20)?;
//!
//! queue.push("hello")?;
//! queue.push("world")?;
//!
//! let batch = queue.consume(10, Duration::from_millis(100))?;
//! assert_eq!(batch, ["hello", "world"]);
//!
//! // Drop all data files once the queue is no longer needed.
//! queue.clean()?;
//! # Ok(())
//! # }
//! ```

use std::{
    fs, io,
    path::{Path, PathBuf},
    sync::atomic::{AtomicU64, Ordering},
    time::{Duration, Instant},
};

use parking_lot::Mutex;
use snafu::{ResultExt, ensure};
use tracing::info;

use crate::{
    QueueConfig, QueueError, Result,
    appender::Appender,
    error::{ClosedSnafu, MetadataSnafu, RemoveFileSnafu},
    naming::{RotationChain, normalize_dir},
    signal::NotEmpty,
    tailer::{ReadState, Tailer},
};

/// How long a consume call may block once it has caught up with producers.
#[derive(Debug, Clone, Copy)]
enum Wait {
    Forever,
    Until(Instant),
    Never,
}

impl Wait {
    fn expired(self) -> bool { matches!(self, Self::Until(deadline) if Instant::now() >= deadline) }
}

/// A disk-backed FIFO queue.
///
/// Any number of threads may [`push`](Self::push) concurrently; records are
/// serialized through a writer lock. Consumption deletes data files, so the
/// queue is meant for a single consumer: concurrent [`consume`](Self::consume)
/// calls are serialized by the reader lock but would otherwise compete for
/// the same messages.
pub struct Queue {
    config:           QueueConfig,
    /// Canonical queue directory.
    dir:              PathBuf,
    chain:            RotationChain,
    appender:         Mutex<Appender>,
    tailer:           Mutex<Tailer>,
    /// Generation of the write file, published after every append.
    write_generation: AtomicU64,
    /// Generation of the read file, published after every advance.
    read_generation:  AtomicU64,
    not_empty:        NotEmpty,
    /// Set by [`clean`](Self::clean); the files are gone afterwards.
    closed:           bool,
}

impl Queue {
    /// Open a queue in `dir`, rolling files once they reach `max_file_size`
    /// bytes (`0` disables rolling).
    ///
    /// Shorthand for [`QueueBuilder`](crate::QueueBuilder).
    pub fn open<P: Into<PathBuf>>(dir: P, max_file_size: u64) -> Result<Self> {
        crate::QueueBuilder::new(dir)
            .max_file_size(max_file_size)
            .build()
    }

    /// Create the directory if needed and start a fresh chain at the base
    /// file. An existing base file is truncated.
    pub(crate) fn new(config: QueueConfig) -> Result<Self> {
        let chain = RotationChain::new(config.file_name.clone())?;
        let dir = normalize_dir(&config.dir)?;

        let appender = Appender::create(dir.clone(), chain.clone(), config.roll_strategy)?;
        let tailer = Tailer::open(dir.clone(), chain.clone())?;

        info!(
            path = ?dir,
            file = chain.base(),
            roll_strategy = ?config.roll_strategy,
            "Queue opened"
        );

        Ok(Self {
            config,
            dir,
            chain,
            appender: Mutex::new(appender),
            tailer: Mutex::new(tailer),
            write_generation: AtomicU64::new(0),
            read_generation: AtomicU64::new(0),
            not_empty: NotEmpty::default(),
            closed: false,
        })
    }

    /// Append one message.
    ///
    /// Once this returns `Ok`, the message is in the file system's view of
    /// the write file and visible to the consumer. Waiting consumers are woken
    /// whether or not the append succeeded.
    pub fn push(&self, message: impl AsRef<str>) -> Result<()> {
        ensure!(!self.closed, ClosedSnafu);

        let mut appender = self.appender.lock();
        let result = appender.append(message.as_ref());
        self.write_generation
            .store(appender.generation(), Ordering::Release);
        drop(appender);

        self.not_empty.notify();
        result
    }

    /// Append several messages under one writer lock.
    ///
    /// Messages from one batch are contiguous in the queue. On error, the
    /// messages before the failing one have been appended. Returns the number
    /// of messages appended.
    pub fn push_batch<I, S>(&self, messages: I) -> Result<usize>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        ensure!(!self.closed, ClosedSnafu);

        let mut appender = self.appender.lock();
        let mut pushed = 0;
        let result = messages.into_iter().try_for_each(|message| {
            appender.append(message.as_ref())?;
            pushed += 1;
            Ok::<_, QueueError>(())
        });
        self.write_generation
            .store(appender.generation(), Ordering::Release);
        drop(appender);

        self.not_empty.notify();
        result.map(|()| pushed)
    }

    /// Take up to `batch_size` messages in append order.
    ///
    /// Blocks while the queue is empty. With a non-zero `timeout`, returns the
    /// messages gathered so far once it elapses, possibly none; that is not an
    /// error. A zero `timeout` waits until the batch is full. A `batch_size`
    /// of zero is treated as one.
    ///
    /// If reading fails after some messages were taken, the error is
    /// returned and those messages are handed out by the next call, ahead of
    /// anything still on disk.
    pub fn consume(&self, batch_size: usize, timeout: Duration) -> Result<Vec<String>> {
        // A deadline past what `Instant` can represent never arrives.
        let wait = if timeout.is_zero() {
            Wait::Forever
        } else {
            Instant::now()
                .checked_add(timeout)
                .map_or(Wait::Forever, Wait::Until)
        };
        self.consume_with(batch_size.max(1), wait)
    }

    /// Take up to `batch_size` messages that are already available, without
    /// blocking.
    pub fn try_consume(&self, batch_size: usize) -> Result<Vec<String>> {
        self.consume_with(batch_size.max(1), Wait::Never)
    }

    fn consume_with(&self, batch_size: usize, wait: Wait) -> Result<Vec<String>> {
        ensure!(!self.closed, ClosedSnafu);

        let mut tailer = self.tailer.lock();

        let mut batch = tailer.take_undelivered(batch_size);
        if !batch.is_empty() {
            return Ok(batch);
        }

        while batch.len() < batch_size && !wait.expired() {
            // Both samples must precede the read: a generation loaded after
            // an empty read could hide records appended just before a roll.
            let epoch = self.not_empty.epoch();
            let write_generation = self.write_generation.load(Ordering::Acquire);

            let step = match tailer.read_record() {
                Ok(Some(message)) => {
                    batch.push(message);
                    continue;
                }
                Ok(None) => match ReadState::classify(tailer.generation(), write_generation) {
                    ReadState::Draining => tailer.advance().map(|()| {
                        self.read_generation
                            .store(tailer.generation(), Ordering::Release);
                        true
                    }),
                    ReadState::CaughtUp => Ok(match wait {
                        Wait::Never => false,
                        Wait::Forever => self.not_empty.wait_past(epoch, None),
                        Wait::Until(deadline) => self.not_empty.wait_past(epoch, Some(deadline)),
                    }),
                },
                Err(e) => Err(e),
            };

            match step {
                Ok(true) => {}
                Ok(false) => break,
                Err(e) => {
                    tailer.hold_undelivered(batch);
                    return Err(e);
                }
            }
        }

        Ok(batch)
    }

    /// Delete every data file of the queue, from the read file through the
    /// write file. Missing files are ignored, so calling this again is fine.
    ///
    /// The queue is closed afterwards: `push` and `consume` return
    /// [`QueueError::Closed`].
    pub fn clean(&mut self) -> Result<()> {
        self.closed = true;

        let from = self.tailer.get_mut().generation();
        let to = self.appender.get_mut().generation();

        let mut removed = 0;
        for name in self.chain.names(from, to) {
            let path = self.dir.join(name);
            match fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e).context(RemoveFileSnafu { path }),
            }
        }

        info!(path = ?self.dir, removed, "Queue cleaned");
        Ok(())
    }

    /// Bytes currently held on disk by unconsumed files.
    ///
    /// Computed from the file system on every call.
    pub fn disk_usage(&self) -> Result<u64> {
        let from = self.read_generation.load(Ordering::Acquire);
        let to = self.write_generation.load(Ordering::Acquire);

        let mut total = 0;
        for name in self.chain.names(from, to) {
            let path = self.dir.join(name);
            match fs::metadata(&path) {
                Ok(metadata) => total += metadata.len(),
                // Consumed and deleted since the generation was sampled.
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e).context(MetadataSnafu { path }),
            }
        }
        Ok(total)
    }

    /// Canonical directory holding the data files.
    pub fn dir(&self) -> &Path { &self.dir }

    /// Path of the file producers currently append to.
    pub fn write_file(&self) -> PathBuf {
        self.dir.join(
            self.chain
                .name(self.write_generation.load(Ordering::Acquire)),
        )
    }

    /// Path of the file the consumer currently reads from.
    pub fn read_file(&self) -> PathBuf {
        self.dir.join(
            self.chain
                .name(self.read_generation.load(Ordering::Acquire)),
        )
    }

    pub const fn config(&self) -> &QueueConfig { &self.config }

    pub const fn is_closed(&self) -> bool { self.closed }
}

impl std::fmt::Debug for Queue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Queue")
            .field("dir", &self.dir)
            .field("file_name", &self.chain.base())
            .field("roll_strategy", &self.config.roll_strategy)
            .field(
                "read_generation",
                &self.read_generation.load(Ordering::Relaxed),
            )
            .field(
                "write_generation",
                &self.write_generation.load(Ordering::Relaxed),
            )
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

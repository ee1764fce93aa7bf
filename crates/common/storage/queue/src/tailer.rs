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

//! Read side of the queue.
//!
//! The [`Tailer`] holds the single read handle of the queue and a buffered
//! cursor into it. It:
//! - Reads newline-terminated records and decodes them
//! - Keeps an unterminated tail buffered until the appender finishes it,
//!   since the read file may still be growing
//! - Advances along the rotation chain once a rolled file is exhausted,
//!   deleting the file it leaves behind
//!
//! When the cursor hits end of stream, [`ReadState::classify`] decides
//! whether the file is finished ([`ReadState::Draining`]) or whether the
//! tailer has caught up with the appender ([`ReadState::CaughtUp`]).
//!
//! ## Failure handling
//!
//! A line that does not decode stays under the cursor. Every later read
//! reports it again rather than skipping it.

use std::{
    collections::VecDeque,
    fs::{self, File},
    io::{BufRead, BufReader},
    path::PathBuf,
};

use snafu::{ResultExt, ensure};
use tracing::{debug, warn};

use crate::{
    Result,
    error::{DecodeSnafu, OpenFileSnafu, ReadSnafu, RemoveFileSnafu, TruncatedRecordSnafu},
    naming::RotationChain,
    record::{self, RECORD_DELIMITER},
};

/// Position of the tailer relative to the appender at end of stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ReadState {
    /// The appender has rolled past the read file. It will not grow again
    /// and can be deleted once exhausted.
    Draining,
    /// The read file is the write file. More data needs a producer.
    CaughtUp,
}

impl ReadState {
    pub(crate) const fn classify(read_generation: u64, write_generation: u64) -> Self {
        if read_generation < write_generation {
            Self::Draining
        } else {
            Self::CaughtUp
        }
    }
}

pub(crate) struct Tailer {
    /// Normalized queue directory.
    dir:         PathBuf,
    chain:       RotationChain,
    /// Buffered read handle on the current read file.
    reader:      BufReader<File>,
    /// Full path of the current read file.
    path:        PathBuf,
    /// Generation of the current read file in the rotation chain.
    generation:  u64,
    /// Bytes of the record under the cursor: an unterminated tail, or a whole
    /// line that failed to decode.
    pending:     Vec<u8>,
    /// Messages decoded by a consume call that failed afterwards. They are
    /// handed out before anything else is read.
    undelivered: VecDeque<String>,
}

impl Tailer {
    /// Open the base file of the chain for reading.
    pub(crate) fn open(dir: PathBuf, chain: RotationChain) -> Result<Self> {
        let path = dir.join(chain.name(0));
        let file = File::open(&path).context(OpenFileSnafu { path: &path })?;
        Ok(Self {
            dir,
            chain,
            reader: BufReader::new(file),
            path,
            generation: 0,
            pending: Vec::new(),
            undelivered: VecDeque::new(),
        })
    }

    pub(crate) const fn generation(&self) -> u64 { self.generation }

    #[cfg(test)]
    pub(crate) fn path(&self) -> &std::path::Path { &self.path }

    /// Read the next complete record.
    ///
    /// Returns `Ok(None)` at end of stream, including when only part of a
    /// record is available yet.
    pub(crate) fn read_record(&mut self) -> Result<Option<String>> {
        if !record::is_complete(&self.pending) {
            self.reader
                .read_until(RECORD_DELIMITER, &mut self.pending)
                .context(ReadSnafu { path: &self.path })?;
            if !record::is_complete(&self.pending) {
                return Ok(None);
            }
        }

        let message = record::decode(&self.pending)
            .inspect_err(|e| warn!(path = ?self.path, error = %e, "Malformed record at read cursor"))
            .context(DecodeSnafu { path: &self.path })?;
        self.pending.clear();
        Ok(Some(message))
    }

    /// Leave the exhausted read file for the next one in the chain.
    ///
    /// Only valid in [`ReadState::Draining`] after `read_record` returned
    /// `None`. The next file is opened before the old one is removed, so a
    /// failure leaves the tailer where it was.
    pub(crate) fn advance(&mut self) -> Result<()> {
        if !self.pending.is_empty() {
            warn!(path = ?self.path, bytes = self.pending.len(), "Rolled file ends mid-record");
        }
        ensure!(
            self.pending.is_empty(),
            TruncatedRecordSnafu { path: &self.path }
        );

        let generation = self.generation + 1;
        let path = self.dir.join(self.chain.name(generation));
        let file = File::open(&path).context(OpenFileSnafu { path: &path })?;
        fs::remove_file(&self.path).context(RemoveFileSnafu { path: &self.path })?;

        debug!(removed = ?self.path, next = ?path, generation, "Advanced read file");

        self.reader = BufReader::new(file);
        self.path = path;
        self.generation = generation;
        Ok(())
    }

    /// Up to `limit` messages left over from a failed consume.
    pub(crate) fn take_undelivered(&mut self, limit: usize) -> Vec<String> {
        let n = limit.min(self.undelivered.len());
        self.undelivered.drain(..n).collect()
    }

    pub(crate) fn hold_undelivered(&mut self, messages: Vec<String>) {
        self.undelivered.extend(messages);
    }
}

#[cfg(test)]
mod tests {
    use std::{fs::OpenOptions, io::Write};

    use tempfile::TempDir;

    use super::*;

    fn chain() -> RotationChain { RotationChain::new("data").unwrap() }

    fn append_raw(temp_dir: &TempDir, name: &str, bytes: &[u8]) {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(temp_dir.path().join(name))
            .unwrap();
        file.write_all(bytes).unwrap();
    }

    fn tailer(temp_dir: &TempDir) -> Tailer {
        append_raw(temp_dir, "data", b"");
        Tailer::open(temp_dir.path().to_path_buf(), chain()).unwrap()
    }

    #[test]
    fn test_classify() {
        assert_eq!(ReadState::classify(0, 0), ReadState::CaughtUp);
        assert_eq!(ReadState::classify(3, 3), ReadState::CaughtUp);
        assert_eq!(ReadState::classify(0, 1), ReadState::Draining);
        assert_eq!(ReadState::classify(2, 7), ReadState::Draining);
    }

    #[test]
    fn test_open_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let err = Tailer::open(temp_dir.path().to_path_buf(), chain())
            .err()
            .unwrap();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_read_sees_appends_on_open_handle() {
        let temp_dir = TempDir::new().unwrap();
        let mut tailer = tailer(&temp_dir);

        assert!(tailer.read_record().unwrap().is_none());

        append_raw(&temp_dir, "data", b"\"msg\"\n\"msg1\"\n");
        assert_eq!(tailer.read_record().unwrap().as_deref(), Some("msg"));
        assert_eq!(tailer.read_record().unwrap().as_deref(), Some("msg1"));
        assert!(tailer.read_record().unwrap().is_none());
    }

    #[test]
    fn test_partial_record_waits_for_delimiter() {
        let temp_dir = TempDir::new().unwrap();
        let mut tailer = tailer(&temp_dir);

        append_raw(&temp_dir, "data", b"\"hal");
        assert!(tailer.read_record().unwrap().is_none());

        append_raw(&temp_dir, "data", b"f\"\n");
        assert_eq!(tailer.read_record().unwrap().as_deref(), Some("half"));
    }

    #[test]
    fn test_malformed_record_stays_at_cursor() {
        let temp_dir = TempDir::new().unwrap();
        let mut tailer = tailer(&temp_dir);
        append_raw(&temp_dir, "data", b"garbage\n\"after\"\n");

        for _ in 0..3 {
            let err = tailer.read_record().unwrap_err();
            assert!(err.is_corrupted());
        }
    }

    #[test]
    fn test_advance_removes_exhausted_file() {
        let temp_dir = TempDir::new().unwrap();
        let mut tailer = tailer(&temp_dir);
        append_raw(&temp_dir, "data", b"\"a\"\n");
        append_raw(&temp_dir, "data.1", b"\"b\"\n");

        assert_eq!(tailer.read_record().unwrap().as_deref(), Some("a"));
        assert!(tailer.read_record().unwrap().is_none());

        tailer.advance().unwrap();
        assert_eq!(tailer.generation(), 1);
        assert_eq!(tailer.path(), temp_dir.path().join("data.1"));
        assert!(!temp_dir.path().join("data").exists());
        assert_eq!(tailer.read_record().unwrap().as_deref(), Some("b"));
    }

    #[test]
    fn test_advance_without_next_file_keeps_position() {
        let temp_dir = TempDir::new().unwrap();
        let mut tailer = tailer(&temp_dir);

        let err = tailer.advance().unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(tailer.generation(), 0);
        assert!(temp_dir.path().join("data").exists());
    }

    #[test]
    fn test_advance_rejects_truncated_record() {
        let temp_dir = TempDir::new().unwrap();
        let mut tailer = tailer(&temp_dir);
        append_raw(&temp_dir, "data", b"\"cut sho");
        append_raw(&temp_dir, "data.1", b"");

        assert!(tailer.read_record().unwrap().is_none());
        let err = tailer.advance().unwrap_err();
        assert!(matches!(err, crate::QueueError::TruncatedRecord { .. }));
        assert!(temp_dir.path().join("data").exists());
    }

    #[test]
    fn test_undelivered_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let mut tailer = tailer(&temp_dir);

        tailer.hold_undelivered(vec!["a".into(), "b".into(), "c".into()]);
        assert_eq!(tailer.take_undelivered(2), vec!["a", "b"]);
        assert_eq!(tailer.take_undelivered(5), vec!["c"]);
        assert!(tailer.take_undelivered(5).is_empty());
    }
}

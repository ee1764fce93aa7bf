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

use std::{io, path::PathBuf};

use snafu::{Location, Snafu};

/// Queue operation errors.
///
/// I/O variants carry the path of the file or directory that failed. A
/// returned error means the operation did not complete; the queue may have
/// been partially advanced (for example, a record was written but the
/// following roll failed).
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum QueueError {
    #[snafu(display("Failed to create queue directory {}", path.display()))]
    CreateDir {
        path:   PathBuf,
        source: io::Error,
        #[snafu(implicit)]
        loc:    Location,
    },

    #[snafu(display("Invalid queue directory {}", path.display()))]
    InvalidPath {
        path:   PathBuf,
        source: io::Error,
        #[snafu(implicit)]
        loc:    Location,
    },

    #[snafu(display("Invalid queue file name {name:?}"))]
    InvalidFileName {
        name: String,
        #[snafu(implicit)]
        loc:  Location,
    },

    #[snafu(display("Failed to open {}", path.display()))]
    OpenFile {
        path:   PathBuf,
        source: io::Error,
        #[snafu(implicit)]
        loc:    Location,
    },

    #[snafu(display("Failed to write to {}", path.display()))]
    Write {
        path:   PathBuf,
        source: io::Error,
        #[snafu(implicit)]
        loc:    Location,
    },

    #[snafu(display("Failed to read from {}", path.display()))]
    Read {
        path:   PathBuf,
        source: io::Error,
        #[snafu(implicit)]
        loc:    Location,
    },

    #[snafu(display("Failed to remove {}", path.display()))]
    RemoveFile {
        path:   PathBuf,
        source: io::Error,
        #[snafu(implicit)]
        loc:    Location,
    },

    #[snafu(display("Failed to stat {}", path.display()))]
    Metadata {
        path:   PathBuf,
        source: io::Error,
        #[snafu(implicit)]
        loc:    Location,
    },

    #[snafu(display("Failed to encode message"))]
    Encode {
        source: serde_json::Error,
        #[snafu(implicit)]
        loc:    Location,
    },

    /// A complete line that is not a valid encoded message. The record stays
    /// at the read cursor, so every later consume reports it again.
    #[snafu(display("Malformed record in {}", path.display()))]
    Decode {
        path:   PathBuf,
        source: serde_json::Error,
        #[snafu(implicit)]
        loc:    Location,
    },

    /// A rolled file ends in the middle of a record.
    #[snafu(display("Truncated record at end of {}", path.display()))]
    TruncatedRecord {
        path: PathBuf,
        #[snafu(implicit)]
        loc:  Location,
    },

    #[snafu(display("Queue has been cleaned"))]
    Closed {
        #[snafu(implicit)]
        loc: Location,
    },
}

impl QueueError {
    /// The underlying I/O error, if this is a filesystem failure.
    pub const fn io_error(&self) -> Option<&io::Error> {
        match self {
            Self::CreateDir { source, .. }
            | Self::InvalidPath { source, .. }
            | Self::OpenFile { source, .. }
            | Self::Write { source, .. }
            | Self::Read { source, .. }
            | Self::RemoveFile { source, .. }
            | Self::Metadata { source, .. } => Some(source),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.io_error()
            .is_some_and(|e| e.kind() == io::ErrorKind::NotFound)
    }

    /// Whether the error comes from the contents of a data file rather than
    /// from the filesystem.
    pub const fn is_corrupted(&self) -> bool {
        matches!(self, Self::Decode { .. } | Self::TruncatedRecord { .. })
    }
}

/// Result type for queue operations.
pub type Result<T, E = QueueError> = std::result::Result<T, E>;
